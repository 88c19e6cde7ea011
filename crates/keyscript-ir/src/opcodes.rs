//! Opcode definitions and their operand signatures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ValidationError;

/// The kind of value an operand position accepts.
///
/// Literal operands are checked against the kind at validation time.
/// Argument references and nested commands are only known at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// A key reference. Keys are always bound by name, so the runtime can
    /// prefix them.
    Key,
    /// A string or number value
    Value,
    /// An integer
    Count,
    /// A floating point score
    Score,
    /// A literal [`crate::SetOptions`] object
    SetOptions,
}

impl OperandKind {
    /// Human-readable description used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            OperandKind::Key => "key reference",
            OperandKind::Value => "string or number",
            OperandKind::Count => "integer",
            OperandKind::Score => "number",
            OperandKind::SetOptions => "literal set options object",
        }
    }
}

/// One operand slot in an opcode signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    /// Operand name
    pub name: &'static str,
    /// Accepted kind
    pub kind: OperandKind,
    /// Whether the operand may be omitted (only trailing operands are optional)
    pub optional: bool,
}

const fn req(name: &'static str, kind: OperandKind) -> Operand {
    Operand {
        name,
        kind,
        optional: false,
    }
}

const fn opt(name: &'static str, kind: OperandKind) -> Operand {
    Operand {
        name,
        kind,
        optional: true,
    }
}

/// Operand layout of an opcode: fixed operands, then a group that repeats
/// one or more times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub fixed: &'static [Operand],
    /// Empty when the opcode takes no repeated operands. Signatures with a
    /// repeated group have no optional fixed operands.
    pub repeated: &'static [Operand],
}

impl Signature {
    const fn fixed(fixed: &'static [Operand]) -> Self {
        Self {
            fixed,
            repeated: &[],
        }
    }

    const fn repeated(fixed: &'static [Operand], repeated: &'static [Operand]) -> Self {
        Self { fixed, repeated }
    }

    /// Minimum operand count, and the maximum if there is one.
    pub fn arity(&self) -> (usize, Option<usize>) {
        let required = self.fixed.iter().filter(|operand| !operand.optional).count();
        if self.repeated.is_empty() {
            (required, Some(self.fixed.len()))
        } else {
            (required + self.repeated.len(), None)
        }
    }

    /// Whether `count` operands fit this signature.
    pub fn accepts(&self, count: usize) -> bool {
        let (min, max) = self.arity();
        match max {
            Some(max) => (min..=max).contains(&count),
            None => count >= min && (count - self.fixed.len()) % self.repeated.len() == 0,
        }
    }

    /// The operand expected at `position`.
    pub fn operand(&self, position: usize) -> Option<Operand> {
        if let Some(operand) = self.fixed.get(position) {
            return Some(*operand);
        }
        let group = self.repeated.len();
        if group == 0 {
            return None;
        }
        Some(self.repeated[(position - self.fixed.len()) % group])
    }

    /// The accepted operand counts, for error messages.
    pub fn describe_arity(&self) -> String {
        match (self.arity(), self.repeated.len()) {
            ((min, Some(max)), _) if min == max => min.to_string(),
            ((min, Some(max)), _) => format!("{min} to {max}"),
            ((min, None), 1) => format!("{min} or more"),
            (_, group) => format!("{} plus one or more groups of {group}", self.fixed.len()),
        }
    }
}

const KEY: Operand = req("key", OperandKind::Key);
const VALUE: Operand = req("value", OperandKind::Value);
const FIELD: Operand = req("field", OperandKind::Value);

const SIG_KEY: Signature = Signature::fixed(&[KEY]);
const SIG_KEYS: Signature = Signature::repeated(&[], &[KEY]);
const SIG_SET: Signature = Signature::fixed(&[
    KEY,
    VALUE,
    opt("options", OperandKind::SetOptions),
]);
const SIG_KEY_INC: Signature = Signature::fixed(&[KEY, req("increment", OperandKind::Count)]);
const SIG_KEY_COUNT: Signature = Signature::fixed(&[KEY, opt("count", OperandKind::Count)]);
const SIG_PUSH: Signature = Signature::repeated(&[KEY], &[VALUE]);
const SIG_ZADD: Signature = Signature::repeated(
    &[KEY],
    &[req("score", OperandKind::Score), req("member", OperandKind::Value)],
);
const SIG_KEY_FIELD: Signature = Signature::fixed(&[KEY, FIELD]);
const SIG_KEY_FIELDS: Signature = Signature::repeated(&[KEY], &[FIELD]);
const SIG_HSET: Signature = Signature::repeated(&[KEY], &[FIELD, VALUE]);
const SIG_HINCRBY: Signature =
    Signature::fixed(&[KEY, FIELD, req("increment", OperandKind::Count)]);

/// The fixed set of key/value operations a script can perform.
///
/// Every backend lowers every opcode; adding a variant forces each
/// backend's exhaustive match to grow with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Opcode {
    Get,
    Set,
    IncrBy,
    Del,
    Exists,
    LPush,
    RPush,
    LPop,
    RPop,
    LLen,
    ZAdd,
    ZPopMax,
    ZPopMin,
    ZCard,
    HSet,
    HGet,
    HDel,
    HLen,
    HMGet,
    HIncrBy,
    HKeys,
    HVals,
    HGetAll,
}

impl Opcode {
    /// All opcodes, in declaration order.
    pub const ALL: &'static [Opcode] = &[
        Opcode::Get,
        Opcode::Set,
        Opcode::IncrBy,
        Opcode::Del,
        Opcode::Exists,
        Opcode::LPush,
        Opcode::RPush,
        Opcode::LPop,
        Opcode::RPop,
        Opcode::LLen,
        Opcode::ZAdd,
        Opcode::ZPopMax,
        Opcode::ZPopMin,
        Opcode::ZCard,
        Opcode::HSet,
        Opcode::HGet,
        Opcode::HDel,
        Opcode::HLen,
        Opcode::HMGet,
        Opcode::HIncrBy,
        Opcode::HKeys,
        Opcode::HVals,
        Opcode::HGetAll,
    ];

    /// The opcode name, which is also the Redis command name.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Get => "get",
            Opcode::Set => "set",
            Opcode::IncrBy => "incrby",
            Opcode::Del => "del",
            Opcode::Exists => "exists",
            Opcode::LPush => "lpush",
            Opcode::RPush => "rpush",
            Opcode::LPop => "lpop",
            Opcode::RPop => "rpop",
            Opcode::LLen => "llen",
            Opcode::ZAdd => "zadd",
            Opcode::ZPopMax => "zpopmax",
            Opcode::ZPopMin => "zpopmin",
            Opcode::ZCard => "zcard",
            Opcode::HSet => "hset",
            Opcode::HGet => "hget",
            Opcode::HDel => "hdel",
            Opcode::HLen => "hlen",
            Opcode::HMGet => "hmget",
            Opcode::HIncrBy => "hincrby",
            Opcode::HKeys => "hkeys",
            Opcode::HVals => "hvals",
            Opcode::HGetAll => "hgetall",
        }
    }

    /// The declared operand signature.
    pub fn signature(self) -> Signature {
        match self {
            Opcode::Get
            | Opcode::LLen
            | Opcode::ZCard
            | Opcode::HLen
            | Opcode::HKeys
            | Opcode::HVals
            | Opcode::HGetAll => SIG_KEY,
            Opcode::Del | Opcode::Exists => SIG_KEYS,
            Opcode::Set => SIG_SET,
            Opcode::IncrBy => SIG_KEY_INC,
            Opcode::LPush | Opcode::RPush => SIG_PUSH,
            Opcode::LPop | Opcode::RPop | Opcode::ZPopMax | Opcode::ZPopMin => SIG_KEY_COUNT,
            Opcode::ZAdd => SIG_ZADD,
            Opcode::HGet => SIG_KEY_FIELD,
            Opcode::HDel | Opcode::HMGet => SIG_KEY_FIELDS,
            Opcode::HSet => SIG_HSET,
            Opcode::HIncrBy => SIG_HINCRBY,
        }
    }

    /// Minimum operand count, and the maximum if there is one.
    pub fn arity(self) -> (usize, Option<usize>) {
        self.signature().arity()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Opcode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownOpcode(s.to_string()))
    }
}
