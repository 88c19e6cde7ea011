//! Constructors for commands and operands.
//!
//! ```
//! use rhizome_keyscript_ir::builders::*;
//! use rhizome_keyscript_ir::SequenceObj;
//!
//! let seq = SequenceObj::new()
//!     .then(zadd(key("queue"), 2.0, "a"))
//!     .then(zpopmax_n(key("queue"), arg("count")));
//! assert_eq!(seq.len(), 2);
//! ```

use crate::{CommandObj, ExprObj, Opcode, SetOptions};

pub fn key(name: impl Into<String>) -> ExprObj {
    ExprObj::key(name)
}

pub fn arg(name: impl Into<String>) -> ExprObj {
    ExprObj::arg(name)
}

pub fn lit(value: impl Into<serde_json::Value>) -> ExprObj {
    ExprObj::literal(value)
}

fn cmd(op: Opcode, args: Vec<ExprObj>) -> CommandObj {
    CommandObj::new(op, args)
}

// ============================================================================
// strings
// ============================================================================

/// Reads a string value. Absent keys reply `false`.
pub fn get(key: ExprObj) -> CommandObj {
    cmd(Opcode::Get, vec![key])
}

/// Writes a string value. Replies `true`.
pub fn set(key: ExprObj, value: impl Into<ExprObj>) -> CommandObj {
    cmd(Opcode::Set, vec![key, value.into()])
}

/// Writes a string value under `options`. Replies whether the value was
/// written, or the previous value (`false` if none) with `return_previous`.
/// Default options give the plain two-operand form.
pub fn set_with(key: ExprObj, value: impl Into<ExprObj>, options: &SetOptions) -> CommandObj {
    let mut args = vec![key, value.into()];
    if !options.is_default() {
        args.push(ExprObj::literal(options.to_literal()));
    }
    cmd(Opcode::Set, args)
}

/// Adds to an integer value, creating it at zero. Replies the new value.
pub fn incrby(key: ExprObj, increment: impl Into<ExprObj>) -> CommandObj {
    cmd(Opcode::IncrBy, vec![key, increment.into()])
}

pub fn del(key: ExprObj) -> CommandObj {
    cmd(Opcode::Del, vec![key])
}

/// Deletes every key. Replies how many existed.
pub fn del_keys(keys: impl IntoIterator<Item = ExprObj>) -> CommandObj {
    cmd(Opcode::Del, keys.into_iter().collect())
}

pub fn exists(key: ExprObj) -> CommandObj {
    cmd(Opcode::Exists, vec![key])
}

/// Counts the keys that exist. A key named twice counts twice.
pub fn exists_keys(keys: impl IntoIterator<Item = ExprObj>) -> CommandObj {
    cmd(Opcode::Exists, keys.into_iter().collect())
}

// ============================================================================
// lists
// ============================================================================

pub fn lpush(key: ExprObj, value: impl Into<ExprObj>) -> CommandObj {
    cmd(Opcode::LPush, vec![key, value.into()])
}

pub fn rpush(key: ExprObj, value: impl Into<ExprObj>) -> CommandObj {
    cmd(Opcode::RPush, vec![key, value.into()])
}

/// Pushes each value in turn, so the last one ends up leftmost.
pub fn lpush_all<V: Into<ExprObj>>(key: ExprObj, values: impl IntoIterator<Item = V>) -> CommandObj {
    cmd(Opcode::LPush, with_key(key, values))
}

pub fn rpush_all<V: Into<ExprObj>>(key: ExprObj, values: impl IntoIterator<Item = V>) -> CommandObj {
    cmd(Opcode::RPush, with_key(key, values))
}

/// Pops one value from the left. Replies the value or `false`.
pub fn lpop(key: ExprObj) -> CommandObj {
    cmd(Opcode::LPop, vec![key])
}

/// Pops up to `count` values from the left. Replies an array or `false`.
pub fn lpop_n(key: ExprObj, count: impl Into<ExprObj>) -> CommandObj {
    cmd(Opcode::LPop, vec![key, count.into()])
}

pub fn rpop(key: ExprObj) -> CommandObj {
    cmd(Opcode::RPop, vec![key])
}

pub fn rpop_n(key: ExprObj, count: impl Into<ExprObj>) -> CommandObj {
    cmd(Opcode::RPop, vec![key, count.into()])
}

pub fn llen(key: ExprObj) -> CommandObj {
    cmd(Opcode::LLen, vec![key])
}

// ============================================================================
// sorted sets
// ============================================================================

pub fn zadd(key: ExprObj, score: impl Into<ExprObj>, member: impl Into<ExprObj>) -> CommandObj {
    cmd(Opcode::ZAdd, vec![key, score.into(), member.into()])
}

/// Adds `(member, score)` pairs. Replies the number of new members.
pub fn zadd_all<M, S>(key: ExprObj, members: impl IntoIterator<Item = (M, S)>) -> CommandObj
where
    M: Into<ExprObj>,
    S: Into<ExprObj>,
{
    let mut args = vec![key];
    for (member, score) in members {
        args.push(score.into());
        args.push(member.into());
    }
    cmd(Opcode::ZAdd, args)
}

/// Pops the highest scoring member as `[member, score]`.
pub fn zpopmax(key: ExprObj) -> CommandObj {
    cmd(Opcode::ZPopMax, vec![key])
}

/// Pops up to `count` members, highest first, as a flat member/score array.
pub fn zpopmax_n(key: ExprObj, count: impl Into<ExprObj>) -> CommandObj {
    cmd(Opcode::ZPopMax, vec![key, count.into()])
}

pub fn zpopmin(key: ExprObj) -> CommandObj {
    cmd(Opcode::ZPopMin, vec![key])
}

pub fn zpopmin_n(key: ExprObj, count: impl Into<ExprObj>) -> CommandObj {
    cmd(Opcode::ZPopMin, vec![key, count.into()])
}

pub fn zcard(key: ExprObj) -> CommandObj {
    cmd(Opcode::ZCard, vec![key])
}

// ============================================================================
// hashes
// ============================================================================

pub fn hset(key: ExprObj, field: impl Into<ExprObj>, value: impl Into<ExprObj>) -> CommandObj {
    cmd(Opcode::HSet, vec![key, field.into(), value.into()])
}

pub fn hget(key: ExprObj, field: impl Into<ExprObj>) -> CommandObj {
    cmd(Opcode::HGet, vec![key, field.into()])
}

pub fn hdel(key: ExprObj, field: impl Into<ExprObj>) -> CommandObj {
    cmd(Opcode::HDel, vec![key, field.into()])
}

/// Sets `(field, value)` pairs. Replies the number of new fields.
pub fn hset_all<F, V>(key: ExprObj, fields: impl IntoIterator<Item = (F, V)>) -> CommandObj
where
    F: Into<ExprObj>,
    V: Into<ExprObj>,
{
    let mut args = vec![key];
    for (field, value) in fields {
        args.push(field.into());
        args.push(value.into());
    }
    cmd(Opcode::HSet, args)
}

pub fn hdel_all<F: Into<ExprObj>>(key: ExprObj, fields: impl IntoIterator<Item = F>) -> CommandObj {
    cmd(Opcode::HDel, with_key(key, fields))
}

pub fn hlen(key: ExprObj) -> CommandObj {
    cmd(Opcode::HLen, vec![key])
}

/// Reads several fields. Replies an array with `false` for missing fields.
pub fn hmget<F: Into<ExprObj>>(key: ExprObj, fields: impl IntoIterator<Item = F>) -> CommandObj {
    cmd(Opcode::HMGet, with_key(key, fields))
}

pub fn hincrby(
    key: ExprObj,
    field: impl Into<ExprObj>,
    increment: impl Into<ExprObj>,
) -> CommandObj {
    cmd(Opcode::HIncrBy, vec![key, field.into(), increment.into()])
}

/// Field names in insertion order.
pub fn hkeys(key: ExprObj) -> CommandObj {
    cmd(Opcode::HKeys, vec![key])
}

pub fn hvals(key: ExprObj) -> CommandObj {
    cmd(Opcode::HVals, vec![key])
}

/// A flat field/value array in insertion order.
pub fn hgetall(key: ExprObj) -> CommandObj {
    cmd(Opcode::HGetAll, vec![key])
}

fn with_key<V: Into<ExprObj>>(key: ExprObj, values: impl IntoIterator<Item = V>) -> Vec<ExprObj> {
    std::iter::once(key)
        .chain(values.into_iter().map(Into::into))
        .collect()
}
