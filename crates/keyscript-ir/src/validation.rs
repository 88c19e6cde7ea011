//! Structural validation of script graphs.

use thiserror::Error;

use crate::{CommandObj, ExprObj, JsonType, OperandKind, SequenceObj, SetOptions};

/// Largest integer magnitude every engine represents exactly. Lua numbers
/// and the `cjson` decoder both go through doubles.
pub const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// Errors found while reading or validating a script graph.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("unknown opcode: {0}")]
    UnknownOpcode(String),

    #[error("invalid argument count for {opcode}: expected {expected}, got {got}")]
    InvalidArgCount {
        opcode: String,
        expected: String,
        got: usize,
    },

    #[error("invalid argument type for {opcode} at position {position}: expected {expected}")]
    InvalidArgType {
        opcode: String,
        position: usize,
        expected: String,
    },

    #[error("integer literal for {opcode} at position {position} is outside ±2^53")]
    InexactInteger { opcode: String, position: usize },

    #[error("invalid options for {opcode}: {reason}")]
    InvalidOptions { opcode: String, reason: String },

    #[error("invalid {kind} name {name:?}")]
    InvalidName { kind: &'static str, name: String },

    #[error("invalid form: {0}")]
    InvalidForm(String),
}

/// Validate every command of a sequence against its opcode signature.
pub fn validate(seq: &SequenceObj) -> Result<(), ValidationError> {
    seq.commands().iter().try_for_each(validate_command)
}

/// Validate a command and, recursively, its nested commands.
pub fn validate_command(cmd: &CommandObj) -> Result<(), ValidationError> {
    let signature = cmd.op.signature();
    let got = cmd.args.len();
    if !signature.accepts(got) {
        return Err(ValidationError::InvalidArgCount {
            opcode: cmd.op.to_string(),
            expected: signature.describe_arity(),
            got,
        });
    }

    for (position, arg) in cmd.args.iter().enumerate() {
        let Some(operand) = signature.operand(position) else {
            continue;
        };
        let wrong_type = || ValidationError::InvalidArgType {
            opcode: cmd.op.to_string(),
            position,
            expected: operand.kind.describe().to_string(),
        };
        match (arg, operand.kind) {
            (ExprObj::Literal { value }, OperandKind::SetOptions) => {
                SetOptions::from_literal(value).map_err(|reason| {
                    ValidationError::InvalidOptions {
                        opcode: cmd.op.to_string(),
                        reason,
                    }
                })?;
            }
            (_, OperandKind::SetOptions) => return Err(wrong_type()),
            (ExprObj::Key { name }, _) => check_name("key", name)?,
            // Keys must be bound by name so a runtime prefix reaches them.
            (_, OperandKind::Key) => return Err(wrong_type()),
            (ExprObj::Literal { value }, kind) => {
                if !literal_matches(value, kind) {
                    return Err(wrong_type());
                }
                if !is_exact_number(value) {
                    return Err(ValidationError::InexactInteger {
                        opcode: cmd.op.to_string(),
                        position,
                    });
                }
            }
            (ExprObj::Arg { name }, _) => check_name("argument", name)?,
            (ExprObj::Command { cmd: nested }, _) => validate_command(nested)?,
        }
    }
    Ok(())
}

fn literal_matches(value: &JsonType, kind: OperandKind) -> bool {
    match kind {
        OperandKind::Key | OperandKind::SetOptions => false,
        OperandKind::Value => value.is_string() || value.is_number(),
        OperandKind::Count => value.is_i64() || value.is_u64(),
        OperandKind::Score => value.is_number(),
    }
}

/// False for integers beyond ±2^53, which not every engine can hold
/// exactly. Everything else, floats included, passes.
pub fn is_exact_number(value: &JsonType) -> bool {
    let JsonType::Number(n) = value else {
        return true;
    };
    if let Some(i) = n.as_i64() {
        i.unsigned_abs() <= MAX_EXACT_INTEGER
    } else if let Some(u) = n.as_u64() {
        u <= MAX_EXACT_INTEGER
    } else {
        true
    }
}

/// The JSON form of an integer reply. Beyond ±2^53 the reply is the
/// nearest double, as a Lua engine would give it.
pub fn integer_value(n: i64) -> JsonType {
    if n.unsigned_abs() <= MAX_EXACT_INTEGER {
        JsonType::from(n)
    } else {
        JsonType::from(n as f64)
    }
}

// Names end up in generated comments, so they must be single-line.
fn check_name(kind: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.chars().any(char::is_control) {
        return Err(ValidationError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}
