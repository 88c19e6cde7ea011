//! Script IR types and validation for Keyscript.
//!
//! This crate defines the intermediate representation shared by every
//! execution target (generated Lua for Redis, in-process emulation).
//!
//! # S-expression format
//!
//! Scripts can be written as JSON S-expressions:
//!
//! ```json
//! ["seq",
//!   ["set", ["key", "bar"], ["arg", "value"]],
//!   ["get", ["key", "bar"]]
//! ]
//! ```
//!
//! `["pipe", ...]` is the same, but the script replies every command's
//! reply instead of the last one.
//!
//! A command is `[opcode, ...operands]`. An operand is either a bare JSON
//! literal, a reference (`["key", name]`, `["arg", name]`), a quoted literal
//! (`["lit", value]`), or a nested command.

pub mod builders;
mod ir;
mod opcodes;
mod options;
pub mod sexpr;
mod validation;

pub use ir::{CommandObj, ExprObj, JsonType, ReplyMode, SequenceObj};
pub use opcodes::{Opcode, Operand, OperandKind, Signature};
pub use options::{SetMode, SetOptions};
pub use validation::{
    MAX_EXACT_INTEGER, ValidationError, integer_value, is_exact_number, validate,
    validate_command,
};
