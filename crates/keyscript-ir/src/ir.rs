//! Script graph types.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Opcode;

/// The JSON value model crossing the execution boundary.
pub type JsonType = serde_json::Value;

/// An operand of a command.
///
/// Expressions form a tree: a nested command is owned by its parent, so
/// cycles cannot be built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExprObj {
    /// A constant JSON value.
    Literal { value: JsonType },
    /// A key supplied by name at invocation time.
    Key { name: String },
    /// An argument supplied by name at invocation time.
    Arg { name: String },
    /// The reply of a nested command.
    Command { cmd: Box<CommandObj> },
}

impl ExprObj {
    /// Creates a literal operand.
    pub fn literal(value: impl Into<JsonType>) -> Self {
        ExprObj::Literal {
            value: value.into(),
        }
    }

    /// Creates a key reference.
    pub fn key(name: impl Into<String>) -> Self {
        ExprObj::Key { name: name.into() }
    }

    /// Creates an argument reference.
    pub fn arg(name: impl Into<String>) -> Self {
        ExprObj::Arg { name: name.into() }
    }

    /// Wraps a command so its reply can be used as an operand.
    pub fn command(cmd: CommandObj) -> Self {
        ExprObj::Command { cmd: Box::new(cmd) }
    }

    /// Returns the literal value, if this is a literal.
    pub fn as_literal(&self) -> Option<&JsonType> {
        match self {
            ExprObj::Literal { value } => Some(value),
            _ => None,
        }
    }
}

impl From<CommandObj> for ExprObj {
    fn from(cmd: CommandObj) -> Self {
        ExprObj::command(cmd)
    }
}

impl From<&str> for ExprObj {
    fn from(value: &str) -> Self {
        ExprObj::literal(value)
    }
}

impl From<String> for ExprObj {
    fn from(value: String) -> Self {
        ExprObj::literal(value)
    }
}

impl From<i32> for ExprObj {
    fn from(value: i32) -> Self {
        ExprObj::literal(value)
    }
}

impl From<i64> for ExprObj {
    fn from(value: i64) -> Self {
        ExprObj::literal(value)
    }
}

impl From<f64> for ExprObj {
    fn from(value: f64) -> Self {
        ExprObj::literal(value)
    }
}

/// A single key/value operation with its operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandObj {
    pub op: Opcode,
    pub args: Vec<ExprObj>,
}

impl CommandObj {
    /// Creates a command. Operands are checked by [`crate::validate`].
    pub fn new(op: Opcode, args: Vec<ExprObj>) -> Self {
        Self { op, args }
    }
}

/// What a sequence replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyMode {
    /// The reply of the last command, or `null` for an empty sequence.
    #[default]
    Last,
    /// The replies of every top-level command, in order. An empty
    /// sequence replies `{}`.
    Each,
}

/// An ordered list of commands, run as one atomic script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceObj {
    commands: Vec<CommandObj>,
    #[serde(default)]
    reply: ReplyMode,
}

impl SequenceObj {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty sequence that replies every command's reply.
    pub fn pipeline() -> Self {
        Self::new().with_reply(ReplyMode::Each)
    }

    pub fn with_reply(mut self, reply: ReplyMode) -> Self {
        self.reply = reply;
        self
    }

    pub fn reply(&self) -> ReplyMode {
        self.reply
    }

    /// Appends a command.
    pub fn add(&mut self, cmd: CommandObj) -> &mut Self {
        self.commands.push(cmd);
        self
    }

    /// Appends a command, builder style.
    pub fn then(mut self, cmd: CommandObj) -> Self {
        self.commands.push(cmd);
        self
    }

    /// The commands in execution order.
    pub fn commands(&self) -> &[CommandObj] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Stable identity of this script: SHA-256 over its canonical
    /// S-expression serialization, hex encoded.
    pub fn digest(&self) -> String {
        let canonical = crate::sexpr::to_sexpr(self).to_string();
        format!("{:x}", Sha256::digest(canonical.as_bytes()))
    }
}

impl From<Vec<CommandObj>> for SequenceObj {
    fn from(commands: Vec<CommandObj>) -> Self {
        Self {
            commands,
            reply: ReplyMode::Last,
        }
    }
}

impl FromIterator<CommandObj> for SequenceObj {
    fn from_iter<I: IntoIterator<Item = CommandObj>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
            reply: ReplyMode::Last,
        }
    }
}
