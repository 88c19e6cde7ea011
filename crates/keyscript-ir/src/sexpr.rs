//! Reading and writing the JSON S-expression form of a script.

use serde_json::{Value, json};

use crate::{CommandObj, ExprObj, Opcode, ReplyMode, SequenceObj, ValidationError, validate};

const SEQ: &str = "seq";
const PIPE: &str = "pipe";
const KEY: &str = "key";
const ARG: &str = "arg";
const LIT: &str = "lit";

/// Parse a script from its S-expression form and validate it.
///
/// Accepts `["seq", cmd...]`, `["pipe", cmd...]` (replies every command's
/// reply) or a single bare command.
pub fn parse_sequence(value: &Value) -> Result<SequenceObj, ValidationError> {
    let items = value
        .as_array()
        .ok_or_else(|| ValidationError::InvalidForm("script must be a list".into()))?;
    let seq = match items.first().and_then(Value::as_str) {
        Some(head @ (SEQ | PIPE)) => {
            let seq = items[1..]
                .iter()
                .map(parse_command)
                .collect::<Result<SequenceObj, _>>()?;
            if head == PIPE {
                seq.with_reply(ReplyMode::Each)
            } else {
                seq
            }
        }
        Some(_) => SequenceObj::from(vec![parse_command(value)?]),
        None if items.is_empty() => SequenceObj::new(),
        None => {
            return Err(ValidationError::InvalidForm(
                "script must start with an opcode, \"seq\" or \"pipe\"".into(),
            ));
        }
    };
    validate(&seq)?;
    Ok(seq)
}

/// Parse a single command `[opcode, ...operands]`.
pub fn parse_command(value: &Value) -> Result<CommandObj, ValidationError> {
    let items = value
        .as_array()
        .ok_or_else(|| ValidationError::InvalidForm(format!("expected command, got {value}")))?;
    let op = items
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::InvalidForm("opcode name must be a string".into()))?;
    let op: Opcode = op.parse()?;
    let args = items[1..]
        .iter()
        .map(parse_expr)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CommandObj::new(op, args))
}

fn parse_expr(value: &Value) -> Result<ExprObj, ValidationError> {
    let Some(items) = value.as_array() else {
        // Scalars and objects are literals
        return Ok(ExprObj::literal(value.clone()));
    };
    match items.first().and_then(Value::as_str) {
        Some(head @ (KEY | ARG)) => {
            let name = match items.as_slice() {
                [_, Value::String(name)] => name.clone(),
                _ => {
                    return Err(ValidationError::InvalidForm(format!(
                        "{head} reference takes exactly one name"
                    )));
                }
            };
            Ok(if head == KEY {
                ExprObj::key(name)
            } else {
                ExprObj::arg(name)
            })
        }
        Some(LIT) => match items.as_slice() {
            [_, literal] => Ok(ExprObj::literal(literal.clone())),
            _ => Err(ValidationError::InvalidForm(
                "lit takes exactly one value".into(),
            )),
        },
        Some(_) => Ok(ExprObj::command(parse_command(value)?)),
        None => Err(ValidationError::InvalidForm(
            "list literals must be quoted with \"lit\"".into(),
        )),
    }
}

/// Write a script in S-expression form. `parse_sequence` reads it back.
pub fn to_sexpr(seq: &SequenceObj) -> Value {
    let head = match seq.reply() {
        ReplyMode::Last => SEQ,
        ReplyMode::Each => PIPE,
    };
    let mut items = vec![Value::from(head)];
    items.extend(seq.commands().iter().map(command_to_sexpr));
    Value::Array(items)
}

fn command_to_sexpr(cmd: &CommandObj) -> Value {
    let mut items = vec![Value::from(cmd.op.name())];
    items.extend(cmd.args.iter().map(expr_to_sexpr));
    Value::Array(items)
}

fn expr_to_sexpr(expr: &ExprObj) -> Value {
    match expr {
        ExprObj::Literal { value: value @ Value::Array(_) } => json!([LIT, value]),
        ExprObj::Literal { value } => value.clone(),
        ExprObj::Key { name } => json!([KEY, name]),
        ExprObj::Arg { name } => json!([ARG, name]),
        ExprObj::Command { cmd } => command_to_sexpr(cmd),
    }
}
