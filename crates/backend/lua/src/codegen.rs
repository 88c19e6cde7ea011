//! Lua source generation helpers.

use rhizome_keyscript_core::ir::SetOptions;
use rhizome_keyscript_core::{JsonType, Opcode};

/// Quote a string as a Lua string literal.
pub(crate) fn lua_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // Decimal escapes must be three digits so a following digit is not absorbed.
            c if c.is_ascii_control() => out.push_str(&format!("\\{:03}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Format a number as a Lua expression.
pub(crate) fn lua_number(n: f64) -> String {
    if n.is_nan() {
        "(0/0)".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "(1/0)" } else { "(-1/0)" }.to_string()
    } else {
        format!("{n}")
    }
}

/// Compile a JSON literal to a Lua expression.
pub(crate) fn lua_literal(value: &JsonType) -> String {
    match value {
        JsonType::Null => "nil".to_string(),
        JsonType::Bool(b) => b.to_string(),
        JsonType::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64().map_or_else(|| n.to_string(), lua_number),
        },
        JsonType::String(s) => lua_string_literal(s),
        JsonType::Array(_) | JsonType::Object(_) => {
            format!("cjson.decode({})", lua_string_literal(&value.to_string()))
        }
    }
}

/// Compile a command call from already compiled operands. `set` options
/// become trailing flags.
pub(crate) fn lua_call(op: Opcode, options: &SetOptions, operands: &[String]) -> String {
    let mut call = format!("redis.call({}", lua_string_literal(op.name()));
    let flags = options.flags();
    let flags = flags.iter().map(|flag| lua_string_literal(flag));
    for operand in operands.iter().cloned().chain(flags) {
        call.push_str(", ");
        call.push_str(&operand);
    }
    call.push(')');
    match op {
        // The status table becomes a plain boolean.
        Opcode::Set if !options.return_previous => format!("({call} ~= false)"),
        _ => call,
    }
}

/// Make a name safe to embed in a Lua comment.
pub(crate) fn lua_comment(name: &str) -> String {
    name.replace("]]", "] ]")
}
