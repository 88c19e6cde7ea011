//! Reply shaping: native store replies to the JSON model.
//!
//! Mirrors what a reply goes through on the script path, Redis reply to Lua
//! value to `cjson.encode`. Nil becomes `false`, and an empty array becomes
//! an empty table, which encodes as `{}`.

use rhizome_keyscript_core::ir::{SetOptions, integer_value};
use rhizome_keyscript_core::{JsonType, Opcode, Reply};
use serde_json::{Map, json};

/// Shapes the reply of a command, including per-opcode adjustments.
///
/// `set` replies whether it wrote, unless it returns the previous value.
pub fn shape(op: Opcode, options: &SetOptions, reply: Reply) -> JsonType {
    match op {
        Opcode::Set if !options.return_previous => JsonType::Bool(reply != Reply::Nil),
        _ => shape_reply(reply),
    }
}

/// Shapes a native reply. Integers beyond ±2^53 become doubles, as they
/// do in Lua.
pub fn shape_reply(reply: Reply) -> JsonType {
    match reply {
        Reply::Nil => JsonType::Bool(false),
        Reply::Int(n) => integer_value(n),
        Reply::Bulk(s) => JsonType::String(s),
        Reply::Status(s) => json!({ "ok": s }),
        Reply::Array(items) if items.is_empty() => JsonType::Object(Map::new()),
        Reply::Array(items) => JsonType::Array(items.into_iter().map(shape_reply).collect()),
    }
}
