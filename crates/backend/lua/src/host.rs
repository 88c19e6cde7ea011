//! Embedded LuaJIT host for generated scripts.
//!
//! Provides the globals a Redis scripting environment offers (`KEYS`,
//! `ARGV`, `redis.call`, `cjson`) with `redis.call` dispatching into the
//! emulation store. A script runs inside one store transaction, committed
//! only if the script returns normally.

use mlua::{IntoLua, Lua, LuaSerdeExt, Table, Value, Variadic};
use rhizome_keyscript_core::ir::{MAX_EXACT_INTEGER, integer_value};
use rhizome_keyscript_core::store::format_number;
use rhizome_keyscript_core::{ExecError, JsonType, Reply, SharedStore, Store, Txn};
use serde_json::Map;

use crate::{ConnectionSource, LuaScript, ScriptConnection};

/// Nesting limit for `cjson.encode`, as in lua-cjson.
const MAX_ENCODE_DEPTH: usize = 1000;

/// Runs generated scripts against a shared emulation store.
#[derive(Debug, Clone)]
pub struct LuaHost {
    store: SharedStore,
}

impl LuaHost {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Host over a fresh, empty store.
    pub fn fresh() -> Self {
        Self::new(Store::shared())
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }
}

impl ConnectionSource for LuaHost {
    fn connection(&self) -> Result<Box<dyn ScriptConnection + '_>, ExecError> {
        Ok(Box::new(HostConnection {
            store: &self.store,
            lua: Lua::new(),
        }))
    }
}

struct HostConnection<'a> {
    store: &'a SharedStore,
    lua: Lua,
}

impl ScriptConnection for HostConnection<'_> {
    fn eval(
        &mut self,
        script: &LuaScript,
        keys: &[String],
        args: &[String],
    ) -> Result<String, ExecError> {
        let mut guard = Store::lock(self.store);
        let mut txn = guard.begin();
        let reply = run_script(&self.lua, &mut txn, script.source(), keys, args)
            .map_err(|err| ExecError::Engine(err.to_string()))?;
        txn.commit();
        Ok(reply)
    }
}

fn run_script(
    lua: &Lua,
    txn: &mut Txn<'_>,
    source: &str,
    keys: &[String],
    args: &[String],
) -> mlua::Result<String> {
    let globals = lua.globals();
    globals.set("KEYS", lua.create_sequence_from(keys.iter().map(String::as_str))?)?;
    globals.set("ARGV", lua.create_sequence_from(args.iter().map(String::as_str))?)?;
    globals.set("cjson", cjson(lua)?)?;

    lua.scope(|scope| {
        let call = scope.create_function_mut(|lua, (name, params): (String, Variadic<Value>)| {
            let params = params
                .iter()
                .map(command_arg)
                .collect::<mlua::Result<Vec<_>>>()?;
            let reply = txn
                .call_named(&name, &params)
                .map_err(|err| mlua::Error::RuntimeError(err.to_string()))?;
            reply_to_lua(lua, reply)
        })?;
        let redis = lua.create_table()?;
        redis.set("call", call)?;
        lua.globals().set("redis", redis)?;
        lua.load(source).set_name("=script").eval::<String>()
    })
}

/// Converts a `redis.call` argument to a command argument.
fn command_arg(value: &Value) -> mlua::Result<String> {
    match value {
        Value::String(s) => {
            let s: &str = &s.to_str()?;
            Ok(s.to_owned())
        }
        Value::Integer(i) => Ok(i.to_string()),
        Value::Number(n) => Ok(format_number(*n)),
        _ => Err(mlua::Error::RuntimeError(
            "Lua redis lib command arguments must be strings or integers".to_string(),
        )),
    }
}

/// Converts a native reply the way Redis hands replies to Lua.
fn reply_to_lua(lua: &Lua, reply: Reply) -> mlua::Result<Value> {
    Ok(match reply {
        Reply::Nil => Value::Boolean(false),
        Reply::Int(n) => n.into_lua(lua)?,
        Reply::Bulk(s) => Value::String(lua.create_string(&s)?),
        Reply::Status(s) => {
            let status = lua.create_table()?;
            status.set("ok", s)?;
            Value::Table(status)
        }
        Reply::Array(items) => {
            let items = items
                .into_iter()
                .map(|item| reply_to_lua(lua, item))
                .collect::<mlua::Result<Vec<_>>>()?;
            Value::Table(lua.create_sequence_from(items)?)
        }
    })
}

/// The subset of lua-cjson generated scripts use.
fn cjson(lua: &Lua) -> mlua::Result<Table> {
    let cjson = lua.create_table()?;
    cjson.set(
        "encode",
        lua.create_function(|_, value: Value| {
            let json = lua_to_json(&value, 0)?;
            serde_json::to_string(&json).map_err(mlua::Error::external)
        })?,
    )?;
    cjson.set(
        "decode",
        lua.create_function(|lua, text: String| {
            let json: JsonType = serde_json::from_str(&text).map_err(mlua::Error::external)?;
            lua.to_value(&json)
        })?,
    )?;
    cjson.set("null", Value::NULL)?;
    Ok(cjson)
}

fn lua_to_json(value: &Value, depth: usize) -> mlua::Result<JsonType> {
    if depth > MAX_ENCODE_DEPTH {
        return Err(mlua::Error::RuntimeError(
            "Cannot serialise, excessive nesting".to_string(),
        ));
    }
    Ok(match value {
        Value::Nil => JsonType::Null,
        Value::LightUserData(ud) if ud.0.is_null() => JsonType::Null,
        Value::Boolean(b) => JsonType::Bool(*b),
        Value::Integer(i) => integer_value(*i as i64),
        Value::Number(n) => number_to_json(*n)?,
        Value::String(s) => {
            let s: &str = &s.to_str()?;
            JsonType::String(s.to_owned())
        }
        Value::Table(table) => table_to_json(table, depth)?,
        other => {
            return Err(mlua::Error::RuntimeError(format!(
                "Cannot serialise {}: type not supported",
                other.type_name()
            )));
        }
    })
}

// Integral numbers encode without a fraction, as lua-cjson prints them,
// up to 2^53. Beyond that a double is all there is.
fn number_to_json(n: f64) -> mlua::Result<JsonType> {
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER as f64 {
        return Ok(JsonType::from(n as i64));
    }
    serde_json::Number::from_f64(n)
        .map(JsonType::Number)
        .ok_or_else(|| {
            mlua::Error::RuntimeError("Cannot serialise number: must not be NaN or Infinity".into())
        })
}

// A table is an array when its keys are exactly 1..=n. Empty tables encode
// as objects.
fn table_to_json(table: &Table, depth: usize) -> mlua::Result<JsonType> {
    let pairs = table
        .pairs::<Value, Value>()
        .collect::<mlua::Result<Vec<_>>>()?;
    let len = table.raw_len();
    if len > 0 && pairs.len() == len {
        let mut items = Vec::with_capacity(len);
        for idx in 1..=len {
            items.push(lua_to_json(&table.raw_get::<Value>(idx)?, depth + 1)?);
        }
        return Ok(JsonType::Array(items));
    }

    let mut object = Map::new();
    for (key, value) in pairs {
        let key = match key {
            Value::String(s) => {
                let s: &str = &s.to_str()?;
                s.to_owned()
            }
            Value::Integer(i) => i.to_string(),
            Value::Number(n) => format_number(n),
            other => {
                return Err(mlua::Error::RuntimeError(format!(
                    "Cannot serialise table: {} key not supported",
                    other.type_name()
                )));
            }
        };
        object.insert(key, lua_to_json(&value, depth + 1)?);
    }
    Ok(JsonType::Object(object))
}
