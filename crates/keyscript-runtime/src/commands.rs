//! Direct command calls on any runtime.
//!
//! Each method runs a one-command script. Values travel as arguments, so
//! every method compiles once per runtime and command shape and is served
//! from the cache afterwards.

use std::collections::HashMap;

use rhizome_keyscript_core::ir::SetOptions;
use rhizome_keyscript_core::{JsonType, SequenceObj};

use crate::calls::{self, Call};
use crate::reply::{
    SetReply, boolean, field_map, field_values, integer, optional_string, set_reply, string_list,
    zpop_pairs,
};
use crate::{Pipeline, RuntimeError, ScriptRuntime};

pub(crate) fn run<R: ScriptRuntime + ?Sized>(runtime: &R, call: Call) -> Result<JsonType, RuntimeError> {
    let exec = runtime.register_script(&SequenceObj::from(vec![call.cmd]))?;
    Ok(exec.call(&call.keys, &call.args)?)
}

/// Convenience API over [`ScriptRuntime`]. Keys are prefixed by the runtime.
pub trait Commands: ScriptRuntime {
    /// Queues commands to run later as one script.
    fn pipeline(&self) -> Pipeline<'_, Self> {
        Pipeline::new(self)
    }

    fn get(&self, target: &str) -> Result<Option<String>, RuntimeError> {
        Ok(optional_string(run(self, calls::get("", target))?)?)
    }

    /// Writes a string value. Always true.
    fn set(&self, target: &str, value: &str) -> Result<bool, RuntimeError> {
        let reply = run(self, calls::set("", target, value, &SetOptions::new()))?;
        Ok(boolean(reply)?)
    }

    /// Writes a string value under `options`.
    fn set_with(
        &self,
        target: &str,
        value: &str,
        options: &SetOptions,
    ) -> Result<SetReply, RuntimeError> {
        let reply = run(self, calls::set("", target, value, options))?;
        Ok(set_reply(options.return_previous, reply)?)
    }

    fn incrby(&self, target: &str, increment: i64) -> Result<i64, RuntimeError> {
        Ok(integer(run(self, calls::incrby("", target, increment))?)?)
    }

    /// Deletes keys, replying how many existed.
    fn del(&self, targets: &[&str]) -> Result<i64, RuntimeError> {
        Ok(integer(run(self, calls::del("", targets))?)?)
    }

    /// Counts the given keys that exist.
    fn exists(&self, targets: &[&str]) -> Result<i64, RuntimeError> {
        Ok(integer(run(self, calls::exists("", targets))?)?)
    }

    fn lpush(&self, target: &str, values: &[&str]) -> Result<i64, RuntimeError> {
        Ok(integer(run(self, calls::push("", target, values, true))?)?)
    }

    fn rpush(&self, target: &str, values: &[&str]) -> Result<i64, RuntimeError> {
        Ok(integer(run(self, calls::push("", target, values, false))?)?)
    }

    fn lpop(&self, target: &str) -> Result<Option<String>, RuntimeError> {
        Ok(optional_string(run(self, calls::pop("", target, None, true))?)?)
    }

    fn rpop(&self, target: &str) -> Result<Option<String>, RuntimeError> {
        Ok(optional_string(run(self, calls::pop("", target, None, false))?)?)
    }

    /// Pops up to `count` values from the head.
    fn lpop_n(&self, target: &str, count: usize) -> Result<Vec<String>, RuntimeError> {
        Ok(string_list(run(self, calls::pop("", target, Some(count), true))?)?)
    }

    /// Pops up to `count` values from the tail.
    fn rpop_n(&self, target: &str, count: usize) -> Result<Vec<String>, RuntimeError> {
        Ok(string_list(run(self, calls::pop("", target, Some(count), false))?)?)
    }

    fn llen(&self, target: &str) -> Result<i64, RuntimeError> {
        Ok(integer(run(self, calls::llen("", target))?)?)
    }

    /// Adds or rescores `(member, score)` pairs. Replies the number of new
    /// members.
    fn zadd(&self, target: &str, members: &[(&str, f64)]) -> Result<i64, RuntimeError> {
        Ok(integer(run(self, calls::zadd("", target, members))?)?)
    }

    /// Pops the highest-scored members, one when `count` is `None`.
    fn zpop_max(
        &self,
        target: &str,
        count: Option<usize>,
    ) -> Result<Vec<(String, f64)>, RuntimeError> {
        let reply = run(self, calls::zpop("", target, count, true))?;
        Ok(zpop_pairs(&reply)?)
    }

    /// Pops the lowest-scored members, one when `count` is `None`.
    fn zpop_min(
        &self,
        target: &str,
        count: Option<usize>,
    ) -> Result<Vec<(String, f64)>, RuntimeError> {
        let reply = run(self, calls::zpop("", target, count, false))?;
        Ok(zpop_pairs(&reply)?)
    }

    fn zcard(&self, target: &str) -> Result<i64, RuntimeError> {
        Ok(integer(run(self, calls::zcard("", target))?)?)
    }

    /// Sets `(field, value)` pairs. Replies the number of new fields.
    fn hset(&self, target: &str, fields: &[(&str, &str)]) -> Result<i64, RuntimeError> {
        Ok(integer(run(self, calls::hset("", target, fields))?)?)
    }

    fn hget(&self, target: &str, field: &str) -> Result<Option<String>, RuntimeError> {
        Ok(optional_string(run(self, calls::hget("", target, field))?)?)
    }

    fn hdel(&self, target: &str, fields: &[&str]) -> Result<i64, RuntimeError> {
        Ok(integer(run(self, calls::hdel("", target, fields))?)?)
    }

    fn hlen(&self, target: &str) -> Result<i64, RuntimeError> {
        Ok(integer(run(self, calls::hlen("", target))?)?)
    }

    fn hmget(
        &self,
        target: &str,
        fields: &[&str],
    ) -> Result<HashMap<String, Option<String>>, RuntimeError> {
        let reply = run(self, calls::hmget("", target, fields))?;
        let fields: Vec<String> = fields.iter().map(|field| field.to_string()).collect();
        Ok(field_values(&fields, reply)?)
    }

    fn hincrby(&self, target: &str, field: &str, increment: i64) -> Result<i64, RuntimeError> {
        Ok(integer(run(self, calls::hincrby("", target, field, increment))?)?)
    }

    /// Field names in insertion order.
    fn hkeys(&self, target: &str) -> Result<Vec<String>, RuntimeError> {
        Ok(string_list(run(self, calls::hkeys("", target))?)?)
    }

    fn hvals(&self, target: &str) -> Result<Vec<String>, RuntimeError> {
        Ok(string_list(run(self, calls::hvals("", target))?)?)
    }

    fn hgetall(&self, target: &str) -> Result<HashMap<String, String>, RuntimeError> {
        Ok(field_map(run(self, calls::hgetall("", target))?)?)
    }
}

impl<R: ScriptRuntime + ?Sized> Commands for R {}
