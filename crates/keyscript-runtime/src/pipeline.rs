//! Batched commands run as one script.
//!
//! Commands queue up until [`Pipeline::execute`], then run together in a
//! single atomic script. Each reply is decoded the way the matching
//! [`Commands`](crate::Commands) method decodes it and returned as JSON:
//! absent values are `null`, popped members are `[member, score]` pairs and
//! hash reads are objects.
//!
//! A pipeline dropped with queued commands executes them.

use std::mem;

use rhizome_keyscript_core::ir::{ReplyMode, SetOptions};
use rhizome_keyscript_core::{Args, CommandObj, JsonType, Keys, SequenceObj};
use serde::Serialize;

use crate::calls::{self, Call};
use crate::reply::{
    boolean, field_map, field_values, integer, optional_string, reply_list, set_reply, string_list,
    zpop_pairs,
};
use crate::{ReplyError, RuntimeError, ScriptRuntime};

type Decoder = Box<dyn FnOnce(JsonType) -> Result<JsonType, ReplyError>>;

pub struct Pipeline<'a, R: ScriptRuntime + ?Sized> {
    runtime: &'a R,
    commands: Vec<CommandObj>,
    keys: Keys,
    args: Args,
    decoders: Vec<Decoder>,
}

impl<'a, R: ScriptRuntime + ?Sized> Pipeline<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self {
            runtime,
            commands: Vec::new(),
            keys: Keys::new(),
            args: Args::new(),
            decoders: Vec::new(),
        }
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn tag(&self) -> String {
        format!("c{}_", self.commands.len())
    }

    fn queue<T, F>(&mut self, call: Call, decode: F) -> &mut Self
    where
        T: Serialize,
        F: FnOnce(JsonType) -> Result<T, ReplyError> + 'static,
    {
        self.commands.push(call.cmd);
        self.keys.extend(call.keys);
        self.args.extend(call.args);
        self.decoders.push(Box::new(move |reply| {
            serde_json::to_value(decode(reply)?).map_err(|err| ReplyError::Encode(err.to_string()))
        }));
        self
    }

    pub fn get(&mut self, target: &str) -> &mut Self {
        let call = calls::get(&self.tag(), target);
        self.queue(call, optional_string)
    }

    pub fn set(&mut self, target: &str, value: &str) -> &mut Self {
        let call = calls::set(&self.tag(), target, value, &SetOptions::new());
        self.queue(call, boolean)
    }

    pub fn set_with(&mut self, target: &str, value: &str, options: &SetOptions) -> &mut Self {
        let call = calls::set(&self.tag(), target, value, options);
        let return_previous = options.return_previous;
        self.queue(call, move |reply| set_reply(return_previous, reply))
    }

    pub fn incrby(&mut self, target: &str, increment: i64) -> &mut Self {
        let call = calls::incrby(&self.tag(), target, increment);
        self.queue(call, integer)
    }

    pub fn del(&mut self, targets: &[&str]) -> &mut Self {
        let call = calls::del(&self.tag(), targets);
        self.queue(call, integer)
    }

    pub fn exists(&mut self, targets: &[&str]) -> &mut Self {
        let call = calls::exists(&self.tag(), targets);
        self.queue(call, integer)
    }

    pub fn lpush(&mut self, target: &str, values: &[&str]) -> &mut Self {
        let call = calls::push(&self.tag(), target, values, true);
        self.queue(call, integer)
    }

    pub fn rpush(&mut self, target: &str, values: &[&str]) -> &mut Self {
        let call = calls::push(&self.tag(), target, values, false);
        self.queue(call, integer)
    }

    pub fn lpop(&mut self, target: &str) -> &mut Self {
        let call = calls::pop(&self.tag(), target, None, true);
        self.queue(call, optional_string)
    }

    pub fn rpop(&mut self, target: &str) -> &mut Self {
        let call = calls::pop(&self.tag(), target, None, false);
        self.queue(call, optional_string)
    }

    pub fn lpop_n(&mut self, target: &str, count: usize) -> &mut Self {
        let call = calls::pop(&self.tag(), target, Some(count), true);
        self.queue(call, string_list)
    }

    pub fn rpop_n(&mut self, target: &str, count: usize) -> &mut Self {
        let call = calls::pop(&self.tag(), target, Some(count), false);
        self.queue(call, string_list)
    }

    pub fn llen(&mut self, target: &str) -> &mut Self {
        let call = calls::llen(&self.tag(), target);
        self.queue(call, integer)
    }

    pub fn zadd(&mut self, target: &str, members: &[(&str, f64)]) -> &mut Self {
        let call = calls::zadd(&self.tag(), target, members);
        self.queue(call, integer)
    }

    pub fn zpop_max(&mut self, target: &str, count: Option<usize>) -> &mut Self {
        let call = calls::zpop(&self.tag(), target, count, true);
        self.queue(call, |reply| zpop_pairs(&reply))
    }

    pub fn zpop_min(&mut self, target: &str, count: Option<usize>) -> &mut Self {
        let call = calls::zpop(&self.tag(), target, count, false);
        self.queue(call, |reply| zpop_pairs(&reply))
    }

    pub fn zcard(&mut self, target: &str) -> &mut Self {
        let call = calls::zcard(&self.tag(), target);
        self.queue(call, integer)
    }

    pub fn hset(&mut self, target: &str, fields: &[(&str, &str)]) -> &mut Self {
        let call = calls::hset(&self.tag(), target, fields);
        self.queue(call, integer)
    }

    pub fn hget(&mut self, target: &str, field: &str) -> &mut Self {
        let call = calls::hget(&self.tag(), target, field);
        self.queue(call, optional_string)
    }

    pub fn hdel(&mut self, target: &str, fields: &[&str]) -> &mut Self {
        let call = calls::hdel(&self.tag(), target, fields);
        self.queue(call, integer)
    }

    pub fn hlen(&mut self, target: &str) -> &mut Self {
        let call = calls::hlen(&self.tag(), target);
        self.queue(call, integer)
    }

    pub fn hmget(&mut self, target: &str, fields: &[&str]) -> &mut Self {
        let call = calls::hmget(&self.tag(), target, fields);
        let fields: Vec<String> = fields.iter().map(|field| field.to_string()).collect();
        self.queue(call, move |reply| field_values(&fields, reply))
    }

    pub fn hincrby(&mut self, target: &str, field: &str, increment: i64) -> &mut Self {
        let call = calls::hincrby(&self.tag(), target, field, increment);
        self.queue(call, integer)
    }

    pub fn hkeys(&mut self, target: &str) -> &mut Self {
        let call = calls::hkeys(&self.tag(), target);
        self.queue(call, string_list)
    }

    pub fn hvals(&mut self, target: &str) -> &mut Self {
        let call = calls::hvals(&self.tag(), target);
        self.queue(call, string_list)
    }

    pub fn hgetall(&mut self, target: &str) -> &mut Self {
        let call = calls::hgetall(&self.tag(), target);
        self.queue(call, field_map)
    }

    /// Runs the queued commands as one script and returns their decoded
    /// replies in order. The pipeline is empty afterwards, even on error.
    pub fn execute(&mut self) -> Result<Vec<JsonType>, RuntimeError> {
        let commands = mem::take(&mut self.commands);
        let keys = mem::take(&mut self.keys);
        let args = mem::take(&mut self.args);
        let decoders = mem::take(&mut self.decoders);
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let seq = SequenceObj::from(commands).with_reply(ReplyMode::Each);
        let exec = self.runtime.register_script(&seq)?;
        let reply = exec.call(&keys, &args)?;
        let replies = reply_list(reply, decoders.len())?;
        tracing::trace!(commands = decoders.len(), "pipeline executed");
        Ok(decoders
            .into_iter()
            .zip(replies)
            .map(|(decode, reply)| decode(reply))
            .collect::<Result<_, _>>()?)
    }
}

impl<R: ScriptRuntime + ?Sized> Drop for Pipeline<'_, R> {
    fn drop(&mut self) {
        if self.is_empty() {
            return;
        }
        if let Err(err) = self.execute() {
            tracing::warn!(%err, "pipeline dropped with queued commands failed");
        }
    }
}
