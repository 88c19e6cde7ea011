//! One call of the command API: a command with its key and argument
//! bindings.
//!
//! Values always travel as arguments, never as literals, so a call's script
//! depends only on its shape and is served from the cache after the first
//! use. A tag keeps the names of calls sharing one pipeline script apart.

use rhizome_keyscript_core::ir::SetOptions;
use rhizome_keyscript_core::ir::builders::{self, arg, key};
use rhizome_keyscript_core::{Args, CommandObj, ExprObj, JsonType, Keys};

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub cmd: CommandObj,
    pub keys: Keys,
    pub args: Args,
}

struct Binder<'t> {
    tag: &'t str,
    keys: Keys,
    args: Args,
}

impl<'t> Binder<'t> {
    fn new(tag: &'t str) -> Self {
        Self {
            tag,
            keys: Keys::new(),
            args: Args::new(),
        }
    }

    fn key(&mut self, target: &str) -> ExprObj {
        let name = format!("{}k{}", self.tag, self.keys.len());
        self.keys.insert(name.clone(), target.to_string());
        key(name)
    }

    fn arg(&mut self, value: impl Into<JsonType>) -> ExprObj {
        let name = format!("{}a{}", self.tag, self.args.len());
        self.args.insert(name.clone(), value.into());
        arg(name)
    }

    fn finish(self, cmd: CommandObj) -> Call {
        Call {
            cmd,
            keys: self.keys,
            args: self.args,
        }
    }
}

fn keyed(tag: &str, target: &str, build: fn(ExprObj) -> CommandObj) -> Call {
    let mut b = Binder::new(tag);
    let k = b.key(target);
    b.finish(build(k))
}

pub(crate) fn get(tag: &str, target: &str) -> Call {
    keyed(tag, target, builders::get)
}

pub(crate) fn set(tag: &str, target: &str, value: &str, options: &SetOptions) -> Call {
    let mut b = Binder::new(tag);
    let k = b.key(target);
    let v = b.arg(value);
    b.finish(builders::set_with(k, v, options))
}

pub(crate) fn incrby(tag: &str, target: &str, increment: i64) -> Call {
    let mut b = Binder::new(tag);
    let k = b.key(target);
    let inc = b.arg(increment);
    b.finish(builders::incrby(k, inc))
}

pub(crate) fn del(tag: &str, targets: &[&str]) -> Call {
    let mut b = Binder::new(tag);
    let keys: Vec<_> = targets.iter().map(|target| b.key(target)).collect();
    b.finish(builders::del_keys(keys))
}

pub(crate) fn exists(tag: &str, targets: &[&str]) -> Call {
    let mut b = Binder::new(tag);
    let keys: Vec<_> = targets.iter().map(|target| b.key(target)).collect();
    b.finish(builders::exists_keys(keys))
}

pub(crate) fn push(tag: &str, target: &str, values: &[&str], left: bool) -> Call {
    let mut b = Binder::new(tag);
    let k = b.key(target);
    let values: Vec<_> = values.iter().map(|value| b.arg(*value)).collect();
    b.finish(if left {
        builders::lpush_all(k, values)
    } else {
        builders::rpush_all(k, values)
    })
}

pub(crate) fn pop(tag: &str, target: &str, count: Option<usize>, left: bool) -> Call {
    let mut b = Binder::new(tag);
    let k = b.key(target);
    let cmd = match (count, left) {
        (None, true) => builders::lpop(k),
        (None, false) => builders::rpop(k),
        (Some(count), true) => builders::lpop_n(k, b.arg(count)),
        (Some(count), false) => builders::rpop_n(k, b.arg(count)),
    };
    b.finish(cmd)
}

pub(crate) fn llen(tag: &str, target: &str) -> Call {
    keyed(tag, target, builders::llen)
}

pub(crate) fn zadd(tag: &str, target: &str, members: &[(&str, f64)]) -> Call {
    let mut b = Binder::new(tag);
    let k = b.key(target);
    let pairs: Vec<_> = members
        .iter()
        .map(|(member, score)| (b.arg(*member), b.arg(*score)))
        .collect();
    b.finish(builders::zadd_all(k, pairs))
}

pub(crate) fn zpop(tag: &str, target: &str, count: Option<usize>, max: bool) -> Call {
    let mut b = Binder::new(tag);
    let k = b.key(target);
    let cmd = match (count, max) {
        (None, true) => builders::zpopmax(k),
        (None, false) => builders::zpopmin(k),
        (Some(count), true) => builders::zpopmax_n(k, b.arg(count)),
        (Some(count), false) => builders::zpopmin_n(k, b.arg(count)),
    };
    b.finish(cmd)
}

pub(crate) fn zcard(tag: &str, target: &str) -> Call {
    keyed(tag, target, builders::zcard)
}

pub(crate) fn hset(tag: &str, target: &str, fields: &[(&str, &str)]) -> Call {
    let mut b = Binder::new(tag);
    let k = b.key(target);
    let pairs: Vec<_> = fields
        .iter()
        .map(|(field, value)| (b.arg(*field), b.arg(*value)))
        .collect();
    b.finish(builders::hset_all(k, pairs))
}

pub(crate) fn hget(tag: &str, target: &str, field: &str) -> Call {
    let mut b = Binder::new(tag);
    let k = b.key(target);
    let f = b.arg(field);
    b.finish(builders::hget(k, f))
}

pub(crate) fn hdel(tag: &str, target: &str, fields: &[&str]) -> Call {
    let mut b = Binder::new(tag);
    let k = b.key(target);
    let fields: Vec<_> = fields.iter().map(|field| b.arg(*field)).collect();
    b.finish(builders::hdel_all(k, fields))
}

pub(crate) fn hlen(tag: &str, target: &str) -> Call {
    keyed(tag, target, builders::hlen)
}

pub(crate) fn hmget(tag: &str, target: &str, fields: &[&str]) -> Call {
    let mut b = Binder::new(tag);
    let k = b.key(target);
    let fields: Vec<_> = fields.iter().map(|field| b.arg(*field)).collect();
    b.finish(builders::hmget(k, fields))
}

pub(crate) fn hincrby(tag: &str, target: &str, field: &str, increment: i64) -> Call {
    let mut b = Binder::new(tag);
    let k = b.key(target);
    let f = b.arg(field);
    let inc = b.arg(increment);
    b.finish(builders::hincrby(k, f, inc))
}

pub(crate) fn hkeys(tag: &str, target: &str) -> Call {
    keyed(tag, target, builders::hkeys)
}

pub(crate) fn hvals(tag: &str, target: &str) -> Call {
    keyed(tag, target, builders::hvals)
}

pub(crate) fn hgetall(tag: &str, target: &str) -> Call {
    keyed(tag, target, builders::hgetall)
}
