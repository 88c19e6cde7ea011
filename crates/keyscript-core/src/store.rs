//! In-process key/value store with Redis command semantics.
//!
//! Commands run inside a [`Txn`], a copy-on-touch overlay over the store.
//! Nothing reaches the store until the transaction is committed, so a
//! script that fails halfway leaves no trace.
//!
//! Keys may carry an expiry in milliseconds since the Unix epoch. A
//! transaction reads the clock once when it begins, as Redis does for a
//! script, and keys that expired by then are dropped before it starts.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use rhizome_keyscript_ir::{JsonType, Opcode};
use thiserror::Error;

/// Errors raised by store commands. Messages follow the Redis wording.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR value is not an integer or out of range")]
    NotInteger,

    #[error("ERR value is not a valid float")]
    NotFloat,

    #[error("ERR value is out of range, must be positive")]
    OutOfRange,

    #[error("ERR hash value is not an integer")]
    HashNotInteger,

    #[error("ERR syntax error")]
    Syntax,

    #[error("ERR invalid expire time in 'set' command")]
    InvalidExpire,

    #[error("ERR increment or decrement would overflow")]
    Overflow,

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(String),

    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR command arguments must be strings or integers, got {0}")]
    InvalidArgument(String),
}

/// A native command reply, before any shaping into JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Nil,
    Int(i64),
    Bulk(String),
    Status(String),
    Array(Vec<Reply>),
}

/// Score with a total order, so it can key an ordered set.
#[derive(Debug, Clone, Copy)]
struct Score(f64);

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Sorted set. Canonical order is (score ascending, member ascending).
#[derive(Debug, Clone, Default)]
pub struct ZSet {
    scores: HashMap<String, f64>,
    order: BTreeSet<(Score, String)>,
}

impl ZSet {
    /// Inserts or rescores a member. Returns true if the member is new.
    pub fn insert(&mut self, member: &str, score: f64) -> bool {
        let previous = self.scores.insert(member.to_string(), score);
        if let Some(old) = previous {
            self.order.remove(&(Score(old), member.to_string()));
        }
        self.order.insert((Score(score), member.to_string()));
        previous.is_none()
    }

    pub fn pop_max(&mut self) -> Option<(String, f64)> {
        let (score, member) = self.order.pop_last()?;
        self.scores.remove(&member);
        Some((member, score.0))
    }

    pub fn pop_min(&mut self) -> Option<(String, f64)> {
        let (score, member) = self.order.pop_first()?;
        self.scores.remove(&member);
        Some((member, score.0))
    }

    pub fn score(&self, member: &str) -> Option<f64> {
        self.scores.get(member).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Members in canonical order.
    pub fn members(&self) -> impl Iterator<Item = (&str, f64)> {
        self.order.iter().map(|(score, member)| (member.as_str(), score.0))
    }
}

/// Hash fields in insertion order. Updating a field keeps its place.
#[derive(Debug, Clone, Default)]
pub struct Fields(Vec<(String, String)>);

impl Fields {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Sets a field. Returns true if the field is new.
    pub fn insert(&mut self, field: &str, value: String) -> bool {
        match self.0.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => {
                *slot = value;
                false
            }
            None => {
                self.0.push((field.to_string(), value));
                true
            }
        }
    }

    pub fn remove(&mut self, field: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|(name, _)| name != field);
        self.0.len() != before
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// A value stored under a key.
#[derive(Debug, Clone)]
pub enum Entry {
    Str(String),
    List(VecDeque<String>),
    ZSet(ZSet),
    Hash(Fields),
}

impl Entry {
    fn is_empty_container(&self) -> bool {
        match self {
            Entry::Str(_) => false,
            Entry::List(list) => list.is_empty(),
            Entry::ZSet(zset) => zset.is_empty(),
            Entry::Hash(hash) => hash.is_empty(),
        }
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// The emulation store.
#[derive(Debug, Default)]
pub struct Store {
    entries: HashMap<String, Entry>,
    expires: HashMap<String, u64>,
}

/// A store shared between runtimes and executions.
pub type SharedStore = Arc<Mutex<Store>>;

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store wrapped for sharing.
    pub fn shared() -> SharedStore {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Locks a shared store.
    ///
    /// A poisoned lock is recovered: transactions only write on commit, so a
    /// panic mid-script cannot leave partial state behind.
    pub fn lock(store: &SharedStore) -> MutexGuard<'_, Store> {
        store.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            tracing::warn!("recovering poisoned store lock");
            poisoned.into_inner()
        })
    }

    /// Starts a transaction at the current time.
    pub fn begin(&mut self) -> Txn<'_> {
        self.begin_at(now_millis())
    }

    /// Starts a transaction at `now`, in milliseconds since the epoch.
    pub fn begin_at(&mut self, now: u64) -> Txn<'_> {
        self.purge_expired(now);
        Txn {
            store: self,
            now,
            touched: HashMap::new(),
            ttls: HashMap::new(),
        }
    }

    fn purge_expired(&mut self, now: u64) {
        let entries = &mut self.entries;
        self.expires.retain(|key, at| {
            let live = *at > now;
            if !live {
                entries.remove(key);
            }
            live
        });
    }

    fn is_live(&self, key: &str) -> bool {
        self.expires.get(key).is_none_or(|at| *at > now_millis())
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key).filter(|_| self.is_live(key))
    }

    /// When `key` expires, in milliseconds since the epoch.
    pub fn expiry(&self, key: &str) -> Option<u64> {
        self.expires.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.keys().filter(|key| self.is_live(key)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.expires.clear();
    }
}

/// A copy-on-touch view of the store. Reads see the transaction's own
/// writes; the store only changes on [`Txn::commit`].
pub struct Txn<'a> {
    store: &'a mut Store,
    now: u64,
    touched: HashMap<String, Option<Entry>>,
    // `None` clears the expiry. Keys missing here keep the stored one.
    ttls: HashMap<String, Option<u64>>,
}

impl Txn<'_> {
    /// Applies all writes to the store.
    pub fn commit(self) {
        let store = self.store;
        for (key, entry) in self.touched {
            match entry {
                Some(entry) => {
                    store.entries.insert(key, entry);
                }
                None => {
                    store.entries.remove(&key);
                }
            }
        }
        for (key, ttl) in self.ttls {
            match ttl {
                Some(at) if store.entries.contains_key(&key) => {
                    store.expires.insert(key, at);
                }
                _ => {
                    store.expires.remove(&key);
                }
            }
        }
    }

    fn read(&self, key: &str) -> Option<&Entry> {
        match self.touched.get(key) {
            Some(entry) => entry.as_ref(),
            None => self.store.entries.get(key),
        }
    }

    fn slot(&mut self, key: &str) -> &mut Option<Entry> {
        let store = &self.store;
        self.touched
            .entry(key.to_string())
            .or_insert_with(|| store.entries.get(key).cloned())
    }

    fn remove(&mut self, key: &str) {
        *self.slot(key) = None;
        self.ttls.insert(key.to_string(), None);
    }

    // Redis removes keys whose aggregate value became empty.
    fn settle(&mut self, key: &str) {
        let emptied = self
            .touched
            .get(key)
            .is_some_and(|slot| slot.as_ref().is_some_and(Entry::is_empty_container));
        if emptied {
            self.remove(key);
        }
    }

    /// Runs one command. `args[0]` is the key.
    pub fn call(&mut self, op: Opcode, args: &[String]) -> Result<Reply, StoreError> {
        // `set` takes any number of trailing flags
        let accepted = match op {
            Opcode::Set => args.len() >= 2,
            _ => op.signature().accepts(args.len()),
        };
        if !accepted {
            return Err(StoreError::WrongArity(op.name().to_string()));
        }
        let key = args[0].as_str();
        let reply = match op {
            Opcode::Get => self.get(key)?,
            Opcode::Set => {
                let flags = SetFlags::parse(&args[2..], self.now)?;
                self.set(key, &args[1], &flags)?
            }
            Opcode::IncrBy => self.incrby(key, parse_int(&args[1])?)?,
            Opcode::Del => self.del(args),
            Opcode::Exists => Reply::Int(len_reply(
                args.iter().filter(|key| self.read(key).is_some()).count(),
            )),
            Opcode::LPush => self.push(key, &args[1..], true)?,
            Opcode::RPush => self.push(key, &args[1..], false)?,
            Opcode::LPop => self.pop(key, parse_count(args.get(1))?, true)?,
            Opcode::RPop => self.pop(key, parse_count(args.get(1))?, false)?,
            Opcode::LLen => self.llen(key)?,
            Opcode::ZAdd => self.zadd(key, &args[1..])?,
            Opcode::ZPopMax => self.zpop(key, parse_count(args.get(1))?, true)?,
            Opcode::ZPopMin => self.zpop(key, parse_count(args.get(1))?, false)?,
            Opcode::ZCard => self.zcard(key)?,
            Opcode::HSet => self.hset(key, &args[1..])?,
            Opcode::HGet => self.hget(key, &args[1])?,
            Opcode::HDel => self.hdel(key, &args[1..])?,
            Opcode::HLen => self.hlen(key)?,
            Opcode::HMGet => self.hmget(key, &args[1..])?,
            Opcode::HIncrBy => self.hincrby(key, &args[1], parse_int(&args[2])?)?,
            Opcode::HKeys => self.hash_items(key, |name, _| name)?,
            Opcode::HVals => self.hash_items(key, |_, value| value)?,
            Opcode::HGetAll => self.hgetall(key)?,
        };
        self.settle(key);
        Ok(reply)
    }

    /// Runs a command given by name, as `redis.call` does.
    pub fn call_named(&mut self, name: &str, args: &[String]) -> Result<Reply, StoreError> {
        let op: Opcode = name
            .parse()
            .map_err(|_| StoreError::UnknownCommand(name.to_string()))?;
        self.call(op, args)
    }

    fn get(&self, key: &str) -> Result<Reply, StoreError> {
        match self.read(key) {
            None => Ok(Reply::Nil),
            Some(Entry::Str(value)) => Ok(Reply::Bulk(value.clone())),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    fn set(&mut self, key: &str, value: &str, flags: &SetFlags) -> Result<Reply, StoreError> {
        let previous = if flags.get { self.get(key)? } else { Reply::Nil };
        let exists = self.read(key).is_some();
        let apply = match flags.condition {
            None => true,
            Some(Condition::Missing) => !exists,
            Some(Condition::Existing) => exists,
        };
        if apply {
            *self.slot(key) = Some(Entry::Str(value.to_string()));
            match flags.expire_at {
                Some(at) if at <= self.now => self.remove(key),
                Some(at) => {
                    self.ttls.insert(key.to_string(), Some(at));
                }
                None if flags.keep_ttl => {}
                None => {
                    self.ttls.insert(key.to_string(), None);
                }
            }
        }
        Ok(match (flags.get, apply) {
            (true, _) => previous,
            (false, true) => Reply::Status("OK".to_string()),
            (false, false) => Reply::Nil,
        })
    }

    fn incrby(&mut self, key: &str, increment: i64) -> Result<Reply, StoreError> {
        let current = match self.read(key) {
            None => 0,
            Some(Entry::Str(value)) => parse_int(value)?,
            Some(_) => return Err(StoreError::WrongType),
        };
        let next = current.checked_add(increment).ok_or(StoreError::Overflow)?;
        *self.slot(key) = Some(Entry::Str(next.to_string()));
        Ok(Reply::Int(next))
    }

    fn del(&mut self, keys: &[String]) -> Reply {
        let mut removed = 0;
        for key in keys {
            if self.read(key).is_some() {
                removed += 1;
                self.remove(key);
            }
        }
        Reply::Int(removed)
    }

    fn push(&mut self, key: &str, values: &[String], left: bool) -> Result<Reply, StoreError> {
        let slot = self.slot(key);
        let list = match slot.get_or_insert_with(|| Entry::List(VecDeque::new())) {
            Entry::List(list) => list,
            _ => return Err(StoreError::WrongType),
        };
        for value in values {
            if left {
                list.push_front(value.clone());
            } else {
                list.push_back(value.clone());
            }
        }
        Ok(Reply::Int(len_reply(list.len())))
    }

    fn pop(&mut self, key: &str, count: Option<usize>, left: bool) -> Result<Reply, StoreError> {
        match self.read(key) {
            None => return Ok(Reply::Nil),
            Some(Entry::List(_)) => {}
            Some(_) => return Err(StoreError::WrongType),
        }
        let Some(Entry::List(list)) = self.slot(key) else {
            return Err(StoreError::WrongType);
        };
        let mut pop_one = || {
            if left {
                list.pop_front()
            } else {
                list.pop_back()
            }
        };
        Ok(match count {
            None => pop_one().map_or(Reply::Nil, Reply::Bulk),
            Some(count) => Reply::Array(
                std::iter::from_fn(pop_one)
                    .take(count)
                    .map(Reply::Bulk)
                    .collect(),
            ),
        })
    }

    fn llen(&self, key: &str) -> Result<Reply, StoreError> {
        match self.read(key) {
            None => Ok(Reply::Int(0)),
            Some(Entry::List(list)) => Ok(Reply::Int(len_reply(list.len()))),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    /// `pairs` is `score member [score member ...]`.
    fn zadd(&mut self, key: &str, pairs: &[String]) -> Result<Reply, StoreError> {
        // all scores are checked before anything is written
        let members = pairs
            .chunks_exact(2)
            .map(|pair| Ok((parse_float(&pair[0])?, pair[1].as_str())))
            .collect::<Result<Vec<_>, StoreError>>()?;
        let slot = self.slot(key);
        let zset = match slot.get_or_insert_with(|| Entry::ZSet(ZSet::default())) {
            Entry::ZSet(zset) => zset,
            _ => return Err(StoreError::WrongType),
        };
        let added = members
            .into_iter()
            .filter(|(score, member)| zset.insert(member, *score))
            .count();
        Ok(Reply::Int(len_reply(added)))
    }

    fn zpop(&mut self, key: &str, count: Option<usize>, max: bool) -> Result<Reply, StoreError> {
        match self.read(key) {
            None => return Ok(Reply::Array(Vec::new())),
            Some(Entry::ZSet(_)) => {}
            Some(_) => return Err(StoreError::WrongType),
        }
        let Some(Entry::ZSet(zset)) = self.slot(key) else {
            return Err(StoreError::WrongType);
        };
        let mut items = Vec::new();
        for _ in 0..count.unwrap_or(1) {
            let popped = if max { zset.pop_max() } else { zset.pop_min() };
            let Some((member, score)) = popped else {
                break;
            };
            items.push(Reply::Bulk(member));
            items.push(Reply::Bulk(format_number(score)));
        }
        Ok(Reply::Array(items))
    }

    fn zcard(&self, key: &str) -> Result<Reply, StoreError> {
        match self.read(key) {
            None => Ok(Reply::Int(0)),
            Some(Entry::ZSet(zset)) => Ok(Reply::Int(len_reply(zset.len()))),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    fn hash(&self, key: &str) -> Result<Option<&Fields>, StoreError> {
        match self.read(key) {
            None => Ok(None),
            Some(Entry::Hash(hash)) => Ok(Some(hash)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    fn hash_mut(&mut self, key: &str) -> Result<&mut Fields, StoreError> {
        let slot = self.slot(key);
        match slot.get_or_insert_with(|| Entry::Hash(Fields::default())) {
            Entry::Hash(hash) => Ok(hash),
            _ => Err(StoreError::WrongType),
        }
    }

    /// `pairs` is `field value [field value ...]`.
    fn hset(&mut self, key: &str, pairs: &[String]) -> Result<Reply, StoreError> {
        let hash = self.hash_mut(key)?;
        let added = pairs
            .chunks_exact(2)
            .filter(|pair| hash.insert(&pair[0], pair[1].clone()))
            .count();
        Ok(Reply::Int(len_reply(added)))
    }

    fn hget(&self, key: &str, field: &str) -> Result<Reply, StoreError> {
        let value = self.hash(key)?.and_then(|hash| hash.get(field));
        Ok(value.map_or(Reply::Nil, |value| Reply::Bulk(value.to_string())))
    }

    fn hdel(&mut self, key: &str, fields: &[String]) -> Result<Reply, StoreError> {
        if self.hash(key)?.is_none() {
            return Ok(Reply::Int(0));
        }
        let hash = self.hash_mut(key)?;
        let removed = fields.iter().filter(|field| hash.remove(field)).count();
        Ok(Reply::Int(len_reply(removed)))
    }

    fn hlen(&self, key: &str) -> Result<Reply, StoreError> {
        let len = self.hash(key)?.map_or(0, Fields::len);
        Ok(Reply::Int(len_reply(len)))
    }

    fn hmget(&self, key: &str, fields: &[String]) -> Result<Reply, StoreError> {
        let hash = self.hash(key)?;
        Ok(Reply::Array(
            fields
                .iter()
                .map(|field| match hash.and_then(|hash| hash.get(field)) {
                    Some(value) => Reply::Bulk(value.to_string()),
                    None => Reply::Nil,
                })
                .collect(),
        ))
    }

    fn hincrby(&mut self, key: &str, field: &str, increment: i64) -> Result<Reply, StoreError> {
        let current = match self.hash(key)?.and_then(|hash| hash.get(field)) {
            None => 0,
            Some(value) => value.parse::<i64>().map_err(|_| StoreError::HashNotInteger)?,
        };
        let next = current.checked_add(increment).ok_or(StoreError::Overflow)?;
        self.hash_mut(key)?.insert(field, next.to_string());
        Ok(Reply::Int(next))
    }

    fn hash_items(
        &self,
        key: &str,
        pick: impl for<'h> Fn(&'h str, &'h str) -> &'h str,
    ) -> Result<Reply, StoreError> {
        let items = self.hash(key)?.map_or_else(Vec::new, |hash| {
            hash.iter()
                .map(|(name, value)| Reply::Bulk(pick(name, value).to_string()))
                .collect()
        });
        Ok(Reply::Array(items))
    }

    fn hgetall(&self, key: &str) -> Result<Reply, StoreError> {
        let items = self.hash(key)?.map_or_else(Vec::new, |hash| {
            hash.iter()
                .flat_map(|(name, value)| [Reply::Bulk(name.to_string()), Reply::Bulk(value.to_string())])
                .collect()
        });
        Ok(Reply::Array(items))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Condition {
    Missing,
    Existing,
}

/// Trailing flags of `set`.
#[derive(Debug, Default)]
struct SetFlags {
    condition: Option<Condition>,
    get: bool,
    expire_at: Option<u64>,
    keep_ttl: bool,
}

impl SetFlags {
    fn parse(flags: &[String], now: u64) -> Result<Self, StoreError> {
        let mut parsed = SetFlags::default();
        let mut flags = flags.iter();
        while let Some(flag) = flags.next() {
            match flag.to_ascii_uppercase().as_str() {
                name @ ("NX" | "XX") => {
                    if parsed.condition.is_some() {
                        return Err(StoreError::Syntax);
                    }
                    parsed.condition = Some(if name == "NX" {
                        Condition::Missing
                    } else {
                        Condition::Existing
                    });
                }
                "GET" => parsed.get = true,
                "KEEPTTL" => {
                    if parsed.expire_at.is_some() {
                        return Err(StoreError::Syntax);
                    }
                    parsed.keep_ttl = true;
                }
                unit @ ("EX" | "PX" | "EXAT" | "PXAT") => {
                    if parsed.expire_at.is_some() || parsed.keep_ttl {
                        return Err(StoreError::Syntax);
                    }
                    let value = parse_int(flags.next().ok_or(StoreError::Syntax)?)?;
                    if value <= 0 {
                        return Err(StoreError::InvalidExpire);
                    }
                    let millis = match unit {
                        "EX" | "EXAT" => value.checked_mul(1000),
                        _ => Some(value),
                    };
                    let millis = millis
                        .and_then(|millis| u64::try_from(millis).ok())
                        .ok_or(StoreError::InvalidExpire)?;
                    let at = match unit {
                        "EX" | "PX" => now.checked_add(millis),
                        _ => Some(millis),
                    };
                    parsed.expire_at = Some(at.ok_or(StoreError::InvalidExpire)?);
                }
                _ => return Err(StoreError::Syntax),
            }
        }
        Ok(parsed)
    }
}

fn len_reply(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

fn parse_int(value: &str) -> Result<i64, StoreError> {
    value.parse().map_err(|_| StoreError::NotInteger)
}

fn parse_float(value: &str) -> Result<f64, StoreError> {
    let score = match value {
        "inf" | "+inf" => f64::INFINITY,
        "-inf" => f64::NEG_INFINITY,
        _ => value.parse().map_err(|_| StoreError::NotFloat)?,
    };
    if score.is_nan() {
        return Err(StoreError::NotFloat);
    }
    Ok(score)
}

fn parse_count(value: Option<&String>) -> Result<Option<usize>, StoreError> {
    value
        .map(|value| {
            let count = parse_int(value)?;
            usize::try_from(count).map_err(|_| StoreError::OutOfRange)
        })
        .transpose()
}

/// Formats a number the way Redis prints scores and converts script
/// numbers to command arguments: integral values without a fraction.
pub fn format_number(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e17 {
        return format!("{}", value as i64);
    }
    format!("{value}")
}

/// Converts an operand value to a command argument string.
pub fn to_command_arg(value: &JsonType) -> Result<String, StoreError> {
    match value {
        JsonType::String(s) => Ok(s.clone()),
        JsonType::Number(n) => Ok(match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        }),
        other => Err(StoreError::InvalidArgument(json_type_name(other).to_string())),
    }
}

/// JSON type name used in error messages.
pub fn json_type_name(value: &JsonType) -> &'static str {
    match value {
        JsonType::Null => "null",
        JsonType::Bool(_) => "boolean",
        JsonType::Number(_) => "number",
        JsonType::String(_) => "string",
        JsonType::Array(_) => "array",
        JsonType::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests;
