//! The same scripts through every runtime must give the same JSON.
//!
//! Live Redis runs need `KEYSCRIPT_REDIS_URL`, e.g.
//! `KEYSCRIPT_REDIS_URL=redis://127.0.0.1:6379/15 cargo test -- --ignored`.

use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rhizome_keyscript_core::ir::builders::*;
use rhizome_keyscript_core::ir::{SetMode, SetOptions, ValidationError};
use rhizome_keyscript_core::{
    Args, BindingError, CompileError, ExecError, JsonType, Keys, SequenceObj,
};
use rhizome_keyscript_runtime::{
    Commands, LocalRuntime, LuaRuntime, RedisConnection, RuntimeError, ScriptRuntime, zpop_pairs,
};
use serde_json::json;

fn call<R: ScriptRuntime>(rt: &R, seq: SequenceObj, bound: &[(&str, &str)], args: Args) -> JsonType {
    let keys: Keys = bound
        .iter()
        .map(|(name, key)| (name.to_string(), key.to_string()))
        .collect();
    rt.register_script(&seq).unwrap().call(&keys, &args).unwrap()
}

fn run<R: ScriptRuntime>(rt: &R, seq: SequenceObj, bound: &[(&str, &str)]) -> JsonType {
    call(rt, seq, bound, Args::new())
}

/// Runs every scenario and returns the replies in order, asserting the
/// expected values along the way.
fn scenarios<R: ScriptRuntime>(rt: &R) -> Vec<JsonType> {
    let mut replies = Vec::new();
    let mut record = |reply: JsonType, expected: JsonType| {
        assert_eq!(reply, expected);
        replies.push(reply);
    };

    // get on an absent key
    record(run(rt, SequenceObj::new().then(get(key("k"))), &[("k", "foo")]), json!(false));

    // set then get, twice
    let seq = SequenceObj::new()
        .then(set(key("k"), "a"))
        .then(get(key("k")));
    record(run(rt, seq, &[("k", "bar")]), json!("a"));
    let seq = SequenceObj::new()
        .then(set(key("k"), "b"))
        .then(get(key("k")));
    record(run(rt, seq, &[("k", "bar")]), json!("b"));

    // llen on an absent key
    record(run(rt, SequenceObj::new().then(llen(key("k"))), &[("k", "foo")]), json!(0));

    // zpopmax on an absent key, then on a single member
    let z = [("z", "zbar")];
    record(run(rt, SequenceObj::new().then(zpopmax(key("z"))), &z), json!({}));
    let seq = SequenceObj::new()
        .then(zadd(key("z"), 2, "a"))
        .then(zpopmax(key("z")));
    record(run(rt, seq, &z), json!(["a", "2"]));

    // zpopmax with a count
    let seq = SequenceObj::new()
        .then(zadd(key("z"), 2, "a"))
        .then(zadd(key("z"), 3, "b"))
        .then(zpopmax_n(key("z"), 2));
    let reply = run(rt, seq, &z);
    assert_eq!(
        zpop_pairs(&reply).unwrap(),
        [("b".to_string(), 3.0), ("a".to_string(), 2.0)]
    );
    record(reply, json!(["b", "3", "a", "2"]));

    // zpopmin with a count
    let seq = SequenceObj::new()
        .then(zadd(key("z"), 2, "a"))
        .then(zadd(key("z"), 3, "b"))
        .then(zpopmin_n(key("z"), 2));
    let reply = run(rt, seq, &z);
    assert_eq!(
        zpop_pairs(&reply).unwrap(),
        [("a".to_string(), 2.0), ("b".to_string(), 3.0)]
    );
    record(reply, json!(["a", "2", "b", "3"]));

    replies
}

/// Edge cases where the reply shape is easy to get wrong.
fn shapes<R: ScriptRuntime>(rt: &R) -> Vec<JsonType> {
    let l = [("l", "list")];
    let h = [("h", "hash")];
    let z = [("z", "ties")];
    let mut replies = vec![
        run(rt, SequenceObj::new().then(lpop_n(key("l"), 2)), &l),
        run(rt, SequenceObj::new().then(rpush(key("l"), "x")).then(lpop_n(key("l"), 0)), &l),
        run(rt, SequenceObj::new().then(rpop_n(key("l"), 2)), &l),
        run(rt, SequenceObj::new().then(exists(key("l"))), &l),
        run(rt, SequenceObj::new().then(hget(key("h"), "f")), &h),
        run(rt, SequenceObj::new().then(hset(key("h"), "f", 1)).then(hget(key("h"), "f")), &h),
        run(rt, SequenceObj::new().then(hlen(key("h"))), &[("h", "nohash")]),
        run(rt, SequenceObj::new(), &[]),
    ];
    for member in ["b", "c", "a"] {
        replies.push(run(rt, SequenceObj::new().then(zadd(key("z"), 1, member)), &z));
    }
    replies.push(run(rt, SequenceObj::new().then(zpopmax(key("z"))), &z));
    replies.push(run(rt, SequenceObj::new().then(zpopmin_n(key("z"), 5)), &z));
    replies.push(run(rt, SequenceObj::new().then(zadd(key("z"), 0.5, "f")).then(zpopmin(key("z"))), &z));

    let seq = SequenceObj::new()
        .then(set(key("s"), "y"))
        .then(rpush(key("l"), arg("v")))
        .then(rpush(key("l"), get(key("s"))))
        .then(lpop_n(key("l"), 3));
    let args = Args::from([("v".to_string(), json!(2.5))]);
    replies.push(call(rt, seq, &[("l", "mixed"), ("s", "stash")], args));
    replies
}

fn expected_shapes() -> Vec<JsonType> {
    vec![
        json!(false),
        json!({}),
        json!(["x"]),
        json!(0),
        json!(false),
        json!("1"),
        json!(0),
        json!(null),
        json!(1),
        json!(1),
        json!(1),
        json!(["c", "1"]),
        json!(["a", "1", "b", "1"]),
        json!(["f", "0.5"]),
        json!(["2.5", "y"]),
    ]
}

#[test]
fn test_local_scenarios() {
    scenarios(&LocalRuntime::new().with_prefix("test_local"));
}

#[test]
fn test_embedded_lua_scenarios() {
    scenarios(&LuaRuntime::embedded().with_prefix("test_lua"));
}

#[test]
fn test_backends_agree() {
    let local = LocalRuntime::new().with_prefix("p");
    let lua = LuaRuntime::embedded().with_prefix("p");
    assert_eq!(scenarios(&local), scenarios(&lua));
}

#[test]
fn test_backends_agree_on_shapes() {
    let local = shapes(&LocalRuntime::new());
    let lua = shapes(&LuaRuntime::embedded());
    assert_eq!(local, lua);
    assert_eq!(local, expected_shapes());
}

#[test]
fn test_prefix_is_applied_on_both_paths() {
    let local = LocalRuntime::new().with_prefix("app");
    let lua = LuaRuntime::embedded().with_prefix("app");
    local.set("foo", "1").unwrap();
    lua.set("foo", "1").unwrap();

    let unprefixed_local = LocalRuntime::with_store(local.store().clone());
    let unprefixed_lua = LuaRuntime::new(lua.source().clone());
    assert_eq!(unprefixed_local.get("app:foo").unwrap().as_deref(), Some("1"));
    assert_eq!(unprefixed_lua.get("app:foo").unwrap().as_deref(), Some("1"));
    assert_eq!(unprefixed_lua.get("foo").unwrap(), None);
}

#[test]
fn test_cached_and_fresh_artifacts_agree() {
    let rt = LuaRuntime::embedded();
    let seq = SequenceObj::new()
        .then(zadd(key("z"), 2, "a"))
        .then(zpopmax(key("z")));
    let first = run(&rt, seq.clone(), &[("z", "a")]);
    let cached = run(&rt, seq.clone(), &[("z", "b")]);
    let fresh = run(&LuaRuntime::new(rt.source().clone()), seq, &[("z", "c")]);
    assert_eq!(first, cached);
    assert_eq!(cached, fresh);
    assert_eq!(rt.cache().len(), 1);
}

fn collections<R: ScriptRuntime>(rt: &R) -> Vec<JsonType> {
    rt.pipeline()
        .rpush("l", &["a", "b", "c"])
        .lpush("l", &["z"])
        .lpop_n("l", 2)
        .del(&["l", "nope"])
        .exists(&["l"])
        .hset("h", &[("x", "1"), ("y", "2")])
        .hincrby("h", "x", 5)
        .hkeys("h")
        .hvals("h")
        .hgetall("h")
        .hmget("h", &["y", "q"])
        .hdel("h", &["x", "y"])
        .hgetall("h")
        .zadd("z", &[("a", 1.0), ("b", 2.0)])
        .zpop_max("z", Some(1))
        .execute()
        .unwrap()
}

fn expected_collections() -> Vec<JsonType> {
    vec![
        json!(3),
        json!(4),
        json!(["z", "a"]),
        json!(1),
        json!(0),
        json!(2),
        json!(6),
        json!(["x", "y"]),
        json!(["6", "2"]),
        json!({"x": "6", "y": "2"}),
        json!({"y": "2", "q": null}),
        json!(2),
        json!({}),
        json!(2),
        json!([["b", 2.0]]),
    ]
}

#[test]
fn test_backends_agree_on_collections() {
    let local = collections(&LocalRuntime::new());
    let lua = collections(&LuaRuntime::embedded());
    assert_eq!(local, lua);
    assert_eq!(local, expected_collections());
}

#[test]
fn test_backends_agree_on_raw_pipelines() {
    let seq = SequenceObj::pipeline()
        .then(set(key("k"), "v"))
        .then(get(key("missing")))
        .then(zpopmin(key("missing")));
    let empty = SequenceObj::pipeline();
    for reply in [
        run(&LocalRuntime::new(), seq.clone(), &[("k", "k"), ("missing", "m")]),
        run(&LuaRuntime::embedded(), seq, &[("k", "k"), ("missing", "m")]),
    ] {
        assert_eq!(reply, json!([true, false, {}]));
    }
    assert_eq!(run(&LocalRuntime::new(), empty.clone(), &[]), json!({}));
    assert_eq!(run(&LuaRuntime::embedded(), empty, &[]), json!({}));
}

fn set_options<R: ScriptRuntime>(rt: &R) -> Vec<JsonType> {
    let missing = SetOptions::new().mode(SetMode::IfMissing);
    let existing = SetOptions::new().mode(SetMode::IfExists);
    let short = SetOptions::new().expire_in(0.05);
    let mut replies = rt
        .pipeline()
        .set_with("k", "a", &missing)
        .set_with("k", "b", &missing)
        .set_with("k", "c", &existing.clone().return_previous())
        .set_with("absent", "x", &existing)
        .get("k")
        .set_with("ttl", "v", &short)
        .set_with("keep", "v", &short)
        .set_with("keep", "w", &SetOptions::new().keep_ttl())
        .set_with("gone", "v", &SetOptions::new().expire_in(60.0))
        .set("gone", "w")
        .execute()
        .unwrap();

    thread::sleep(Duration::from_millis(150));
    replies.extend(
        rt.pipeline()
            .get("ttl")
            .exists(&["ttl", "keep", "gone"])
            .execute()
            .unwrap(),
    );
    replies
}

#[test]
fn test_backends_agree_on_set_options() {
    let expected = vec![
        json!(true),
        json!(false),
        json!("a"),
        json!(false),
        json!("c"),
        json!(true),
        json!(true),
        json!(true),
        json!(true),
        json!(true),
        json!(null),
        json!(1),
    ];
    assert_eq!(set_options(&LocalRuntime::new()), expected);
    assert_eq!(set_options(&LuaRuntime::embedded()), expected);
}

fn is_inexact_binding(err: &RuntimeError) -> bool {
    matches!(
        err,
        RuntimeError::Exec(ExecError::Binding(BindingError::InexactInteger(_)))
    )
}

fn large_integers<R: ScriptRuntime>(rt: &R) -> Vec<JsonType> {
    let err = rt.incrby("n", 1152921504606846977).unwrap_err();
    assert!(is_inexact_binding(&err), "{err}");
    assert_eq!(rt.get("n").unwrap(), None);

    let literal = SequenceObj::new().then(incrby(key("n"), 1152921504606846977i64));
    let err = rt.register_script(&literal).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Invalid(ValidationError::InexactInteger { .. })
    ));

    let seq = SequenceObj::new().then(incrby(key("n"), arg("by")));
    let by = Args::from([("by".to_string(), json!(1u64 << 53))]);
    let mut replies = vec![
        call(rt, seq.clone(), &[("n", "n")], by.clone()),
        call(rt, seq, &[("n", "n")], by),
    ];
    replies.push(json!(rt.get("n").unwrap()));
    replies.push(json!(rt.incrby("n", -(1i64 << 53)).unwrap()));
    replies
}

#[test]
fn test_backends_agree_on_large_integers() {
    let local = large_integers(&LocalRuntime::new());
    let lua = large_integers(&LuaRuntime::embedded());
    assert_eq!(local, lua);
    assert_eq!(
        local,
        [
            json!(9007199254740992u64),
            json!(18014398509481984.0),
            json!("18014398509481984"),
            json!(9007199254740992i64),
        ]
    );
}

fn concurrent_increments<R: ScriptRuntime + Sync>(rt: &R) {
    let seq = SequenceObj::new()
        .then(incrby(key("a"), 1))
        .then(incrby(key("b"), 1));
    let exec = rt.register_script(&seq).unwrap();
    let keys = Keys::from([
        ("a".to_string(), "a".to_string()),
        ("b".to_string(), "b".to_string()),
    ]);

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..200 {
                    exec.call(&keys, &Args::new()).unwrap();
                }
            });
        }
        s.spawn(|| {
            for _ in 0..200 {
                let replies = rt.pipeline().get("a").get("b").execute().unwrap();
                assert_eq!(replies[0], replies[1]);
            }
        });
    });

    assert_eq!(rt.get("a").unwrap().as_deref(), Some("800"));
    assert_eq!(rt.get("b").unwrap().as_deref(), Some("800"));
}

#[test]
fn test_local_scripts_are_atomic_under_threads() {
    concurrent_increments(&LocalRuntime::new());
}

#[test]
fn test_embedded_lua_scripts_are_atomic_under_threads() {
    concurrent_increments(&LuaRuntime::embedded());
}

fn live_prefix(test: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("keyscript_{test}_{}_{nanos}", std::process::id())
}

fn live_runtime(test: &str) -> Option<LuaRuntime<RedisConnection>> {
    let url = std::env::var("KEYSCRIPT_REDIS_URL").ok()?;
    let conn = RedisConnection::open(&url).unwrap();
    Some(LuaRuntime::new(conn).with_prefix(live_prefix(test)))
}

#[test]
#[ignore = "requires a Redis server at KEYSCRIPT_REDIS_URL"]
fn test_redis_scenarios() {
    let Some(rt) = live_runtime("scenarios") else {
        return;
    };
    let local = LocalRuntime::new();
    assert_eq!(scenarios(&rt), scenarios(&local));
    rt.del(&["bar"]).unwrap();
}

#[test]
#[ignore = "requires a Redis server at KEYSCRIPT_REDIS_URL"]
fn test_redis_shapes() {
    let Some(rt) = live_runtime("shapes") else {
        return;
    };
    assert_eq!(shapes(&rt), expected_shapes());
    rt.del(&["hash", "stash"]).unwrap();
}

#[test]
#[ignore = "requires a Redis server at KEYSCRIPT_REDIS_URL"]
fn test_redis_collections() {
    let Some(rt) = live_runtime("collections") else {
        return;
    };
    assert_eq!(collections(&rt), expected_collections());
    rt.del(&["z"]).unwrap();
}
