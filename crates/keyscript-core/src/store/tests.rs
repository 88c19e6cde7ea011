//! Tests for the emulation store.

use super::*;
use serde_json::json;

fn s(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn run(store: &mut Store, op: Opcode, args: &[&str]) -> Result<Reply, StoreError> {
    let mut txn = store.begin();
    let reply = txn.call(op, &s(args));
    if reply.is_ok() {
        txn.commit();
    }
    reply
}

fn bulk(value: &str) -> Reply {
    Reply::Bulk(value.to_string())
}

#[test]
fn test_get_set() {
    let mut store = Store::new();
    assert_eq!(run(&mut store, Opcode::Get, &["foo"]).unwrap(), Reply::Nil);
    assert_eq!(
        run(&mut store, Opcode::Set, &["bar", "a"]).unwrap(),
        Reply::Status("OK".into())
    );
    assert_eq!(run(&mut store, Opcode::Get, &["bar"]).unwrap(), bulk("a"));
    run(&mut store, Opcode::Set, &["bar", "b"]).unwrap();
    assert_eq!(run(&mut store, Opcode::Get, &["bar"]).unwrap(), bulk("b"));
}

#[test]
fn test_incrby() {
    let mut store = Store::new();
    assert_eq!(run(&mut store, Opcode::IncrBy, &["n", "5"]).unwrap(), Reply::Int(5));
    assert_eq!(run(&mut store, Opcode::IncrBy, &["n", "-7"]).unwrap(), Reply::Int(-2));
    assert_eq!(run(&mut store, Opcode::Get, &["n"]).unwrap(), bulk("-2"));

    run(&mut store, Opcode::Set, &["s", "abc"]).unwrap();
    assert_eq!(
        run(&mut store, Opcode::IncrBy, &["s", "1"]).unwrap_err(),
        StoreError::NotInteger
    );
    run(&mut store, Opcode::Set, &["max", &i64::MAX.to_string()]).unwrap();
    assert_eq!(
        run(&mut store, Opcode::IncrBy, &["max", "1"]).unwrap_err(),
        StoreError::Overflow
    );
}

#[test]
fn test_lists() {
    let mut store = Store::new();
    assert_eq!(run(&mut store, Opcode::LLen, &["foo"]).unwrap(), Reply::Int(0));
    assert_eq!(run(&mut store, Opcode::LPop, &["foo"]).unwrap(), Reply::Nil);
    assert_eq!(run(&mut store, Opcode::RPop, &["foo", "2"]).unwrap(), Reply::Nil);

    run(&mut store, Opcode::RPush, &["l", "a"]).unwrap();
    run(&mut store, Opcode::RPush, &["l", "b"]).unwrap();
    assert_eq!(run(&mut store, Opcode::LPush, &["l", "z"]).unwrap(), Reply::Int(3));

    assert_eq!(run(&mut store, Opcode::LPop, &["l"]).unwrap(), bulk("z"));
    assert_eq!(
        run(&mut store, Opcode::RPop, &["l", "5"]).unwrap(),
        Reply::Array(vec![bulk("b"), bulk("a")])
    );
    // emptied lists disappear
    assert!(store.get("l").is_none());
    assert_eq!(run(&mut store, Opcode::Exists, &["l"]).unwrap(), Reply::Int(0));
}

#[test]
fn test_pop_count_zero_and_negative() {
    let mut store = Store::new();
    run(&mut store, Opcode::RPush, &["l", "a"]).unwrap();
    assert_eq!(
        run(&mut store, Opcode::LPop, &["l", "0"]).unwrap(),
        Reply::Array(vec![])
    );
    assert_eq!(
        run(&mut store, Opcode::LPop, &["l", "-1"]).unwrap_err(),
        StoreError::OutOfRange
    );
    assert_eq!(run(&mut store, Opcode::LLen, &["l"]).unwrap(), Reply::Int(1));
}

#[test]
fn test_zset_pop_order() {
    let mut store = Store::new();
    assert_eq!(
        run(&mut store, Opcode::ZPopMax, &["foo"]).unwrap(),
        Reply::Array(vec![])
    );
    assert_eq!(run(&mut store, Opcode::ZAdd, &["z", "2", "a"]).unwrap(), Reply::Int(1));
    assert_eq!(run(&mut store, Opcode::ZAdd, &["z", "3", "b"]).unwrap(), Reply::Int(1));
    assert_eq!(run(&mut store, Opcode::ZAdd, &["z", "3", "b"]).unwrap(), Reply::Int(0));
    assert_eq!(run(&mut store, Opcode::ZCard, &["z"]).unwrap(), Reply::Int(2));

    assert_eq!(
        run(&mut store, Opcode::ZPopMax, &["z", "2"]).unwrap(),
        Reply::Array(vec![bulk("b"), bulk("3"), bulk("a"), bulk("2")])
    );
    assert!(store.get("z").is_none());

    run(&mut store, Opcode::ZAdd, &["z", "2", "a"]).unwrap();
    run(&mut store, Opcode::ZAdd, &["z", "3", "b"]).unwrap();
    assert_eq!(
        run(&mut store, Opcode::ZPopMin, &["z", "2"]).unwrap(),
        Reply::Array(vec![bulk("a"), bulk("2"), bulk("b"), bulk("3")])
    );
}

#[test]
fn test_zset_ties_follow_canonical_order() {
    let mut store = Store::new();
    for member in ["b", "c", "a"] {
        run(&mut store, Opcode::ZAdd, &["z", "1", member]).unwrap();
    }
    assert_eq!(
        run(&mut store, Opcode::ZPopMin, &["z"]).unwrap(),
        Reply::Array(vec![bulk("a"), bulk("1")])
    );
    assert_eq!(
        run(&mut store, Opcode::ZPopMax, &["z"]).unwrap(),
        Reply::Array(vec![bulk("c"), bulk("1")])
    );
}

#[test]
fn test_zadd_rescore_and_bad_score() {
    let mut store = Store::new();
    run(&mut store, Opcode::ZAdd, &["z", "1", "a"]).unwrap();
    run(&mut store, Opcode::ZAdd, &["z", "5", "b"]).unwrap();
    run(&mut store, Opcode::ZAdd, &["z", "9.5", "a"]).unwrap();
    assert_eq!(
        run(&mut store, Opcode::ZPopMax, &["z"]).unwrap(),
        Reply::Array(vec![bulk("a"), bulk("9.5")])
    );
    assert_eq!(
        run(&mut store, Opcode::ZAdd, &["z", "nope", "c"]).unwrap_err(),
        StoreError::NotFloat
    );
    assert_eq!(
        run(&mut store, Opcode::ZAdd, &["z", "nan", "c"]).unwrap_err(),
        StoreError::NotFloat
    );
}

#[test]
fn test_hashes() {
    let mut store = Store::new();
    assert_eq!(run(&mut store, Opcode::HGet, &["h", "f"]).unwrap(), Reply::Nil);
    assert_eq!(run(&mut store, Opcode::HSet, &["h", "f", "1"]).unwrap(), Reply::Int(1));
    assert_eq!(run(&mut store, Opcode::HSet, &["h", "f", "2"]).unwrap(), Reply::Int(0));
    assert_eq!(run(&mut store, Opcode::HGet, &["h", "f"]).unwrap(), bulk("2"));
    assert_eq!(run(&mut store, Opcode::HLen, &["h"]).unwrap(), Reply::Int(1));
    assert_eq!(run(&mut store, Opcode::HDel, &["h", "f"]).unwrap(), Reply::Int(1));
    assert!(store.get("h").is_none());
}

#[test]
fn test_hash_reads_keep_insertion_order() {
    let mut store = Store::new();
    assert_eq!(
        run(&mut store, Opcode::HSet, &["h", "b", "1", "a", "2", "c", "3"]).unwrap(),
        Reply::Int(3)
    );
    assert_eq!(
        run(&mut store, Opcode::HSet, &["h", "a", "20", "d", "4"]).unwrap(),
        Reply::Int(1)
    );
    assert_eq!(
        run(&mut store, Opcode::HKeys, &["h"]).unwrap(),
        Reply::Array(vec![bulk("b"), bulk("a"), bulk("c"), bulk("d")])
    );
    assert_eq!(
        run(&mut store, Opcode::HVals, &["h"]).unwrap(),
        Reply::Array(vec![bulk("1"), bulk("20"), bulk("3"), bulk("4")])
    );
    assert_eq!(
        run(&mut store, Opcode::HMGet, &["h", "c", "x", "b"]).unwrap(),
        Reply::Array(vec![bulk("3"), Reply::Nil, bulk("1")])
    );
    assert_eq!(
        run(&mut store, Opcode::HDel, &["h", "b", "x", "c"]).unwrap(),
        Reply::Int(2)
    );
    assert_eq!(
        run(&mut store, Opcode::HGetAll, &["h"]).unwrap(),
        Reply::Array(vec![bulk("a"), bulk("20"), bulk("d"), bulk("4")])
    );

    assert_eq!(run(&mut store, Opcode::HGetAll, &["none"]).unwrap(), Reply::Array(vec![]));
    assert_eq!(
        run(&mut store, Opcode::HMGet, &["none", "f"]).unwrap(),
        Reply::Array(vec![Reply::Nil])
    );
}

#[test]
fn test_hincrby() {
    let mut store = Store::new();
    assert_eq!(run(&mut store, Opcode::HIncrBy, &["h", "n", "3"]).unwrap(), Reply::Int(3));
    assert_eq!(run(&mut store, Opcode::HIncrBy, &["h", "n", "-5"]).unwrap(), Reply::Int(-2));
    assert_eq!(run(&mut store, Opcode::HGet, &["h", "n"]).unwrap(), bulk("-2"));
    run(&mut store, Opcode::HSet, &["h", "s", "abc"]).unwrap();
    assert_eq!(
        run(&mut store, Opcode::HIncrBy, &["h", "s", "1"]).unwrap_err(),
        StoreError::HashNotInteger
    );
    assert_eq!(
        run(&mut store, Opcode::HIncrBy, &["h", "n", "x"]).unwrap_err(),
        StoreError::NotInteger
    );
}

#[test]
fn test_multi_key_and_multi_value() {
    let mut store = Store::new();
    assert_eq!(run(&mut store, Opcode::RPush, &["l", "a", "b", "c"]).unwrap(), Reply::Int(3));
    assert_eq!(run(&mut store, Opcode::LPush, &["l", "x", "y"]).unwrap(), Reply::Int(5));
    assert_eq!(
        run(&mut store, Opcode::LPop, &["l", "5"]).unwrap(),
        Reply::Array(vec![bulk("y"), bulk("x"), bulk("a"), bulk("b"), bulk("c")])
    );

    run(&mut store, Opcode::Set, &["a", "1"]).unwrap();
    run(&mut store, Opcode::Set, &["b", "2"]).unwrap();
    assert_eq!(
        run(&mut store, Opcode::Exists, &["a", "b", "a", "missing"]).unwrap(),
        Reply::Int(3)
    );
    assert_eq!(
        run(&mut store, Opcode::Del, &["a", "b", "a", "missing"]).unwrap(),
        Reply::Int(2)
    );
    assert!(store.is_empty());

    assert_eq!(
        run(&mut store, Opcode::ZAdd, &["z", "1", "a", "2", "b", "3", "a"]).unwrap(),
        Reply::Int(2)
    );
    assert_eq!(run(&mut store, Opcode::ZCard, &["z"]).unwrap(), Reply::Int(2));
    // a bad score anywhere rejects the whole command
    assert_eq!(
        run(&mut store, Opcode::ZAdd, &["z", "5", "c", "x", "d"]).unwrap_err(),
        StoreError::NotFloat
    );
    assert_eq!(run(&mut store, Opcode::ZCard, &["z"]).unwrap(), Reply::Int(2));
    assert_eq!(
        run(&mut store, Opcode::ZAdd, &["z", "5"]).unwrap_err(),
        StoreError::WrongArity("zadd".into())
    );
}

fn run_at(store: &mut Store, now: u64, args: &[&str]) -> Result<Reply, StoreError> {
    let mut txn = store.begin_at(now);
    let reply = txn.call(Opcode::Set, &s(args));
    if reply.is_ok() {
        txn.commit();
    }
    reply
}

fn get_at(store: &mut Store, now: u64, key: &str) -> Reply {
    store.begin_at(now).call(Opcode::Get, &s(&[key])).unwrap()
}

#[test]
fn test_set_conditions() {
    let mut store = Store::new();
    assert_eq!(run(&mut store, Opcode::Set, &["k", "a", "XX"]).unwrap(), Reply::Nil);
    assert!(store.get("k").is_none());
    assert_eq!(
        run(&mut store, Opcode::Set, &["k", "a", "NX"]).unwrap(),
        Reply::Status("OK".into())
    );
    assert_eq!(run(&mut store, Opcode::Set, &["k", "b", "NX"]).unwrap(), Reply::Nil);
    assert_eq!(run(&mut store, Opcode::Get, &["k"]).unwrap(), bulk("a"));
    assert_eq!(
        run(&mut store, Opcode::Set, &["k", "c", "xx"]).unwrap(),
        Reply::Status("OK".into())
    );

    // GET replies the previous value whether or not the write happened
    assert_eq!(run(&mut store, Opcode::Set, &["k", "d", "NX", "GET"]).unwrap(), bulk("c"));
    assert_eq!(run(&mut store, Opcode::Set, &["k", "e", "GET"]).unwrap(), bulk("c"));
    assert_eq!(run(&mut store, Opcode::Set, &["n", "1", "GET"]).unwrap(), Reply::Nil);
    assert_eq!(run(&mut store, Opcode::Get, &["k"]).unwrap(), bulk("e"));

    run(&mut store, Opcode::RPush, &["l", "x"]).unwrap();
    assert_eq!(
        run(&mut store, Opcode::Set, &["l", "v", "GET"]).unwrap_err(),
        StoreError::WrongType
    );
    assert_eq!(
        run(&mut store, Opcode::Set, &["l", "v"]).unwrap(),
        Reply::Status("OK".into())
    );
}

#[test]
fn test_set_flag_errors() {
    let mut store = Store::new();
    for flags in [
        vec!["NX", "XX"],
        vec!["PX", "10", "KEEPTTL"],
        vec!["EX", "1", "PX", "5"],
        vec!["PX"],
        vec!["SOON"],
    ] {
        let mut args = vec!["k", "v"];
        args.extend(flags);
        assert_eq!(run(&mut store, Opcode::Set, &args).unwrap_err(), StoreError::Syntax);
    }
    assert_eq!(
        run(&mut store, Opcode::Set, &["k", "v", "PX", "0"]).unwrap_err(),
        StoreError::InvalidExpire
    );
    assert_eq!(
        run(&mut store, Opcode::Set, &["k", "v", "EX", &i64::MAX.to_string()]).unwrap_err(),
        StoreError::InvalidExpire
    );
    assert_eq!(
        run(&mut store, Opcode::Set, &["k", "v", "PX", "soon"]).unwrap_err(),
        StoreError::NotInteger
    );
    assert!(store.is_empty());
}

#[test]
fn test_expiry() {
    let mut store = Store::new();
    let now = 1_000_000;
    run_at(&mut store, now, &["k", "v", "PX", "1500"]).unwrap();
    assert_eq!(store.expiry("k"), Some(now + 1500));
    assert_eq!(get_at(&mut store, now + 1499, "k"), bulk("v"));
    assert_eq!(get_at(&mut store, now + 1500, "k"), Reply::Nil);
    assert_eq!(store.expiry("k"), None);

    run_at(&mut store, now, &["k", "v", "EX", "2"]).unwrap();
    assert_eq!(store.expiry("k"), Some(now + 2000));
    // KEEPTTL keeps it, a plain set clears it
    run_at(&mut store, now, &["k", "w", "KEEPTTL"]).unwrap();
    assert_eq!(store.expiry("k"), Some(now + 2000));
    run_at(&mut store, now, &["k", "x"]).unwrap();
    assert_eq!(store.expiry("k"), None);

    run_at(&mut store, now, &["k", "v", "PXAT", &(now + 10).to_string()]).unwrap();
    assert_eq!(store.expiry("k"), Some(now + 10));
    run_at(&mut store, now, &["k", "v", "EXAT", "5000"]).unwrap();
    assert_eq!(store.expiry("k"), Some(5_000_000));

    // an expiry already in the past deletes the key
    assert_eq!(
        run_at(&mut store, now, &["k", "v", "PXAT", "10", "GET"]).unwrap(),
        bulk("v")
    );
    assert_eq!(get_at(&mut store, now, "k"), Reply::Nil);
}

#[test]
fn test_expired_key_is_absent_to_writes() {
    let mut store = Store::new();
    let now = 1_000_000;
    run_at(&mut store, now, &["k", "5", "PX", "100"]).unwrap();
    let mut txn = store.begin_at(now + 100);
    assert_eq!(txn.call(Opcode::IncrBy, &s(&["k", "1"])).unwrap(), Reply::Int(1));
    assert_eq!(
        txn.call(Opcode::Set, &s(&["k", "v", "NX"])).unwrap(),
        Reply::Nil
    );
    txn.commit();
    assert_eq!(store.expiry("k"), None);

    // writes other than set keep the expiry
    run_at(&mut store, now, &["n", "1", "PX", "100"]).unwrap();
    let mut txn = store.begin_at(now);
    txn.call(Opcode::IncrBy, &s(&["n", "1"])).unwrap();
    txn.commit();
    assert_eq!(store.expiry("n"), Some(now + 100));

    // deleting drops the expiry with the key
    let mut txn = store.begin_at(now);
    txn.call(Opcode::Del, &s(&["n"])).unwrap();
    txn.commit();
    assert_eq!(store.expiry("n"), None);
}

#[test]
fn test_wrong_type() {
    let mut store = Store::new();
    run(&mut store, Opcode::Set, &["k", "v"]).unwrap();
    for (op, args) in [
        (Opcode::LLen, vec!["k"]),
        (Opcode::RPush, vec!["k", "x"]),
        (Opcode::ZPopMax, vec!["k"]),
        (Opcode::HGet, vec!["k", "f"]),
        (Opcode::HGetAll, vec!["k"]),
        (Opcode::HMGet, vec!["k", "f"]),
        (Opcode::HIncrBy, vec!["k", "f", "1"]),
    ] {
        assert_eq!(run(&mut store, op, &args).unwrap_err(), StoreError::WrongType);
    }
    run(&mut store, Opcode::RPush, &["l", "x"]).unwrap();
    assert_eq!(run(&mut store, Opcode::Get, &["l"]).unwrap_err(), StoreError::WrongType);
}

#[test]
fn test_uncommitted_transaction_leaves_store_untouched() {
    let mut store = Store::new();
    run(&mut store, Opcode::Set, &["a", "1"]).unwrap();

    let mut txn = store.begin();
    txn.call(Opcode::Set, &s(&["a", "2"])).unwrap();
    txn.call(Opcode::RPush, &s(&["l", "x"])).unwrap();
    // reads inside the transaction see its own writes
    assert_eq!(txn.call(Opcode::Get, &s(&["a"])).unwrap(), bulk("2"));
    drop(txn);

    assert_eq!(run(&mut store, Opcode::Get, &["a"]).unwrap(), bulk("1"));
    assert!(store.get("l").is_none());
}

#[test]
fn test_call_named_and_arity() {
    let mut store = Store::new();
    let mut txn = store.begin();
    assert_eq!(
        txn.call_named("LLEN", &s(&["x"])).unwrap(),
        Reply::Int(0)
    );
    assert_eq!(
        txn.call_named("flushall", &[]).unwrap_err(),
        StoreError::UnknownCommand("flushall".into())
    );
    assert_eq!(
        txn.call(Opcode::Set, &s(&["k"])).unwrap_err(),
        StoreError::WrongArity("set".into())
    );
}

#[test]
fn test_format_number() {
    assert_eq!(format_number(2.0), "2");
    assert_eq!(format_number(-3.0), "-3");
    assert_eq!(format_number(3.5), "3.5");
    assert_eq!(format_number(f64::INFINITY), "inf");
    assert_eq!(format_number(f64::NEG_INFINITY), "-inf");
}

#[test]
fn test_to_command_arg() {
    assert_eq!(to_command_arg(&json!("a")).unwrap(), "a");
    assert_eq!(to_command_arg(&json!(2)).unwrap(), "2");
    assert_eq!(to_command_arg(&json!(2.0)).unwrap(), "2");
    assert_eq!(to_command_arg(&json!(0.25)).unwrap(), "0.25");
    assert_eq!(
        to_command_arg(&json!(false)).unwrap_err(),
        StoreError::InvalidArgument("boolean".into())
    );
    assert!(to_command_arg(&json!(null)).is_err());
}
