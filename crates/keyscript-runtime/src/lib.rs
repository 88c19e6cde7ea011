//! Runtimes for Keyscript.
//!
//! A runtime owns a backend, a cache of compiled scripts, a key prefix, and
//! the execution resource scripts run on. [`LocalRuntime`] interprets
//! scripts in-process; [`LuaRuntime`] runs generated Lua on a Redis server
//! or an embedded host.
//!
//! ```
//! use rhizome_keyscript_runtime::{Commands, LocalRuntime};
//!
//! let rt = LocalRuntime::new().with_prefix("app");
//! rt.zadd("queue", &[("a", 2.0), ("b", 3.0)]).unwrap();
//! assert_eq!(rt.zpop_max("queue", Some(2)).unwrap(), [("b".to_string(), 3.0), ("a".to_string(), 2.0)]);
//!
//! let replies = rt.pipeline().incrby("n", 2).get("n").execute().unwrap();
//! assert_eq!(replies, [serde_json::json!(2), serde_json::json!("2")]);
//! ```

mod cache;
mod calls;
mod commands;
mod config;
mod error;
mod pipeline;
mod prefix;
mod reply;
mod runtime;

pub use cache::ScriptCache;
pub use commands::Commands;
pub use config::RuntimeConfig;
pub use error::{ConfigError, RuntimeError};
pub use pipeline::Pipeline;
pub use prefix::KeyPrefix;
pub use reply::{ReplyError, SetReply, zpop_pairs};
pub use runtime::{LocalRuntime, LuaRuntime, ScriptRuntime};

pub use rhizome_keyscript_backend_lua::{LuaHost, RedisConnection};
