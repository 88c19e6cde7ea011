//! Connection to a real Redis server.

use redis::{Client, Connection, RedisError, Script};
use rhizome_keyscript_core::ExecError;

use crate::{ConnectionSource, LuaScript, ScriptConnection};

/// Runs generated scripts on a Redis server via `EVALSHA`, falling back to
/// `EVAL` when the server does not have the script cached yet.
#[derive(Debug, Clone)]
pub struct RedisConnection {
    client: Client,
}

impl RedisConnection {
    /// Creates a connection source for a `redis://` URL. No connection is
    /// made until a script runs.
    pub fn open(url: &str) -> Result<Self, ExecError> {
        let client = Client::open(url).map_err(|err| ExecError::Transport(Box::new(err)))?;
        Ok(Self { client })
    }
}

impl ConnectionSource for RedisConnection {
    fn connection(&self) -> Result<Box<dyn ScriptConnection + '_>, ExecError> {
        let conn = self.client.get_connection().map_err(classify)?;
        Ok(Box::new(RedisHandle { conn }))
    }
}

struct RedisHandle {
    conn: Connection,
}

impl ScriptConnection for RedisHandle {
    fn eval(
        &mut self,
        script: &LuaScript,
        keys: &[String],
        args: &[String],
    ) -> Result<String, ExecError> {
        let lua = Script::new(script.source());
        let mut invocation = lua.prepare_invoke();
        for key in keys {
            invocation.key(key);
        }
        for arg in args {
            invocation.arg(arg);
        }
        invocation.invoke(&mut self.conn).map_err(classify)
    }
}

// Connection-level failures are transport errors; anything the server
// replied with is a script error.
fn classify(err: RedisError) -> ExecError {
    if err.is_io_error()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
    {
        ExecError::Transport(Box::new(err))
    } else {
        ExecError::Engine(err.to_string())
    }
}
