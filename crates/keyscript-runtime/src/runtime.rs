//! Runtimes: a backend, a cache, a key prefix, and an execution resource.

use std::sync::Arc;

use rhizome_keyscript_backend_lua::{ConnectionSource, LuaBackend, LuaHost, LuaScript};
use rhizome_keyscript_backend_memory::{MemoryBackend, MemoryScript};
use rhizome_keyscript_core::{Backend, CompileError, ExecFunction, SequenceObj, SharedStore, Store};

use crate::{KeyPrefix, ScriptCache};

/// Turns scripts into callable functions.
pub trait ScriptRuntime {
    /// Compiles (or fetches from cache) and binds a script. Keys passed to
    /// the returned function are prefixed before the backend sees them.
    fn register_script(&self, seq: &SequenceObj) -> Result<ExecFunction, CompileError>;

    fn prefix(&self) -> &KeyPrefix;
}

/// Runs scripts in-process against the emulation store.
#[derive(Debug)]
pub struct LocalRuntime {
    store: SharedStore,
    backend: MemoryBackend,
    cache: ScriptCache<MemoryScript>,
    prefix: KeyPrefix,
}

impl Default for LocalRuntime {
    fn default() -> Self {
        Self::with_store(Store::shared())
    }
}

impl LocalRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runtime over an existing store, e.g. one shared with a [`LuaHost`].
    pub fn with_store(store: SharedStore) -> Self {
        Self {
            store,
            backend: MemoryBackend::new(),
            cache: ScriptCache::new(),
            prefix: KeyPrefix::default(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<KeyPrefix>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn cache(&self) -> &ScriptCache<MemoryScript> {
        &self.cache
    }
}

impl ScriptRuntime for LocalRuntime {
    fn register_script(&self, seq: &SequenceObj) -> Result<ExecFunction, CompileError> {
        let code = self
            .cache
            .get_or_compile(seq, |seq| self.backend.translate(seq))?;
        let exec = self.backend.create_executable(code, &self.store);
        Ok(self.prefix.apply(exec))
    }

    fn prefix(&self) -> &KeyPrefix {
        &self.prefix
    }
}

/// Runs generated Lua on a scripting engine: a Redis server or a [`LuaHost`].
pub struct LuaRuntime<S> {
    source: Arc<S>,
    backend: LuaBackend,
    cache: ScriptCache<LuaScript>,
    prefix: KeyPrefix,
}

impl<S: ConnectionSource + 'static> LuaRuntime<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            backend: LuaBackend::new(),
            cache: ScriptCache::new(),
            prefix: KeyPrefix::default(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<KeyPrefix>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &ScriptCache<LuaScript> {
        &self.cache
    }

    /// The generated script for `seq`, cached.
    pub fn compile(&self, seq: &SequenceObj) -> Result<Arc<LuaScript>, CompileError> {
        self.cache
            .get_or_compile(seq, |seq| self.backend.translate(seq))
    }
}

impl LuaRuntime<LuaHost> {
    /// Runtime over an embedded host with a fresh store.
    pub fn embedded() -> Self {
        Self::new(LuaHost::fresh())
    }
}

impl<S: ConnectionSource + 'static> ScriptRuntime for LuaRuntime<S> {
    fn register_script(&self, seq: &SequenceObj) -> Result<ExecFunction, CompileError> {
        let code = self.compile(seq)?;
        let source: Arc<dyn ConnectionSource> = self.source.clone();
        let exec = self.backend.create_executable(code, &source);
        Ok(self.prefix.apply(exec))
    }

    fn prefix(&self) -> &KeyPrefix {
        &self.prefix
    }
}
