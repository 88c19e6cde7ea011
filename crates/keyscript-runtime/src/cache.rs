//! Compiled-script cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rhizome_keyscript_core::{CompileError, SequenceObj};

/// Maps script digests to compiled artifacts. A hit never recompiles.
#[derive(Debug)]
pub struct ScriptCache<T> {
    entries: Mutex<HashMap<String, Arc<T>>>,
}

impl<T> Default for ScriptCache<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> ScriptCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<T>>> {
        // Entries are only ever inserted whole.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached artifact for `seq`, compiling it on a miss.
    ///
    /// Compilation runs outside the lock; if two callers race on the same
    /// script, the first artifact inserted wins.
    pub fn get_or_compile<F>(&self, seq: &SequenceObj, compile: F) -> Result<Arc<T>, CompileError>
    where
        F: FnOnce(&SequenceObj) -> Result<T, CompileError>,
    {
        let digest = seq.digest();
        if let Some(code) = self.entries().get(&digest) {
            return Ok(Arc::clone(code));
        }

        tracing::debug!(%digest, commands = seq.len(), "script cache miss");
        let code = Arc::new(compile(seq)?);
        Ok(Arc::clone(self.entries().entry(digest).or_insert(code)))
    }

    pub fn get(&self, digest: &str) -> Option<Arc<T>> {
        self.entries().get(digest).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}
