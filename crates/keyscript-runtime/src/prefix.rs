//! Key namespacing.

use std::fmt;

use rhizome_keyscript_core::ExecFunction;

/// Prefix applied to every key before it reaches a backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPrefix {
    prefix: String,
}

impl KeyPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// `"{prefix}:{key}"`, or `key` unchanged when the prefix is empty.
    pub fn with_prefix(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{key}", self.prefix)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    /// Wraps an executable so its key bindings are prefixed.
    pub fn apply(&self, exec: ExecFunction) -> ExecFunction {
        if self.is_empty() {
            return exec;
        }
        let prefix = self.clone();
        exec.map_keys(move |key| prefix.with_prefix(key))
    }
}

impl fmt::Display for KeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix)
    }
}

impl From<&str> for KeyPrefix {
    fn from(prefix: &str) -> Self {
        Self::new(prefix)
    }
}

impl From<String> for KeyPrefix {
    fn from(prefix: String) -> Self {
        Self::new(prefix)
    }
}
