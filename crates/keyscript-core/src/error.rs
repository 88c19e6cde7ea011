//! Error kinds, kept apart by the phase that raises them.

use rhizome_keyscript_ir::ValidationError;
use thiserror::Error;

use crate::StoreError;

/// Raised while lowering a script, before any execution resource exists.
#[derive(Debug, Error, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("{backend} backend cannot compile script: {reason}")]
    BackendLimit {
        backend: &'static str,
        reason: String,
    },
}

/// Raised when the caller's bindings do not cover the names a script uses.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("missing key binding: {0}")]
    MissingKey(String),

    #[error("missing argument binding: {0}")]
    MissingArg(String),

    #[error("argument {0} cannot be encoded as JSON")]
    UnencodableArg(String),

    #[error("argument {0} is an integer outside ±2^53")]
    InexactInteger(String),
}

/// Errors that can occur while executing a compiled script.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("binding error: {0}")]
    Binding(#[from] BindingError),

    #[error("emulation error: {0}")]
    Emulation(#[from] StoreError),

    #[error("script error: {0}")]
    Engine(String),

    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid reply: {0}")]
    InvalidReply(#[from] serde_json::Error),
}
