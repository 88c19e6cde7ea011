use rhizome_keyscript_core::{CompileError, ExecError};
use thiserror::Error;

use crate::ReplyError;

/// Errors from the convenience command API.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("malformed reply: {0}")]
    Reply(#[from] ReplyError),
}

impl From<CompileError> for RuntimeError {
    fn from(err: CompileError) -> Self {
        RuntimeError::Exec(err.into())
    }
}

/// Errors loading a runtime configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
