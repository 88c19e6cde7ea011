//! The compiler contract every backend implements, and the invocation
//! surface compiled scripts are exposed through.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rhizome_keyscript_ir::{CommandObj, ExprObj, JsonType, SequenceObj, is_exact_number, validate};

use crate::{BindingError, CompileError, ExecError};

/// Key bindings: script key name → concrete (already prefixed) key.
pub type Keys = HashMap<String, String>;

/// Argument bindings: script argument name → JSON value.
pub type Args = HashMap<String, JsonType>;

type ExecFn = dyn Fn(&Keys, &Args) -> Result<JsonType, ExecError> + Send + Sync;

/// A compiled script bound to an execution resource. Calling it runs the
/// script once.
#[derive(Clone)]
pub struct ExecFunction {
    inner: Arc<ExecFn>,
}

impl ExecFunction {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Keys, &Args) -> Result<JsonType, ExecError> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Executes the script with the given bindings.
    pub fn call(&self, keys: &Keys, args: &Args) -> Result<JsonType, ExecError> {
        (self.inner)(keys, args)
    }

    /// Returns a function that rewrites every bound key before delegating.
    pub fn map_keys<F>(self, rewrite: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let inner = self.inner;
        Self::new(move |keys, args| {
            let mapped: Keys = keys
                .iter()
                .map(|(name, key)| (name.clone(), rewrite(key)))
                .collect();
            inner(&mapped, args)
        })
    }
}

impl fmt::Debug for ExecFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecFunction").finish_non_exhaustive()
    }
}

/// Positional slots for key and argument names, assigned in first-reference
/// order during compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slots {
    keys: Vec<String>,
    args: Vec<String>,
}

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot index of a key name, assigning the next one on first reference.
    pub fn key_slot(&mut self, name: &str) -> usize {
        slot(&mut self.keys, name)
    }

    /// Slot index of an argument name, assigning the next one on first reference.
    pub fn arg_slot(&mut self, name: &str) -> usize {
        slot(&mut self.args, name)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Projects key bindings onto slot order.
    pub fn bind_keys(&self, keys: &Keys) -> Result<Vec<String>, BindingError> {
        self.keys
            .iter()
            .map(|name| {
                keys.get(name)
                    .cloned()
                    .ok_or_else(|| BindingError::MissingKey(name.clone()))
            })
            .collect()
    }

    /// Projects argument bindings onto slot order.
    ///
    /// Integers beyond ±2^53 are refused: the Lua engines would round them.
    pub fn bind_args(&self, args: &Args) -> Result<Vec<JsonType>, BindingError> {
        self.args
            .iter()
            .map(|name| match args.get(name) {
                None => Err(BindingError::MissingArg(name.clone())),
                Some(value) if !is_exact_number(value) => {
                    Err(BindingError::InexactInteger(name.clone()))
                }
                Some(value) => Ok(value.clone()),
            })
            .collect()
    }
}

fn slot(names: &mut Vec<String>, name: &str) -> usize {
    match names.iter().position(|n| n == name) {
        Some(idx) => idx,
        None => {
            names.push(name.to_string());
            names.len() - 1
        }
    }
}

/// Lowers script graphs into a backend-specific compiled form.
///
/// `translate` is the only entry point callers need. It is pure: the same
/// graph always yields an equivalent artifact and nothing shared is touched,
/// so artifacts can be cached and reused freely.
pub trait Backend {
    /// The final, immutable artifact.
    type Compiled: Send + Sync + 'static;
    /// Intermediate result of compiling a sequence or a command.
    type Partial;
    /// Intermediate result of compiling an operand.
    type Expr;
    /// State threaded through the compilation of one script.
    type Context;
    /// State needed to compile operands.
    type ExprContext;
    /// The execution resource compiled scripts are bound to.
    type Runtime;

    /// Validates and compiles a script.
    fn translate(&self, seq: &SequenceObj) -> Result<Self::Compiled, CompileError> {
        validate(seq)?;
        let mut ctx = self.create_command_context();
        let partial = self.compile_sequence(&mut ctx, seq)?;
        self.finish(ctx, partial)
    }

    /// Creates a fresh script context.
    fn create_command_context(&self) -> Self::Context;

    /// Compiles a sequence, preserving command order.
    fn compile_sequence(
        &self,
        ctx: &mut Self::Context,
        seq: &SequenceObj,
    ) -> Result<Self::Partial, CompileError>;

    /// Compiles a single command.
    fn compile_command(
        &self,
        ctx: &mut Self::Context,
        cmd: &CommandObj,
    ) -> Result<Self::Partial, CompileError>;

    /// Compiles an operand.
    fn compile_expr(
        &self,
        ctx: &mut Self::ExprContext,
        expr: &ExprObj,
    ) -> Result<Self::Expr, CompileError>;

    /// Finalizes the compiled script.
    fn finish(
        &self,
        ctx: Self::Context,
        partial: Self::Partial,
    ) -> Result<Self::Compiled, CompileError>;

    /// Binds a compiled script to a runtime resource.
    fn create_executable(&self, code: Arc<Self::Compiled>, runtime: &Self::Runtime)
    -> ExecFunction;
}
