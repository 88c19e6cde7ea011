//! Emulation backend for Keyscript.
//!
//! Lowers a script into a tree of closures that run against the in-process
//! [`Store`], shaping replies exactly as Redis' Lua engine would.

mod reply;

pub use reply::{shape, shape_reply};

use std::fmt;
use std::sync::Arc;

use rhizome_keyscript_core::ir::ReplyMode;
use rhizome_keyscript_core::store::to_command_arg;
use rhizome_keyscript_core::{
    Backend, CommandObj, CompileError, ExecError, ExecFunction, ExprObj, JsonType, SequenceObj,
    SharedStore, Slots, Store, Txn,
};

/// Bound state a compiled script runs against.
pub struct Frame<'a, 'b> {
    pub txn: &'a mut Txn<'b>,
    /// Concrete keys, in slot order.
    pub keys: &'a [String],
    /// Argument values, in slot order.
    pub args: &'a [JsonType],
}

/// A compiled step: evaluates to the JSON value of a command or operand.
pub type Eval = Arc<dyn Fn(&mut Frame<'_, '_>) -> Result<JsonType, ExecError> + Send + Sync>;

fn eval<F>(f: F) -> Eval
where
    F: Fn(&mut Frame<'_, '_>) -> Result<JsonType, ExecError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Compiled emulation script.
pub struct MemoryScript {
    slots: Slots,
    eval: Eval,
}

impl MemoryScript {
    /// Key and argument names, in slot order.
    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    /// Runs the script inside an open transaction.
    pub fn run(
        &self,
        txn: &mut Txn<'_>,
        keys: &[String],
        args: &[JsonType],
    ) -> Result<JsonType, ExecError> {
        (self.eval)(&mut Frame { txn, keys, args })
    }
}

impl fmt::Debug for MemoryScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryScript")
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

/// Per-script compilation state.
#[derive(Debug, Default)]
pub struct MemoryContext {
    slots: Slots,
}

/// Backend that interprets scripts against the emulation store.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryBackend;

impl MemoryBackend {
    pub fn new() -> Self {
        Self
    }

    fn lower(&self, slots: &mut Slots, cmd: &CommandObj) -> Result<Eval, CompileError> {
        let (operands, options) = cmd.split_options()?;
        let operands = operands
            .iter()
            .map(|arg| self.compile_expr(slots, arg))
            .collect::<Result<Vec<_>, _>>()?;
        let flags = options.flags();
        let op = cmd.op;
        Ok(eval(move |frame| {
            let mut args = Vec::with_capacity(operands.len() + flags.len());
            for operand in &operands {
                let value = operand(frame)?;
                args.push(to_command_arg(&value)?);
            }
            args.extend(flags.iter().cloned());
            let reply = frame.txn.call(op, &args)?;
            Ok(shape(op, &options, reply))
        }))
    }
}

impl Backend for MemoryBackend {
    type Compiled = MemoryScript;
    type Partial = Eval;
    type Expr = Eval;
    type Context = MemoryContext;
    type ExprContext = Slots;
    type Runtime = SharedStore;

    fn create_command_context(&self) -> MemoryContext {
        MemoryContext::default()
    }

    fn compile_sequence(
        &self,
        ctx: &mut MemoryContext,
        seq: &SequenceObj,
    ) -> Result<Eval, CompileError> {
        let steps = seq
            .commands()
            .iter()
            .map(|cmd| self.compile_command(ctx, cmd))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(match seq.reply() {
            ReplyMode::Last => eval(move |frame| {
                let mut last = JsonType::Null;
                for step in &steps {
                    last = step(frame)?;
                }
                Ok(last)
            }),
            ReplyMode::Each => eval(move |frame| {
                let replies = steps
                    .iter()
                    .map(|step| step(frame))
                    .collect::<Result<Vec<_>, _>>()?;
                // an empty table encodes as an object
                if replies.is_empty() {
                    return Ok(JsonType::Object(Default::default()));
                }
                Ok(JsonType::Array(replies))
            }),
        })
    }

    fn compile_command(
        &self,
        ctx: &mut MemoryContext,
        cmd: &CommandObj,
    ) -> Result<Eval, CompileError> {
        self.lower(&mut ctx.slots, cmd)
    }

    fn compile_expr(&self, slots: &mut Slots, expr: &ExprObj) -> Result<Eval, CompileError> {
        Ok(match expr {
            ExprObj::Literal { value } => {
                let value = value.clone();
                eval(move |_| Ok(value.clone()))
            }
            ExprObj::Key { name } => {
                let idx = slots.key_slot(name);
                eval(move |frame| Ok(JsonType::String(frame.keys[idx].clone())))
            }
            ExprObj::Arg { name } => {
                let idx = slots.arg_slot(name);
                eval(move |frame| Ok(frame.args[idx].clone()))
            }
            ExprObj::Command { cmd } => self.lower(slots, cmd)?,
        })
    }

    fn finish(&self, ctx: MemoryContext, partial: Eval) -> Result<MemoryScript, CompileError> {
        tracing::debug!(
            keys = ctx.slots.keys().len(),
            args = ctx.slots.args().len(),
            "compiled emulation script"
        );
        Ok(MemoryScript {
            slots: ctx.slots,
            eval: partial,
        })
    }

    fn create_executable(&self, code: Arc<MemoryScript>, store: &SharedStore) -> ExecFunction {
        let store = Arc::clone(store);
        ExecFunction::new(move |keys, args| {
            let keys = code.slots.bind_keys(keys)?;
            let args = code.slots.bind_args(args)?;
            tracing::trace!(keys = keys.len(), args = args.len(), "running emulation script");

            let mut guard = Store::lock(&store);
            let mut txn = guard.begin();
            let reply = code.run(&mut txn, &keys, &args)?;
            txn.commit();
            Ok(reply)
        })
    }
}
