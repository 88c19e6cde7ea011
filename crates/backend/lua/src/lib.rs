//! Lua backend for Keyscript.
//!
//! Compiles scripts to Lua source for a Redis server's embedded scripting
//! engine. Keys and arguments become positional `KEYS`/`ARGV` slots;
//! arguments travel JSON-encoded and the reply comes back through
//! `cjson.encode`. A pipeline script replies a table of every command's
//! reply.
//!
//! Generated scripts run either on a real server ([`RedisConnection`]) or
//! on an embedded LuaJIT over the emulation store ([`LuaHost`]).

mod codegen;
mod host;
mod remote;

pub use host::LuaHost;
pub use remote::RedisConnection;

use std::sync::Arc;

use codegen::{lua_call, lua_comment, lua_literal};
use rhizome_keyscript_core::ir::ReplyMode;
use rhizome_keyscript_core::{
    Backend, BindingError, CommandObj, CompileError, ExecError, ExecFunction, ExprObj, JsonType,
    SequenceObj, Slots,
};

/// Lua functions are limited to 200 locals.
pub const MAX_LOCALS: usize = 200;

/// Generated Lua script with the key and argument names its slots stand for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuaScript {
    source: String,
    slots: Slots,
}

impl LuaScript {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Key names, in `KEYS` order.
    pub fn keys(&self) -> &[String] {
        self.slots.keys()
    }

    /// Argument names, in `ARGV` order.
    pub fn args(&self) -> &[String] {
        self.slots.args()
    }
}

/// An open connection to a Lua scripting engine.
pub trait ScriptConnection {
    /// Runs a script. `keys` and `args` are in slot order; each argument is
    /// JSON text. Returns the JSON text the script replied with.
    fn eval(
        &mut self,
        script: &LuaScript,
        keys: &[String],
        args: &[String],
    ) -> Result<String, ExecError>;
}

/// Hands out connections, one per invocation.
pub trait ConnectionSource: Send + Sync {
    fn connection(&self) -> Result<Box<dyn ScriptConnection + '_>, ExecError>;
}

/// Per-script compilation state.
#[derive(Debug, Default)]
pub struct LuaContext {
    slots: Slots,
    lines: Vec<String>,
}

/// Backend that emits Lua source.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuaBackend;

impl LuaBackend {
    pub fn new() -> Self {
        Self
    }

    fn call_expr(&self, slots: &mut Slots, cmd: &CommandObj) -> Result<String, CompileError> {
        let (operands, options) = cmd.split_options()?;
        let operands = operands
            .iter()
            .map(|arg| self.compile_expr(slots, arg))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lua_call(cmd.op, &options, &operands))
    }
}

impl Backend for LuaBackend {
    type Compiled = LuaScript;
    type Partial = String;
    type Expr = String;
    type Context = LuaContext;
    type ExprContext = Slots;
    type Runtime = Arc<dyn ConnectionSource>;

    fn create_command_context(&self) -> LuaContext {
        LuaContext::default()
    }

    fn compile_sequence(
        &self,
        ctx: &mut LuaContext,
        seq: &SequenceObj,
    ) -> Result<String, CompileError> {
        let vars = seq
            .commands()
            .iter()
            .map(|cmd| self.compile_command(ctx, cmd))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(match seq.reply() {
            ReplyMode::Last => vars.last().cloned().unwrap_or_else(|| "nil".to_string()),
            ReplyMode::Each => format!("{{{}}}", vars.join(", ")),
        })
    }

    fn compile_command(&self, ctx: &mut LuaContext, cmd: &CommandObj) -> Result<String, CompileError> {
        let expr = self.call_expr(&mut ctx.slots, cmd)?;
        let var = format!("var_{}", ctx.lines.len());
        ctx.lines.push(format!("local {var} = {expr}"));
        Ok(var)
    }

    fn compile_expr(&self, slots: &mut Slots, expr: &ExprObj) -> Result<String, CompileError> {
        match expr {
            ExprObj::Literal { value } => Ok(lua_literal(value)),
            ExprObj::Key { name } => Ok(format!("key_{}", slots.key_slot(name))),
            ExprObj::Arg { name } => Ok(format!("arg_{}", slots.arg_slot(name))),
            ExprObj::Command { cmd } => self.call_expr(slots, cmd),
        }
    }

    fn finish(&self, ctx: LuaContext, result: String) -> Result<LuaScript, CompileError> {
        let LuaContext { slots, lines } = ctx;
        let locals = slots.keys().len() + slots.args().len() + lines.len();
        if locals > MAX_LOCALS {
            return Err(CompileError::BackendLimit {
                backend: "lua",
                reason: format!("script needs {locals} locals, at most {MAX_LOCALS} allowed"),
            });
        }

        let mut source = String::new();
        source.push_str("--[[ KEYV\n");
        for name in slots.keys() {
            source.push_str(&lua_comment(name));
            source.push('\n');
        }
        source.push_str("]]\n--[[ ARGV\n");
        for name in slots.args() {
            source.push_str(&lua_comment(name));
            source.push('\n');
        }
        source.push_str("]]\n");
        for (idx, name) in slots.keys().iter().enumerate() {
            source.push_str(&format!("local key_{idx} = (KEYS[{}])  -- {name}\n", idx + 1));
        }
        for (idx, name) in slots.args().iter().enumerate() {
            source.push_str(&format!(
                "local arg_{idx} = cjson.decode(ARGV[{}])  -- {name}\n",
                idx + 1
            ));
        }
        for line in &lines {
            source.push_str(line);
            source.push('\n');
        }
        source.push_str(&format!("return cjson.encode({result})\n"));

        tracing::debug!(
            keys = slots.keys().len(),
            args = slots.args().len(),
            commands = lines.len(),
            "compiled lua script"
        );
        Ok(LuaScript { source, slots })
    }

    fn create_executable(
        &self,
        code: Arc<LuaScript>,
        source: &Arc<dyn ConnectionSource>,
    ) -> ExecFunction {
        let source = Arc::clone(source);
        ExecFunction::new(move |keys, args| {
            let keys = code.slots.bind_keys(keys)?;
            let args = encode_args(code.args(), code.slots.bind_args(args)?)?;
            tracing::trace!(keys = keys.len(), args = args.len(), "running lua script");

            let reply = source.connection()?.eval(&code, &keys, &args)?;
            Ok(serde_json::from_str(&reply)?)
        })
    }
}

fn encode_args(names: &[String], values: Vec<JsonType>) -> Result<Vec<String>, BindingError> {
    names
        .iter()
        .zip(values)
        .map(|(name, value)| {
            serde_json::to_string(&value).map_err(|_| BindingError::UnencodableArg(name.clone()))
        })
        .collect()
}
