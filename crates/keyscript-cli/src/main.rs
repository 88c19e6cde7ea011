//! Keyscript CLI entry point.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use rhizome_keyscript_core::ir::sexpr::parse_sequence;
use rhizome_keyscript_core::{Args, JsonType, Keys, SequenceObj};
use rhizome_keyscript_runtime::{
    LocalRuntime, LuaRuntime, RedisConnection, RuntimeConfig, ScriptRuntime,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keyscript")]
#[command(about = "Compile and run key/value scripts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an S-expression script to Lua
    Compile {
        /// Input S-expression file (or - for stdin)
        file: String,

        /// Write to stdout instead of file
        #[arg(long)]
        stdout: bool,
    },

    /// Execute an S-expression script and print its reply
    Exec {
        /// Input S-expression file (or - for stdin)
        file: String,

        /// Key binding, `name=key`
        #[arg(short, long = "key", value_parser = parse_key)]
        keys: Vec<(String, String)>,

        /// Argument binding, `name=json` (non-JSON values are taken as strings)
        #[arg(short, long = "arg", value_parser = parse_arg)]
        args: Vec<(String, JsonType)>,

        /// Execution engine (defaults to redis when a URL is configured, memory otherwise)
        #[arg(short, long, value_enum)]
        backend: Option<Engine>,

        /// Runtime config file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Key prefix, overrides the config file
        #[arg(short, long)]
        prefix: Option<String>,

        /// Redis URL, overrides the config file
        #[arg(long)]
        redis_url: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Engine {
    /// In-process emulation
    Memory,
    /// Generated Lua on an embedded LuaJIT
    Lua,
    /// Generated Lua on a Redis server
    Redis,
}

fn split_binding(s: &str) -> Result<(&str, &str), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => Err(format!("expected name=value, got {s:?}")),
    }
}

fn parse_key(s: &str) -> Result<(String, String), String> {
    let (name, value) = split_binding(s)?;
    Ok((name.to_string(), value.to_string()))
}

fn parse_arg(s: &str) -> Result<(String, JsonType), String> {
    let (name, value) = split_binding(s)?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| JsonType::String(value.to_string()));
    Ok((name.to_string(), value))
}

fn read_input(file: &str) -> std::io::Result<String> {
    if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file)
    }
}

fn load_script(file: &str) -> Result<SequenceObj, Box<dyn std::error::Error>> {
    let input = read_input(file)?;
    let value: JsonType = serde_json::from_str(&input)?;
    Ok(parse_sequence(&value)?)
}

/// Where `compile` writes its Lua output: the input path with a `.lua`
/// extension, or `output.lua` for stdin.
fn output_path(file: &str) -> Result<PathBuf, String> {
    if file == "-" {
        return Ok(PathBuf::from("output.lua"));
    }
    let input = Path::new(file);
    let output = input.with_extension("lua");
    if output == input {
        return Err(format!("refusing to overwrite input {file}; use --stdout"));
    }
    Ok(output)
}

fn run<R: ScriptRuntime>(
    rt: &R,
    seq: &SequenceObj,
    keys: &Keys,
    args: &Args,
) -> Result<JsonType, Box<dyn std::error::Error>> {
    let exec = rt.register_script(seq)?;
    Ok(exec.call(keys, args)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("keyscript=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { file, stdout } => {
            let seq = load_script(&file)?;
            let rt = LuaRuntime::embedded();
            let script = rt.compile(&seq)?;

            if stdout {
                print!("{}", script.source());
            } else {
                let out_path = output_path(&file)?;
                std::fs::write(&out_path, script.source())?;
                println!("Wrote: {}", out_path.display());
            }
        }

        Commands::Exec {
            file,
            keys,
            args,
            backend,
            config,
            prefix,
            redis_url,
        } => {
            let mut config = match config {
                Some(path) => RuntimeConfig::from_file(path)?,
                None => RuntimeConfig::default(),
            };
            if let Some(prefix) = prefix {
                config.prefix = prefix;
            }
            if redis_url.is_some() {
                config.redis_url = redis_url;
            }

            let seq = load_script(&file)?;
            let keys: Keys = keys.into_iter().collect();
            let args: Args = args.into_iter().collect();
            let engine = backend.unwrap_or(if config.redis_url.is_some() {
                Engine::Redis
            } else {
                Engine::Memory
            });
            info!(?engine, prefix = %config.prefix, "executing script");

            let prefix = config.key_prefix();
            let result = match engine {
                Engine::Memory => run(&LocalRuntime::new().with_prefix(prefix), &seq, &keys, &args)?,
                Engine::Lua => run(&LuaRuntime::embedded().with_prefix(prefix), &seq, &keys, &args)?,
                Engine::Redis => {
                    let url = config
                        .redis_url
                        .as_deref()
                        .ok_or("redis backend needs --redis-url or redis_url in the config")?;
                    let rt = LuaRuntime::new(RedisConnection::open(url)?).with_prefix(prefix);
                    run(&rt, &seq, &keys, &args)?
                }
            };

            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
