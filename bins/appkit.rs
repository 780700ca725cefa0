use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use configs::{AppConfig, LogFormat};
use dotenvy::dotenv;
use service::{AppContext, Lookup};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Inspect and edit the application key-value store", long_about = None)]
struct Cli {
    /// Path to configuration file (defaults to $CONFIG_PATH or config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the JSON value stored under KEY
    Get {
        key: String,
        /// JSON printed when the key is absent or unreadable
        #[arg(long, default_value = "null")]
        default: String,
    },
    /// Store VALUE under KEY; VALUE is parsed as JSON, falling back to a plain string
    Set { key: String, value: String },
    /// Delete KEY
    Remove { key: String },
    /// Delete every key
    Clear,
    /// List stored keys
    Keys,
    /// Print new unique ids
    Id {
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Print the effective application settings
    Info,
}

fn init_logging(cfg: &AppConfig) {
    common::utils::logging::init_logging(cfg.logging.format == LogFormat::Json, &cfg.logging.filter);
    info!(service = "appkit", event = "logger_init", "tracing subscriber initialized");
}

fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

fn run(ctx: &AppContext, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Get { key, default } => {
            let value = match ctx.storage.lookup::<serde_json::Value>(&key) {
                Lookup::Present(v) => v,
                Lookup::Absent => parse_value(&default),
                Lookup::Corrupt(e) => {
                    eprintln!("warning: entry {key:?} is not valid JSON ({e}); showing default");
                    parse_value(&default)
                }
                Lookup::Unavailable(e) => return Err(e.into()),
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Command::Set { key, value } => {
            ctx.storage.try_set(&key, &parse_value(&value))?;
            info!(service = "appkit", event = "set", %key, "value stored");
        }
        Command::Remove { key } => {
            ctx.storage.try_remove(&key)?;
            info!(service = "appkit", event = "remove", %key, "value removed");
        }
        Command::Clear => {
            ctx.storage.try_clear()?;
            info!(service = "appkit", event = "clear", "store cleared");
        }
        Command::Keys => {
            for key in ctx.storage.backend().keys()? {
                println!("{key}");
            }
        }
        Command::Id { count } => {
            for _ in 0..count {
                println!("{}", ctx.generate_id());
            }
        }
        Command::Info => {
            let cfg = &ctx.config;
            println!("title:       {}", cfg.app.title);
            println!("version:     {}", cfg.app.version);
            println!("environment: {:?}", cfg.app.environment);
            println!("debug:       {}", cfg.app.enable_debug);
            println!("analytics:   {}", cfg.app.enable_analytics);
            println!("api:         {} (timeout {} ms)", cfg.api.url, cfg.api.timeout_ms);
            println!("storage:     {:?} {}", cfg.storage.backend, cfg.storage.path.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    // load .env before reading RUST_LOG, CONFIG_PATH and APP_* overrides
    dotenv().ok();
    let cli = Cli::parse();

    let config_path = cli.config.as_ref().map(|p| p.to_string_lossy().into_owned());
    let cfg = match AppConfig::load_or_default(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default();
            error!(service = "appkit", event = "config_invalid", error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&cfg);

    let run_id = Uuid::new_v4();
    info!(
        service = "appkit",
        event = "start",
        %run_id,
        pid = std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
        environment = ?cfg.app.environment,
        "appkit starting"
    );

    let ctx = match AppContext::from_config(cfg) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(service = "appkit", event = "context_failed", error = %e, "failed to open storage");
            return ExitCode::FAILURE;
        }
    };

    let code = match run(&ctx, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(service = "appkit", event = "command_failed", %run_id, error = %e, "command failed");
            ExitCode::FAILURE
        }
    };
    ctx.shutdown();
    code
}
