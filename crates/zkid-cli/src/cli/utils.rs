use super::commands::{Cli, OutputFormat};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zkid_cli::LoggingConfig;
use zkid_types::Bytes32;

pub const OK: &str = "\x1b[38;5;46m[+]\x1b[0m";
pub const FAIL: &str = "\x1b[38;5;196m[-]\x1b[0m";
pub const DIM: &str = "\x1b[38;5;245m";
pub const RESET: &str = "\x1b[0m";

/// `RUST_LOG` wins, then `-q`/`-v`, then the configured level.
pub fn init_logging(cli: &Cli, logging: &LoggingConfig) -> Result<()> {
    let level = if cli.quiet {
        "warn".to_string()
    } else {
        match cli.verbose {
            0 => logging.level.to_string(),
            1 => "info,zkid_verifier=debug,zkid_registry=debug".to_string(),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    let log_file = cli.log_file.as_ref().or(logging.file.as_ref());
    let init = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            let file_layer = fmt::layer().with_writer(Mutex::new(file)).with_ansi(false);
            if logging.json {
                subscriber.with(file_layer.json()).try_init()
            } else {
                subscriber.with(file_layer).try_init()
            }
        }
        None => {
            let stderr_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(cli.verbose >= 2);
            if logging.json {
                subscriber.with(stderr_layer.json()).try_init()
            } else {
                subscriber.with(stderr_layer).try_init()
            }
        }
    };

    init.context("Failed to install log subscriber")
}

pub fn parse_bytes32(value: &str) -> Result<Bytes32> {
    value
        .parse::<Bytes32>()
        .with_context(|| format!("Invalid 32-byte hex value: {}", value))
}

pub fn parse_optional_bytes32(value: Option<&str>) -> Result<Option<Bytes32>> {
    value.map(parse_bytes32).transpose()
}

pub fn read_json_file(path: &Path) -> Result<serde_json::Value> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {:?} as JSON", path))
}

/// Inline JSON, or `@path` to read it from a file.
pub fn read_json_arg(arg: &str) -> Result<serde_json::Value> {
    match arg.strip_prefix('@') {
        Some(path) => read_json_file(Path::new(path)),
        None => serde_json::from_str(arg).context("Failed to parse inline JSON"),
    }
}

/// Prints `value` as JSON, or runs `text` for human output.
pub fn emit<T, F>(format: OutputFormat, value: &T, text: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T),
{
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}
