//! Logship - batched log delivery
//!
//! # Usage
//!
//! ```bash
//! # Ship stdin lines through the configured sink (default)
//! my-service | logship --config logship.toml
//!
//! # Emit sample structured logs through the stream
//! logship test --count 20
//!
//! # Check a config file
//! logship validate --config logship.toml
//! ```

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use logship_config::{LogFormat, LogLevel};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Logship - batched log delivery to a batch ingestion API
#[derive(Parser, Debug)]
#[command(name = "logship")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true, env = "LOGSHIP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read lines from stdin and ship each one as a record
    Pipe(cmd::pipe::PipeArgs),

    /// Emit sample structured log events through the stream
    Test(cmd::test::TestArgs),

    /// Validate a configuration file and print the effective settings
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cmd::load_config(cli.config.as_deref())?;

    let level = cli.log_level.unwrap_or(config.log.level);
    init_logging(level, config.log.format)?;

    match cli.command {
        Some(Command::Pipe(args)) => cmd::pipe::run(args, &config).await,
        Some(Command::Test(args)) => cmd::test::run(args, &config).await,
        Some(Command::Validate) => cmd::validate::run(&config),
        // No subcommand = pipe stdin (default behavior)
        None => cmd::pipe::run(cmd::pipe::PipeArgs::default(), &config).await,
    }
}

/// Initialize the tracing subscriber for logship's own diagnostics
///
/// Always writes to stderr; stdout belongs to the `stdout` sink.
fn init_logging(level: LogLevel, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level.as_str())
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Console => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}
