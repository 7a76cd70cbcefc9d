//! Pipe command - ship stdin lines through the stream
//!
//! Each input line becomes one record, newline-terminated. The stream is
//! closed (and drained) on EOF, Ctrl-C or SIGTERM.
//!
//! # Usage
//!
//! ```bash
//! my-service 2>&1 | logship pipe --config logship.toml
//! tail -F app.log | logship pipe --destination app-logs
//! ```

use anyhow::{Context, Result};
use clap::Args;
use logship_config::Config;
use logship_stream::DeliveryStream;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;

use super::{close_stream, open_stream, wait_for_shutdown};

#[derive(Args, Debug, Default)]
pub struct PipeArgs {
    /// Override the stream destination from the config file
    #[arg(short, long)]
    pub destination: Option<String>,
}

pub async fn run(args: PipeArgs, config: &Config) -> Result<()> {
    let mut config = config.clone();
    if let Some(destination) = args.destination {
        config.stream.destination = destination;
    }
    config.validate().context("invalid configuration")?;

    let stream = open_stream(&config).await?;
    let stdin = BufReader::new(tokio::io::stdin());

    tokio::select! {
        result = forward_lines(stdin, &stream) => {
            let lines = result.context("failed to read stdin")?;
            info!(lines, "stdin closed");
        }
        _ = wait_for_shutdown() => {
            info!("shutdown signal received, draining stream");
        }
    }

    let summary = close_stream(&stream).await?;
    if summary.abandoned > 0 {
        anyhow::bail!(
            "{} records could not be delivered to '{}'",
            summary.abandoned,
            config.stream.destination
        );
    }

    Ok(())
}

/// Write every line of `reader` into the stream
///
/// Returns the number of lines forwarded.
pub(crate) async fn forward_lines<R>(mut reader: R, stream: &DeliveryStream) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::with_capacity(1024);
    let mut count = 0;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        if line.last() != Some(&b'\n') {
            line.push(b'\n');
        }
        stream.write_record(&line);
        count += 1;
    }

    Ok(count)
}
