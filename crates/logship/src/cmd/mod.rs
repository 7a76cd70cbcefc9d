//! Command implementations for the logship CLI
//!
//! Shared plumbing lives here: loading the config file and turning its
//! settings into a running [`DeliveryStream`].

pub mod pipe;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use logship_config::{Config, SinkSettings};
use logship_sinks::null::NullSink;
use logship_sinks::stdout::StdoutSink;
use logship_stream::{CloseSummary, DeliveryStream, IngestionSink};
use tokio::signal;
use tracing::{info, warn};

/// Load the config file, or defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// Build the configured sink
pub async fn build_sink(settings: &SinkSettings) -> Result<Arc<dyn IngestionSink>> {
    match settings {
        SinkSettings::Stdout => Ok(Arc::new(StdoutSink::new())),
        SinkSettings::Null => Ok(Arc::new(NullSink::new())),
        #[cfg(feature = "firehose")]
        SinkSettings::Firehose(fh) => {
            use logship_sinks::firehose::{FirehoseSink, FirehoseSinkConfig};

            let mut config = FirehoseSinkConfig::new(fh.region.clone());
            config.endpoint_url = fh.endpoint_url.clone();
            config.access_key_id = fh.access_key_id.clone();
            config.secret_access_key = fh.secret_access_key.clone();
            config.session_token = fh.session_token.clone();

            let sink = FirehoseSink::connect(config)
                .await
                .context("failed to initialize firehose sink")?;
            Ok(Arc::new(sink))
        }
        #[cfg(not(feature = "firehose"))]
        SinkSettings::Firehose(_) => {
            anyhow::bail!("this build of logship does not include the firehose sink")
        }
    }
}

/// Build the sink and start a stream over it
pub async fn open_stream(config: &Config) -> Result<DeliveryStream> {
    let sink = build_sink(&config.sink).await?;
    DeliveryStream::with_shared_sink(config.stream.to_stream_config(), sink)
        .context("failed to start delivery stream")
}

/// Close the stream and log what happened
pub async fn close_stream(stream: &DeliveryStream) -> Result<CloseSummary> {
    let summary = stream.close().await.context("failed to close stream")?;
    let metrics = stream.metrics();

    info!(
        delivered = metrics.records_delivered,
        dropped = metrics.records_dropped(),
        abandoned = summary.abandoned,
        transport_failures = metrics.transport_failures,
        "stream closed"
    );

    Ok(summary)
}

/// Wait for SIGINT or SIGTERM
pub async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
