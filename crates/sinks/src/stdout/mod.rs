//! Stdout Sink - debug output
//!
//! Writes every record's bytes, unmodified and in batch order, to stdout and
//! reports the whole batch delivered. Records produced by a line-oriented
//! formatter already end in `\n`, so the output reads as one record per line.
//!
//! Not intended for production; use it to inspect what a stream would send
//! without AWS credentials.

use std::fmt;

use async_trait::async_trait;
use logship_stream::record::total_bytes;
use logship_stream::{DeliveryError, IngestionSink, Record, RecordOutcome};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::common::{MetricsSnapshot, SinkMetrics};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Stdout sink for debug output
pub struct StdoutSink {
    /// Held for a whole batch so batches never interleave
    writer: Mutex<BoxedWriter>,

    metrics: SinkMetrics,
}

impl StdoutSink {
    /// Create a sink writing to the process stdout
    pub fn new() -> Self {
        Self::with_writer(tokio::io::stdout())
    }

    /// Create a sink writing to any async writer
    pub fn with_writer(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            metrics: SinkMetrics::new(),
        }
    }

    /// Get snapshot of metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn write_batch(&self, records: &[Record]) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        for record in records {
            writer.write_all(record.as_bytes()).await?;
        }
        writer.flush().await
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdoutSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdoutSink")
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IngestionSink for StdoutSink {
    fn kind(&self) -> &str {
        "stdout"
    }

    async fn deliver_batch(
        &self,
        _destination: &str,
        records: &[Record],
    ) -> Result<Vec<RecordOutcome>, DeliveryError> {
        match self.write_batch(records).await {
            Ok(()) => {
                self.metrics
                    .batch_written(records.len() as u64, total_bytes(records) as u64);
                Ok(Vec::new())
            }
            Err(e) => {
                self.metrics.write_error();
                Err(DeliveryError::transport(format!("stdout write failed: {e}")))
            }
        }
    }
}
