//! Null sink - discards all data
//!
//! Accepts every batch, updates metrics, and drops the records.
//!
//! # Use Cases
//!
//! - **Benchmarking**: Measure stream throughput without network I/O
//! - **Testing**: Validate stream configuration without credentials
//!
//! # Example
//!
//! ```ignore
//! use logship_sinks::null::NullSink;
//! use logship_stream::{DeliveryStream, StreamConfig};
//!
//! let sink = Arc::new(NullSink::new());
//! let stream = DeliveryStream::new(StreamConfig::new("bench"), Arc::clone(&sink))?;
//! ```

use async_trait::async_trait;
use logship_stream::record::total_bytes;
use logship_stream::{DeliveryError, IngestionSink, Record, RecordOutcome};

use crate::common::{MetricsSnapshot, SinkMetrics};

/// Null sink that accepts and discards every batch
#[derive(Debug, Default)]
pub struct NullSink {
    metrics: SinkMetrics,
}

impl NullSink {
    /// Create a new null sink
    pub const fn new() -> Self {
        Self {
            metrics: SinkMetrics::new(),
        }
    }

    /// Get snapshot of metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl IngestionSink for NullSink {
    fn kind(&self) -> &str {
        "null"
    }

    async fn deliver_batch(
        &self,
        _destination: &str,
        records: &[Record],
    ) -> Result<Vec<RecordOutcome>, DeliveryError> {
        self.metrics
            .batch_written(records.len() as u64, total_bytes(records) as u64);
        Ok(Vec::new())
    }
}
