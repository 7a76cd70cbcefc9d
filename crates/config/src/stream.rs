//! Delivery stream settings
//!
//! Mirrors the runtime stream configuration. Durations use humantime
//! notation (`"1s"`, `"250ms"`).

use std::time::Duration;

use logship_stream::StreamConfig;
use serde::Deserialize;

/// Stream settings
///
/// # Example
///
/// ```toml
/// [stream]
/// destination = "app-logs"
/// max_batch_records = 500
/// flush_interval = "1s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Target identifier passed to the sink (Firehose delivery stream name)
    /// Default: "logship"
    pub destination: String,

    /// Maximum records per batch
    /// Default: 500
    pub max_batch_records: usize,

    /// Maximum summed payload bytes per batch
    /// Default: 4 MiB
    pub max_batch_bytes: usize,

    /// Records larger than this are dropped
    /// Default: 1000 KiB
    pub max_record_bytes: usize,

    /// Periodic flush cadence, "0s" disables it
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,

    /// Upper bound on one delivery call
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub delivery_timeout: Duration,

    /// Upper bound on the shutdown drain
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,

    /// Consecutive no-progress flushes tolerated on shutdown
    /// Default: 10
    pub shutdown_max_attempts: usize,

    /// Pause between failed shutdown flushes
    /// Default: 100ms
    #[serde(with = "humantime_serde")]
    pub shutdown_retry_interval: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            destination: "logship".into(),
            max_batch_records: 500,
            max_batch_bytes: 4 * 1024 * 1024,
            max_record_bytes: 1000 * 1024,
            flush_interval: Duration::from_secs(1),
            delivery_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(30),
            shutdown_max_attempts: 10,
            shutdown_retry_interval: Duration::from_millis(100),
        }
    }
}

impl StreamSettings {
    /// Runtime stream config carrying every setting
    pub fn to_stream_config(&self) -> StreamConfig {
        StreamConfig::new(self.destination.clone())
            .with_max_batch_records(self.max_batch_records)
            .with_max_batch_bytes(self.max_batch_bytes)
            .with_max_record_bytes(self.max_record_bytes)
            .with_flush_interval(self.flush_interval)
            .with_delivery_timeout(self.delivery_timeout)
            .with_shutdown_timeout(self.shutdown_timeout)
            .with_shutdown_max_attempts(self.shutdown_max_attempts)
            .with_shutdown_retry_interval(self.shutdown_retry_interval)
    }
}
