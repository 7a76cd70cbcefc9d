//! Stream configuration
//!
//! Immutable once the stream is built. Defaults match the limits of the
//! AWS Firehose `PutRecordBatch` API, which is the reference sink.

use std::time::Duration;

use crate::error::{Result, StreamError};

/// Default maximum records per delivery attempt
pub const DEFAULT_MAX_BATCH_RECORDS: usize = 500;

/// Default ceiling on the summed payload size of one batch (4 MiB)
pub const DEFAULT_MAX_BATCH_BYTES: usize = 4 * 1024 * 1024;

/// Default ceiling on a single record (1000 KiB)
pub const DEFAULT_MAX_RECORD_BYTES: usize = 1000 * 1024;

/// Default periodic flush cadence
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(1000);

/// Default bound on one delivery call
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on the shutdown drain loop
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of consecutive no-progress flushes tolerated on shutdown
pub const DEFAULT_SHUTDOWN_MAX_ATTEMPTS: usize = 10;

/// Default pause between failed shutdown flushes
pub const DEFAULT_SHUTDOWN_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for a delivery stream
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Target identifier passed to the sink (e.g. Firehose stream name)
    pub destination: String,

    /// Maximum records per batch; reaching it in the buffer triggers a flush
    pub max_batch_records: usize,

    /// Maximum summed payload bytes per batch
    pub max_batch_bytes: usize,

    /// Records larger than this are dropped at write time
    pub max_record_bytes: usize,

    /// Periodic flush cadence (zero disables the periodic trigger)
    pub flush_interval: Duration,

    /// Upper bound on a single delivery call
    pub delivery_timeout: Duration,

    /// Upper bound on the drain loop run by `close`
    pub shutdown_timeout: Duration,

    /// Consecutive flushes without progress before `close` gives up
    pub shutdown_max_attempts: usize,

    /// Pause between failed flushes during `close`
    pub shutdown_retry_interval: Duration,
}

impl StreamConfig {
    /// Create a config for `destination` with default limits
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            max_batch_records: DEFAULT_MAX_BATCH_RECORDS,
            max_batch_bytes: DEFAULT_MAX_BATCH_BYTES,
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            shutdown_max_attempts: DEFAULT_SHUTDOWN_MAX_ATTEMPTS,
            shutdown_retry_interval: DEFAULT_SHUTDOWN_RETRY_INTERVAL,
        }
    }

    /// Set maximum records per batch
    #[must_use]
    pub fn with_max_batch_records(mut self, count: usize) -> Self {
        self.max_batch_records = count;
        self
    }

    /// Set maximum bytes per batch
    #[must_use]
    pub fn with_max_batch_bytes(mut self, bytes: usize) -> Self {
        self.max_batch_bytes = bytes;
        self
    }

    /// Set maximum bytes per record
    #[must_use]
    pub fn with_max_record_bytes(mut self, bytes: usize) -> Self {
        self.max_record_bytes = bytes;
        self
    }

    /// Set the periodic flush interval (zero disables it)
    #[must_use]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Set the delivery timeout
    #[must_use]
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Set the shutdown drain deadline
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set how many consecutive failed flushes `close` tolerates
    #[must_use]
    pub fn with_shutdown_max_attempts(mut self, attempts: usize) -> Self {
        self.shutdown_max_attempts = attempts;
        self
    }

    /// Set the pause between failed flushes during `close`
    #[must_use]
    pub fn with_shutdown_retry_interval(mut self, interval: Duration) -> Self {
        self.shutdown_retry_interval = interval;
        self
    }

    /// Whether the periodic trigger runs
    #[inline]
    pub fn periodic_flush_enabled(&self) -> bool {
        !self.flush_interval.is_zero()
    }

    /// Check invariants the flush algorithm relies on
    ///
    /// A single accepted record must always fit in an empty batch, so the
    /// per-record ceiling has to be strictly below the batch ceiling.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.destination.trim().is_empty() {
            return Err(StreamError::invalid_config(
                "destination",
                "must not be empty",
            ));
        }

        if self.max_batch_records == 0 {
            return Err(StreamError::invalid_config(
                "max_batch_records",
                "must be greater than 0",
            ));
        }

        if self.max_record_bytes == 0 {
            return Err(StreamError::invalid_config(
                "max_record_bytes",
                "must be greater than 0",
            ));
        }

        if self.max_record_bytes >= self.max_batch_bytes {
            return Err(StreamError::invalid_config(
                "max_record_bytes",
                format!(
                    "({}) must be smaller than max_batch_bytes ({})",
                    self.max_record_bytes, self.max_batch_bytes
                ),
            ));
        }

        if self.delivery_timeout.is_zero() {
            return Err(StreamError::invalid_config(
                "delivery_timeout",
                "must be greater than 0",
            ));
        }

        if self.shutdown_max_attempts == 0 {
            return Err(StreamError::invalid_config(
                "shutdown_max_attempts",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}
