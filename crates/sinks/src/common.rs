//! Common types shared by the sinks

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

/// Counters shared by the local sinks
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Delivery calls received
    pub batches_received: AtomicU64,

    /// Records written (or discarded, for the null sink)
    pub records_written: AtomicU64,

    /// Payload bytes written
    pub bytes_written: AtomicU64,

    /// Delivery calls that failed
    pub write_errors: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            batches_received: AtomicU64::new(0),
            records_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    /// Record a batch that was fully written
    #[inline]
    pub fn batch_written(&self, record_count: u64, bytes: u64) {
        self.batches_received.fetch_add(1, Ordering::Relaxed);
        self.records_written
            .fetch_add(record_count, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a batch that could not be written
    #[inline]
    pub fn write_error(&self) {
        self.batches_received.fetch_add(1, Ordering::Relaxed);
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_received: self.batches_received.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches_received: u64,
    pub records_written: u64,
    pub bytes_written: u64,
    pub write_errors: u64,
}

/// Errors raised while building a sink
///
/// Delivery failures are reported through `DeliveryError` instead.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink initialization failed
    #[error("failed to initialize sink: {0}")]
    Init(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl SinkError {
    /// Create an initialization error
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;
