//! Stream metrics
//!
//! Lock-free counters updated on the write and flush paths. Callers take a
//! [`StreamMetricsSnapshot`] for reporting.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one delivery stream
#[derive(Debug, Default)]
pub struct StreamMetrics {
    /// Records accepted into the buffer
    records_accepted: AtomicU64,

    /// Bytes accepted into the buffer
    bytes_accepted: AtomicU64,

    /// Records dropped because they exceeded the per-record ceiling
    records_oversized: AtomicU64,

    /// Records dropped because they arrived after close started
    records_after_close: AtomicU64,

    /// Flush attempts that found something to send
    flushes: AtomicU64,

    /// Delivery calls that completed at transport level
    batches_delivered: AtomicU64,

    /// Records acknowledged by the sink
    records_delivered: AtomicU64,

    /// Bytes acknowledged by the sink
    bytes_delivered: AtomicU64,

    /// Records the sink marked failed (requeued)
    records_failed: AtomicU64,

    /// Delivery calls that failed at transport level
    transport_failures: AtomicU64,

    /// Records pushed back because the batch exceeded the byte ceiling
    records_trimmed: AtomicU64,
}

impl StreamMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            records_accepted: AtomicU64::new(0),
            bytes_accepted: AtomicU64::new(0),
            records_oversized: AtomicU64::new(0),
            records_after_close: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            batches_delivered: AtomicU64::new(0),
            records_delivered: AtomicU64::new(0),
            bytes_delivered: AtomicU64::new(0),
            records_failed: AtomicU64::new(0),
            transport_failures: AtomicU64::new(0),
            records_trimmed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_accepted(&self, bytes: usize) {
        self.records_accepted.fetch_add(1, Ordering::Relaxed);
        self.bytes_accepted
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_oversized(&self) {
        self.records_oversized.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_after_close(&self) {
        self.records_after_close.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn trimmed(&self, count: usize) {
        self.records_trimmed
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn batch_delivered(&self, delivered: usize, bytes: usize, failed: usize) {
        self.batches_delivered.fetch_add(1, Ordering::Relaxed);
        self.records_delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.bytes_delivered
            .fetch_add(bytes as u64, Ordering::Relaxed);
        self.records_failed
            .fetch_add(failed as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn transport_failure(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> StreamMetricsSnapshot {
        StreamMetricsSnapshot {
            records_accepted: self.records_accepted.load(Ordering::Relaxed),
            bytes_accepted: self.bytes_accepted.load(Ordering::Relaxed),
            records_oversized: self.records_oversized.load(Ordering::Relaxed),
            records_after_close: self.records_after_close.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            batches_delivered: self.batches_delivered.load(Ordering::Relaxed),
            records_delivered: self.records_delivered.load(Ordering::Relaxed),
            bytes_delivered: self.bytes_delivered.load(Ordering::Relaxed),
            records_failed: self.records_failed.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            records_trimmed: self.records_trimmed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of stream metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StreamMetricsSnapshot {
    pub records_accepted: u64,
    pub bytes_accepted: u64,
    pub records_oversized: u64,
    pub records_after_close: u64,
    pub flushes: u64,
    pub batches_delivered: u64,
    pub records_delivered: u64,
    pub bytes_delivered: u64,
    pub records_failed: u64,
    pub transport_failures: u64,
    pub records_trimmed: u64,
}

impl StreamMetricsSnapshot {
    /// Records dropped at write time for any reason
    #[inline]
    pub fn records_dropped(&self) -> u64 {
        self.records_oversized + self.records_after_close
    }
}
