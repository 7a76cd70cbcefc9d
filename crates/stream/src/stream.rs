//! Delivery stream - the byte sink producers write into
//!
//! Three triggers feed the same [`Flusher`]:
//!
//! ```text
//!  write_record ──append──▶ [RecordBuffer] ◀──drain/requeue── [Flusher] ──▶ IngestionSink
//!       │                                                       ▲  ▲  ▲
//!       └── len ≥ max_batch_records ── spawn capacity flush ────┘  │  │
//!                                   ticker (flush_interval) ───────┘  │
//!                                   close (drain until empty) ────────┘
//! ```
//!
//! Writes never wait for the network: they take the buffer lock for one
//! push and return. Capacity flushes run on the runtime captured at
//! construction, so `write_record` is usable from plain threads too.
//!
//! # Example
//!
//! ```ignore
//! let config = StreamConfig::new("app-logs");
//! let stream = DeliveryStream::new(config, StdoutSink::new())?;
//!
//! stream.write_record(b"{\"msg\":\"hello\"}\n");
//!
//! let summary = stream.close().await?;
//! assert_eq!(summary.abandoned, 0);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::buffer::RecordBuffer;
use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::flush::{FlushOutcome, Flusher};
use crate::metrics::{StreamMetrics, StreamMetricsSnapshot};
use crate::record::Record;
use crate::sink::IngestionSink;
use crate::util::RateLimitedLogger;

/// Lifecycle of a delivery stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StreamState {
    /// Accepting writes, periodic flush running
    Open = 0,
    /// Ticker stopped, final drain in progress
    Closing = 1,
    /// Terminal
    Closed = 2,
}

impl StreamState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Open,
            1 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// What `close` managed to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseSummary {
    /// Records delivered by the shutdown drain
    pub delivered: usize,
    /// Records still buffered when the drain gave up
    pub abandoned: usize,
    /// Flush attempts made by the drain loop
    pub attempts: usize,
}

/// Handle to a batched delivery stream
///
/// Cheap to clone; every clone writes into the same buffer. The periodic
/// ticker stops when `close` runs or when the last handle is dropped.
#[derive(Clone)]
pub struct DeliveryStream {
    inner: Arc<Inner>,
}

struct Inner {
    config: Arc<StreamConfig>,
    buffer: Arc<RecordBuffer>,
    metrics: Arc<StreamMetrics>,
    flusher: Flusher,
    sink_kind: String,

    state: AtomicU8,
    runtime: Handle,

    /// Set while a capacity-triggered flush task is outstanding
    capacity_flush_pending: AtomicBool,

    cancel: CancellationToken,
    ticker: Mutex<Option<JoinHandle<()>>>,

    drop_log: RateLimitedLogger,
}

impl Inner {
    fn capacity_reached(&self) -> bool {
        self.buffer.len() >= self.config.max_batch_records
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl DeliveryStream {
    /// Build a stream and start its periodic flush
    ///
    /// # Errors
    ///
    /// Returns `StreamError::InvalidConfig` if the config fails validation
    /// and `StreamError::NoRuntime` if called outside a Tokio runtime.
    pub fn new(config: StreamConfig, sink: impl IngestionSink + 'static) -> Result<Self> {
        Self::with_shared_sink(config, Arc::new(sink))
    }

    /// Build a stream over an already shared sink
    ///
    /// # Errors
    ///
    /// Same as [`DeliveryStream::new`].
    pub fn with_shared_sink(config: StreamConfig, sink: Arc<dyn IngestionSink>) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| StreamError::NoRuntime)?;

        let config = Arc::new(config);
        let buffer = Arc::new(RecordBuffer::new());
        let metrics = Arc::new(StreamMetrics::new());
        let sink_kind = sink.kind().to_string();
        let flusher = Flusher::new(
            Arc::clone(&buffer),
            sink,
            Arc::clone(&config),
            Arc::clone(&metrics),
        );

        let inner = Arc::new(Inner {
            config,
            buffer,
            metrics,
            flusher,
            sink_kind,
            state: AtomicU8::new(StreamState::Open as u8),
            runtime,
            capacity_flush_pending: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            ticker: Mutex::new(None),
            drop_log: RateLimitedLogger::default(),
        });

        if inner.config.periodic_flush_enabled() {
            let task = inner
                .runtime
                .spawn(run_ticker(Arc::downgrade(&inner), inner.cancel.clone()));
            *inner.ticker.lock() = Some(task);
        }

        info!(
            destination = %inner.config.destination,
            sink = %inner.sink_kind,
            max_batch_records = inner.config.max_batch_records,
            max_batch_bytes = inner.config.max_batch_bytes,
            flush_interval_ms = inner.config.flush_interval.as_millis() as u64,
            "delivery stream started"
        );

        Ok(Self { inner })
    }

    /// Accept one record
    ///
    /// Always reports the full length as accepted. Records larger than
    /// `max_record_bytes`, and records written after `close` started, are
    /// dropped and reported through a rate-limited warning.
    pub fn write_record(&self, payload: &[u8]) -> usize {
        let len = payload.len();
        let inner = &self.inner;

        if len > inner.config.max_record_bytes {
            inner.metrics.record_oversized();
            inner.drop_log.warn(
                "record exceeds max_record_bytes, dropped",
                &format_args!("{len} bytes > {} bytes", inner.config.max_record_bytes),
            );
            return len;
        }

        // `close` seals the buffer under the same lock, so a record is
        // either stored before the drain starts or refused here
        let Some(buffered) = inner.buffer.append(Record::copy_from_slice(payload)) else {
            inner.metrics.record_after_close();
            inner.drop_log.warn(
                "record written after close, dropped",
                &format_args!("{len} bytes"),
            );
            return len;
        };
        inner.metrics.record_accepted(len);

        if buffered >= inner.config.max_batch_records {
            self.schedule_capacity_flush();
        }

        len
    }

    /// Run one flush now
    ///
    /// Named apart from `io::Write::flush`, which is a no-op on the stream.
    pub async fn flush_batch(&self) -> FlushOutcome {
        self.inner.flusher.flush().await
    }

    /// Stop the periodic trigger and drain the buffer
    ///
    /// Keeps flushing until the buffer is empty, the sink stops making
    /// progress for `shutdown_max_attempts` consecutive attempts, or
    /// `shutdown_timeout` passes. Records left over are removed from the
    /// buffer, reported in the summary and lost. Writes racing with `close`
    /// are either drained or counted in `records_after_close`.
    ///
    /// # Errors
    ///
    /// Returns `StreamError::AlreadyClosed` on a second call and
    /// `StreamError::Task` if the ticker task panicked.
    pub async fn close(&self) -> Result<CloseSummary> {
        let inner = &self.inner;

        inner
            .state
            .compare_exchange(
                StreamState::Open as u8,
                StreamState::Closing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| StreamError::AlreadyClosed)?;
        inner.buffer.seal();

        debug!(
            destination = %inner.config.destination,
            buffered = inner.buffer.len(),
            "delivery stream closing"
        );

        inner.cancel.cancel();
        let ticker = inner.ticker.lock().take();
        let ticker_result = match ticker {
            Some(task) => task.await.map_err(|e| StreamError::Task(e.to_string())),
            None => Ok(()),
        };

        let summary = self.drain().await;
        inner
            .state
            .store(StreamState::Closed as u8, Ordering::Release);

        if summary.abandoned > 0 {
            warn!(
                destination = %inner.config.destination,
                delivered = summary.delivered,
                abandoned = summary.abandoned,
                attempts = summary.attempts,
                "delivery stream closed with undelivered records"
            );
        } else {
            info!(
                destination = %inner.config.destination,
                delivered = summary.delivered,
                attempts = summary.attempts,
                "delivery stream closed"
            );
        }

        ticker_result.map(|()| summary)
    }

    /// Flush repeatedly until empty or out of patience
    ///
    /// Emptiness is judged by an `Idle` flush rather than the buffer length:
    /// the flush gate guarantees no capacity flush still holds records in
    /// flight at that point.
    async fn drain(&self) -> CloseSummary {
        let config = &self.inner.config;
        let deadline = Instant::now() + config.shutdown_timeout;
        let mut summary = CloseSummary::default();
        let mut stalled = 0;

        loop {
            if Instant::now() >= deadline {
                warn!(
                    destination = %config.destination,
                    timeout_ms = config.shutdown_timeout.as_millis() as u64,
                    "shutdown drain timed out"
                );
                break;
            }

            let outcome = self.inner.flusher.flush().await;
            if outcome == FlushOutcome::Idle {
                break;
            }
            summary.attempts += 1;
            summary.delivered += outcome.delivered();

            if matches!(outcome, FlushOutcome::Unsplittable { .. }) {
                break;
            }
            if outcome.made_progress() {
                stalled = 0;
                continue;
            }

            stalled += 1;
            if stalled >= config.shutdown_max_attempts {
                warn!(
                    destination = %config.destination,
                    attempts = stalled,
                    "sink made no progress, giving up shutdown drain"
                );
                break;
            }
            tokio::time::sleep(config.shutdown_retry_interval).await;
        }

        summary.abandoned = self.inner.flusher.discard_remaining().await;
        summary
    }

    /// Spawn a capacity flush unless one is already outstanding
    fn schedule_capacity_flush(&self) {
        let inner = &self.inner;
        if inner.capacity_flush_pending.swap(true, Ordering::AcqRel) {
            return;
        }

        let task_inner = Arc::clone(inner);
        inner.runtime.spawn(async move {
            loop {
                let outcome = task_inner.flusher.flush().await;
                if outcome.made_progress() && task_inner.capacity_reached() {
                    continue;
                }

                task_inner
                    .capacity_flush_pending
                    .store(false, Ordering::Release);

                // A producer that crossed the threshold while the flag was
                // still set returned without scheduling
                if !outcome.made_progress()
                    || !task_inner.capacity_reached()
                    || task_inner.capacity_flush_pending.swap(true, Ordering::AcqRel)
                {
                    break;
                }
            }
        });
    }

    /// Current lifecycle state
    pub fn state(&self) -> StreamState {
        StreamState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    /// Records waiting for delivery
    pub fn buffered_records(&self) -> usize {
        self.inner.buffer.len()
    }

    /// Bytes waiting for delivery
    pub fn buffered_bytes(&self) -> usize {
        self.inner.buffer.byte_len()
    }

    /// Stream configuration
    pub fn config(&self) -> &StreamConfig {
        &self.inner.config
    }

    /// Snapshot of the stream counters
    pub fn metrics(&self) -> StreamMetricsSnapshot {
        self.inner.metrics.snapshot()
    }
}

impl fmt::Debug for DeliveryStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryStream")
            .field("destination", &self.inner.config.destination)
            .field("sink", &self.inner.sink_kind)
            .field("state", &self.state())
            .field("buffered", &self.inner.buffer.len())
            .finish()
    }
}

/// Periodic trigger
///
/// Flushes inline, so a slow delivery delays the next tick rather than
/// stacking flush tasks behind the gate. Holds only a weak reference so the
/// stream can be dropped without calling `close`.
async fn run_ticker(inner: Weak<Inner>, cancel: CancellationToken) {
    let period = match inner.upgrade() {
        Some(inner) => inner.config.flush_interval,
        None => return,
    };

    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                inner.flusher.flush().await;
            }
        }
    }
}

#[cfg(test)]
#[path = "stream_test.rs"]
mod stream_test;
