//! Flush - drain one batch from the buffer and deliver it
//!
//! # Algorithm
//!
//! ```text
//! drain ≤ max_batch_records ──▶ trim tail until ≤ max_batch_bytes ──▶ deliver
//!        (buffer head)            (trimmed → buffer front)              │
//!                                                                       ▼
//!                       transport error: requeue all ◀── outcome ──▶ per-record:
//!                                                                    failed → requeue
//!                                                                    delivered → drop
//! ```
//!
//! Trimming removes the newest records first, so the oldest records in the
//! candidate set are the ones that go out now.
//!
//! # Concurrency
//!
//! The capacity trigger, the periodic ticker and `close` all call
//! [`Flusher::flush`]. An async gate serializes whole flushes (drain through
//! reconciliation) so two flushes never interleave their requeues. The
//! buffer's own lock is only held for the drain and requeue mutations, so
//! producers keep appending while a delivery call is in flight.

use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, trace, warn};

use crate::buffer::RecordBuffer;
use crate::config::StreamConfig;
use crate::metrics::StreamMetrics;
use crate::record::{Record, total_bytes};
use crate::sink::{DeliveryError, IngestionSink, RecordOutcome};
use crate::util::RateLimitedLogger;

/// Result of one flush attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was buffered
    Idle,

    /// The sink answered; `requeued` records were marked failed
    Delivered { delivered: usize, requeued: usize },

    /// The delivery call failed; every record went back to the buffer
    TransportFailed { requeued: usize },

    /// Not even one record fit under the byte ceiling
    ///
    /// Unreachable with a validated config, kept so the drain loop in
    /// `close` can never spin on it.
    Unsplittable { requeued: usize },
}

impl FlushOutcome {
    /// Records the sink acknowledged
    #[inline]
    pub fn delivered(&self) -> usize {
        match self {
            Self::Delivered { delivered, .. } => *delivered,
            _ => 0,
        }
    }

    /// Check if anything was delivered
    #[inline]
    pub fn made_progress(&self) -> bool {
        self.delivered() > 0
    }
}

/// Executes flushes against a shared buffer and sink
pub(crate) struct Flusher {
    buffer: Arc<RecordBuffer>,
    sink: Arc<dyn IngestionSink>,
    config: Arc<StreamConfig>,
    metrics: Arc<StreamMetrics>,

    /// Held for the full drain → deliver → reconcile sequence
    gate: AsyncMutex<()>,

    /// Transport errors repeat every tick while a sink is down
    failure_log: RateLimitedLogger,
}

impl Flusher {
    pub(crate) fn new(
        buffer: Arc<RecordBuffer>,
        sink: Arc<dyn IngestionSink>,
        config: Arc<StreamConfig>,
        metrics: Arc<StreamMetrics>,
    ) -> Self {
        Self {
            buffer,
            sink,
            config,
            metrics,
            gate: AsyncMutex::new(()),
            failure_log: RateLimitedLogger::default(),
        }
    }

    /// Attempt to deliver one batch
    pub(crate) async fn flush(&self) -> FlushOutcome {
        let _gate = self.gate.lock().await;

        let mut batch = self.buffer.drain_candidate(self.config.max_batch_records);
        if batch.is_empty() {
            return FlushOutcome::Idle;
        }
        self.metrics.flush();

        let trimmed = trim_to_byte_limit(&mut batch, self.config.max_batch_bytes);
        let trimmed_count = trimmed.len();
        if trimmed_count > 0 {
            trace!(
                kept = batch.len(),
                trimmed = trimmed_count,
                "batch over byte ceiling, trimmed newest records"
            );
            self.metrics.trimmed(trimmed_count);
            self.buffer.requeue_front(trimmed);
        }

        if batch.is_empty() {
            warn!(
                destination = %self.config.destination,
                max_batch_bytes = self.config.max_batch_bytes,
                "no record fits under the batch byte ceiling"
            );
            return FlushOutcome::Unsplittable {
                requeued: trimmed_count,
            };
        }

        match self.deliver(&batch).await {
            Ok(outcomes) => self.reconcile(batch, outcomes),
            Err(e) => {
                let requeued = batch.len();
                self.metrics.transport_failure();
                self.buffer.requeue_front(batch);
                self.failure_log.error(
                    &format!(
                        "delivery to {} sink '{}' failed, {} records requeued",
                        self.sink.kind(),
                        self.config.destination,
                        requeued
                    ),
                    &e,
                );
                FlushOutcome::TransportFailed { requeued }
            }
        }
    }

    /// Wait for any flush in flight, then empty the buffer
    ///
    /// Returns how many records were thrown away.
    pub(crate) async fn discard_remaining(&self) -> usize {
        let _gate = self.gate.lock().await;
        self.buffer.drain_candidate(usize::MAX).len()
    }

    /// Call the sink, bounded by the delivery timeout
    async fn deliver(&self, batch: &[Record]) -> Result<Vec<RecordOutcome>, DeliveryError> {
        let timeout = self.config.delivery_timeout;
        let call = self
            .sink
            .deliver_batch(&self.config.destination, batch);

        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| DeliveryError::Timeout(timeout))?
    }

    /// Requeue the records the sink did not accept
    fn reconcile(&self, batch: Vec<Record>, outcomes: Vec<RecordOutcome>) -> FlushOutcome {
        let sent = batch.len();
        let (delivered_bytes, failed) = split_failed(batch, &outcomes);
        let requeued = failed.len();
        let delivered = sent - requeued;

        self.metrics
            .batch_delivered(delivered, delivered_bytes, requeued);

        if requeued > 0 {
            let reason = outcomes
                .iter()
                .find_map(|o| match o {
                    RecordOutcome::Failed { reason } => Some(reason.as_str()),
                    RecordOutcome::Delivered => None,
                })
                .unwrap_or("no outcome reported");
            warn!(
                destination = %self.config.destination,
                delivered,
                requeued,
                first_reason = %reason,
                "partial delivery, failed records requeued"
            );
            self.buffer.requeue_front(failed);
        } else {
            debug!(
                destination = %self.config.destination,
                delivered,
                bytes = delivered_bytes,
                "batch delivered"
            );
        }

        FlushOutcome::Delivered {
            delivered,
            requeued,
        }
    }
}

/// Pop records off the tail until the batch fits under `max_bytes`
///
/// Returns the removed records in their original order.
pub(crate) fn trim_to_byte_limit(batch: &mut Vec<Record>, max_bytes: usize) -> Vec<Record> {
    let mut size = total_bytes(batch);
    let mut cut = batch.len();

    while size > max_bytes && cut > 0 {
        cut -= 1;
        size -= batch[cut].len();
    }

    batch.split_off(cut)
}

/// Separate failed records from delivered ones
///
/// An empty outcome list means everything was delivered. Records past the
/// end of a non-empty outcome list count as failed. Returns the delivered
/// byte count and the failed records in original order.
pub(crate) fn split_failed(batch: Vec<Record>, outcomes: &[RecordOutcome]) -> (usize, Vec<Record>) {
    if outcomes.is_empty() {
        return (total_bytes(&batch), Vec::new());
    }

    let mut delivered_bytes = 0;
    let mut failed = Vec::new();

    for (i, record) in batch.into_iter().enumerate() {
        match outcomes.get(i) {
            Some(RecordOutcome::Delivered) => delivered_bytes += record.len(),
            Some(RecordOutcome::Failed { .. }) | None => failed.push(record),
        }
    }

    (delivered_bytes, failed)
}

#[cfg(test)]
#[path = "flush_test.rs"]
mod flush_test;
