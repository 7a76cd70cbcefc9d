//! Ingestion sink - the remote batch API the stream delivers to
//!
//! A sink receives one ordered batch per call and answers in one of two ways:
//!
//! - `Err(DeliveryError)`: the request itself failed (network, auth,
//!   timeout, whole-request rejection). Nothing in the batch is known to
//!   have landed, so the stream requeues all of it.
//! - `Ok(outcomes)`: the request went through. An empty list means every
//!   record was accepted. Otherwise `outcomes[i]` describes `records[i]`;
//!   records without a matching entry are treated as failed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::record::Record;

/// Per-record result reported by a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Durably accepted by the sink
    Delivered,
    /// Rejected, worth retrying
    Failed {
        /// Sink-provided reason (error code and message)
        reason: String,
    },
}

impl RecordOutcome {
    /// Create a Failed outcome
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Check if this outcome is a failure
    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Transport-level delivery failure; the whole batch is unresolved
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Network or service error
    #[error("transport error: {0}")]
    Transport(String),

    /// Credentials missing or refused
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The delivery call did not finish in time
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    /// The sink refused the request as a whole
    #[error("batch rejected: {0}")]
    Rejected(String),
}

impl DeliveryError {
    /// Create a Transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

/// A remote API that accepts batches of records
#[async_trait]
pub trait IngestionSink: Send + Sync {
    /// Short sink type name used in logs (e.g. "firehose", "stdout")
    fn kind(&self) -> &str;

    /// Deliver one batch to `destination`
    ///
    /// `records` already respects the stream's count and byte ceilings.
    async fn deliver_batch(
        &self,
        destination: &str,
        records: &[Record],
    ) -> Result<Vec<RecordOutcome>, DeliveryError>;
}

#[async_trait]
impl<T: IngestionSink + ?Sized> IngestionSink for Arc<T> {
    fn kind(&self) -> &str {
        (**self).kind()
    }

    async fn deliver_batch(
        &self,
        destination: &str,
        records: &[Record],
    ) -> Result<Vec<RecordOutcome>, DeliveryError> {
        (**self).deliver_batch(destination, records).await
    }
}

#[async_trait]
impl<T: IngestionSink + ?Sized> IngestionSink for Box<T> {
    fn kind(&self) -> &str {
        (**self).kind()
    }

    async fn deliver_batch(
        &self,
        destination: &str,
        records: &[Record],
    ) -> Result<Vec<RecordOutcome>, DeliveryError> {
        (**self).deliver_batch(destination, records).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_is_failed() {
        assert!(!RecordOutcome::Delivered.is_failed());
        assert!(RecordOutcome::failed("ServiceUnavailable").is_failed());
    }

    #[test]
    fn test_delivery_error_display() {
        let err = DeliveryError::Timeout(Duration::from_secs(5));
        assert!(err.to_string().contains("5s"));

        let err = DeliveryError::transport("connection reset");
        assert_eq!(err.to_string(), "transport error: connection reset");
    }
}
