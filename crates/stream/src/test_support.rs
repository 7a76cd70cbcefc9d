//! Scriptable sink used by the unit tests

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::record::Record;
use crate::sink::{DeliveryError, IngestionSink, RecordOutcome};

/// Scripted reply for one delivery call
pub(crate) enum Reply {
    /// Accept everything (empty outcome list)
    Accept,
    /// Fail the call at transport level
    Transport,
    /// Mark the records at these batch positions failed
    FailAt(Vec<usize>),
    /// Return exactly these outcomes
    Outcomes(Vec<RecordOutcome>),
    /// Sleep before accepting
    Stall(Duration),
}

/// Sink that records every batch and answers from a script
///
/// Once the script runs out it falls back to `default`.
pub(crate) struct MockSink {
    script: Mutex<VecDeque<Reply>>,
    default_transport_error: bool,
    batches: Mutex<Vec<Vec<Vec<u8>>>>,
}

impl MockSink {
    pub(crate) fn accepting() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_transport_error: false,
            batches: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            default_transport_error: true,
            ..Self::accepting()
        }
    }

    pub(crate) fn scripted(replies: Vec<Reply>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            ..Self::accepting()
        }
    }

    /// Every batch passed to the sink, including failed calls
    pub(crate) fn batches(&self) -> Vec<Vec<Vec<u8>>> {
        self.batches.lock().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.batches.lock().len()
    }

    /// Payloads from every call, flattened in call order
    pub(crate) fn payloads(&self) -> Vec<Vec<u8>> {
        self.batches.lock().iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl IngestionSink for MockSink {
    fn kind(&self) -> &str {
        "mock"
    }

    async fn deliver_batch(
        &self,
        _destination: &str,
        records: &[Record],
    ) -> Result<Vec<RecordOutcome>, DeliveryError> {
        self.batches
            .lock()
            .push(records.iter().map(|r| r.as_bytes().to_vec()).collect());

        let reply = self.script.lock().pop_front();
        match reply {
            Some(Reply::Accept) => Ok(Vec::new()),
            Some(Reply::Transport) => Err(DeliveryError::transport("simulated outage")),
            Some(Reply::FailAt(positions)) => Ok((0..records.len())
                .map(|i| {
                    if positions.contains(&i) {
                        RecordOutcome::failed("ServiceUnavailableException")
                    } else {
                        RecordOutcome::Delivered
                    }
                })
                .collect()),
            Some(Reply::Outcomes(outcomes)) => Ok(outcomes),
            Some(Reply::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(Vec::new())
            }
            None if self.default_transport_error => {
                Err(DeliveryError::transport("simulated outage"))
            }
            None => Ok(Vec::new()),
        }
    }
}
