//! Record buffer - ordered, mutex-guarded pending records
//!
//! Insertion order is arrival order. Records that come back from a failed
//! or trimmed delivery attempt are pushed to the front, so they go out
//! before anything that arrived while they were in flight.
//!
//! A sealed buffer refuses appends but still takes requeued records, so a
//! drain in progress can finish without racing late producers.
//!
//! Every method takes the lock for a single short mutation. The lock is
//! never held across an `.await` and never while logging, so producers only
//! ever contend with other in-memory operations.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::record::Record;

/// In-memory queue of records waiting for delivery
#[derive(Debug, Default)]
pub struct RecordBuffer {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    records: VecDeque<Record>,
    bytes: usize,
    sealed: bool,
}

impl RecordBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record at the tail
    ///
    /// Returns the buffer length after the insert so the caller can decide
    /// on a capacity flush without taking the lock again, or `None` if the
    /// buffer is sealed and the record was not stored.
    pub fn append(&self, record: Record) -> Option<usize> {
        let mut inner = self.inner.lock();
        if inner.sealed {
            return None;
        }
        inner.bytes += record.len();
        inner.records.push_back(record);
        Some(inner.records.len())
    }

    /// Refuse all further appends
    pub fn seal(&self) {
        self.inner.lock().sealed = true;
    }

    /// Check if appends are refused
    pub fn is_sealed(&self) -> bool {
        self.inner.lock().sealed
    }

    /// Remove and return up to `max` records from the head
    ///
    /// Returns an empty vec when the buffer is empty.
    pub fn drain_candidate(&self, max: usize) -> Vec<Record> {
        let mut inner = self.inner.lock();
        let take = max.min(inner.records.len());
        let drained: Vec<Record> = inner.records.drain(..take).collect();
        inner.bytes -= crate::record::total_bytes(&drained);
        drained
    }

    /// Reinsert records at the head, keeping their relative order
    pub fn requeue_front(&self, records: Vec<Record>) {
        if records.is_empty() {
            return;
        }

        let mut inner = self.inner.lock();
        inner.bytes += crate::record::total_bytes(&records);
        for record in records.into_iter().rev() {
            inner.records.push_front(record);
        }
    }

    /// Number of buffered records
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// Check if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    /// Sum of buffered payload sizes
    pub fn byte_len(&self) -> usize {
        self.inner.lock().bytes
    }

    /// Copy of the buffered records, head first
    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Vec<Record> {
        self.inner.lock().records.iter().cloned().collect()
    }
}

#[cfg(test)]
#[path = "buffer_test.rs"]
mod buffer_test;
