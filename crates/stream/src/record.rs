//! Record - one opaque payload accepted by the stream
//!
//! The stream never looks inside a record. Whatever the producer wrote
//! (usually one serialized log line) is shipped byte-for-byte.

use bytes::Bytes;

/// An immutable byte payload owned by the stream until it is delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    data: Bytes,
}

impl Record {
    /// Create a record from owned bytes
    #[inline]
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Create a record by copying the caller's bytes
    ///
    /// The write path uses this so producers are free to reuse their
    /// buffer as soon as the write returns.
    #[inline]
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self {
            data: Bytes::copy_from_slice(data),
        }
    }

    /// Payload size in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the payload
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the record, returning the payload
    #[inline]
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl From<&'static str> for Record {
    fn from(s: &'static str) -> Self {
        Self::new(Bytes::from_static(s.as_bytes()))
    }
}

impl From<Vec<u8>> for Record {
    fn from(v: Vec<u8>) -> Self {
        Self::new(v)
    }
}

/// Total payload size of a slice of records
#[inline]
pub fn total_bytes(records: &[Record]) -> usize {
    records.iter().map(Record::len).sum()
}
