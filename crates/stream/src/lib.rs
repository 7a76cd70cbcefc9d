//! Logship - Delivery Stream
//!
//! A byte sink for log output that batches records and ships them to a
//! remote batch-ingestion API (AWS Firehose `PutRecordBatch` or anything
//! shaped like it).
//!
//! # Architecture
//!
//! ```text
//! [Producer] --write_record--> [RecordBuffer] --drain--> [Flusher] --batch--> [IngestionSink]
//!                                    ▲                       │
//!                                    └──── requeue failed ───┘
//! ```
//!
//! - Producers never block on the network. A write copies the payload into
//!   the buffer and returns the full length.
//! - A flush drains up to `max_batch_records` from the head, trims the tail
//!   until the batch fits `max_batch_bytes`, delivers, and puts back every
//!   record the sink did not accept. Delivery is at-least-once.
//! - Flushes are triggered when the buffer reaches the record ceiling, on a
//!   fixed interval, and repeatedly during `close`.
//!
//! # Example
//!
//! ```ignore
//! use logship_stream::{DeliveryStream, StreamConfig};
//!
//! let stream = DeliveryStream::new(StreamConfig::new("app-logs"), sink)?;
//!
//! tracing_subscriber::fmt()
//!     .json()
//!     .with_writer(stream.clone())
//!     .init();
//!
//! // ... on shutdown
//! stream.close().await?;
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod flush;
pub mod metrics;
pub mod record;
pub mod sink;
pub mod stream;
pub mod util;

mod writer;

#[cfg(test)]
mod test_support;

pub use buffer::RecordBuffer;
pub use config::StreamConfig;
pub use error::{Result, StreamError};
pub use flush::FlushOutcome;
pub use metrics::{StreamMetrics, StreamMetricsSnapshot};
pub use record::Record;
pub use sink::{DeliveryError, IngestionSink, RecordOutcome};
pub use stream::{CloseSummary, DeliveryStream, StreamState};
