//! Logship - Sinks
//!
//! Concrete [`IngestionSink`](logship_stream::IngestionSink) implementations
//! for delivery streams.
//!
//! # Available Sinks
//!
//! | Sink | Purpose | Feature |
//! |------|---------|---------|
//! | `null` | Benchmarking (discard all) | - |
//! | `stdout` | Debug output | - |
//! | `firehose` | AWS Kinesis Data Firehose | `firehose` (default) |
//!
//! # Example
//!
//! ```ignore
//! use logship_sinks::stdout::StdoutSink;
//! use logship_stream::{DeliveryStream, StreamConfig};
//!
//! let stream = DeliveryStream::new(StreamConfig::new("debug"), StdoutSink::new())?;
//! ```

// =============================================================================
// Sink implementations (each in its own submodule)
// =============================================================================

/// Null sink - discards all data (for benchmarking)
pub mod null;

/// Stdout sink - writes records verbatim
pub mod stdout;

/// Firehose sink - AWS `PutRecordBatch`
#[cfg(feature = "firehose")]
pub mod firehose;

// =============================================================================
// Shared types
// =============================================================================

mod common;

pub use common::{MetricsSnapshot, SinkError, SinkMetrics};
