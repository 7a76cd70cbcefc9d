//! Tests for the delivery stream scheduler

use super::*;
use crate::test_support::{MockSink, Reply};
use std::time::Duration;

fn config(max_batch_records: usize) -> StreamConfig {
    StreamConfig::new("test-stream")
        .with_max_batch_records(max_batch_records)
        .with_flush_interval(Duration::ZERO)
        .with_shutdown_retry_interval(Duration::from_millis(1))
}

fn open(config: StreamConfig, sink: MockSink) -> (DeliveryStream, Arc<MockSink>) {
    let sink = Arc::new(sink);
    let stream = DeliveryStream::new(config, Arc::clone(&sink)).unwrap();
    (stream, sink)
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_requires_runtime() {
    let err = DeliveryStream::new(config(10), MockSink::accepting()).unwrap_err();
    assert!(matches!(err, StreamError::NoRuntime));
}

#[tokio::test]
async fn test_new_rejects_invalid_config() {
    let err = DeliveryStream::new(config(0), MockSink::accepting()).unwrap_err();
    assert!(matches!(
        err,
        StreamError::InvalidConfig {
            field: "max_batch_records",
            ..
        }
    ));
}

#[tokio::test]
async fn test_new_stream_is_open_and_empty() {
    let (stream, _) = open(config(10), MockSink::accepting());

    assert_eq!(stream.state(), StreamState::Open);
    assert_eq!(stream.buffered_records(), 0);
    assert_eq!(stream.config().destination, "test-stream");
}

// ============================================================================
// write_record
// ============================================================================

#[tokio::test]
async fn test_write_buffers_and_reports_length() {
    let (stream, sink) = open(config(10), MockSink::accepting());

    assert_eq!(stream.write_record(b"hello"), 5);
    assert_eq!(stream.write_record(b""), 0);

    assert_eq!(stream.buffered_records(), 2);
    assert_eq!(stream.buffered_bytes(), 5);
    assert_eq!(sink.calls(), 0);
    assert_eq!(stream.metrics().records_accepted, 2);
}

#[tokio::test]
async fn test_oversized_record_dropped_but_reported_written() {
    let (stream, _) = open(
        config(10)
            .with_max_record_bytes(8)
            .with_max_batch_bytes(64),
        MockSink::accepting(),
    );

    assert_eq!(stream.write_record(&[b'x'; 9]), 9);
    assert_eq!(stream.write_record(&[b'x'; 8]), 8);

    assert_eq!(stream.buffered_records(), 1);
    let m = stream.metrics();
    assert_eq!(m.records_oversized, 1);
    assert_eq!(m.records_accepted, 1);
}

#[tokio::test]
async fn test_clones_share_one_buffer() {
    let (stream, _) = open(config(10), MockSink::accepting());
    let other = stream.clone();

    stream.write_record(b"a");
    other.write_record(b"b");

    assert_eq!(stream.buffered_records(), 2);
}

// ============================================================================
// Triggers
// ============================================================================

#[tokio::test]
async fn test_capacity_trigger_flushes_full_batch() {
    let (stream, sink) = open(config(3), MockSink::accepting());

    stream.write_record(b"a");
    stream.write_record(b"b");
    assert_eq!(sink.calls(), 0);

    stream.write_record(b"c");
    wait_until(|| sink.calls() == 1).await;

    assert_eq!(
        sink.batches()[0],
        vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
    );
    wait_until(|| stream.buffered_records() == 0).await;
}

#[tokio::test]
async fn test_capacity_trigger_keeps_flushing_while_full() {
    let (stream, sink) = open(config(2), MockSink::accepting());

    // No await between writes: one capacity task must empty all full batches
    for i in 0..7 {
        stream.write_record(format!("r{i}").as_bytes());
    }
    wait_until(|| stream.buffered_records() < 2).await;

    assert_eq!(sink.payloads().len(), 6);
    assert_eq!(stream.buffered_records(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_capacity_trigger_never_strands_a_full_batch() {
    for _ in 0..20 {
        let (stream, sink) = open(config(10), MockSink::accepting());

        let writers: Vec<_> = (0..4)
            .map(|_| {
                let stream = stream.clone();
                std::thread::spawn(move || {
                    for _ in 0..503 {
                        stream.write_record(b"x");
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        // No timer: only the capacity trigger can bring this below the ceiling
        wait_until(|| stream.buffered_records() < 10).await;
        assert_eq!(sink.payloads().len() + stream.buffered_records(), 2012);
    }
}

#[tokio::test(start_paused = true)]
async fn test_periodic_flush_delivers_partial_batch() {
    let (stream, sink) = open(
        config(100).with_flush_interval(Duration::from_secs(1)),
        MockSink::accepting(),
    );

    stream.write_record(b"lonely");
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(sink.calls(), 0);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(sink.batches(), vec![vec![b"lonely".to_vec()]]);
    assert_eq!(stream.buffered_records(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_zero_interval_disables_periodic_flush() {
    let (stream, sink) = open(config(100), MockSink::accepting());

    stream.write_record(b"waiting");
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(sink.calls(), 0);
    assert_eq!(stream.buffered_records(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_flush_retries_after_transport_failure() {
    let (stream, sink) = open(
        config(100).with_flush_interval(Duration::from_secs(1)),
        MockSink::scripted(vec![Reply::Transport]),
    );

    stream.write_record(b"retry-me");
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(stream.buffered_records(), 1);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(stream.buffered_records(), 0);
    assert_eq!(sink.calls(), 2);
    assert_eq!(stream.metrics().transport_failures, 1);
}

#[tokio::test]
async fn test_manual_flush() {
    let (stream, sink) = open(config(100), MockSink::accepting());
    stream.write_record(b"now");

    let outcome = stream.flush_batch().await;

    assert_eq!(outcome.delivered(), 1);
    assert_eq!(sink.calls(), 1);
}

// ============================================================================
// close
// ============================================================================

#[tokio::test]
async fn test_close_drains_everything_in_order() {
    let (stream, sink) = open(config(500), MockSink::accepting());

    let expected: Vec<Vec<u8>> = (0..1200).map(|i| format!("r{i}").into_bytes()).collect();
    for payload in &expected {
        stream.write_record(payload);
    }

    let summary = stream.close().await.unwrap();

    assert_eq!(summary.abandoned, 0);
    assert_eq!(stream.state(), StreamState::Closed);
    assert_eq!(sink.payloads(), expected);
    assert!(sink.batches().iter().all(|b| b.len() <= 500));
}

#[tokio::test]
async fn test_close_on_empty_stream() {
    let (stream, sink) = open(config(10), MockSink::accepting());

    let summary = stream.close().await.unwrap();

    assert_eq!(summary, CloseSummary::default());
    assert_eq!(sink.calls(), 0);
}

#[tokio::test]
async fn test_close_retries_failed_records() {
    let (stream, sink) = open(
        config(10),
        MockSink::scripted(vec![Reply::FailAt(vec![0])]),
    );
    stream.write_record(b"a");
    stream.write_record(b"b");

    let summary = stream.close().await.unwrap();

    assert_eq!(summary.delivered, 2);
    assert_eq!(summary.attempts, 2);
    assert_eq!(summary.abandoned, 0);
    assert_eq!(sink.batches()[1], vec![b"a".to_vec()]);
}

#[tokio::test(start_paused = true)]
async fn test_close_gives_up_after_max_attempts() {
    let (stream, sink) = open(
        config(10).with_shutdown_max_attempts(3),
        MockSink::failing(),
    );
    stream.write_record(b"stuck");

    let summary = stream.close().await.unwrap();

    assert_eq!(summary.attempts, 3);
    assert_eq!(summary.delivered, 0);
    assert_eq!(summary.abandoned, 1);
    assert_eq!(sink.calls(), 3);
    assert_eq!(stream.state(), StreamState::Closed);
    assert_eq!(stream.buffered_records(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_close_respects_shutdown_timeout() {
    let (stream, _) = open(
        config(10)
            .with_shutdown_max_attempts(1000)
            .with_shutdown_timeout(Duration::from_millis(50))
            .with_shutdown_retry_interval(Duration::from_millis(20)),
        MockSink::failing(),
    );
    stream.write_record(b"stuck");

    let summary = stream.close().await.unwrap();

    assert_eq!(summary.abandoned, 1);
    assert!(summary.attempts >= 1 && summary.attempts < 1000);
}

#[tokio::test]
async fn test_second_close_is_rejected() {
    let (stream, _) = open(config(10), MockSink::accepting());

    stream.close().await.unwrap();
    let err = stream.close().await.unwrap_err();

    assert!(matches!(err, StreamError::AlreadyClosed));
}

#[tokio::test]
async fn test_write_after_close_is_dropped() {
    let (stream, sink) = open(config(10), MockSink::accepting());
    stream.close().await.unwrap();

    assert_eq!(stream.write_record(b"late"), 4);

    assert_eq!(stream.buffered_records(), 0);
    assert_eq!(stream.metrics().records_after_close, 1);
    assert_eq!(sink.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_close_stops_ticker() {
    let (stream, sink) = open(
        config(10).with_flush_interval(Duration::from_secs(1)),
        MockSink::accepting(),
    );
    stream.close().await.unwrap();

    stream.write_record(b"late");
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(sink.calls(), 0);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_writers_on_plain_threads_deliver_exactly_once() {
    let (stream, sink) = open(config(50), MockSink::accepting());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let stream = stream.clone();
            std::thread::spawn(move || {
                for i in 0..250 {
                    stream.write_record(format!("t{t}-{i}").as_bytes());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let summary = stream.close().await.unwrap();
    assert_eq!(summary.abandoned, 0);

    let mut payloads = sink.payloads();
    assert_eq!(payloads.len(), 1000);
    payloads.sort();
    payloads.dedup();
    assert_eq!(payloads.len(), 1000);
    assert_eq!(stream.metrics().records_delivered, 1000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_racing_writers_accounts_for_every_record() {
    for _ in 0..50 {
        let (stream, _sink) = open(config(50), MockSink::accepting());
        let stop = Arc::new(AtomicBool::new(false));

        let writers: Vec<_> = (0..3)
            .map(|_| {
                let stream = stream.clone();
                let stop = Arc::clone(&stop);
                std::thread::spawn(move || {
                    let mut written = 0u64;
                    while !stop.load(Ordering::Relaxed) {
                        stream.write_record(b"x");
                        written += 1;
                    }
                    written
                })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(1)).await;
        let summary = stream.close().await.unwrap();
        stop.store(true, Ordering::Relaxed);
        let written: u64 = writers.into_iter().map(|w| w.join().unwrap()).sum();

        let metrics = stream.metrics();
        assert_eq!(summary.abandoned, 0);
        assert_eq!(
            metrics.records_accepted,
            metrics.records_delivered + summary.abandoned as u64
        );
        assert_eq!(metrics.records_accepted + metrics.records_after_close, written);
        assert_eq!(stream.buffered_records(), 0);
    }
}
