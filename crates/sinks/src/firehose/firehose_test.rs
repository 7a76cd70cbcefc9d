//! Tests for the Firehose sink

use super::*;
use aws_sdk_firehose::types::PutRecordBatchResponseEntry;

fn ok_entry(id: &str) -> PutRecordBatchResponseEntry {
    PutRecordBatchResponseEntry::builder().record_id(id).build()
}

fn failed_entry(code: &str, message: &str) -> PutRecordBatchResponseEntry {
    PutRecordBatchResponseEntry::builder()
        .error_code(code)
        .error_message(message)
        .build()
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_defaults() {
    let config = FirehoseSinkConfig::default();

    assert_eq!(config.region, "us-east-1");
    assert!(config.endpoint_url.is_none());
    assert!(config.access_key_id.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_builders() {
    let config = FirehoseSinkConfig::new("eu-west-1")
        .with_endpoint_url("http://localhost:4566")
        .with_credentials("AKIDEXAMPLE", "secret")
        .with_session_token("token");

    assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:4566"));
    assert_eq!(config.access_key_id.as_deref(), Some("AKIDEXAMPLE"));
    assert_eq!(config.session_token.as_deref(), Some("token"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_rejects_empty_region() {
    let err = FirehoseSinkConfig::new(" ").validate().unwrap_err();
    assert!(err.to_string().contains("region"));
}

#[test]
fn test_config_rejects_half_credentials() {
    let mut config = FirehoseSinkConfig::new("us-east-1");
    config.access_key_id = Some("AKIDEXAMPLE".into());

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("secret_access_key"));
}

#[test]
fn test_config_debug_redacts_secrets() {
    let config = FirehoseSinkConfig::new("us-east-1").with_credentials("AKIDEXAMPLE", "hunter2");
    let debug = format!("{config:?}");

    assert!(debug.contains("AKIDEXAMPLE"));
    assert!(debug.contains("<redacted>"));
    assert!(!debug.contains("hunter2"));
}

// ============================================================================
// Response mapping
// ============================================================================

#[test]
fn test_zero_failed_count_means_all_delivered() {
    let entries = vec![ok_entry("1"), ok_entry("2")];
    assert!(outcomes_from_entries(0, &entries).is_empty());
}

#[test]
fn test_failed_entries_carry_code_and_message() {
    let entries = vec![
        ok_entry("1"),
        failed_entry("ServiceUnavailableException", "Slow down."),
        ok_entry("3"),
    ];

    let outcomes = outcomes_from_entries(1, &entries);

    assert_eq!(
        outcomes,
        vec![
            RecordOutcome::Delivered,
            RecordOutcome::failed("ServiceUnavailableException: Slow down."),
            RecordOutcome::Delivered,
        ]
    );
}

#[test]
fn test_failed_entry_without_message() {
    let entry = PutRecordBatchResponseEntry::builder()
        .error_code("InternalFailure")
        .build();

    let outcomes = outcomes_from_entries(1, &[entry]);

    assert_eq!(outcomes, vec![RecordOutcome::failed("InternalFailure: no message")]);
}

#[test]
fn test_records_are_copied_in_order() {
    let records = vec![Record::from("first"), Record::from("second")];

    let converted = to_firehose_records(&records).unwrap();

    assert_eq!(converted.len(), 2);
    assert_eq!(converted[0].data().as_ref(), b"first");
    assert_eq!(converted[1].data().as_ref(), b"second");
}

// ============================================================================
// Error classification
// ============================================================================

#[test]
fn test_auth_codes_are_unauthorized() {
    let err = classify_service_error(Some("AccessDeniedException"), "no firehose:PutRecordBatch");
    assert!(matches!(err, DeliveryError::Unauthorized(_)));
    assert!(err.to_string().contains("AccessDeniedException"));
}

#[test]
fn test_unknown_stream_is_rejected() {
    let err = classify_service_error(Some("ResourceNotFoundException"), "stream not found");
    assert!(matches!(err, DeliveryError::Rejected(_)));
}

#[test]
fn test_throttling_and_unknown_codes_are_transport() {
    assert!(matches!(
        classify_service_error(Some("ServiceUnavailableException"), "busy"),
        DeliveryError::Transport(_)
    ));
    assert!(matches!(
        classify_service_error(None, "mystery"),
        DeliveryError::Transport(_)
    ));
}

// ============================================================================
// Client
// ============================================================================

#[tokio::test]
async fn test_connect_with_explicit_credentials() {
    let config = FirehoseSinkConfig::new("us-east-1")
        .with_endpoint_url("http://127.0.0.1:4566")
        .with_credentials("AKIDEXAMPLE", "secret");

    let sink = FirehoseSink::connect(config).await.unwrap();

    assert_eq!(sink.kind(), "firehose");
}

#[tokio::test]
async fn test_connect_rejects_invalid_config() {
    let err = FirehoseSink::connect(FirehoseSinkConfig::new(""))
        .await
        .unwrap_err();
    assert!(matches!(err, SinkError::Config(_)));
}
