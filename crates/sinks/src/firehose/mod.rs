//! Firehose Sink - AWS Kinesis Data Firehose
//!
//! Delivers each batch with a single `PutRecordBatch` call to the delivery
//! stream named by the stream's destination.
//!
//! # Outcome mapping
//!
//! | Firehose answer | Result |
//! |-----------------|--------|
//! | `FailedPutCount == 0` | empty outcome list (all delivered) |
//! | entry with `ErrorCode` | `RecordOutcome::Failed { reason: "<code>: <message>" }` |
//! | entry without `ErrorCode` | `RecordOutcome::Delivered` |
//! | auth error codes | `DeliveryError::Unauthorized` |
//! | unknown stream, invalid argument | `DeliveryError::Rejected` |
//! | anything else | `DeliveryError::Transport` |
//!
//! # Example
//!
//! ```ignore
//! let config = FirehoseSinkConfig::new("eu-west-1");
//! let sink = FirehoseSink::connect(config).await?;
//!
//! let stream = DeliveryStream::new(StreamConfig::new("app-logs"), sink)?;
//! ```

use std::fmt;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_firehose::Client as FirehoseClient;
use aws_sdk_firehose::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_firehose::primitives::Blob;
use aws_sdk_firehose::types::{PutRecordBatchResponseEntry, Record as FirehoseRecord};
use logship_stream::{DeliveryError, IngestionSink, Record, RecordOutcome};
use tracing::{debug, info};

use crate::common::SinkError;

/// Default AWS region
pub const DEFAULT_REGION: &str = "us-east-1";

/// Error codes that mean the caller's identity was refused
const AUTH_ERROR_CODES: &[&str] = &[
    "AccessDeniedException",
    "UnrecognizedClientException",
    "InvalidSignatureException",
    "ExpiredTokenException",
    "MissingAuthenticationTokenException",
];

/// Error codes that mean the request itself is wrong
const REJECTED_ERROR_CODES: &[&str] = &[
    "ResourceNotFoundException",
    "InvalidArgumentException",
    "InvalidKMSResourceException",
    "InvalidSourceException",
];

/// Configuration for the Firehose sink
#[derive(Clone)]
pub struct FirehoseSinkConfig {
    /// AWS region
    pub region: String,

    /// Endpoint override (LocalStack, VPC endpoints)
    pub endpoint_url: Option<String>,

    /// Explicit access key; the default credential chain is used when unset
    pub access_key_id: Option<String>,

    /// Explicit secret key, required with `access_key_id`
    pub secret_access_key: Option<String>,

    /// Optional session token for temporary credentials
    pub session_token: Option<String>,
}

impl FirehoseSinkConfig {
    /// Create a config for `region` using the default credential chain
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
        }
    }

    /// Set endpoint override
    #[must_use]
    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Use explicit static credentials
    #[must_use]
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Set a session token for temporary credentials
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Check the config before touching AWS
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Config` for an empty region or a half-specified
    /// credential pair.
    pub fn validate(&self) -> Result<(), SinkError> {
        if self.region.trim().is_empty() {
            return Err(SinkError::config("firehose region must not be empty"));
        }

        match (&self.access_key_id, &self.secret_access_key) {
            (Some(_), None) => Err(SinkError::config(
                "firehose access_key_id set without secret_access_key",
            )),
            (None, Some(_)) => Err(SinkError::config(
                "firehose secret_access_key set without access_key_id",
            )),
            _ => Ok(()),
        }
    }
}

impl Default for FirehoseSinkConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

impl fmt::Debug for FirehoseSinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirehoseSinkConfig")
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Ingestion sink backed by `PutRecordBatch`
#[derive(Debug, Clone)]
pub struct FirehoseSink {
    client: FirehoseClient,
}

impl FirehoseSink {
    /// Load AWS configuration and build a client
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Config` if the config fails validation.
    pub async fn connect(config: FirehoseSinkConfig) -> Result<Self, SinkError> {
        config.validate()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let creds = aws_sdk_firehose::config::Credentials::new(
                access_key,
                secret_key,
                config.session_token.clone(),
                None,
                "logship-firehose",
            );
            loader = loader.credentials_provider(creds);
        }

        let sdk_config = loader.load().await;
        let mut builder = aws_sdk_firehose::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        info!(
            region = %config.region,
            endpoint = config.endpoint_url.as_deref().unwrap_or("default"),
            explicit_credentials = config.access_key_id.is_some(),
            "firehose sink initialized"
        );

        Ok(Self::from_client(FirehoseClient::from_conf(builder.build())))
    }

    /// Wrap an existing client
    pub fn from_client(client: FirehoseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IngestionSink for FirehoseSink {
    fn kind(&self) -> &str {
        "firehose"
    }

    async fn deliver_batch(
        &self,
        destination: &str,
        records: &[Record],
    ) -> Result<Vec<RecordOutcome>, DeliveryError> {
        let entries = to_firehose_records(records)?;

        let output = self
            .client
            .put_record_batch()
            .delivery_stream_name(destination)
            .set_records(Some(entries))
            .send()
            .await
            .map_err(map_put_error)?;

        debug!(
            destination,
            records = records.len(),
            failed = output.failed_put_count(),
            "PutRecordBatch completed"
        );

        Ok(outcomes_from_entries(
            output.failed_put_count(),
            output.request_responses(),
        ))
    }
}

/// Copy stream records into SDK records
pub(crate) fn to_firehose_records(
    records: &[Record],
) -> Result<Vec<FirehoseRecord>, DeliveryError> {
    records
        .iter()
        .map(|r| {
            FirehoseRecord::builder()
                .data(Blob::new(r.as_bytes()))
                .build()
                .map_err(|e| DeliveryError::Rejected(format!("invalid firehose record: {e}")))
        })
        .collect()
}

/// Per-record outcomes from a `PutRecordBatch` response
pub(crate) fn outcomes_from_entries(
    failed_put_count: i32,
    entries: &[PutRecordBatchResponseEntry],
) -> Vec<RecordOutcome> {
    if failed_put_count == 0 {
        return Vec::new();
    }

    entries
        .iter()
        .map(|entry| match entry.error_code() {
            Some(code) => RecordOutcome::failed(format!(
                "{code}: {}",
                entry.error_message().unwrap_or("no message")
            )),
            None => RecordOutcome::Delivered,
        })
        .collect()
}

/// Map a whole-request failure
fn map_put_error<E, R>(err: SdkError<E, R>) -> DeliveryError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    let full_msg = DisplayErrorContext(&err).to_string();

    match err {
        SdkError::ServiceError(ctx) => {
            let service_err = ctx.into_err();
            classify_service_error(service_err.code(), service_err.message().unwrap_or(&full_msg))
        }
        SdkError::TimeoutError(_) => DeliveryError::transport(format!("request timed out: {full_msg}")),
        _ => DeliveryError::transport(full_msg),
    }
}

/// Sort a service error code into a delivery error kind
pub(crate) fn classify_service_error(code: Option<&str>, message: &str) -> DeliveryError {
    let code_str = code.unwrap_or("Unknown");
    let detail = format!("{code_str}: {message}");

    match code {
        Some(c) if AUTH_ERROR_CODES.contains(&c) => DeliveryError::Unauthorized(detail),
        Some(c) if REJECTED_ERROR_CODES.contains(&c) => DeliveryError::Rejected(detail),
        _ => DeliveryError::Transport(detail),
    }
}

#[cfg(test)]
#[path = "firehose_test.rs"]
mod firehose_test;
