//! Sink selection
//!
//! Exactly one sink per stream, chosen by `type`.

use serde::Deserialize;

/// Which ingestion sink the stream delivers to
///
/// # Example
///
/// ```toml
/// [sink]
/// type = "firehose"
/// region = "eu-west-1"
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkSettings {
    /// Print records to stdout (default)
    #[default]
    Stdout,

    /// Discard records
    Null,

    /// AWS Kinesis Data Firehose
    Firehose(FirehoseSettings),
}

impl SinkSettings {
    /// Sink type name as written in config
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Null => "null",
            Self::Firehose(_) => "firehose",
        }
    }
}

/// Firehose sink settings
///
/// Credentials come from the default AWS chain unless both keys are set.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FirehoseSettings {
    /// AWS region
    /// Default: us-east-1
    pub region: String,

    /// Endpoint override (LocalStack, VPC endpoints)
    pub endpoint_url: Option<String>,

    /// Static access key
    pub access_key_id: Option<String>,

    /// Static secret key
    pub secret_access_key: Option<String>,

    /// Session token for temporary credentials
    pub session_token: Option<String>,
}

impl Default for FirehoseSettings {
    fn default() -> Self {
        Self {
            region: "us-east-1".into(),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
        }
    }
}

impl std::fmt::Debug for FirehoseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirehoseSettings")
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "<redacted>"))
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
