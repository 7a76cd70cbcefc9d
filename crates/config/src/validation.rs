//! Configuration validation
//!
//! Validates config consistency:
//! - The stream has a destination
//! - Batch limits leave room for at least one record
//! - Timeouts and retry counts are usable
//! - Firehose credentials are either complete or absent

use logship_stream::StreamError;

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::sink::{FirehoseSettings, SinkSettings};
use crate::stream::StreamSettings;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_stream(&config.stream)?;
    validate_sink(&config.sink)?;
    Ok(())
}

/// Validate stream settings
///
/// The rules are the runtime stream's own, so a file that passes here
/// never fails at stream construction.
fn validate_stream(stream: &StreamSettings) -> Result<()> {
    match stream.to_stream_config().validate() {
        Ok(()) => Ok(()),
        Err(StreamError::InvalidConfig {
            field: "destination",
            ..
        }) => Err(ConfigError::missing_field("stream", "destination")),
        Err(StreamError::InvalidConfig { field, message }) => {
            Err(ConfigError::invalid_value("stream", field, message))
        }
        Err(other) => Err(ConfigError::invalid_value("stream", "stream", other.to_string())),
    }
}

/// Validate the selected sink
fn validate_sink(sink: &SinkSettings) -> Result<()> {
    match sink {
        SinkSettings::Stdout | SinkSettings::Null => Ok(()),
        SinkSettings::Firehose(firehose) => validate_firehose(firehose),
    }
}

fn validate_firehose(firehose: &FirehoseSettings) -> Result<()> {
    if firehose.region.trim().is_empty() {
        return Err(ConfigError::missing_field("sink", "region"));
    }

    match (&firehose.access_key_id, &firehose.secret_access_key) {
        (Some(_), None) => Err(ConfigError::missing_field("sink", "secret_access_key")),
        (None, Some(_)) => Err(ConfigError::missing_field("sink", "access_key_id")),
        _ => Ok(()),
    }
}
