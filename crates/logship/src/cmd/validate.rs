//! Validate command - check a config file and print the effective settings
//!
//! # Usage
//!
//! ```bash
//! logship validate --config logship.toml
//! ```

use anyhow::{Context, Result};
use logship_config::{Config, SinkSettings};

pub fn run(config: &Config) -> Result<()> {
    let stream = config.stream.to_stream_config();
    stream.validate().context("stream settings rejected")?;

    print!("{}", render(config));
    Ok(())
}

/// Human-readable summary of the effective configuration
fn render(config: &Config) -> String {
    let s = &config.stream;
    let mut out = String::new();

    out.push_str("Configuration OK\n\n");
    out.push_str(&format!("  log level           {}\n", config.log.level));
    out.push_str(&format!("  sink                {}\n", config.sink.kind()));
    if let SinkSettings::Firehose(fh) = &config.sink {
        out.push_str(&format!("  region              {}\n", fh.region));
        if let Some(endpoint) = &fh.endpoint_url {
            out.push_str(&format!("  endpoint            {endpoint}\n"));
        }
        let credentials = if fh.access_key_id.is_some() {
            "static"
        } else {
            "default chain"
        };
        out.push_str(&format!("  credentials         {credentials}\n"));
    }
    out.push_str(&format!("  destination         {}\n", s.destination));
    out.push_str(&format!("  max batch records   {}\n", s.max_batch_records));
    out.push_str(&format!("  max batch bytes     {}\n", s.max_batch_bytes));
    out.push_str(&format!("  max record bytes    {}\n", s.max_record_bytes));
    let interval = if s.flush_interval.is_zero() {
        "disabled".to_string()
    } else {
        format!("{:?}", s.flush_interval)
    };
    out.push_str(&format!("  flush interval      {interval}\n"));
    out.push_str(&format!("  delivery timeout    {:?}\n", s.delivery_timeout));
    out.push_str(&format!(
        "  shutdown            {:?} / {} attempts / {:?} between\n",
        s.shutdown_timeout, s.shutdown_max_attempts, s.shutdown_retry_interval
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_render_defaults() {
        let out = render(&Config::default());

        assert!(out.starts_with("Configuration OK"));
        assert!(out.contains("sink                stdout"));
        assert!(out.contains("destination         logship"));
        assert!(out.contains("flush interval      1s"));
    }

    #[test]
    fn test_render_firehose_hides_secrets() {
        let config = Config::from_str(
            r#"
[stream]
flush_interval = "0s"

[sink]
type = "firehose"
region = "eu-west-1"
access_key_id = "AKIDEXAMPLE"
secret_access_key = "hunter2"
"#,
        )
        .unwrap();

        let out = render(&config);

        assert!(out.contains("region              eu-west-1"));
        assert!(out.contains("credentials         static"));
        assert!(out.contains("flush interval      disabled"));
        assert!(!out.contains("hunter2"));
    }

    #[test]
    fn test_run_accepts_default_config() {
        assert!(run(&Config::default()).is_ok());
    }
}
