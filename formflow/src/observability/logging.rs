//! `tracing-subscriber` setup for binaries and tests that embed formflow.

use crate::errors::FormError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the log output format.
pub const ENV_LOG_FORMAT: &str = "FORMFLOW_LOG_FORMAT";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(FormError::Config(format!("unknown log format '{other}'"))),
        }
    }
}

/// Installs a global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_directive` (e.g.
/// `"formflow=info"`) is used.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(default_directive: &str, format: LogFormat) -> Result<(), FormError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|e| FormError::Config(format!("tracing subscriber: {e}")))
}

/// Like [`init_tracing`], reading the format from `FORMFLOW_LOG_FORMAT`.
///
/// # Errors
///
/// Returns an error for an unknown format or if a subscriber is already
/// installed.
pub fn init_tracing_from_env(default_directive: &str) -> Result<(), FormError> {
    let format = match std::env::var(ENV_LOG_FORMAT) {
        Ok(value) => value.parse()?,
        Err(_) => LogFormat::default(),
    };
    init_tracing(default_directive, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_second_init_fails() {
        // Either this call or an earlier one in the same process installs the
        // subscriber; the next one must be rejected.
        let _ = init_tracing("off", LogFormat::Pretty);
        assert!(matches!(
            init_tracing("off", LogFormat::Json),
            Err(FormError::Config(_))
        ));
    }
}
