//! Form execution configuration.

use crate::errors::FormError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable selecting the execution mode.
pub const ENV_EXECUTION_MODE: &str = "FORMFLOW_EXECUTION_MODE";
/// Environment variable holding the per-pipeline deadline in milliseconds.
pub const ENV_PIPELINE_TIMEOUT_MS: &str = "FORMFLOW_PIPELINE_TIMEOUT_MS";
/// Environment variable toggling lifecycle events.
pub const ENV_EMIT_EVENTS: &str = "FORMFLOW_EMIT_EVENTS";

/// How field pipelines are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// All pipelines are polled together on the calling task and interleave
    /// at step await points.
    #[default]
    Interleaved,
    /// Each pipeline runs as its own tokio task.
    Spawned,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interleaved => write!(f, "interleaved"),
            Self::Spawned => write!(f, "spawned"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interleaved" => Ok(Self::Interleaved),
            "spawned" => Ok(Self::Spawned),
            other => Err(FormError::Config(format!(
                "unknown execution mode '{other}' (expected 'interleaved' or 'spawned')"
            ))),
        }
    }
}

/// Configuration for processing a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormConfig {
    /// How pipelines are scheduled.
    #[serde(default)]
    pub execution_mode: ExecutionMode,
    /// Deadline for each field's pipeline; `None` waits forever.
    #[serde(default)]
    pub pipeline_timeout_ms: Option<u64>,
    /// Whether lifecycle events are sent to the event sink.
    #[serde(default = "default_emit_events")]
    pub emit_events: bool,
}

fn default_emit_events() -> bool {
    true
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            execution_mode: ExecutionMode::default(),
            pipeline_timeout_ms: None,
            emit_events: default_emit_events(),
        }
    }
}

impl FormConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads overrides from `FORMFLOW_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, FormError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FormError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(mode) = lookup(ENV_EXECUTION_MODE) {
            config.execution_mode = mode.parse()?;
        }
        if let Some(timeout) = lookup(ENV_PIPELINE_TIMEOUT_MS) {
            let ms = timeout.trim().parse::<u64>().map_err(|e| {
                FormError::Config(format!("{ENV_PIPELINE_TIMEOUT_MS}='{timeout}': {e}"))
            })?;
            config.pipeline_timeout_ms = Some(ms);
        }
        if let Some(emit) = lookup(ENV_EMIT_EVENTS) {
            config.emit_events = match emit.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(FormError::Config(format!(
                        "{ENV_EMIT_EVENTS}='{other}' is not a boolean"
                    )))
                }
            };
        }

        Ok(config)
    }

    /// Sets the execution mode.
    #[must_use]
    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    /// Sets the per-pipeline deadline.
    #[must_use]
    pub fn with_pipeline_timeout(mut self, timeout: Duration) -> Self {
        self.pipeline_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Enables or disables lifecycle events.
    #[must_use]
    pub fn with_events(mut self, emit: bool) -> Self {
        self.emit_events = emit;
        self
    }

    /// Returns the per-pipeline deadline.
    #[must_use]
    pub fn pipeline_timeout(&self) -> Option<Duration> {
        self.pipeline_timeout_ms.map(Duration::from_millis)
    }
}
