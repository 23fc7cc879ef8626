//! Error types for the formflow framework.
//!
//! Validation failures are data ([`FieldError`]), not faults. The
//! [`FormError`] enum only covers problems with the form definition itself
//! and with orchestrating its pipelines.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for formflow operations.
#[derive(Debug, Error)]
pub enum FormError {
    /// The form definition is invalid.
    #[error("{0}")]
    Definition(#[from] FormDefinitionError),

    /// A step panicked while running a field's pipeline.
    #[error("Pipeline for field '{field}' panicked: {reason}")]
    PipelinePanicked {
        /// The field whose pipeline panicked.
        field: String,
        /// The panic payload, if it was a string.
        reason: String,
    },

    /// A field's pipeline did not finish before the configured deadline.
    #[error("Pipeline for field '{field}' timed out after {timeout_ms}ms")]
    PipelineTimeout {
        /// The field whose pipeline timed out.
        field: String,
        /// The deadline that was exceeded.
        timeout_ms: u64,
    },

    /// A spawned pipeline task could not be joined.
    #[error("Task join error: {0}")]
    Join(String),

    /// The input could not be interpreted as a record.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A configuration value could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FormError {
    /// Returns the field this error is scoped to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::PipelinePanicked { field, .. } | Self::PipelineTimeout { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }
}

/// A validation failure bound to a single field.
///
/// Serializes as a single-entry map `{field: message}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    /// The field that failed validation.
    pub field: String,
    /// The human-readable message supplied when the step was built.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Converts to the `{field: message}` map shape.
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        HashMap::from([(self.field.clone(), self.message.clone())])
    }
}

impl Serialize for FieldError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.message)?;
        map.end()
    }
}

/// Returned by a validator function to signal that its check failed.
///
/// The user-facing message lives on the step; the optional detail is only
/// logged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckFailed {
    /// Optional diagnostic detail.
    pub detail: Option<String>,
}

impl CheckFailed {
    /// Creates a failure with no detail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a failure carrying diagnostic detail.
    #[must_use]
    pub fn with_detail(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
        }
    }
}

impl std::fmt::Display for CheckFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "check failed: {detail}"),
            None => write!(f, "check failed"),
        }
    }
}

impl std::error::Error for CheckFailed {}

/// Metadata about a definition error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "FORM-001-DUPLICATE_FIELD").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }
}

/// Error raised when a form definition is rejected at build time.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct FormDefinitionError {
    /// The error message.
    pub message: String,
    /// The fields involved in the error.
    pub fields: Vec<String>,
    /// Contract error info.
    pub error_info: ContractErrorInfo,
}

impl FormDefinitionError {
    /// A field was declared twice.
    #[must_use]
    pub fn duplicate_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            message: format!("Field '{field}' is declared more than once"),
            error_info: ContractErrorInfo::new(
                "FORM-001-DUPLICATE_FIELD",
                format!("Duplicate declaration of field '{field}'"),
            )
            .with_fix_hint("Use FormBuilder::step to append steps to an existing field."),
            fields: vec![field],
        }
    }

    /// Returns the error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.error_info.code
    }
}
