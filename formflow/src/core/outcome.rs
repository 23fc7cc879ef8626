//! Per-field and aggregate outcomes.

use super::{FieldStatus, Record};
use crate::errors::FieldError;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

/// What one field's pipeline produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldOutcome {
    /// The field name.
    pub field: String,
    /// The field's value after the last executed step.
    pub value: Value,
    /// Empty when valid, otherwise exactly the first failing step's error.
    pub errors: Vec<FieldError>,
    /// Number of steps that ran (including the failing one).
    pub steps_run: usize,
    /// Wall-clock time spent in the pipeline.
    pub duration_ms: f64,
}

impl FieldOutcome {
    /// Creates a valid outcome.
    #[must_use]
    pub fn valid(field: impl Into<String>, value: Value, steps_run: usize) -> Self {
        Self {
            field: field.into(),
            value,
            errors: Vec::new(),
            steps_run,
            duration_ms: 0.0,
        }
    }

    /// Creates an invalid outcome carrying a single error for `field`.
    #[must_use]
    pub fn invalid(
        field: impl Into<String>,
        message: impl Into<String>,
        value: Value,
        steps_run: usize,
    ) -> Self {
        let field = field.into();
        Self {
            errors: vec![FieldError::new(field.clone(), message)],
            field,
            value,
            steps_run,
            duration_ms: 0.0,
        }
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Returns the field status.
    #[must_use]
    pub fn status(&self) -> FieldStatus {
        if self.errors.is_empty() {
            FieldStatus::Valid
        } else {
            FieldStatus::Invalid
        }
    }

    /// Returns true if the field passed every step.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.status().is_valid()
    }
}

/// The single result of processing a record through a form.
///
/// Exactly one of the two shapes is ever produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FormOutcome {
    /// At least one field failed; errors are in field declaration order.
    Invalid(Vec<FieldError>),
    /// Every field passed; the cleaned record holds exactly the declared fields.
    Valid(Record),
}

impl FormOutcome {
    /// Merges per-field outcomes, given in submission order.
    #[must_use]
    pub fn from_fields<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = FieldOutcome>,
    {
        let mut errors = Vec::new();
        let mut record = Record::new();

        for outcome in fields {
            if errors.is_empty() && outcome.errors.is_empty() {
                record.insert(outcome.field, outcome.value);
            } else {
                errors.extend(outcome.errors);
            }
        }

        if errors.is_empty() {
            Self::Valid(record)
        } else {
            Self::Invalid(errors)
        }
    }

    /// Returns true if every field passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Returns the errors, if the form was invalid.
    #[must_use]
    pub fn errors(&self) -> Option<&[FieldError]> {
        match self {
            Self::Invalid(errors) => Some(errors),
            Self::Valid(_) => None,
        }
    }

    /// Returns the cleaned record, if the form was valid.
    #[must_use]
    pub fn record(&self) -> Option<&Record> {
        match self {
            Self::Valid(record) => Some(record),
            Self::Invalid(_) => None,
        }
    }

    /// Splits into the `(errors, result)` pair; exactly one side is `Some`.
    #[must_use]
    pub fn into_parts(self) -> (Option<Vec<FieldError>>, Option<Record>) {
        match self {
            Self::Invalid(errors) => (Some(errors), None),
            Self::Valid(record) => (None, Some(record)),
        }
    }

    /// Converts into a standard `Result`.
    pub fn into_result(self) -> Result<Record, Vec<FieldError>> {
        match self {
            Self::Valid(record) => Ok(record),
            Self::Invalid(errors) => Err(errors),
        }
    }
}

impl Serialize for FormOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::Invalid(errors) => map.serialize_entry("errors", errors)?,
            Self::Valid(record) => map.serialize_entry("result", record)?,
        }
        map.end()
    }
}

/// A detailed account of one `process` call.
#[derive(Debug, Clone, Serialize)]
pub struct FormReport {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// The form name.
    pub form: String,
    /// When processing started.
    pub started_at: DateTime<Utc>,
    /// Total wall-clock time.
    pub duration_ms: f64,
    /// Per-field outcomes in declaration order.
    pub fields: Vec<FieldOutcome>,
    /// The aggregate outcome.
    pub outcome: FormOutcome,
}

impl FormReport {
    /// Returns the outcome for one field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldOutcome> {
        self.fields.iter().find(|f| f.field == name)
    }

    /// Returns the names of fields that failed, in declaration order.
    #[must_use]
    pub fn invalid_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| !f.is_valid())
            .map(|f| f.field.as_str())
            .collect()
    }
}
