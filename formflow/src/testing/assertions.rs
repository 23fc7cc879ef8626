//! Test assertions for form outcomes.

use crate::core::{FormOutcome, Record};
use crate::errors::FieldError;

/// Asserts that the outcome is valid and returns the cleaned record.
#[track_caller]
pub fn assert_valid(outcome: &FormOutcome) -> &Record {
    match outcome {
        FormOutcome::Valid(record) => record,
        FormOutcome::Invalid(errors) => panic!("Expected a valid outcome, got errors: {errors:?}"),
    }
}

/// Asserts that the outcome is invalid and returns the errors.
#[track_caller]
pub fn assert_invalid(outcome: &FormOutcome) -> &[FieldError] {
    match outcome {
        FormOutcome::Invalid(errors) => errors,
        FormOutcome::Valid(record) => panic!("Expected errors, got a valid record: {record:?}"),
    }
}

/// Asserts the exact `(field, message)` errors, in order.
#[track_caller]
pub fn assert_errors(outcome: &FormOutcome, expected: &[(&str, &str)]) {
    let actual: Vec<(&str, &str)> = assert_invalid(outcome)
        .iter()
        .map(|e| (e.field.as_str(), e.message.as_str()))
        .collect();
    assert_eq!(actual, expected, "Unexpected field errors");
}

/// Asserts that a valid outcome holds `expected` for `field`.
#[track_caller]
pub fn assert_field_value(outcome: &FormOutcome, field: &str, expected: &serde_json::Value) {
    let record = assert_valid(outcome);
    let actual = record.get(field);
    assert_eq!(
        actual,
        Some(expected),
        "Expected value {expected:?} for field '{field}', got {actual:?}"
    );
}
