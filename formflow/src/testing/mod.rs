//! Testing utilities for formflow.
//!
//! This module provides:
//! - Reference filters and validators
//! - Mock steps
//! - Assertions for form outcomes

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_errors, assert_field_value, assert_invalid, assert_valid};
pub use fixtures::{
    default_value, equals_field, is_int, length_between, matches, not_empty, to_lower, trim,
};
pub use mocks::{CountingStep, RecordingStep, SlowStep};
