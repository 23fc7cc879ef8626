//! Reference filters and validators.
//!
//! A handful of common steps for exercising forms in tests and benchmarks.
//! They are not meant as a general-purpose validation library.

use crate::errors::CheckFailed;
use crate::steps::{filter, predicate, validator, Step};
use regex::Regex;
use std::sync::Arc;

/// Strips leading and trailing whitespace.
#[must_use]
pub fn trim() -> Arc<dyn Step> {
    filter("trim", |value, _| value.trim().to_string())
}

/// Lowercases the value.
#[must_use]
pub fn to_lower() -> Arc<dyn Step> {
    filter("to_lower", |value, _| value.to_lowercase())
}

/// Replaces an empty value with `default`.
#[must_use]
pub fn default_value(default: impl Into<String>) -> Arc<dyn Step> {
    let default = default.into();
    filter("default_value", move |value, _| {
        if value.is_empty() {
            default.clone()
        } else {
            value.to_string()
        }
    })
}

/// Fails on the empty string.
#[must_use]
pub fn not_empty(message: impl Into<String>) -> Arc<dyn Step> {
    predicate("not_empty", message, |value, _| !value.is_empty())
}

/// Fails unless the value contains a match for `pattern`.
///
/// # Errors
///
/// Returns an error if `pattern` is not a valid regex.
pub fn matches(pattern: &str, message: impl Into<String>) -> Result<Arc<dyn Step>, regex::Error> {
    let regex = Regex::new(pattern)?;
    Ok(predicate("matches", message, move |value, _| {
        regex.is_match(value)
    }))
}

/// Fails unless the value is between `min` and `max` characters long.
#[must_use]
pub fn length_between(min: usize, max: usize, message: impl Into<String>) -> Arc<dyn Step> {
    validator("length_between", message, move |value, _| {
        let len = value.chars().count();
        if (min..=max).contains(&len) {
            Ok(())
        } else {
            Err(CheckFailed::with_detail(format!(
                "length {len} outside {min}..={max}"
            )))
        }
    })
}

/// Fails unless the value parses as an integer.
#[must_use]
pub fn is_int(message: impl Into<String>) -> Arc<dyn Step> {
    predicate("is_int", message, |value, _| value.parse::<i64>().is_ok())
}

/// Fails unless the value equals another field's input value.
#[must_use]
pub fn equals_field(other: impl Into<String>, message: impl Into<String>) -> Arc<dyn Step> {
    let other = other.into();
    predicate("equals_field", message, move |value, ctx| {
        ctx.record().text(&other) == value
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldSlot, RecordView};
    use crate::steps::FieldContext;
    use serde_json::json;

    async fn run(step: &Arc<dyn Step>, value: &str) -> (bool, String) {
        let mut slot = FieldSlot::new(Some(json!(value)));
        let ctx = FieldContext::new("f", RecordView::default());
        let ok = step.apply(&mut slot, &ctx).await.is_ok();
        (ok, slot.text().into_owned())
    }

    #[tokio::test]
    async fn test_filters() {
        assert_eq!(run(&trim(), "  a b ").await, (true, "a b".to_string()));
        assert_eq!(run(&to_lower(), "MiXed").await, (true, "mixed".to_string()));
        assert_eq!(run(&default_value("n/a"), "").await, (true, "n/a".to_string()));
        assert_eq!(run(&default_value("n/a"), "x").await, (true, "x".to_string()));
    }

    #[tokio::test]
    async fn test_trim_is_idempotent() {
        let (_, once) = run(&trim(), "  42  ").await;
        let (_, twice) = run(&trim(), &once).await;
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_validators() {
        assert!(!run(&not_empty("Empty"), "").await.0);
        assert!(run(&not_empty("Empty"), " ").await.0);

        let digits = matches("[0-9]+", "Bad name").unwrap();
        assert!(run(&digits, "abc42").await.0);
        assert!(!run(&digits, "tester").await.0);

        let len = length_between(3, 5, "Bad length");
        assert!(run(&len, "abc").await.0);
        assert!(run(&len, "héllo").await.0);
        assert!(!run(&len, "ab").await.0);
        assert!(!run(&len, "abcdef").await.0);

        assert!(run(&is_int("NaN"), "-12").await.0);
        assert!(!run(&is_int("NaN"), "1.5").await.0);
    }

    #[test]
    fn test_matches_rejects_bad_pattern() {
        assert!(matches("(", "never").is_err());
    }

    #[tokio::test]
    async fn test_equals_field() {
        let input = json!({"password": "hunter2", "confirm": "hunter2"});
        let view = RecordView::project(input.as_object().unwrap(), ["password", "confirm"]);
        let step = equals_field("password", "Passwords differ");

        let ctx = FieldContext::new("confirm", view.clone());
        assert!(step.apply(&mut view.slot("confirm"), &ctx).await.is_ok());

        let mut wrong = FieldSlot::new(Some(json!("other")));
        assert!(step.apply(&mut wrong, &ctx).await.is_err());
    }
}
