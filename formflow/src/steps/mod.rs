//! Step trait and adapters.
//!
//! A step is one element of a field's pipeline. Filters rewrite the field's
//! value and never fail; validators inspect it and may report a
//! [`FieldError`](crate::errors::FieldError).

mod filter;
mod validator;

pub use filter::{filter, FilterStep};
pub use validator::{async_validator, predicate, validator, AsyncValidatorStep, ValidatorStep};

use crate::core::{FieldSlot, RecordView, StepKind};
use crate::errors::FieldError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Result of running one step: `Ok(())` or the field's error.
pub type StepResult = Result<(), FieldError>;

/// What a step knows about its surroundings.
///
/// The record view is the projected input, shared read-only by every
/// pipeline of the same `process` call.
#[derive(Debug, Clone)]
pub struct FieldContext {
    field: Arc<str>,
    record: RecordView,
}

impl FieldContext {
    /// Creates a new field context.
    #[must_use]
    pub fn new(field: impl Into<Arc<str>>, record: RecordView) -> Self {
        Self {
            field: field.into(),
            record,
        }
    }

    /// Returns the name of the field being processed.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the read-only input record.
    #[must_use]
    pub fn record(&self) -> &RecordView {
        &self.record
    }

    /// Builds an error for this field.
    #[must_use]
    pub fn error(&self, message: impl Into<String>) -> FieldError {
        FieldError::new(self.field(), message)
    }
}

/// Trait for pipeline steps.
#[async_trait]
pub trait Step: Send + Sync + Debug {
    /// Returns the name of the step.
    fn name(&self) -> &str;

    /// Returns whether this step filters or validates.
    fn kind(&self) -> StepKind;

    /// Runs the step against the field's slot.
    ///
    /// # Arguments
    ///
    /// * `slot` - The field's working value; only filters write to it
    /// * `ctx` - The field name and a read-only view of the input record
    async fn apply(&self, slot: &mut FieldSlot, ctx: &FieldContext) -> StepResult;
}

/// A step that does nothing.
#[derive(Debug, Clone)]
pub struct PassThroughStep {
    name: String,
}

impl PassThroughStep {
    /// Creates a new pass-through step.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Step for PassThroughStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StepKind {
        StepKind::Filter
    }

    async fn apply(&self, _slot: &mut FieldSlot, _ctx: &FieldContext) -> StepResult {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_pass_through_leaves_slot_untouched() {
        let step = PassThroughStep::new("noop");
        let ctx = FieldContext::new("name", RecordView::default());
        let mut slot = FieldSlot::new(Some(json!(" x ")));

        assert_eq!(step.name(), "noop");
        assert_eq!(step.kind(), StepKind::Filter);
        assert!(step.apply(&mut slot, &ctx).await.is_ok());
        assert_eq!(slot.value(), Some(&json!(" x ")));
    }

    #[test]
    fn test_context_error_is_bound_to_field() {
        let ctx = FieldContext::new("email", RecordView::default());
        let err = ctx.error("Bad email");
        assert_eq!(err, FieldError::new("email", "Bad email"));
    }
}
