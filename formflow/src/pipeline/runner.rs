//! Sequential execution of one field's steps.

use crate::core::{FieldOutcome, FieldSlot};
use crate::steps::{FieldContext, Step};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Runs `steps` in order against one field's slot.
///
/// Stops at the first step that reports an error; later steps never run.
/// The returned outcome carries the slot's final value, an error list that
/// is either empty or holds exactly that first error, and the number of
/// steps that ran. Errors are always keyed to `ctx.field()`, whatever field
/// name the step put on them.
pub async fn run_pipeline(
    ctx: &FieldContext,
    steps: &[Arc<dyn Step>],
    mut slot: FieldSlot,
) -> FieldOutcome {
    let start = Instant::now();

    for (index, step) in steps.iter().enumerate() {
        match step.apply(&mut slot, ctx).await {
            Ok(()) => {
                debug!(
                    field = ctx.field(),
                    step = step.name(),
                    kind = %step.kind(),
                    position = index,
                    "Step completed"
                );
            }
            Err(error) => {
                debug!(
                    field = ctx.field(),
                    step = step.name(),
                    position = index,
                    message = %error.message,
                    "Step failed; skipping remaining steps"
                );
                return FieldOutcome::invalid(
                    ctx.field(),
                    error.message,
                    slot.into_value(),
                    index + 1,
                )
                .with_duration_ms(start.elapsed().as_secs_f64() * 1000.0);
            }
        }
    }

    FieldOutcome::valid(ctx.field(), slot.into_value(), steps.len())
        .with_duration_ms(start.elapsed().as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RecordView, StepKind};
    use crate::errors::FieldError;
    use crate::steps::{filter, predicate, StepResult};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx(field: &str) -> FieldContext {
        FieldContext::new(field, RecordView::default())
    }

    #[tokio::test]
    async fn test_all_steps_pass() {
        let steps = vec![
            filter("trim", |v, _| v.trim().to_string()),
            predicate("not_empty", "Empty name", |v, _| !v.is_empty()),
        ];

        let outcome = run_pipeline(&ctx("name"), &steps, FieldSlot::new(Some(json!(" 42 ")))).await;

        assert!(outcome.is_valid());
        assert_eq!(outcome.value, json!("42"));
        assert_eq!(outcome.steps_run, 2);
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn test_short_circuits_on_first_failure() {
        let after = Arc::new(AtomicUsize::new(0));
        let counter = after.clone();

        let steps = vec![
            filter("trim", |v, _| v.trim().to_string()),
            predicate("not_empty", "Empty text", |v, _| !v.is_empty()),
            predicate("len", "Bad text length", |v, _| v.len() >= 30),
            filter("count", move |v, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                v.to_string()
            }),
            predicate("never", "Unreachable", |_, _| false),
        ];

        let outcome =
            run_pipeline(&ctx("text"), &steps, FieldSlot::new(Some(json!("short")))).await;

        assert_eq!(outcome.errors, vec![FieldError::new("text", "Bad text length")]);
        assert_eq!(outcome.steps_run, 3);
        assert_eq!(after.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_steps_run_in_declared_order() {
        let steps = vec![
            filter("a", |v, _| format!("{v}a")),
            filter("b", |v, _| format!("{v}b")),
            filter("c", |v, _| format!("{v}c")),
        ];

        let outcome = run_pipeline(&ctx("f"), &steps, FieldSlot::new(None)).await;
        assert_eq!(outcome.value, json!("abc"));
    }

    #[tokio::test]
    async fn test_empty_pipeline_keeps_value() {
        let outcome = run_pipeline(&ctx("age"), &[], FieldSlot::new(Some(json!(30)))).await;
        assert!(outcome.is_valid());
        assert_eq!(outcome.value, json!(30));
        assert_eq!(outcome.steps_run, 0);

        let absent = run_pipeline(&ctx("age"), &[], FieldSlot::new(None)).await;
        assert_eq!(absent.value, Value::Null);
    }

    #[derive(Debug)]
    struct MislabeledStep;

    #[async_trait]
    impl Step for MislabeledStep {
        fn name(&self) -> &str {
            "mislabeled"
        }

        fn kind(&self) -> StepKind {
            StepKind::Validator
        }

        async fn apply(&self, _slot: &mut FieldSlot, _ctx: &FieldContext) -> StepResult {
            Err(FieldError::new("other", "Wrong key"))
        }
    }

    #[tokio::test]
    async fn test_error_is_keyed_to_own_field() {
        let steps: Vec<Arc<dyn Step>> = vec![Arc::new(MislabeledStep)];

        let outcome = run_pipeline(&ctx("mine"), &steps, FieldSlot::new(None)).await;

        assert_eq!(outcome.field, "mine");
        assert_eq!(outcome.errors, vec![FieldError::new("mine", "Wrong key")]);
    }
}
