//! Fan-out/fan-in of field pipelines.
//!
//! Every declared field gets its own pipeline. All pipelines are started
//! without waiting for one another; the orchestrator then waits for every
//! one of them and collects the outcomes in submission (declaration) order,
//! regardless of which finished first.

use super::runner::run_pipeline;
use super::{ExecutionMode, FormConfig};
use crate::core::{FieldOutcome, RecordView};
use crate::errors::FormError;
use crate::events::EventSink;
use crate::steps::{FieldContext, Step};
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// A declared field and its ordered steps.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// The field name.
    pub name: Arc<str>,
    /// The field's steps in execution order.
    pub steps: Arc<[Arc<dyn Step>]>,
}

impl FieldSpec {
    /// Creates a new field declaration.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, steps: Vec<Arc<dyn Step>>) -> Self {
        Self {
            name: name.into(),
            steps: steps.into(),
        }
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

/// Everything one `process` call needs to run its pipelines.
pub(crate) struct Run<'a> {
    pub run_id: Uuid,
    pub fields: &'a [FieldSpec],
    pub view: RecordView,
    pub config: &'a FormConfig,
    pub sink: Option<Arc<dyn EventSink>>,
}

impl Run<'_> {
    /// Runs every field's pipeline and returns the outcomes in declaration order.
    ///
    /// The first orchestration fault (panic, deadline, join failure) in
    /// declaration order wins; validation failures are not faults.
    pub(crate) async fn execute(self) -> Result<Vec<FieldOutcome>, FormError> {
        let timeout = self.config.pipeline_timeout();

        let results: Vec<Result<FieldOutcome, FormError>> = match self.config.execution_mode {
            ExecutionMode::Interleaved => {
                let pipelines = self.fields.iter().map(|field| {
                    let ctx = FieldContext::new(field.name.clone(), self.view.clone());
                    let slot = self.view.slot(&field.name);
                    let steps = field.steps.clone();
                    let sink = self.sink.clone();
                    let run_id = self.run_id;
                    guarded(field.name.clone(), timeout, async move {
                        let outcome = run_pipeline(&ctx, &steps, slot).await;
                        report_field(sink.as_deref(), run_id, &outcome);
                        outcome
                    })
                });
                join_all(pipelines).await
            }
            ExecutionMode::Spawned => {
                let handles: Vec<_> = self
                    .fields
                    .iter()
                    .map(|field| {
                        let ctx = FieldContext::new(field.name.clone(), self.view.clone());
                        let slot = self.view.slot(&field.name);
                        let steps = field.steps.clone();
                        let sink = self.sink.clone();
                        let run_id = self.run_id;
                        tokio::spawn(guarded(field.name.clone(), timeout, async move {
                            let outcome = run_pipeline(&ctx, &steps, slot).await;
                            report_field(sink.as_deref(), run_id, &outcome);
                            outcome
                        }))
                    })
                    .collect();

                join_all(handles)
                    .await
                    .into_iter()
                    .map(|joined| joined.unwrap_or_else(|e| Err(FormError::Join(e.to_string()))))
                    .collect()
            }
        };

        results.into_iter().collect()
    }
}

/// Wraps a pipeline so that a panic or a missed deadline becomes a
/// [`FormError`] scoped to the field instead of unwinding into the caller.
async fn guarded<F>(
    field: Arc<str>,
    timeout: Option<Duration>,
    pipeline: F,
) -> Result<FieldOutcome, FormError>
where
    F: Future<Output = FieldOutcome>,
{
    let caught = AssertUnwindSafe(pipeline).catch_unwind();

    let finished = match timeout {
        Some(limit) => tokio::time::timeout(limit, caught).await.map_err(|_| {
            let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(field = %field, timeout_ms, "Pipeline timed out");
            FormError::PipelineTimeout {
                field: field.to_string(),
                timeout_ms,
            }
        })?,
        None => caught.await,
    };

    finished.map_err(|payload| {
        let reason = panic_message(payload.as_ref());
        tracing::error!(field = %field, reason = %reason, "Pipeline panicked");
        FormError::PipelinePanicked {
            field: field.to_string(),
            reason,
        }
    })
}

fn report_field(sink: Option<&dyn EventSink>, run_id: Uuid, outcome: &FieldOutcome) {
    let Some(sink) = sink else {
        return;
    };

    if outcome.is_valid() {
        sink.try_emit(
            "field.completed",
            Some(serde_json::json!({
                "run_id": run_id,
                "field": &outcome.field,
                "steps_run": outcome.steps_run,
                "duration_ms": outcome.duration_ms,
            })),
        );
    } else {
        sink.try_emit(
            "field.failed",
            Some(serde_json::json!({
                "run_id": run_id,
                "field": &outcome.field,
                "steps_run": outcome.steps_run,
                "duration_ms": outcome.duration_ms,
                "error": outcome.errors.first().map(|e| e.message.as_str()),
            })),
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{CheckFailed, FieldError};
    use crate::events::CollectingEventSink;
    use crate::steps::{async_validator, filter, predicate};
    use serde_json::json;

    fn view(input: serde_json::Value, fields: &[FieldSpec]) -> RecordView {
        RecordView::project(
            input.as_object().unwrap(),
            fields.iter().map(|f| &*f.name),
        )
    }

    fn delayed_failure(ms: u64, message: &'static str) -> Arc<dyn Step> {
        async_validator("delayed", message, move |_v, _c| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Err(CheckFailed::new())
        })
    }

    async fn execute(
        fields: &[FieldSpec],
        input: serde_json::Value,
        config: &FormConfig,
        sink: Option<Arc<dyn EventSink>>,
    ) -> Result<Vec<FieldOutcome>, FormError> {
        Run {
            run_id: Uuid::new_v4(),
            fields,
            view: view(input, fields),
            config,
            sink,
        }
        .execute()
        .await
    }

    #[tokio::test]
    async fn test_outcomes_follow_submission_order_not_completion_order() {
        let fields = vec![
            FieldSpec::new("slow", vec![delayed_failure(30, "slow failed")]),
            FieldSpec::new("fast", vec![delayed_failure(1, "fast failed")]),
        ];

        for mode in [ExecutionMode::Interleaved, ExecutionMode::Spawned] {
            let config = FormConfig::new().with_execution_mode(mode);
            let outcomes = execute(&fields, json!({}), &config, None).await.unwrap();

            let errors: Vec<FieldError> =
                outcomes.into_iter().flat_map(|o| o.errors).collect();
            assert_eq!(
                errors,
                vec![
                    FieldError::new("slow", "slow failed"),
                    FieldError::new("fast", "fast failed"),
                ],
                "mode {mode}"
            );
        }
    }

    #[tokio::test]
    async fn test_pipelines_interleave_on_one_task() {
        let fields = vec![
            FieldSpec::new("a", vec![delayed_failure(40, "a")]),
            FieldSpec::new("b", vec![delayed_failure(40, "b")]),
            FieldSpec::new("c", vec![delayed_failure(40, "c")]),
        ];

        let start = std::time::Instant::now();
        let outcomes = execute(&fields, json!({}), &FormConfig::new(), None)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        // Sequential execution would take at least 120ms.
        assert!(start.elapsed() < Duration::from_millis(110));
    }

    #[tokio::test]
    async fn test_panicking_step_becomes_form_error() {
        let fields = vec![
            FieldSpec::new("ok", vec![filter("trim", |v, _| v.trim().to_string())]),
            FieldSpec::new("boom", vec![filter("explode", |_, _| panic!("filter exploded"))]),
        ];

        for mode in [ExecutionMode::Interleaved, ExecutionMode::Spawned] {
            let config = FormConfig::new().with_execution_mode(mode);
            let err = execute(&fields, json!({"ok": " x "}), &config, None)
                .await
                .unwrap_err();

            match err {
                FormError::PipelinePanicked { field, reason } => {
                    assert_eq!(field, "boom");
                    assert_eq!(reason, "filter exploded");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_pipeline_deadline() {
        let stall = async_validator("stall", "never", |_v, _c| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });
        let fields = vec![
            FieldSpec::new("quick", vec![predicate("any", "x", |_, _| true)]),
            FieldSpec::new("stuck", vec![stall]),
        ];
        let config = FormConfig::new().with_pipeline_timeout(Duration::from_millis(20));

        let err = execute(&fields, json!({}), &config, None).await.unwrap_err();
        assert!(matches!(
            err,
            FormError::PipelineTimeout { ref field, timeout_ms: 20 } if field == "stuck"
        ));
    }

    #[tokio::test]
    async fn test_field_events_are_reported() {
        let sink = Arc::new(CollectingEventSink::new());
        let fields = vec![
            FieldSpec::new("good", vec![predicate("any", "x", |_, _| true)]),
            FieldSpec::new("bad", vec![predicate("none", "Bad value", |_, _| false)]),
        ];

        execute(&fields, json!({}), &FormConfig::new(), Some(sink.clone()))
            .await
            .unwrap();

        assert_eq!(sink.events_of_type("field.completed").len(), 1);
        let failed = sink.events_of_type("field.failed");
        assert_eq!(failed.len(), 1);
        let data = failed[0].1.as_ref().unwrap();
        assert_eq!(data["field"], "bad");
        assert_eq!(data["error"], "Bad value");
    }

    #[test]
    fn test_panic_message_payloads() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");

        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");

        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}
