//! Form definitions and the `process` entry points.

mod builder;

pub use builder::FormBuilder;

use crate::core::{FieldOutcome, FormOutcome, FormReport, Record, RecordSource, RecordView};
use crate::errors::{FieldError, FormDefinitionError, FormError};
use crate::events::EventSink;
use crate::pipeline::{FieldSpec, FormConfig, Run};
use crate::steps::Step;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// A set of named fields, each with an ordered pipeline of steps.
///
/// Immutable once built. Processing a record projects it onto the declared
/// fields, runs every field's pipeline concurrently, and produces exactly one
/// [`FormOutcome`].
#[derive(Clone)]
pub struct Form {
    name: String,
    fields: Vec<FieldSpec>,
    config: FormConfig,
    event_sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Form {
    /// Creates a form from `(field, steps)` pairs, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns an error if a field name appears twice.
    pub fn new<I, S>(fields: I) -> Result<Self, FormDefinitionError>
    where
        I: IntoIterator<Item = (S, Vec<Arc<dyn Step>>)>,
        S: Into<String>,
    {
        let builder = fields
            .into_iter()
            .try_fold(FormBuilder::new("form"), |builder, (name, steps)| {
                builder.field(name, steps)
            })?;
        Ok(builder.build())
    }

    /// Starts a [`FormBuilder`].
    #[must_use]
    pub fn builder(name: impl Into<String>) -> FormBuilder {
        FormBuilder::new(name)
    }

    /// Returns the form name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| &*f.name)
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Returns the steps of a field.
    #[must_use]
    pub fn steps(&self, field: &str) -> Option<&[Arc<dyn Step>]> {
        self.fields
            .iter()
            .find(|f| &*f.name == field)
            .map(|f| &*f.steps)
    }

    /// Returns the execution configuration.
    #[must_use]
    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Returns a copy of this form using a different configuration.
    #[must_use]
    pub fn with_config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    /// Processes a record.
    ///
    /// Validation failures come back as [`FormOutcome::Invalid`]; the
    /// `Err` side is reserved for orchestration faults (a panicking step, a
    /// missed deadline, a failed task join).
    pub async fn process<S>(&self, input: &S) -> Result<FormOutcome, FormError>
    where
        S: RecordSource + ?Sized,
    {
        let run = self.run(input).await?;
        let outcome = FormOutcome::from_fields(run.fields);
        self.finish(run.run_id, run.start, &outcome);
        Ok(outcome)
    }

    /// Processes a JSON value, which must be an object.
    pub async fn process_value(&self, input: &serde_json::Value) -> Result<FormOutcome, FormError> {
        let map = input.as_object().ok_or_else(|| {
            FormError::InvalidInput(format!("expected a JSON object, got {}", json_kind(input)))
        })?;
        self.process(map).await
    }

    /// Processes a record and hands the result to `callback`.
    ///
    /// The callback runs exactly once, with exactly one of `errors` and
    /// `result` populated. It does not run if orchestration fails.
    pub async fn process_with<S, C>(&self, input: &S, callback: C) -> Result<(), FormError>
    where
        S: RecordSource + ?Sized,
        C: FnOnce(Option<Vec<FieldError>>, Option<Record>),
    {
        let (errors, result) = self.process(input).await?.into_parts();
        callback(errors, result);
        Ok(())
    }

    /// Processes a record and returns per-field details with the outcome.
    pub async fn process_report<S>(&self, input: &S) -> Result<FormReport, FormError>
    where
        S: RecordSource + ?Sized,
    {
        let run = self.run(input).await?;
        let outcome = FormOutcome::from_fields(run.fields.iter().cloned());
        let duration_ms = self.finish(run.run_id, run.start, &outcome);

        Ok(FormReport {
            run_id: run.run_id,
            form: self.name.clone(),
            started_at: run.started_at,
            duration_ms,
            fields: run.fields,
            outcome,
        })
    }

    async fn run<S>(&self, input: &S) -> Result<FinishedRun, FormError>
    where
        S: RecordSource + ?Sized,
    {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        let view = RecordView::project(input, self.field_names());
        let sink = self.config.emit_events.then(|| self.event_sink.clone());

        info!(
            form = %self.name,
            %run_id,
            fields = self.fields.len(),
            mode = %self.config.execution_mode,
            "Processing form"
        );
        if let Some(sink) = &sink {
            sink.try_emit(
                "form.started",
                Some(serde_json::json!({
                    "run_id": run_id,
                    "form": &self.name,
                    "fields": self.field_names().collect::<Vec<_>>(),
                })),
            );
        }

        let result = Run {
            run_id,
            fields: &self.fields,
            view,
            config: &self.config,
            sink: sink.clone(),
        }
        .execute()
        .await;

        match result {
            Ok(fields) => Ok(FinishedRun {
                run_id,
                started_at,
                start,
                fields,
            }),
            Err(error) => {
                warn!(form = %self.name, %run_id, %error, "Form processing aborted");
                if let Some(sink) = &sink {
                    sink.try_emit(
                        "form.failed",
                        Some(serde_json::json!({
                            "run_id": run_id,
                            "form": &self.name,
                            "field": error.field(),
                            "error": error.to_string(),
                        })),
                    );
                }
                Err(error)
            }
        }
    }

    fn finish(&self, run_id: Uuid, start: Instant, outcome: &FormOutcome) -> f64 {
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        let error_count = outcome.errors().map_or(0, <[FieldError]>::len);

        info!(
            form = %self.name,
            %run_id,
            valid = outcome.is_valid(),
            error_count,
            duration_ms,
            "Form processed"
        );
        if self.config.emit_events {
            self.event_sink.try_emit(
                "form.completed",
                Some(serde_json::json!({
                    "run_id": run_id,
                    "form": &self.name,
                    "valid": outcome.is_valid(),
                    "error_count": error_count,
                    "duration_ms": duration_ms,
                })),
            );
        }

        duration_ms
    }
}

struct FinishedRun {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    start: Instant,
    fields: Vec<FieldOutcome>,
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;
    use crate::steps::{filter, predicate};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn name_form() -> Form {
        Form::new(vec![(
            "name",
            vec![
                filter("trim", |v, _| v.trim().to_string()),
                predicate("not_empty", "Empty name", |v, _| !v.is_empty()),
            ],
        )])
        .unwrap()
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let err = Form::new(vec![("a", vec![]), ("a", vec![])]).unwrap_err();
        assert_eq!(err.code(), "FORM-001-DUPLICATE_FIELD");
    }

    #[tokio::test]
    async fn test_form_without_fields_yields_empty_record() {
        let form = Form::new(Vec::<(&str, Vec<Arc<dyn Step>>)>::new()).unwrap();
        assert_eq!(form.field_count(), 0);

        let outcome = form.process_value(&json!({"ignored": 1})).await.unwrap();
        assert_eq!(outcome, FormOutcome::Valid(Record::new()));

        let mut calls = 0;
        form.process_with(&Record::new(), |errors, result| {
            calls += 1;
            assert!(errors.is_none());
            assert_eq!(result, Some(Record::new()));
        })
        .await
        .unwrap();
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_process_value_requires_object() {
        let form = name_form();
        let err = form.process_value(&json!(["name"])).await.unwrap_err();
        assert!(matches!(err, FormError::InvalidInput(_)));
        assert!(err.to_string().contains("an array"));

        let outcome = form.process_value(&json!({"name": " ok "})).await.unwrap();
        assert_eq!(outcome.record().unwrap().get("name"), Some(&json!("ok")));
    }

    #[tokio::test]
    async fn test_process_with_invokes_callback_once() {
        let form = name_form();
        let mut calls = Vec::new();

        form.process_with(&Record::new().with("name", "  "), |errors, result| {
            calls.push((errors, result));
        })
        .await
        .unwrap();

        assert_eq!(calls.len(), 1);
        let (errors, result) = &calls[0];
        assert_eq!(errors.as_deref(), Some(&[FieldError::new("name", "Empty name")][..]));
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_process_report() {
        let form = name_form();
        let report = form.process_report(&Record::new().with("name", " x ")).await.unwrap();

        assert_eq!(report.form, "form");
        assert!(report.outcome.is_valid());
        assert_eq!(report.fields.len(), 1);
        assert_eq!(report.field("name").unwrap().steps_run, 2);
        assert!(report.invalid_fields().is_empty());
        assert!(report.duration_ms >= 0.0);
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let sink = Arc::new(CollectingEventSink::new());
        let form = Form::builder("signup")
            .field("name", vec![predicate("not_empty", "Empty name", |v, _| !v.is_empty())])
            .unwrap()
            .with_event_sink(sink.clone())
            .build();

        form.process(&Record::new()).await.unwrap();

        assert_eq!(
            sink.event_types(),
            vec!["form.started", "field.failed", "form.completed"]
        );
        let completed = sink.events_of_type("form.completed");
        let data = completed[0].1.as_ref().unwrap();
        assert_eq!(data["valid"], json!(false));
        assert_eq!(data["error_count"], json!(1));
    }

    #[tokio::test]
    async fn test_events_can_be_disabled() {
        let sink = Arc::new(CollectingEventSink::new());
        let form = Form::builder("quiet")
            .field("name", vec![])
            .unwrap()
            .with_event_sink(sink.clone())
            .with_config(FormConfig::new().with_events(false))
            .build();

        form.process(&Record::new()).await.unwrap();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_orchestration_fault_emits_form_failed() {
        let sink = Arc::new(CollectingEventSink::new());
        let form = Form::builder("fragile")
            .field("boom", vec![filter("explode", |_, _| panic!("bad filter"))])
            .unwrap()
            .with_event_sink(sink.clone())
            .build();

        let err = form.process(&Record::new()).await.unwrap_err();
        assert_eq!(err.field(), Some("boom"));
        assert_eq!(sink.event_types(), vec!["form.started", "form.failed"]);
    }
}
