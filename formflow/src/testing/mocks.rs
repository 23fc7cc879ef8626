//! Mock steps for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::core::{FieldSlot, StepKind};
use crate::errors::FieldError;
use crate::steps::{FieldContext, Step, StepResult};

/// A step that counts its invocations and returns a configurable result.
#[derive(Debug)]
pub struct CountingStep {
    name: String,
    calls: AtomicUsize,
    failure: Mutex<Option<String>>,
}

impl CountingStep {
    /// Creates a counting step that always passes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: AtomicUsize::new(0),
            failure: Mutex::new(None),
        }
    }

    /// Creates a counting step that always fails with `message`.
    #[must_use]
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        let step = Self::new(name);
        step.fail_with(message);
        step
    }

    /// Makes subsequent calls fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    /// Returns the number of times the step ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Step for CountingStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StepKind {
        StepKind::Validator
    }

    async fn apply(&self, _slot: &mut FieldSlot, ctx: &FieldContext) -> StepResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().as_ref() {
            Some(message) => Err(FieldError::new(ctx.field(), message.clone())),
            None => Ok(()),
        }
    }
}

/// A step that sleeps before passing.
#[derive(Debug)]
pub struct SlowStep {
    name: String,
    delay: Duration,
}

impl SlowStep {
    /// Creates a new slow step.
    #[must_use]
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
        }
    }

    /// Creates a slow step with a delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(name: impl Into<String>, ms: u64) -> Self {
        Self::new(name, Duration::from_millis(ms))
    }
}

#[async_trait]
impl Step for SlowStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StepKind {
        StepKind::Filter
    }

    async fn apply(&self, _slot: &mut FieldSlot, _ctx: &FieldContext) -> StepResult {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Records the value every invocation saw.
#[derive(Debug, Default)]
pub struct RecordingStep {
    name: String,
    seen: Mutex<Vec<(String, String)>>,
}

impl RecordingStep {
    /// Creates a new recording step.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Returns `(field, value)` pairs in invocation order.
    #[must_use]
    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().clone()
    }

    /// Returns the values seen for one field.
    #[must_use]
    pub fn seen_for(&self, field: &str) -> Vec<String> {
        self.seen
            .lock()
            .iter()
            .filter(|(f, _)| f == field)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

#[async_trait]
impl Step for RecordingStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StepKind {
        StepKind::Validator
    }

    async fn apply(&self, slot: &mut FieldSlot, ctx: &FieldContext) -> StepResult {
        self.seen
            .lock()
            .push((ctx.field().to_string(), slot.text().into_owned()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RecordView;
    use serde_json::json;

    fn ctx(field: &str) -> FieldContext {
        FieldContext::new(field, RecordView::default())
    }

    #[tokio::test]
    async fn test_counting_step() {
        let step = CountingStep::new("count");
        let mut slot = FieldSlot::new(None);

        assert!(step.apply(&mut slot, &ctx("a")).await.is_ok());
        step.fail_with("nope");
        let err = step.apply(&mut slot, &ctx("a")).await.unwrap_err();

        assert_eq!(err, FieldError::new("a", "nope"));
        assert_eq!(step.call_count(), 2);
    }

    #[tokio::test]
    async fn test_slow_step() {
        let step = SlowStep::with_delay_ms("slow", 10);
        let start = std::time::Instant::now();
        step.apply(&mut FieldSlot::new(None), &ctx("a")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_recording_step() {
        let step = RecordingStep::new("record");
        step.apply(&mut FieldSlot::new(Some(json!("x"))), &ctx("a")).await.unwrap();
        step.apply(&mut FieldSlot::new(None), &ctx("b")).await.unwrap();

        assert_eq!(
            step.seen(),
            vec![("a".to_string(), "x".to_string()), ("b".to_string(), String::new())]
        );
        assert_eq!(step.seen_for("b"), vec![String::new()]);
    }
}
