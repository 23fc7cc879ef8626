//! Validator step adapters.

use super::{FieldContext, Step, StepResult};
use crate::core::{FieldSlot, StepKind};
use crate::errors::CheckFailed;
use async_trait::async_trait;
use std::fmt::Debug;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Adapts a validator function into a [`Step`].
///
/// The function only ever sees the field's text, so it cannot mutate the
/// slot. A `CheckFailed` is translated into a field error carrying the
/// message given at construction.
pub struct ValidatorStep<F>
where
    F: Fn(&str, &FieldContext) -> Result<(), CheckFailed> + Send + Sync,
{
    name: String,
    message: String,
    func: F,
}

impl<F> ValidatorStep<F>
where
    F: Fn(&str, &FieldContext) -> Result<(), CheckFailed> + Send + Sync,
{
    /// Creates a new validator step.
    pub fn new(name: impl Into<String>, message: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            func,
        }
    }

    /// Returns the message reported on failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl<F> Debug for ValidatorStep<F>
where
    F: Fn(&str, &FieldContext) -> Result<(), CheckFailed> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorStep")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish()
    }
}

#[async_trait]
impl<F> Step for ValidatorStep<F>
where
    F: Fn(&str, &FieldContext) -> Result<(), CheckFailed> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StepKind {
        StepKind::Validator
    }

    async fn apply(&self, slot: &mut FieldSlot, ctx: &FieldContext) -> StepResult {
        let result = (self.func)(&slot.text(), ctx);
        result.map_err(|failure| {
            debug!(
                field = ctx.field(),
                step = %self.name,
                detail = ?failure.detail,
                "Validator rejected value"
            );
            ctx.error(&self.message)
        })
    }
}

/// Adapts an async validator function into a [`Step`].
///
/// For checks that do their own I/O. The function receives an owned copy of
/// the field's text and context.
pub struct AsyncValidatorStep<F, Fut>
where
    F: Fn(String, FieldContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CheckFailed>> + Send,
{
    name: String,
    message: String,
    func: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> AsyncValidatorStep<F, Fut>
where
    F: Fn(String, FieldContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CheckFailed>> + Send,
{
    /// Creates a new async validator step.
    pub fn new(name: impl Into<String>, message: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            func,
            _phantom: PhantomData,
        }
    }
}

impl<F, Fut> Debug for AsyncValidatorStep<F, Fut>
where
    F: Fn(String, FieldContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CheckFailed>> + Send,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncValidatorStep")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish()
    }
}

#[async_trait]
impl<F, Fut> Step for AsyncValidatorStep<F, Fut>
where
    F: Fn(String, FieldContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CheckFailed>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StepKind {
        StepKind::Validator
    }

    async fn apply(&self, slot: &mut FieldSlot, ctx: &FieldContext) -> StepResult {
        let text = slot.text().into_owned();
        (self.func)(text, ctx.clone()).await.map_err(|failure| {
            debug!(
                field = ctx.field(),
                step = %self.name,
                detail = ?failure.detail,
                "Async validator rejected value"
            );
            ctx.error(&self.message)
        })
    }
}

/// Builds a shared validator step from a function returning `Result`.
pub fn validator<F>(name: impl Into<String>, message: impl Into<String>, func: F) -> Arc<dyn Step>
where
    F: Fn(&str, &FieldContext) -> Result<(), CheckFailed> + Send + Sync + 'static,
{
    Arc::new(ValidatorStep::new(name, message, func))
}

/// Builds a shared validator step from a boolean check.
pub fn predicate<F>(name: impl Into<String>, message: impl Into<String>, check: F) -> Arc<dyn Step>
where
    F: Fn(&str, &FieldContext) -> bool + Send + Sync + 'static,
{
    validator(name, message, move |value, ctx| {
        if check(value, ctx) {
            Ok(())
        } else {
            Err(CheckFailed::new())
        }
    })
}

/// Builds a shared async validator step.
pub fn async_validator<F, Fut>(
    name: impl Into<String>,
    message: impl Into<String>,
    func: F,
) -> Arc<dyn Step>
where
    F: Fn(String, FieldContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CheckFailed>> + Send + 'static,
{
    Arc::new(AsyncValidatorStep::new(name, message, func))
}
