//! Filter step adapter.

use super::{FieldContext, Step, StepResult};
use crate::core::{FieldSlot, StepKind};
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Adapts a filter function into a [`Step`].
///
/// The function receives the field's current text (absent reads as `""`)
/// and returns the replacement text. Bound arguments are captured by the
/// closure.
pub struct FilterStep<F>
where
    F: Fn(&str, &FieldContext) -> String + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FilterStep<F>
where
    F: Fn(&str, &FieldContext) -> String + Send + Sync,
{
    /// Creates a new filter step.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FilterStep<F>
where
    F: Fn(&str, &FieldContext) -> String + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterStep")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F> Step for FilterStep<F>
where
    F: Fn(&str, &FieldContext) -> String + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StepKind {
        StepKind::Filter
    }

    async fn apply(&self, slot: &mut FieldSlot, ctx: &FieldContext) -> StepResult {
        let filtered = (self.func)(&slot.text(), ctx);
        slot.set_text(filtered);
        Ok(())
    }
}

/// Builds a shared filter step.
///
/// ```rust,ignore
/// let trim = formflow::steps::filter("trim", |value, _| value.trim().to_string());
/// let prefix = String::from("+");
/// let plus = formflow::steps::filter("plus", move |value, _| format!("{prefix}{value}"));
/// ```
pub fn filter<F>(name: impl Into<String>, func: F) -> Arc<dyn Step>
where
    F: Fn(&str, &FieldContext) -> String + Send + Sync + 'static,
{
    Arc::new(FilterStep::new(name, func))
}
