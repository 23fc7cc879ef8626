//! Form builder with definition checks.

use super::Form;
use crate::errors::FormDefinitionError;
use crate::events::{EventSink, NoOpEventSink};
use crate::pipeline::{FieldSpec, FormConfig};
use crate::steps::Step;
use std::sync::Arc;

/// Builder for creating validated forms.
#[derive(Clone)]
pub struct FormBuilder {
    name: String,
    fields: Vec<(String, Vec<Arc<dyn Step>>)>,
    config: FormConfig,
    event_sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for FormBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormBuilder")
            .field("name", &self.name)
            .field("fields", &self.field_names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FormBuilder {
    /// Creates a new form builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            config: FormConfig::default(),
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Declares a field with its ordered steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is already declared.
    pub fn field(
        mut self,
        name: impl Into<String>,
        steps: Vec<Arc<dyn Step>>,
    ) -> Result<Self, FormDefinitionError> {
        let name = name.into();
        if self.position(&name).is_some() {
            return Err(FormDefinitionError::duplicate_field(name));
        }

        self.fields.push((name, steps));
        Ok(self)
    }

    /// Appends one step to a field, declaring the field if needed.
    #[must_use]
    pub fn step(mut self, name: impl Into<String>, step: Arc<dyn Step>) -> Self {
        let name = name.into();
        match self.position(&name) {
            Some(index) => self.fields[index].1.push(step),
            None => self.fields.push((name, vec![step])),
        }
        self
    }

    /// Merges another builder's fields into this one.
    ///
    /// # Errors
    ///
    /// Returns an error if both builders declare the same field.
    pub fn compose(mut self, other: Self) -> Result<Self, FormDefinitionError> {
        self.name = format!("{}+{}", self.name, other.name);
        for (name, steps) in other.fields {
            self = self.field(name, steps)?;
        }
        Ok(self)
    }

    /// Sets the execution configuration.
    #[must_use]
    pub fn with_config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Builds the form.
    ///
    /// A form without fields is valid; processing it yields an empty record.
    #[must_use]
    pub fn build(self) -> Form {
        let fields = self
            .fields
            .into_iter()
            .map(|(name, steps)| FieldSpec::new(name, steps))
            .collect();

        Form {
            name: self.name,
            fields,
            config: self.config,
            event_sink: self.event_sink,
        }
    }

    /// Returns the form name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(existing, _)| existing == name)
    }
}
