//! # Formflow
//!
//! Declarative per-field filtering and validation for records.
//!
//! A form maps field names to ordered pipelines of steps:
//!
//! - **Filters** rewrite a field's value and never fail
//! - **Validators** inspect the value and may report an error message
//! - **Fan-out/fan-in**: every field's pipeline runs concurrently, and the
//!   results are merged in declaration order into one outcome
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use formflow::prelude::*;
//!
//! let form = formflow::create(vec![
//!     ("name", vec![
//!         filter("trim", |v, _| v.trim().to_string()),
//!         predicate("is_int", "Bad name", |v, _| v.parse::<i64>().is_ok()),
//!     ]),
//! ])?;
//!
//! match form.process(&Record::new().with("name", " 42 ")).await? {
//!     FormOutcome::Valid(record) => println!("{}", record.text("name")),
//!     FormOutcome::Invalid(errors) => eprintln!("{errors:?}"),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod core;
pub mod errors;
pub mod events;
pub mod form;
pub mod observability;
pub mod pipeline;
pub mod steps;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

use std::sync::Arc;

/// Creates a form from `(field, steps)` pairs.
///
/// Shorthand for [`form::Form::new`].
pub fn create<I, S>(fields: I) -> Result<form::Form, errors::FormDefinitionError>
where
    I: IntoIterator<Item = (S, Vec<Arc<dyn steps::Step>>)>,
    S: Into<String>,
{
    form::Form::new(fields)
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        FieldOutcome, FieldSlot, FieldStatus, FormOutcome, FormReport, Record, RecordSource,
        RecordView, StepKind,
    };
    pub use crate::errors::{
        CheckFailed, ContractErrorInfo, FieldError, FormDefinitionError, FormError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::form::{Form, FormBuilder};
    pub use crate::pipeline::{ExecutionMode, FormConfig};
    pub use crate::steps::{
        async_validator, filter, predicate, validator, FieldContext, Step, StepResult,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[tokio::test]
    async fn test_create_and_process() {
        let form = crate::create(vec![(
            "name",
            vec![filter("trim", |v, _| v.trim().to_string())],
        )])
        .unwrap();

        let outcome = form.process(&Record::new().with("name", " 42 ")).await.unwrap();
        assert_eq!(outcome.record().unwrap().text("name"), "42");
    }
}
