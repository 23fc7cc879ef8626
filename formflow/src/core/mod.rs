//! Core domain model types for formflow.
//!
//! - Records, field slots and the read-only record view
//! - Step kind and field status enums
//! - Per-field and per-form outcomes

mod outcome;
mod record;
mod status;

pub use outcome::{FieldOutcome, FormOutcome, FormReport};
pub use record::{value_text, FieldSlot, Record, RecordSource, RecordView};
pub use status::{FieldStatus, StepKind};
