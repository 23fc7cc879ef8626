//! Lifecycle events for observability.
//!
//! A form sends events to its [`EventSink`]; the default sink discards them.

mod sink;

pub use sink::{CollectedEvent, CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
