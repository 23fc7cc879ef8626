//! Field pipeline execution.
//!
//! This module provides:
//! - The sequential per-field runner
//! - The concurrent fan-out/fan-in orchestrator
//! - Execution configuration

mod config;
mod orchestrator;
mod runner;

pub use config::{
    ExecutionMode, FormConfig, ENV_EMIT_EVENTS, ENV_EXECUTION_MODE, ENV_PIPELINE_TIMEOUT_MS,
};
pub use orchestrator::FieldSpec;
pub(crate) use orchestrator::Run;
pub use runner::run_pipeline;
