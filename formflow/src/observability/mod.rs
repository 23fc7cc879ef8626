//! Observability utilities.

mod logging;

pub use logging::{init_tracing, init_tracing_from_env, LogFormat, ENV_LOG_FORMAT};
