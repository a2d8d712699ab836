//! Observability infrastructure for the Folio page framework.
//!
//! This crate provides:
//! - `init_tracing` - Subscriber setup driven by `LogConfig`
//! - `execution_span` - One span per page execution
//! - `EngineMetrics` - Process-wide execution counters

mod logging;
mod metrics;
mod span;

pub use logging::*;
pub use metrics::*;
pub use span::*;

// Re-export RequestId and LogConfig from folio-core for convenience
pub use folio_core::{LogConfig, LogFormat, RequestId};
