//! Flow execution engine.
//!
//! - [`Engine`]: runs a named flow through the invocation state machine
//! - [`EngineConfig`]: concurrency limits
//! - [`ExecutionReport`]: what happened during one successful run

mod config;
mod context;
mod executor;

pub use config::{
    DEFAULT_MAX_CONCURRENT_ENRICHMENTS, DEFAULT_MAX_CONCURRENT_RUNS, EngineConfig,
    EngineConfigBuilder, EngineConfigBuilderError,
};
pub use context::{EntityProvenance, ExecutionReport};
pub use executor::{Engine, FlowResult};
