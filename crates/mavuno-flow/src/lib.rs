#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod assemble;
pub mod catalog;
pub mod definition;
pub mod engine;
pub mod enrich;
mod error;
pub mod registry;
pub mod service;
mod state;

#[doc(hidden)]
pub mod prelude;

pub use error::{FlowError, Result};
pub use state::FlowState;

/// Tracing target for flow engine operations.
pub const TRACING_TARGET_ENGINE: &str = "mavuno_flow::engine";

/// Tracing target for enrichment fan-out.
pub const TRACING_TARGET_ENRICH: &str = "mavuno_flow::enrich";

/// Tracing target for flow registration.
pub const TRACING_TARGET_REGISTRY: &str = "mavuno_flow::registry";
