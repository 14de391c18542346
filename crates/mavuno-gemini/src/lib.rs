#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for the main library.
pub const TRACING_TARGET: &str = "mavuno_gemini";

/// Tracing target for client operations.
pub const TRACING_TARGET_CLIENT: &str = "mavuno_gemini::client";

mod client;
mod config;
mod error;
#[doc(hidden)]
pub mod prelude;

pub use crate::client::{GeminiClient, strip_json_fences};
pub use crate::config::{
    DEFAULT_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL, DEFAULT_TIMEOUT_SECS, GeminiConfig,
    GeminiConfigBuilder, GeminiConfigBuilderError,
};
pub use crate::error::{Error, Result};
