#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for generative client operations.
pub const TRACING_TARGET_CLIENT: &str = "mavuno_core::client";

/// Tracing target for schema validation.
pub const TRACING_TARGET_SCHEMA: &str = "mavuno_core::schema";

mod error;

pub mod client;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
pub mod schema;
pub mod template;

#[doc(hidden)]
pub mod prelude;

pub use error::{BoxedError, Error, ErrorKind, Result};
