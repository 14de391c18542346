//! Convenient re-exports for common use.

pub use crate::{Error, GeminiClient, GeminiConfig, GeminiConfigBuilder, Result};
