//! Generative model capability boundary.
//!
//! The core never implements model internals. It consumes a model through the
//! [`GenerativeClient`] trait, which exposes exactly two capabilities:
//!
//! - [`GenerativeClient::generate_structured`] - produce a JSON value for a
//!   prompt, constrained by a declared schema
//! - [`GenerativeClient::generate_image`] - produce an image asset for a prompt
//!
//! Values returned by `generate_structured` are untrusted: callers must pass
//! them through [`crate::schema::validate`] before use. Implementations never
//! retry.

mod asset;
mod prompt;

use std::sync::Arc;

pub use asset::Asset;
pub use prompt::{Media, Prompt};
use serde_json::Value;

use crate::Result;

/// Type alias for a shared generative client.
pub type SharedClient = Arc<dyn GenerativeClient>;

/// Core trait for generative model backends.
#[async_trait::async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Generates a JSON value for `prompt` that is expected to satisfy `schema`.
    async fn generate_structured(&self, prompt: &Prompt, schema: &Value) -> Result<Value>;

    /// Generates an image for `prompt` and returns a reference to it.
    async fn generate_image(&self, prompt: &str) -> Result<Asset>;

    /// Returns a short name for logging.
    fn client_name(&self) -> &str {
        "generative"
    }
}
