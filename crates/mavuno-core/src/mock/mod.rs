//! Scripted generative client for testing.
//!
//! [`MockClient`] replays queued structured replies in order and answers
//! image requests by prompt substring, optionally after a delay or with a
//! failure. Every call is recorded so tests can assert on what the engine
//! asked for and in which order image calls completed.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! mavuno-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use mavuno_core::mock::MockClient;
//!
//! let client = MockClient::new()
//!     .with_structured(json!({ "crops": [] }))
//!     .with_image_failure("kale");
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;

use crate::client::{Asset, GenerativeClient, Prompt, SharedClient};
use crate::{Error, Result, TRACING_TARGET_CLIENT};

#[derive(Debug, Clone)]
enum ImageReply {
    Asset { uri: String, delay: Option<Duration> },
    Failure,
}

#[derive(Debug, Clone)]
struct ImageRule {
    matcher: String,
    reply: ImageReply,
}

#[derive(Debug, Default)]
struct State {
    structured: VecDeque<Result<Value>>,
    images: Vec<ImageRule>,
    structured_calls: Vec<Prompt>,
    image_calls: Vec<String>,
    image_completions: Vec<String>,
}

/// Scripted [`GenerativeClient`] implementation.
///
/// Clones share state, so a test can keep one handle for assertions while
/// the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    state: Arc<Mutex<State>>,
}

impl MockClient {
    /// Creates a client with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panicking test must not poison the recorder for the assertions.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queues a structured reply.
    pub fn with_structured(self, value: Value) -> Self {
        self.state().structured.push_back(Ok(value));
        self
    }

    /// Queues a structured failure.
    pub fn with_structured_error(self, error: Error) -> Self {
        self.state().structured.push_back(Err(error));
        self
    }

    /// Answers image prompts containing `matcher` with `uri`.
    pub fn with_image(self, matcher: impl Into<String>, uri: impl Into<String>) -> Self {
        self.push_image(matcher, ImageReply::Asset {
            uri: uri.into(),
            delay: None,
        })
    }

    /// Answers image prompts containing `matcher` with `uri` after `delay`.
    pub fn with_image_delay(
        self,
        matcher: impl Into<String>,
        uri: impl Into<String>,
        delay: Duration,
    ) -> Self {
        self.push_image(matcher, ImageReply::Asset {
            uri: uri.into(),
            delay: Some(delay),
        })
    }

    /// Fails image prompts containing `matcher`.
    pub fn with_image_failure(self, matcher: impl Into<String>) -> Self {
        self.push_image(matcher, ImageReply::Failure)
    }

    fn push_image(self, matcher: impl Into<String>, reply: ImageReply) -> Self {
        self.state().images.push(ImageRule {
            matcher: matcher.into(),
            reply,
        });
        self
    }

    /// Wraps the client for use by an engine.
    pub fn into_shared(self) -> SharedClient {
        Arc::new(self)
    }

    /// Returns every structured prompt received, in call order.
    pub fn structured_calls(&self) -> Vec<Prompt> {
        self.state().structured_calls.clone()
    }

    /// Returns every image prompt received, in call order.
    pub fn image_calls(&self) -> Vec<String> {
        self.state().image_calls.clone()
    }

    /// Returns the image prompts that succeeded, in completion order.
    pub fn image_completion_order(&self) -> Vec<String> {
        self.state().image_completions.clone()
    }
}

#[async_trait::async_trait]
impl GenerativeClient for MockClient {
    async fn generate_structured(&self, prompt: &Prompt, _schema: &Value) -> Result<Value> {
        let mut state = self.state();
        state.structured_calls.push(prompt.clone());
        state.structured.pop_front().unwrap_or_else(|| {
            Err(Error::invalid_response().with_message("no scripted structured reply"))
        })
    }

    async fn generate_image(&self, prompt: &str) -> Result<Asset> {
        let reply = {
            let mut state = self.state();
            state.image_calls.push(prompt.to_string());
            let fallback = format!("mock://image/{}", state.image_calls.len());
            state
                .images
                .iter()
                .find(|rule| prompt.contains(&rule.matcher))
                .map(|rule| rule.reply.clone())
                .unwrap_or(ImageReply::Asset {
                    uri: fallback,
                    delay: None,
                })
        };

        match reply {
            ImageReply::Failure => {
                tracing::debug!(target: TRACING_TARGET_CLIENT, prompt, "scripted image failure");
                Err(Error::service_unavailable().with_message("scripted image failure"))
            }
            ImageReply::Asset { uri, delay } => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                self.state().image_completions.push(prompt.to_string());
                Ok(Asset::new(uri))
            }
        }
    }

    fn client_name(&self) -> &str {
        "mock"
    }
}
