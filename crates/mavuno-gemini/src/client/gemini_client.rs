//! HTTP client for the Generative Language API.

use std::sync::Arc;

use mavuno_core::client::{Asset, GenerativeClient, Prompt};
use reqwest::Client as HttpClient;
use serde_json::Value;
use url::Url;

use super::wire::{ApiErrorBody, GenerateContentRequest, GenerateContentResponse};
use crate::config::GeminiConfig;
use crate::error::{Error, Result};
use crate::TRACING_TARGET_CLIENT;

struct GeminiClientInner {
    http: HttpClient,
    config: GeminiConfig,
    base_url: Url,
}

impl std::fmt::Debug for GeminiClientInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClientInner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Gemini implementation of [`GenerativeClient`].
///
/// Structured calls go to the text model in JSON mode. Image calls go to the
/// image model and return the first inline image as a `data:` URI. Calls are
/// never retried.
///
/// # Examples
///
/// ```rust,ignore
/// use mavuno_gemini::{GeminiClient, GeminiConfig};
///
/// let client = GeminiClient::new(GeminiConfig::new(api_key))?;
/// let engine = Engine::with_defaults(client.into_shared())?;
/// ```
#[derive(Clone, Debug)]
pub struct GeminiClient {
    inner: Arc<GeminiClientInner>,
}

impl GeminiClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be created.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            base_url = %config.base_url,
            text_model = %config.text_model,
            image_model = %config.image_model,
            timeout_secs = config.timeout_secs,
            "Creating Gemini client"
        );

        let base_url = config.base_url().map_err(|e| {
            Error::invalid_config(format!("Invalid base URL '{}': {e}", config.base_url))
        })?;

        let http = HttpClient::builder()
            .timeout(config.timeout())
            .user_agent(format!("mavuno-gemini/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let inner = GeminiClientInner {
            http,
            config,
            base_url,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &GeminiConfig {
        &self.inner.config
    }

    /// Wraps the client for use by an engine.
    pub fn into_shared(self) -> mavuno_core::client::SharedClient {
        Arc::new(self)
    }

    fn endpoint(&self, model: &str) -> Result<Url> {
        self.inner
            .base_url
            .join(&format!("v1beta/models/{model}:generateContent"))
            .map_err(|e| Error::invalid_config(format!("Invalid endpoint for model '{model}': {e}")))
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint(model)?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            model,
            "Sending generateContent request"
        );

        let response = self
            .inner
            .http
            .post(url)
            .header("x-goog-api-key", &self.inner.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = ApiErrorBody::message_from(&body);

            tracing::error!(
                target: TRACING_TARGET_CLIENT,
                model,
                status = status.as_u16(),
                message = %message,
                "generateContent request failed"
            );

            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    async fn structured(&self, prompt: &Prompt, schema: &Value) -> Result<Value> {
        let request = GenerateContentRequest::structured(prompt, schema);
        let response = self
            .generate_content(&self.inner.config.text_model, &request)
            .await?;

        let text = response
            .text()
            .ok_or_else(|| Error::EmptyResponse(response.empty_reason()))?;
        serde_json::from_str(strip_json_fences(&text)).map_err(Error::MalformedOutput)
    }

    async fn image(&self, prompt: &str) -> Result<Asset> {
        let request = GenerateContentRequest::image(prompt);
        let response = self
            .generate_content(&self.inner.config.image_model, &request)
            .await?;

        let image = response
            .inline_image()
            .ok_or_else(|| Error::EmptyResponse(response.empty_reason()))?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            mime_type = %image.mime_type,
            bytes = image.data.len(),
            "Received generated image"
        );

        Ok(Asset::from_base64(&image.mime_type, &image.data))
    }
}

#[async_trait::async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate_structured(
        &self,
        prompt: &Prompt,
        schema: &Value,
    ) -> mavuno_core::Result<Value> {
        Ok(self.structured(prompt, schema).await?)
    }

    async fn generate_image(&self, prompt: &str) -> mavuno_core::Result<Asset> {
        Ok(self.image(prompt).await?)
    }

    fn client_name(&self) -> &str {
        "gemini"
    }
}

/// Strips a Markdown code fence wrapped around a JSON payload.
///
/// Models occasionally wrap JSON-mode output in ```` ```json ```` fences.
pub fn strip_json_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.split_once('\n') {
        Some((_language, body)) => body,
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
