//! Gemini client configuration.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use url::Url;

/// Default Generative Language API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";

/// Default model for structured text generation.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";

/// Default model for image generation.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the Gemini client.
#[derive(Clone, Builder)]
#[builder(
    name = "GeminiConfigBuilder",
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "Self::validate_config")
)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct GeminiConfig {
    /// Gemini API key.
    #[cfg_attr(
        feature = "config",
        arg(long = "gemini-api-key", env = "GEMINI_API_KEY", hide_env_values = true)
    )]
    pub api_key: String,

    /// Base URL of the Generative Language API.
    #[builder(default = "DEFAULT_BASE_URL.to_string()")]
    #[cfg_attr(
        feature = "config",
        arg(long = "gemini-base-url", env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)
    )]
    pub base_url: String,

    /// Model used for structured generation.
    #[builder(default = "DEFAULT_TEXT_MODEL.to_string()")]
    #[cfg_attr(
        feature = "config",
        arg(long = "gemini-text-model", env = "GEMINI_TEXT_MODEL", default_value = DEFAULT_TEXT_MODEL)
    )]
    pub text_model: String,

    /// Model used for image generation.
    #[builder(default = "DEFAULT_IMAGE_MODEL.to_string()")]
    #[cfg_attr(
        feature = "config",
        arg(long = "gemini-image-model", env = "GEMINI_IMAGE_MODEL", default_value = DEFAULT_IMAGE_MODEL)
    )]
    pub image_model: String,

    /// Request timeout in seconds.
    #[builder(default = "DEFAULT_TIMEOUT_SECS")]
    #[cfg_attr(
        feature = "config",
        arg(long = "gemini-timeout-secs", env = "GEMINI_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)
    )]
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Creates a configuration with default endpoints and models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Returns a new configuration builder.
    pub fn builder() -> GeminiConfigBuilder {
        GeminiConfigBuilder::default()
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parses the base URL, ensuring it ends with a slash so paths join below it.
    pub(crate) fn base_url(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.base_url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

impl GeminiConfigBuilder {
    fn validate_config(&self) -> Result<(), String> {
        if let Some(key) = &self.api_key
            && key.trim().is_empty()
        {
            return Err("API key must not be empty".to_string());
        }

        if let Some(url) = &self.base_url
            && let Err(e) = Url::parse(url)
        {
            return Err(format!("Invalid base URL '{url}': {e}"));
        }

        for model in [&self.text_model, &self.image_model].into_iter().flatten() {
            if model.trim().is_empty() {
                return Err("Model name must not be empty".to_string());
            }
        }

        if self.timeout_secs == Some(0) {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
