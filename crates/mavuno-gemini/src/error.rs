//! Error types for mavuno-gemini.

use thiserror::Error;

use crate::config::GeminiConfigBuilderError;

/// Result type alias for mavuno-gemini operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for the mavuno-gemini library.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request or response body could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The model's text was not the JSON it was asked for.
    #[error("Model returned malformed JSON: {0}")]
    MalformedOutput(#[source] serde_json::Error),

    /// The API answered with a non-success status.
    #[error("Gemini API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// The response carried no usable candidate.
    #[error("Empty response: {0}")]
    EmptyResponse(String),

    /// Configuration errors.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<GeminiConfigBuilderError> for Error {
    fn from(err: GeminiConfigBuilderError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<Error> for mavuno_core::Error {
    fn from(err: Error) -> Self {
        use mavuno_core::Error as CoreError;

        match err {
            Error::Http(e) => {
                if e.is_timeout() {
                    CoreError::timeout().with_message(e.to_string()).with_source(e)
                } else if e.is_connect() {
                    CoreError::network_error()
                        .with_message("Connection failed")
                        .with_source(e)
                } else if e.is_decode() {
                    CoreError::invalid_response()
                        .with_message(e.to_string())
                        .with_source(e)
                } else {
                    CoreError::network_error()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Serde(e) => CoreError::serialization()
                .with_message(e.to_string())
                .with_source(e),
            Error::MalformedOutput(e) => CoreError::invalid_response()
                .with_message("model output is not valid JSON")
                .with_source(e),
            Error::Api { status, message } => {
                let error = match status {
                    400 | 404 | 422 => CoreError::invalid_input(),
                    401 | 403 => CoreError::authentication(),
                    408 | 504 => CoreError::timeout(),
                    429 => CoreError::rate_limited(),
                    500..=599 => CoreError::service_unavailable(),
                    _ => CoreError::external_error(),
                };
                error.with_message(format!("Gemini API returned {status}: {message}"))
            }
            Error::EmptyResponse(reason) => CoreError::invalid_response().with_message(reason),
            Error::Config(message) => CoreError::configuration().with_message(message),
        }
    }
}
