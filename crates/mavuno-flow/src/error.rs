//! Flow error types.

use mavuno_core::schema::Violations;
use mavuno_core::template::TemplateError;
use thiserror::Error;

use crate::assemble::AssemblyError;

/// Result type for flow operations.
pub type Result<T, E = FlowError> = std::result::Result<T, E>;

/// Errors that can end a flow invocation.
///
/// Only failures on the primary path appear here. A failed enrichment call
/// is recovered with a fallback and recorded in the execution report.
#[derive(Debug, Error)]
pub enum FlowError {
    /// No flow is registered under the requested name.
    #[error("unknown flow '{0}'")]
    UnknownFlow(String),

    /// A flow with this name is already registered.
    #[error("flow '{0}' is already registered")]
    DuplicateFlow(String),

    /// The request does not satisfy the flow's input schema.
    #[error("invalid request for flow '{flow}': {violations}")]
    RequestValidation {
        /// Name of the flow.
        flow: String,
        /// Every violated field.
        violations: Violations,
    },

    /// The primary generation call failed.
    #[error("flow '{flow}' failed: the generative service could not complete the request")]
    GenerationTransport {
        /// Name of the flow.
        flow: String,
        /// Client error, kept for logging.
        #[source]
        source: mavuno_core::Error,
    },

    /// The model output, or the assembled result, does not satisfy its schema.
    #[error("flow '{flow}' produced an invalid result: {violations}")]
    OutputValidation {
        /// Name of the flow.
        flow: String,
        /// Every violated field.
        violations: Violations,
    },

    /// The model returned no entities where at least one is required.
    #[error("{message}")]
    EmptyResult {
        /// Name of the flow.
        flow: String,
        /// Field that was empty or missing.
        field: String,
        /// User-facing description.
        message: String,
    },

    /// A flow template failed to parse.
    #[error("invalid template in flow '{flow}': {source}")]
    Template {
        /// Name of the flow.
        flow: String,
        #[source]
        source: TemplateError,
    },

    /// Enriched entities could not be merged back into the base result.
    #[error("failed to assemble result for flow '{flow}': {source}")]
    Assembly {
        /// Name of the flow.
        flow: String,
        #[source]
        source: AssemblyError,
    },

    /// Typed request or response (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FlowError {
    /// Returns the flow name, if the error is tied to one.
    pub fn flow(&self) -> Option<&str> {
        match self {
            Self::UnknownFlow(flow) | Self::DuplicateFlow(flow) => Some(flow),
            Self::RequestValidation { flow, .. }
            | Self::GenerationTransport { flow, .. }
            | Self::OutputValidation { flow, .. }
            | Self::EmptyResult { flow, .. }
            | Self::Template { flow, .. }
            | Self::Assembly { flow, .. } => Some(flow),
            Self::Serialization(_) | Self::Internal(_) => None,
        }
    }

    /// Returns true if the caller sent a bad request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownFlow(_) | Self::RequestValidation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_hides_client_details() {
        let err = FlowError::GenerationTransport {
            flow: "recommendations".into(),
            source: mavuno_core::Error::rate_limited().with_message("quota for key abc exhausted"),
        };
        let message = err.to_string();
        assert!(!message.contains("quota"));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.flow(), Some("recommendations"));
    }

    #[test]
    fn empty_result_displays_message() {
        let err = FlowError::EmptyResult {
            flow: "dealers".into(),
            field: "dealers".into(),
            message: "The AI could not find any dealers for the selected region.".into(),
        };
        assert_eq!(
            err.to_string(),
            "The AI could not find any dealers for the selected region."
        );
        assert!(!err.is_client_error());
    }
}
