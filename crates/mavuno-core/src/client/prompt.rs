//! Prompt and media attachment types.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A rendered prompt with optional media attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Prompt text.
    pub text: String,
    /// Media attached to the prompt, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
}

impl Prompt {
    /// Creates a text-only prompt.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media: Vec::new(),
        }
    }

    /// Attaches a media item.
    pub fn with_media(mut self, media: Media) -> Self {
        self.media.push(media);
        self
    }

    /// Returns true if the prompt carries media.
    pub fn has_media(&self) -> bool {
        !self.media.is_empty()
    }
}

/// Inline media attached to a prompt, decoded from a `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    /// MIME type, e.g. `image/jpeg`.
    pub mime_type: String,
    /// Base64-encoded payload.
    pub data: String,
}

impl Media {
    /// Parses a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let invalid = || {
            Error::invalid_input()
                .with_message("expected a data URI of the form 'data:<mime>;base64,<data>'")
        };

        let rest = uri.strip_prefix("data:").ok_or_else(invalid)?;
        let (header, data) = rest.split_once(',').ok_or_else(invalid)?;
        let mime_type = header.strip_suffix(";base64").ok_or_else(invalid)?;
        if mime_type.is_empty() || data.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        })
    }

    /// Returns true if `uri` parses as a base64 data URI.
    pub fn is_data_uri(uri: &str) -> bool {
        Self::from_data_uri(uri).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_data_uri() {
        let media = Media::from_data_uri("data:image/jpeg;base64,/9j/4AAQ").unwrap();
        assert_eq!(media.mime_type, "image/jpeg");
        assert_eq!(media.data, "/9j/4AAQ");
    }

    #[test]
    fn rejects_plain_url() {
        assert!(Media::from_data_uri("https://example.com/garden.jpg").is_err());
        assert!(!Media::is_data_uri("data:image/png,raw"));
        assert!(!Media::is_data_uri("data:;base64,AAAA"));
    }

    #[test]
    fn prompt_with_media() {
        let prompt = Prompt::new("Describe this garden")
            .with_media(Media::from_data_uri("data:image/png;base64,AAAA").unwrap());
        assert!(prompt.has_media());
        assert_eq!(prompt.media.len(), 1);
    }
}
