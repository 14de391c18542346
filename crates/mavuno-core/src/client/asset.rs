use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque reference to a generated asset.
///
/// Either a `data:` URI carrying the bytes inline or a plain URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asset {
    uri: String,
}

impl Asset {
    /// Creates an asset from a URI.
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// Creates a `data:` URI asset from base64-encoded bytes.
    pub fn from_base64(mime_type: &str, data: &str) -> Self {
        Self {
            uri: format!("data:{mime_type};base64,{data}"),
        }
    }

    /// Returns the asset URI.
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Returns true if the asset carries its bytes inline.
    pub fn is_inline(&self) -> bool {
        self.uri.starts_with("data:")
    }

    /// Consumes the asset and returns the URI.
    pub fn into_uri(self) -> String {
        self.uri
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_inline() {
            // Inline payloads can be megabytes long.
            let head: String = self.uri.chars().take(48).collect();
            write!(f, "{head}…")
        } else {
            f.write_str(&self.uri)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_data_uri() {
        let asset = Asset::from_base64("image/png", "aGVsbG8=");
        assert_eq!(asset.as_str(), "data:image/png;base64,aGVsbG8=");
        assert!(asset.is_inline());
    }

    #[test]
    fn url_is_not_inline() {
        let asset = Asset::new("https://placehold.co/400x300.png?text=Kale");
        assert!(!asset.is_inline());
        assert_eq!(asset.to_string(), "https://placehold.co/400x300.png?text=Kale");
    }
}
