//! Request and response bodies of the `generateContent` endpoint.

use mavuno_core::client::Prompt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// JSON-mode request with the schema spelled out after the prompt text.
    pub fn structured(prompt: &Prompt, schema: &Value) -> Self {
        let schema = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
        let text = format!(
            "{}\n\nRespond only with a JSON value that conforms to this JSON schema:\n{schema}",
            prompt.text
        );

        let mut parts = vec![Part::text(text)];
        parts.extend(prompt.media.iter().map(|media| Part::InlineData {
            inline_data: Blob {
                mime_type: media.mime_type.clone(),
                data: media.data.clone(),
            },
        }));

        Self {
            contents: vec![Content::user(parts)],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".into()),
                response_modalities: None,
            }),
        }
    }

    /// Image request; the model answers with text and inline image parts.
    pub fn image(prompt: &str) -> Self {
        Self {
            contents: vec![Content::user(vec![Part::text(prompt)])],
            generation_config: Some(GenerationConfig {
                response_mime_type: None,
                response_modalities: Some(vec![Modality::Text, Modality::Image]),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".into()),
            parts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum Part {
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: Blob },
    Text { text: String },
    /// Parts this client never produces, such as function calls.
    Other(Value),
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Blob {
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<Modality>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum Modality {
    Text,
    Image,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .into_iter()
            .flat_map(|content| content.parts.iter())
    }

    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .parts()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }

    /// First inline image of the first candidate.
    pub fn inline_image(&self) -> Option<&Blob> {
        self.parts().find_map(|part| match part {
            Part::InlineData { inline_data } if inline_data.mime_type.starts_with("image/") => {
                Some(inline_data)
            }
            _ => None,
        })
    }

    /// Explains why the response has nothing usable.
    pub fn empty_reason(&self) -> String {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            return format!("prompt blocked: {reason}");
        }
        match self.candidates.first() {
            None => "no candidates returned".to_string(),
            Some(candidate) => match candidate.finish_reason.as_deref() {
                Some(reason) => format!("no usable content, finish reason {reason}"),
                None => "no usable content".to_string(),
            },
        }
    }
}

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl ApiErrorBody {
    /// Extracts a readable message from a raw error body.
    pub fn message_from(body: &str) -> String {
        match serde_json::from_str::<Self>(body) {
            Ok(Self { error }) => match error.status {
                Some(status) => format!("{status}: {}", error.message),
                None => error.message,
            },
            Err(_) if body.trim().is_empty() => "no response body".to_string(),
            Err(_) => body.chars().take(512).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use mavuno_core::client::Media;
    use serde_json::json;

    use super::*;

    #[test]
    fn structured_request_wire_format() {
        let prompt = Prompt::new("Diagnose this garden").with_media(Media {
            mime_type: "image/jpeg".into(),
            data: "/9j/4AAQ".into(),
        });
        let schema = json!({ "type": "object" });
        let body = serde_json::to_value(GenerateContentRequest::structured(&prompt, &schema))
            .unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Diagnose this garden"));
        assert!(text.contains("\"type\": \"object\""));
        assert_eq!(
            body["contents"][0]["parts"][1],
            json!({ "inlineData": { "mimeType": "image/jpeg", "data": "/9j/4AAQ" } })
        );
        assert_eq!(
            body["generationConfig"],
            json!({ "responseMimeType": "application/json" })
        );
    }

    #[test]
    fn image_request_wire_format() {
        let body = serde_json::to_value(GenerateContentRequest::image("a kale plant")).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{ "role": "user", "parts": [{ "text": "a kale plant" }] }],
                "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
            })
        );
    }

    #[test]
    fn reads_text_and_image_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Here is " },
                        { "text": "your image" },
                        { "inlineData": { "mimeType": "image/png", "data": "iVBORw0" } },
                        { "functionCall": { "name": "noop" } }
                    ]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "totalTokenCount": 12 }
        }))
        .unwrap();

        assert_eq!(response.text().as_deref(), Some("Here is your image"));
        let image = response.inline_image().unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw0");
    }

    #[test]
    fn explains_empty_responses() {
        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
                .unwrap();
        assert!(blocked.text().is_none());
        assert_eq!(blocked.empty_reason(), "prompt blocked: SAFETY");

        let truncated: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [{ "finishReason": "MAX_TOKENS" }] }))
                .unwrap();
        assert!(truncated.inline_image().is_none());
        assert_eq!(
            truncated.empty_reason(),
            "no usable content, finish reason MAX_TOKENS"
        );
    }

    #[test]
    fn parses_error_bodies() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            ApiErrorBody::message_from(body),
            "RESOURCE_EXHAUSTED: Quota exceeded"
        );
        assert_eq!(ApiErrorBody::message_from("Bad Gateway"), "Bad Gateway");
        assert_eq!(ApiErrorBody::message_from(""), "no response body");
    }
}
