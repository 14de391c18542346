//! Garden health feedback from a photo.

use mavuno_core::template::{Template, TemplateError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::definition::FlowDefinition;

/// Registered flow name.
pub const NAME: &str = "diagnosis";

const PROMPT: &str = r#"You are a friendly and encouraging gardening expert reviewing a photo of a user's garden.

Analyze the attached photo.
- Give overall encouraging feedback.
- List potential issues as short, actionable alerts, for example "Spacing too tight", "Mulch needed" or "Signs of nutrient deficiency".
- If the garden looks healthy, celebrate it and return no alerts.

Respond with a JSON object containing "feedback" and an array of "alerts".
"#;

fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "photoDataUri": { "type": "string", "format": "data-uri" }
        },
        "required": ["photoDataUri"]
    })
}

fn output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "feedback": { "type": "string", "minLength": 1 },
            "alerts": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["feedback", "alerts"]
    })
}

/// Builds the flow definition.
pub fn definition() -> Result<FlowDefinition, TemplateError> {
    Ok(FlowDefinition::new(
        NAME,
        "Give feedback and alerts for a photo of a garden",
        input_schema(),
        output_schema(),
        Template::parse(PROMPT)?,
    )
    .with_media_field("photoDataUri"))
}

/// A garden photo as a `data:<mime>;base64,<data>` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GardenPhoto {
    pub photo_data_uri: String,
}

/// Feedback on a garden photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GardenDiagnosis {
    pub feedback: String,
    /// May be empty when the garden looks healthy.
    pub alerts: Vec<String>,
}

#[cfg(test)]
mod tests {
    use mavuno_core::schema::validate;

    use super::*;

    #[test]
    fn photo_is_attached_as_media() {
        let flow = definition().unwrap();
        let request = json!({ "photoDataUri": "data:image/jpeg;base64,/9j/4AAQ" });
        assert!(validate(&request, flow.input_schema()).is_ok());

        let prompt = flow.render_prompt(&request).unwrap();
        assert_eq!(prompt.media.len(), 1);
        assert_eq!(prompt.media[0].mime_type, "image/jpeg");
        assert!(!prompt.text.contains("/9j/4AAQ"));
    }

    #[test]
    fn rejects_plain_urls() {
        let request = json!({ "photoDataUri": "https://example.com/garden.jpg" });
        assert!(validate(&request, &input_schema()).is_err());
    }

    #[test]
    fn alerts_may_be_empty() {
        let output = json!({ "feedback": "Looking great!", "alerts": [] });
        assert!(validate(&output, &output_schema()).is_ok());
    }
}
