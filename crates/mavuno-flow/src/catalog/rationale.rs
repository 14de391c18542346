//! Per-crop rationale for an existing recommendation.

use std::collections::BTreeMap;

use mavuno_core::template::{Template, TemplateError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::definition::FlowDefinition;

/// Registered flow name.
pub const NAME: &str = "rationale";

const PROMPT: &str = r#"You are an expert nutritionist and agricultural advisor. Explain, for each recommended crop, its nutritional benefits and how it addresses the dietary needs below.

Land size: {{{landSize}}}
Region: {{{region}}}
Family size: {{familySize}}
Dietary needs: {{{dietaryNeeds}}}
Crop recommendations: {{#each cropRecommendations}}{{#if @index == 0}}{{else}}, {{/if}}{{{this}}}{{/each}}

Return a JSON object with a single key "rationale" whose value maps each crop name to its rationale, for example:
{"rationale": {"Kale": "Rich in iron...", "Carrots": "High in vitamin A..."}}
"#;

fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "landSize": { "type": "string" },
            "region": { "type": "string" },
            "familySize": { "type": ["integer", "string"] },
            "dietaryNeeds": { "type": "string" },
            "cropRecommendations": {
                "type": "array",
                "minItems": 1,
                "items": { "type": "string", "minLength": 1 }
            }
        },
        "required": ["landSize", "region", "familySize", "dietaryNeeds", "cropRecommendations"]
    })
}

fn output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "rationale": {
                "type": "object",
                "additionalProperties": { "type": "string" }
            }
        },
        "required": ["rationale"]
    })
}

/// Builds the flow definition.
pub fn definition() -> Result<FlowDefinition, TemplateError> {
    Ok(FlowDefinition::new(
        NAME,
        "Explain the nutritional rationale for each recommended crop",
        input_schema(),
        output_schema(),
        Template::parse(PROMPT)?,
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RationaleRequest {
    pub land_size: String,
    pub region: String,
    pub family_size: u32,
    pub dietary_needs: String,
    pub crop_recommendations: Vec<String>,
}

/// Rationale text keyed by crop name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRationale {
    pub rationale: BTreeMap<String, String>,
}
