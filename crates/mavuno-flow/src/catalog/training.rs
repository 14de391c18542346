//! Printable training guide for a set of crops.
//!
//! Community guides also carry a nutrition poster.

use mavuno_core::template::{Template, TemplateError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::common::{DietaryNeed, GardenVariant, enum_schema};
use crate::definition::{EntityGuard, FlowDefinition, VariantRule};

/// Registered flow name.
pub const NAME: &str = "training-guide";

/// Message reported when the model returns no title.
pub const EMPTY_MESSAGE: &str = "The AI could not generate a training guide. Please try again.";

const PROMPT: &str = r#"You are an expert curriculum developer for agriculture education. Create a simple, printable training guide for the crops below, easy to follow for beginners such as teachers, community health workers or families.

{{#if variant == "community"}}This guide is for a community garden: write for teaching groups or children, in simple language with an educational focus. Use Markdown such as **Bold Titles** and * for lists.
{{else}}This guide is for a family garden: be direct and focused on home gardening success.
{{/if}}
Crops to cover:
{{#each crops}}- {{{this}}}
{{/each}}
Garden type: {{variant}}
Dietary goal: {{{dietaryGoal}}}

Instructions:
1. Write a catchy "title".
2. Write a brief "introduction".
3. For each crop, add a "sections" entry with "cropName" and "content" covering planting, care (watering, sunlight, basic pest control), harvesting and, for community gardens, a fun fact.
4. Write a positive "conclusion".
{{#if variant == "community"}}5. Add a printable "poster" with a catchy "title" tied to the dietary goal and a short motivational "body" encouraging the community to grow and eat these crops.
{{/if}}
Respond with a JSON object.
"#;

fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "crops": {
                "type": "array",
                "minItems": 1,
                "items": { "type": "string", "minLength": 1 }
            },
            "variant": enum_schema::<GardenVariant>(),
            "dietaryNeeds": { "type": "string", "minLength": 1 }
        },
        "required": ["crops", "variant", "dietaryNeeds"]
    })
}

fn output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string", "minLength": 1 },
            "introduction": { "type": "string" },
            "sections": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "cropName": { "type": "string" },
                        "content": { "type": "string" }
                    },
                    "required": ["cropName", "content"]
                }
            },
            "conclusion": { "type": "string" }
        },
        "required": ["title", "introduction", "sections", "conclusion"]
    })
}

fn poster_variant() -> VariantRule {
    VariantRule::new("variant", GardenVariant::Community.as_ref()).with_field(
        "poster",
        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "body": { "type": "string" }
            },
            "required": ["title", "body"]
        }),
    )
}

/// Resolves `dietaryNeeds` to a label when it is a known key.
fn prepare(request: &mut Value) {
    let Some(needs) = request.get("dietaryNeeds").and_then(Value::as_str) else {
        return;
    };
    let goal = match needs.parse::<DietaryNeed>() {
        Ok(need) => need.label().to_string(),
        Err(_) => needs.to_string(),
    };
    if let Some(map) = request.as_object_mut() {
        map.insert("dietaryGoal".into(), Value::from(goal));
    }
}

/// Builds the flow definition.
pub fn definition() -> Result<FlowDefinition, TemplateError> {
    Ok(FlowDefinition::new(
        NAME,
        "Write a printable training guide for the given crops",
        input_schema(),
        output_schema(),
        Template::parse(PROMPT)?,
    )
    .with_prepare(prepare)
    .with_guard(EntityGuard::new("title", EMPTY_MESSAGE))
    .with_variant(poster_variant()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRequest {
    pub crops: Vec<String>,
    pub variant: GardenVariant,
    /// A dietary key such as `child_health`, or free text.
    pub dietary_needs: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideSection {
    pub crop_name: String,
    /// Markdown.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poster {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingGuide {
    pub title: String,
    pub introduction: String,
    pub sections: Vec<GuideSection>,
    pub conclusion: String,
    /// Present for community gardens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<Poster>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_uses_label_for_known_keys() {
        let mut request = json!({ "dietaryNeeds": "child_health" });
        prepare(&mut request);
        assert_eq!(request["dietaryGoal"], "Child Health (U5)");

        let mut free_text = json!({ "dietaryNeeds": "Low sodium" });
        prepare(&mut free_text);
        assert_eq!(free_text["dietaryGoal"], "Low sodium");
    }

    #[test]
    fn poster_requested_for_community_only() {
        let flow = definition().unwrap();
        let community = json!({ "variant": "community", "crops": ["Kale"] });
        let family = json!({ "variant": "family", "crops": ["Kale"] });

        assert!(flow.render_prompt(&community).unwrap().text.contains("\"poster\""));
        assert!(!flow.render_prompt(&family).unwrap().text.contains("\"poster\""));
        assert_eq!(
            flow.output_schema_for(&community)["required"],
            json!(["title", "introduction", "sections", "conclusion", "poster"])
        );
    }
}
