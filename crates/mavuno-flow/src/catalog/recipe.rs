//! Simple, localized recipe for one crop.

use mavuno_core::template::{Template, TemplateError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::definition::{EntityGuard, FlowDefinition};

/// Registered flow name.
pub const NAME: &str = "recipe";

/// Message reported when the model returns no title.
pub const EMPTY_MESSAGE: &str = "The AI could not generate a recipe. Please try again.";

const PROMPT: &str = r#"You are a nutritionist who creates simple, healthy, localized recipes for East African home cooks, using common household tools and locally available ingredients. Use very simple, clear language suitable for readers with low literacy.

Create one simple recipe for "{{cropName}}", appropriate for "{{context}}". For example, for moringa and toddlers a good title is "How to make moringa ugali for toddlers".

Provide:
1. "title": a simple, descriptive title
2. "description": one sentence describing the dish
3. "ingredients": a list of ingredients
4. "instructions": a list of short, simple steps

Respond with a JSON object.
"#;

fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "cropName": { "type": "string", "minLength": 1 },
            "context": { "type": "string" }
        },
        "required": ["cropName", "context"]
    })
}

fn generation_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string", "minLength": 1 },
            "description": { "type": "string" },
            "ingredients": { "type": "array", "items": { "type": "string" } },
            "instructions": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["title", "description", "ingredients", "instructions"]
    })
}

fn output_schema() -> Value {
    let mut schema = generation_schema();
    schema["properties"]["fullTextForAudio"] = json!({ "type": "string", "minLength": 1 });
    if let Some(required) = schema["required"].as_array_mut() {
        required.push(json!("fullTextForAudio"));
    }
    schema
}

fn strings(value: &Value) -> Vec<&str> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Composes the whole recipe as one text for read-aloud.
pub fn full_text_for_audio(recipe: &Value) -> String {
    let title = recipe["title"].as_str().unwrap_or_default();
    let description = recipe["description"].as_str().unwrap_or_default();
    let ingredients = strings(&recipe["ingredients"]).join(", ");
    let instructions = strings(&recipe["instructions"])
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {step}", i + 1))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "Recipe: {title}. Description: {description}. Ingredients: {ingredients}. Instructions: {instructions}"
    )
}

fn compose_audio_text(_request: &Value, output: &mut Value) {
    let text = full_text_for_audio(output);
    if let Some(map) = output.as_object_mut() {
        map.insert("fullTextForAudio".into(), Value::from(text));
    }
}

/// Builds the flow definition.
pub fn definition() -> Result<FlowDefinition, TemplateError> {
    Ok(FlowDefinition::new(
        NAME,
        "Write a simple local recipe for a crop, with read-aloud text",
        input_schema(),
        output_schema(),
        Template::parse(PROMPT)?,
    )
    .with_generation_schema(generation_schema())
    .with_guard(EntityGuard::new("title", EMPTY_MESSAGE))
    .with_post_process(compose_audio_text))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRequest {
    pub crop_name: String,
    /// Who the dish is for, e.g. "for toddlers".
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub full_text_for_audio: String,
}
