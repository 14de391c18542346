//! Crop recommendations with a generated photo per crop.
//!
//! The model proposes at least three crops for the household or community
//! described by the request, each with planting information and a pair of
//! image keywords. Every crop then gets its own image call; a crop whose
//! image fails receives a placeholder URL built from its name, and the
//! keywords never leave the flow.
//!
//! Community requests additionally receive bulk-planning fields: the area
//! required, seed quantities per crop, a planting schedule and an estimated
//! weekly yield.

use mavuno_core::template::{Template, TemplateError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::form_urlencoded;

use super::common::{DietaryNeed, GardenVariant, WaterAvailability, enum_schema};
use crate::definition::{EnrichmentStep, EntityGuard, FlowDefinition, VariantRule};

/// Registered flow name.
pub const NAME: &str = "recommendations";

/// Minimum number of crops in a recommendation.
pub const MIN_CROPS: u64 = 3;

/// Message reported when the model proposes no crops.
pub const EMPTY_MESSAGE: &str =
    "The AI could not generate recommendations for the provided data. Please try adjusting your inputs.";

const PROMPT: &str = r#"You are an expert in recommending crop combinations for home gardens, schools and community farms, with deep knowledge of nutrition and sustainable agriculture.

Suggest an optimized set of at least THREE crops that together provide a balanced micronutrient supply for the context below, with detailed planting information for each crop.

{{#if variant == "community"}}This is a community garden. Recommend resilient, high-yield crops that are easy for groups to manage and suitable for teaching. Also provide:
- "areaRequired": the total area the plan needs
- "seedQuantities": a list of {"cropName", "quantity"} entries, one per crop
- "plantingSchedule": when to plant each crop
- "estimatedWeeklyYield": the expected weekly harvest once established
{{else}}This is a family garden. Keep the plan at household scale.
{{/if}}
Water availability options:
- rainfed: crops are watered by natural rainfall
- irrigated: crops are watered through an irrigation system
- sack/bag garden: crops are grown in sacks or bags, suitable for small spaces
- balcony garden: crops are grown in containers on a balcony

Context:
- Garden type: {{variant}}
- Land size: {{{landSize}}}
- Region: {{{region}}}
- Number of people: {{familySize}}
- Dietary goal: {{{dietaryGoal}}}
- Water availability: {{waterAvailability}}

Respond with a JSON object containing:
1. "overallRationale": why this combination suits the context
2. "crops": a list where each crop has
   - "name": the crop name
   - "rationale": one or two sentences on its nutritional benefit and fit for the region, land size and dietary goal
   - "imageKeywords": one or two keywords for a photo of the crop, e.g. "kale plant"
   - "plantingInfo": an object with "spacing", "maturity" and "intercropping"

Always recommend at least three different crops.
"#;

const IMAGE_PROMPT: &str =
    "A vibrant, high-quality photo of {{imageKeywords}} growing in a garden, suitable for a gardening app.";

const PLACEHOLDER_BASE: &str = "https://placehold.co/400x300.png?text=";

/// Placeholder image URL for a crop whose image could not be generated.
pub fn placeholder_image(name: &str) -> String {
    let text: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
    format!("{PLACEHOLDER_BASE}{text}")
}

fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "variant": enum_schema::<GardenVariant>(),
            "landSize": { "type": "string", "minLength": 1 },
            "region": { "type": "string", "minLength": 1 },
            "familySize": { "type": "integer", "minimum": 1 },
            "dietaryNeeds": enum_schema::<DietaryNeed>(),
            "waterAvailability": enum_schema::<WaterAvailability>()
        },
        "required": [
            "variant", "landSize", "region", "familySize", "dietaryNeeds", "waterAvailability"
        ]
    })
}

fn planting_info_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "spacing": { "type": "string" },
            "maturity": { "type": "string" },
            "intercropping": { "type": "string" }
        },
        "required": ["spacing", "maturity", "intercropping"]
    })
}

fn recommendation_schema(image_field: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "overallRationale": { "type": "string" },
            "crops": {
                "type": "array",
                "minItems": MIN_CROPS,
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "minLength": 1 },
                        "rationale": { "type": "string" },
                        image_field: { "type": "string", "minLength": 1 },
                        "plantingInfo": planting_info_schema()
                    },
                    "required": ["name", "rationale", image_field, "plantingInfo"]
                }
            }
        },
        "required": ["overallRationale", "crops"]
    })
}

fn community_variant() -> VariantRule {
    VariantRule::new("variant", GardenVariant::Community.as_ref())
        .with_field("areaRequired", json!({ "type": "string" }))
        .with_field(
            "seedQuantities",
            json!({
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "cropName": { "type": "string" },
                        "quantity": { "type": "string" }
                    },
                    "required": ["cropName", "quantity"]
                }
            }),
        )
        .with_field("plantingSchedule", json!({ "type": "string" }))
        .with_field("estimatedWeeklyYield", json!({ "type": "string" }))
}

/// Adds a readable `dietaryGoal` for the prompt.
fn prepare(request: &mut Value) {
    let goal = request
        .get("dietaryNeeds")
        .and_then(Value::as_str)
        .and_then(|key| key.parse::<DietaryNeed>().ok())
        .map(DietaryNeed::goal);

    if let (Some(goal), Some(map)) = (goal, request.as_object_mut()) {
        map.insert("dietaryGoal".into(), Value::from(goal));
    }
}

/// Builds the flow definition.
pub fn definition() -> Result<FlowDefinition, TemplateError> {
    let enrichment = EnrichmentStep::new(
        "crops",
        "name",
        "imageDataUri",
        Template::parse(IMAGE_PROMPT)?,
        placeholder_image,
    )
    .with_base_only("imageKeywords");

    Ok(FlowDefinition::new(
        NAME,
        "Recommend at least three crops for a garden, each with planting info and a photo",
        input_schema(),
        recommendation_schema("imageDataUri"),
        Template::parse(PROMPT)?,
    )
    .with_generation_schema(recommendation_schema("imageKeywords"))
    .with_prepare(prepare)
    .with_guard(EntityGuard::new("crops", EMPTY_MESSAGE))
    .with_variant(community_variant())
    .with_enrichment(enrichment))
}

/// Request for crop recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRequest {
    pub variant: GardenVariant,
    pub land_size: String,
    pub region: String,
    pub family_size: u32,
    pub dietary_needs: DietaryNeed,
    pub water_availability: WaterAvailability,
}

/// Spacing, maturity and companion planting advice for one crop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantingInfo {
    pub spacing: String,
    pub maturity: String,
    pub intercropping: String,
}

/// One recommended crop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedCrop {
    pub name: String,
    pub rationale: String,
    /// Generated photo as a data URI, or a placeholder URL.
    pub image_data_uri: String,
    pub planting_info: PlantingInfo,
}

/// Seed amount for one crop of a community plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedQuantity {
    pub crop_name: String,
    pub quantity: String,
}

/// Crop recommendations. Bulk-planning fields are set for community gardens only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRecommendations {
    pub overall_rationale: String,
    pub crops: Vec<RecommendedCrop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_required: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_quantities: Option<Vec<SeedQuantity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planting_schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_weekly_yield: Option<String>,
}
