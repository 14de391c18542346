//! Grid planting map for a set of crops.
//!
//! The model's grid is normalized before it is returned: it is clamped to
//! [`MAX_GRID`] rows and columns, any cell that is not one of the requested
//! crops becomes [`EMPTY_CELL`], and every requested crop gets a legend
//! color.

use std::collections::BTreeMap;

use mavuno_core::template::{Template, TemplateError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::definition::{EntityGuard, FlowDefinition};

/// Registered flow name.
pub const NAME: &str = "layout";

/// Largest grid dimension returned to callers.
pub const MAX_GRID: usize = 10;

/// Cell value for an unplanted square.
pub const EMPTY_CELL: &str = "empty";

/// Message reported when the model returns no grid.
pub const EMPTY_MESSAGE: &str = "The AI could not generate a garden layout. Please try again.";

/// Legend colors assigned to crops the model left out of the legend.
const PALETTE: [&str; 10] = [
    "green",
    "orange",
    "red",
    "yellow",
    "purple",
    "brown",
    "darkgreen",
    "lightgreen",
    "pink",
    "blue",
];

const PROMPT: &str = r#"You are an expert landscape designer specializing in kitchen gardens. Create a simple, visual planting map.

Context:
- Land size: {{{landSize}}}
- Planting location: {{{plantingLocation}}}
- Crops:
{{#each crops}}  - {{name}} (spacing: {{spacing}}, intercropping: {{intercropping}})
{{/each}}
Instructions:
1. Produce a small grid, no larger than 10x10, as a list of rows of cells.
2. Arrange the crops considering their spacing and beneficial intercropping. Use the full crop name in each cell and the string "empty" for unplanted squares.
3. The grid is a practical representation, not a to-scale map. For sack or balcony gardens, represent planting in containers.
4. Write a short, encouraging "description" explaining the placement.
5. Provide a "legend" mapping each crop name to a common color name such as "green", "orange" or "red".

Respond with a JSON object containing "layout", "description" and "legend".
"#;

fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "crops": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "minLength": 1 },
                        "spacing": { "type": "string" },
                        "intercropping": { "type": "string" }
                    },
                    "required": ["name", "spacing", "intercropping"]
                }
            },
            "landSize": { "type": "string", "minLength": 1 },
            "plantingLocation": { "type": "string", "minLength": 1 }
        },
        "required": ["crops", "landSize", "plantingLocation"]
    })
}

fn output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "layout": {
                "type": "array",
                "minItems": 1,
                "items": { "type": "array", "items": { "type": "string" } }
            },
            "description": { "type": "string" },
            "legend": {
                "type": "object",
                "additionalProperties": { "type": "string" }
            }
        },
        "required": ["layout", "description", "legend"]
    })
}

fn crop_names(request: &Value) -> Vec<&str> {
    request
        .get("crops")
        .and_then(Value::as_array)
        .map(|crops| {
            crops
                .iter()
                .filter_map(|crop| crop.get("name").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

/// Clamps the grid, blanks unknown cells and completes the legend.
fn normalize(request: &Value, output: &mut Value) {
    let names = crop_names(request);
    let Some(output) = output.as_object_mut() else {
        return;
    };

    if let Some(Value::Array(rows)) = output.get_mut("layout") {
        rows.truncate(MAX_GRID);
        for row in rows.iter_mut() {
            let Value::Array(cells) = row else {
                continue;
            };
            cells.truncate(MAX_GRID);
            for cell in cells.iter_mut() {
                let matched = cell
                    .as_str()
                    .and_then(|c| names.iter().find(|name| name.eq_ignore_ascii_case(c.trim())));
                *cell = Value::from(matched.copied().unwrap_or(EMPTY_CELL));
            }
        }
    }

    let legend = output
        .entry("legend")
        .or_insert_with(|| Value::Object(Map::new()));
    if !legend.is_object() {
        *legend = Value::Object(Map::new());
    }
    if let Value::Object(legend) = legend {
        for (i, name) in names.iter().enumerate() {
            if !legend.contains_key(*name) {
                legend.insert(name.to_string(), Value::from(PALETTE[i % PALETTE.len()]));
            }
        }
    }
}

/// Builds the flow definition.
pub fn definition() -> Result<FlowDefinition, TemplateError> {
    Ok(FlowDefinition::new(
        NAME,
        "Arrange crops on a planting grid of at most 10x10 with a color legend",
        input_schema(),
        output_schema(),
        Template::parse(PROMPT)?,
    )
    .with_guard(EntityGuard::new("layout", EMPTY_MESSAGE))
    .with_post_process(normalize))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutCrop {
    pub name: String,
    pub spacing: String,
    pub intercropping: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    pub crops: Vec<LayoutCrop>,
    pub land_size: String,
    /// E.g. "On Ground", "Sack Garden" or "Balcony Garden".
    pub planting_location: String,
}

/// A planting grid with its legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GardenLayout {
    /// Rows of cells; each cell is a crop name or `"empty"`.
    pub layout: Vec<Vec<String>>,
    pub description: String,
    /// Crop name to color name.
    pub legend: BTreeMap<String, String>,
}
