//! Extracts planner form fields from a free-text query.
//!
//! Every output field is optional. Fields the model reports as `null` are
//! dropped so absent information stays absent.

use mavuno_core::template::{Template, TemplateError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::common::{
    DietaryNeed, PlantingMonth, WaterAvailability, enum_schema, nullable_enum_schema,
};
use crate::definition::FlowDefinition;

/// Registered flow name.
pub const NAME: &str = "query-parse";

const PROMPT: &str = r#"You are a helpful assistant for a farming app. Extract form fields from the user's query.

User's query: "{{{query}}}"

Extract these fields, omitting any that the query does not mention:
- landSize: the size of the land
- region: the location, like a county or town
- familySize: the number of people to feed
- plantingMonth: the month for planting, one of {{months}}
- dietaryNeeds: the nutritional goal, mapped to one of {{dietaryKeys}}. For example "for my pregnant wife" maps to "maternal_health" and "for my baby" maps to "child_health".
- waterAvailability: the planting location or water source, mapped to one of {{waterKeys}}. For example "in bags" maps to "sack/bag garden" and "on my veranda" maps to "balcony garden".

Example query: "I want to plant vegetables in March for my 5 children in Nakuru. I have a small kitchen garden that relies on rain."
Example output: {"familySize": 5, "region": "Nakuru", "plantingMonth": "March", "dietaryNeeds": "child_health", "waterAvailability": "rainfed", "landSize": "small kitchen garden"}

Respond with a JSON object containing the extracted fields.
"#;

fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "minLength": 1 }
        },
        "required": ["query"]
    })
}

fn output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "landSize": { "type": ["string", "null"] },
            "region": { "type": ["string", "null"] },
            "familySize": { "type": ["integer", "null"], "minimum": 1 },
            "plantingMonth": nullable_enum_schema::<PlantingMonth>(),
            "dietaryNeeds": nullable_enum_schema::<DietaryNeed>(),
            "waterAvailability": nullable_enum_schema::<WaterAvailability>()
        }
    })
}

/// Lists the allowed values for the prompt.
fn prepare(request: &mut Value) {
    let Some(map) = request.as_object_mut() else {
        return;
    };
    for (field, schema) in [
        ("months", enum_schema::<PlantingMonth>()),
        ("dietaryKeys", enum_schema::<DietaryNeed>()),
        ("waterKeys", enum_schema::<WaterAvailability>()),
    ] {
        map.insert(field.into(), schema["enum"].clone());
    }
}

fn drop_nulls(_request: &Value, output: &mut Value) {
    if let Some(map) = output.as_object_mut() {
        map.retain(|_, value| !value.is_null());
    }
}

/// Builds the flow definition.
pub fn definition() -> Result<FlowDefinition, TemplateError> {
    Ok(FlowDefinition::new(
        NAME,
        "Extract planner fields from a spoken or typed query",
        input_schema(),
        output_schema(),
        Template::parse(PROMPT)?,
    )
    .with_prepare(prepare)
    .with_post_process(drop_nulls))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
}

/// Fields recognized in a query. Unrecognized fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub land_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planting_month: Option<PlantingMonth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary_needs: Option<DietaryNeed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_availability: Option<WaterAvailability>,
}

#[cfg(test)]
mod tests {
    use mavuno_core::schema::validate;

    use super::*;

    #[test]
    fn accepts_empty_and_partial_output() {
        assert!(validate(&json!({}), &output_schema()).is_ok());
        assert!(
            validate(
                &json!({ "region": "Nakuru", "plantingMonth": null, "familySize": 5 }),
                &output_schema()
            )
            .is_ok()
        );
    }

    #[test]
    fn rejects_unknown_keys() {
        let violations = validate(
            &json!({ "plantingMonth": "Marchember", "waterAvailability": "hose", "familySize": 0 }),
            &output_schema(),
        )
        .unwrap_err();
        assert_eq!(
            violations.paths(),
            vec!["familySize", "plantingMonth", "waterAvailability"]
        );
    }

    #[test]
    fn drops_nulls_and_deserializes() {
        let mut output = json!({ "region": "Kisumu", "landSize": null, "dietaryNeeds": "vitamin_a" });
        drop_nulls(&json!({}), &mut output);
        assert_eq!(output, json!({ "region": "Kisumu", "dietaryNeeds": "vitamin_a" }));

        let parsed: ParsedQuery = serde_json::from_value(output).unwrap();
        assert_eq!(parsed.dietary_needs, Some(DietaryNeed::VitaminA));
        assert_eq!(parsed.land_size, None);
    }

    #[test]
    fn prompt_lists_allowed_values() {
        let flow = definition().unwrap();
        let mut request = json!({ "query": "plant in bags" });
        flow.prepare(&mut request);
        let text = flow.render_prompt(&request).unwrap().text;
        assert!(text.contains("January, February, March"));
        assert!(text.contains("rainfed, irrigated, sack/bag garden, balcony garden"));
    }
}
