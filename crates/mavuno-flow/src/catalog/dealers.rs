//! Agro-dealer lookup for a region.

use mavuno_core::template::{Template, TemplateError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::definition::{EntityGuard, FlowDefinition};

/// Registered flow name.
pub const NAME: &str = "dealers";

/// Message reported when the model returns no dealers.
pub const EMPTY_MESSAGE: &str = "The AI could not find any dealers for the selected region.";

const PROMPT: &str = r#"You are a helpful assistant for a farming app. List agro-dealers for a user in a specific region of Kenya.

User's region: {{{region}}}

Generate at least three plausible but fictional agro-dealer shops for this region. For each dealer give a "name", a general "location" (like "Main Street, Town Center") and a fictional Kenyan "phone" number.

The data must be fictional: you have no access to real business directories.

Respond with a JSON object containing a "dealers" array.
"#;

fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "region": { "type": "string", "minLength": 1 }
        },
        "required": ["region"]
    })
}

fn output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "dealers": {
                "type": "array",
                "minItems": 3,
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "minLength": 1 },
                        "location": { "type": "string" },
                        "phone": { "type": "string" }
                    },
                    "required": ["name", "location", "phone"]
                }
            }
        },
        "required": ["dealers"]
    })
}

/// Builds the flow definition.
pub fn definition() -> Result<FlowDefinition, TemplateError> {
    Ok(FlowDefinition::new(
        NAME,
        "List at least three agro-dealers for a region",
        input_schema(),
        output_schema(),
        Template::parse(PROMPT)?,
    )
    .with_guard(EntityGuard::new("dealers", EMPTY_MESSAGE)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealerRequest {
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dealer {
    pub name: String,
    pub location: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealerList {
    pub dealers: Vec<Dealer>,
}

#[cfg(test)]
mod tests {
    use mavuno_core::schema::validate;

    use super::*;

    fn dealer(name: &str) -> Value {
        json!({ "name": name, "location": "Main Street", "phone": "+254 700 000000" })
    }

    #[test]
    fn requires_three_dealers() {
        let two = json!({ "dealers": [dealer("A"), dealer("B")] });
        let violations = validate(&two, &output_schema()).unwrap_err();
        assert_eq!(violations.paths(), vec!["dealers"]);

        let three = json!({ "dealers": [dealer("A"), dealer("B"), dealer("C")] });
        let list: DealerList = serde_json::from_value(three.clone()).unwrap();
        assert!(validate(&three, &output_schema()).is_ok());
        assert_eq!(list.dealers[2].name, "C");
    }

    #[test]
    fn guard_rejects_empty_list() {
        let flow = definition().unwrap();
        let guard = flow.guard().unwrap();
        assert!(!guard.passes(&json!({ "dealers": [] })));
        assert_eq!(guard.message(), EMPTY_MESSAGE);
    }
}
