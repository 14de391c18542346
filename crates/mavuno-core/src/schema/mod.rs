//! Structural validation of JSON values against declared schemas.
//!
//! Schemas are plain JSON-Schema documents restricted to the keywords the
//! flows actually use: `type` (a name or a list of names), `properties`,
//! `required`, `additionalProperties`, `items`, `minItems`, `maxItems`,
//! `enum`, `minLength`, `maxLength`, `minimum`, `maximum`, and
//! `format: "data-uri"`. Unknown keywords are ignored.
//!
//! The same validator is applied to inbound requests and to model outputs.
//! It never stops at the first problem: the returned [`Violations`] lists
//! every offending field.

mod violation;

use serde_json::{Map, Value};
pub use violation::{Violation, Violations};

use crate::TRACING_TARGET_SCHEMA;
use crate::client::Media;

/// Path used for the root value.
pub const ROOT: &str = "$";

/// Validates `value` against `schema`.
///
/// Returns `Ok(())` when the value conforms, or every violation otherwise.
pub fn validate(value: &Value, schema: &Value) -> Result<(), Violations> {
    let mut violations = Violations::new();
    check(schema, value, ROOT, &mut violations);

    if violations.is_empty() {
        return Ok(());
    }

    tracing::debug!(
        target: TRACING_TARGET_SCHEMA,
        count = violations.len(),
        paths = ?violations.paths(),
        "value failed schema validation"
    );
    Err(violations)
}

fn check(schema: &Value, value: &Value, path: &str, out: &mut Violations) {
    // `true` and `{}` accept anything.
    let Some(schema) = schema.as_object() else {
        return;
    };

    let types = declared_types(schema);
    if !types.is_empty() && !types.iter().any(|t| matches_type(t, value)) {
        out.push(Violation::TypeMismatch {
            path: path.to_string(),
            expected: types.join(" | "),
            found: type_name(value).to_string(),
        });
        return;
    }

    if let Some(allowed) = schema.get("enum").and_then(Value::as_array)
        && !allowed.contains(value)
    {
        out.push(Violation::EnumOutOfRange {
            path: path.to_string(),
            value: value.to_string(),
            allowed: allowed.iter().map(Value::to_string).collect(),
        });
    }

    match value {
        Value::Object(map) => check_object(schema, map, path, out),
        Value::Array(items) => check_array(schema, items, path, out),
        Value::String(s) => check_string(schema, s, path, out),
        Value::Number(n) => {
            if let Some(num) = n.as_f64() {
                check_number(schema, num, path, out);
            }
        }
        Value::Bool(_) | Value::Null => {}
    }
}

fn check_object(schema: &Map<String, Value>, map: &Map<String, Value>, path: &str, out: &mut Violations) {
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if !map.contains_key(field) {
                out.push(Violation::MissingField {
                    path: child_path(path, field),
                });
            }
        }
    }

    let properties = schema.get("properties").and_then(Value::as_object);
    let additional = schema.get("additionalProperties");

    for (key, value) in map {
        let field_path = child_path(path, key);
        match properties.and_then(|p| p.get(key)) {
            Some(field_schema) => check(field_schema, value, &field_path, out),
            None => match additional {
                Some(Value::Bool(false)) => {
                    out.push(Violation::UnexpectedField { path: field_path });
                }
                Some(extra_schema @ Value::Object(_)) => {
                    check(extra_schema, value, &field_path, out);
                }
                _ => {}
            },
        }
    }
}

fn check_array(schema: &Map<String, Value>, items: &[Value], path: &str, out: &mut Violations) {
    if let Some(min) = schema.get("minItems").and_then(Value::as_u64)
        && (items.len() as u64) < min
    {
        out.push(Violation::TooFewItems {
            path: path.to_string(),
            min,
            actual: items.len(),
        });
    }

    if let Some(max) = schema.get("maxItems").and_then(Value::as_u64)
        && (items.len() as u64) > max
    {
        out.push(Violation::TooManyItems {
            path: path.to_string(),
            max,
            actual: items.len(),
        });
    }

    if let Some(item_schema) = schema.get("items") {
        for (i, item) in items.iter().enumerate() {
            check(item_schema, item, &format!("{path}[{i}]"), out);
        }
    }
}

fn check_string(schema: &Map<String, Value>, s: &str, path: &str, out: &mut Violations) {
    let length = s.chars().count();

    if let Some(min) = schema.get("minLength").and_then(Value::as_u64)
        && (length as u64) < min
    {
        out.push(Violation::TooShort {
            path: path.to_string(),
            min,
            actual: length,
        });
    }

    if let Some(max) = schema.get("maxLength").and_then(Value::as_u64)
        && (length as u64) > max
    {
        out.push(Violation::TooLong {
            path: path.to_string(),
            max,
            actual: length,
        });
    }

    if let Some(format) = schema.get("format").and_then(Value::as_str)
        && format == "data-uri"
        && !Media::is_data_uri(s)
    {
        out.push(Violation::InvalidFormat {
            path: path.to_string(),
            format: format.to_string(),
        });
    }
}

fn check_number(schema: &Map<String, Value>, num: f64, path: &str, out: &mut Violations) {
    if let Some(min) = schema.get("minimum").and_then(Value::as_f64)
        && num < min
    {
        out.push(Violation::BelowMinimum {
            path: path.to_string(),
            min,
            actual: num,
        });
    }

    if let Some(max) = schema.get("maximum").and_then(Value::as_f64)
        && num > max
    {
        out.push(Violation::AboveMaximum {
            path: path.to_string(),
            max,
            actual: num,
        });
    }
}

fn declared_types(schema: &Map<String, Value>) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => match value {
            Value::Number(n) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            _ => false,
        },
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        _ => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn child_path(parent: &str, key: &str) -> String {
    if parent == ROOT {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn crop_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "overallRationale": { "type": "string" },
                "crops": {
                    "type": "array",
                    "minItems": 3,
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string", "minLength": 1 },
                            "plantingInfo": {
                                "type": "object",
                                "properties": { "spacing": { "type": "string" } },
                                "required": ["spacing"]
                            }
                        },
                        "required": ["name", "plantingInfo"]
                    }
                }
            },
            "required": ["overallRationale", "crops"]
        })
    }

    #[test]
    fn accepts_conforming_value() {
        let value = json!({
            "overallRationale": "Balanced micronutrients.",
            "crops": [
                { "name": "Kale", "plantingInfo": { "spacing": "30cm" } },
                { "name": "Beans", "plantingInfo": { "spacing": "15cm" } },
                { "name": "Carrot", "plantingInfo": { "spacing": "5cm" } }
            ]
        });
        assert!(validate(&value, &crop_schema()).is_ok());
    }

    #[test]
    fn reports_every_violation() {
        let value = json!({
            "crops": [
                { "name": "", "plantingInfo": {} },
                { "name": 7, "plantingInfo": { "spacing": "15cm" } }
            ]
        });

        let violations = validate(&value, &crop_schema()).unwrap_err();
        assert!(violations.contains_path("overallRationale"));
        assert!(violations.contains_path("crops"));
        assert!(violations.contains_path("crops[0].name"));
        assert!(violations.contains_path("crops[0].plantingInfo.spacing"));
        assert!(violations.contains_path("crops[1].name"));
        assert_eq!(violations.len(), 5);
    }

    #[test]
    fn classifies_violations() {
        let schema = json!({
            "type": "object",
            "properties": {
                "variant": { "type": "string", "enum": ["family", "community"] },
                "familySize": { "type": "integer", "minimum": 1 },
                "crops": { "type": "array", "minItems": 3 }
            },
            "required": ["region"]
        });
        let value = json!({ "variant": "school", "familySize": 0, "crops": [] });

        let violations = validate(&value, &schema).unwrap_err().into_vec();
        assert!(violations.contains(&Violation::MissingField {
            path: "region".into()
        }));
        assert!(
            violations
                .iter()
                .any(|v| matches!(v, Violation::EnumOutOfRange { path, .. } if path == "variant"))
        );
        assert!(violations.contains(&Violation::BelowMinimum {
            path: "familySize".into(),
            min: 1.0,
            actual: 0.0,
        }));
        assert!(violations.contains(&Violation::TooFewItems {
            path: "crops".into(),
            min: 3,
            actual: 0,
        }));
    }

    #[test]
    fn type_mismatch_stops_descent() {
        let violations = validate(&json!("not an object"), &crop_schema()).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::TypeMismatch { path, found, .. } if path == ROOT && found == "string"
        ));
    }

    #[test]
    fn integer_accepts_whole_floats() {
        let schema = json!({ "type": "integer" });
        assert!(validate(&json!(4.0), &schema).is_ok());
        assert!(validate(&json!(4.5), &schema).is_err());
    }

    #[test]
    fn nullable_types() {
        let schema = json!({ "type": ["string", "null"] });
        assert!(validate(&json!(null), &schema).is_ok());
        assert!(validate(&json!("Nakuru"), &schema).is_ok());
        assert!(validate(&json!(3), &schema).is_err());
    }

    #[test]
    fn additional_properties() {
        let closed = json!({ "type": "object", "properties": { "a": {} }, "additionalProperties": false });
        let violations = validate(&json!({ "a": 1, "b": 2 }), &closed).unwrap_err();
        assert_eq!(violations.paths(), vec!["b"]);

        let record = json!({ "type": "object", "additionalProperties": { "type": "string" } });
        assert!(validate(&json!({ "Kale": "green" }), &record).is_ok());
        let violations = validate(&json!({ "Kale": 3 }), &record).unwrap_err();
        assert_eq!(violations.paths(), vec!["Kale"]);
    }

    #[test]
    fn data_uri_format() {
        let schema = json!({ "type": "string", "format": "data-uri" });
        assert!(validate(&json!("data:image/png;base64,AAAA"), &schema).is_ok());
        let violations = validate(&json!("https://example.com/a.png"), &schema).unwrap_err();
        assert!(matches!(&violations[0], Violation::InvalidFormat { .. }));
    }

    #[test]
    fn display_joins_violations() {
        let schema = json!({ "type": "object", "required": ["a", "b"] });
        let violations = validate(&json!({}), &schema).unwrap_err();
        assert_eq!(
            violations.to_string(),
            "a: missing required field; b: missing required field"
        );
    }
}
