use serde_json::{Map, Value};

/// Output fields gated on an input discriminator.
///
/// When the request's `discriminator` equals `value`, the rule's fields are
/// added to the schema as required properties. Otherwise they are removed
/// from the output, so they are present iff the discriminator matches.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRule {
    discriminator: String,
    value: Value,
    fields: Vec<(String, Value)>,
}

impl VariantRule {
    /// Creates a rule active when `discriminator == value`.
    pub fn new(discriminator: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            discriminator: discriminator.into(),
            value: value.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a required field and its schema.
    pub fn with_field(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.fields.push((name.into(), schema));
        self
    }

    /// Returns the discriminator field name.
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// Returns true if `request` selects this variant.
    pub fn is_active(&self, request: &Value) -> bool {
        request.get(&self.discriminator) == Some(&self.value)
    }

    /// Returns the names of the gated fields.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Adds the gated fields to an object schema as required properties.
    pub(crate) fn extend_schema(&self, schema: &mut Value) {
        let Some(root) = schema.as_object_mut() else {
            return;
        };

        if let Value::Object(properties) = root
            .entry("properties")
            .or_insert_with(|| Value::Object(Map::new()))
        {
            for (name, field_schema) in &self.fields {
                properties.insert(name.clone(), field_schema.clone());
            }
        }

        if let Value::Array(required) = root
            .entry("required")
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            for (name, _) in &self.fields {
                let name = Value::String(name.clone());
                if !required.contains(&name) {
                    required.push(name);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extends_schema_without_duplicates() {
        let rule = VariantRule::new("variant", "community")
            .with_field("areaRequired", json!({ "type": "string" }));
        let mut schema = json!({ "type": "object", "required": ["areaRequired"] });
        rule.extend_schema(&mut schema);

        assert_eq!(schema["required"], json!(["areaRequired"]));
        assert_eq!(schema["properties"]["areaRequired"], json!({ "type": "string" }));
    }

    #[test]
    fn matches_only_exact_value() {
        let rule = VariantRule::new("variant", "community");
        assert!(rule.is_active(&json!({ "variant": "community" })));
        assert!(!rule.is_active(&json!({ "variant": "Community" })));
        assert!(!rule.is_active(&json!({})));
    }
}
