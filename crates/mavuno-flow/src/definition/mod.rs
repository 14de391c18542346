//! Immutable flow descriptors.
//!
//! A [`FlowDefinition`] is pure configuration: schemas, a prompt template and
//! a handful of plain function hooks. The engine runs every flow through the
//! same skeleton and consults the definition at each step.

mod enrichment;
mod variant;

use std::borrow::Cow;
use std::fmt;

pub use enrichment::{EnrichmentStep, FallbackFn};
use mavuno_core::client::{Media, Prompt};
use mavuno_core::schema::{Violation, Violations};
use mavuno_core::template::Template;
use serde_json::Value;
pub use variant::VariantRule;

/// Input preparation hook, run on the validated request before rendering.
pub type PrepareFn = fn(&mut Value);

/// Output post-processing hook, run after assembly and before the final
/// output check. Receives the prepared request and the output to adjust.
pub type PostProcessFn = fn(&Value, &mut Value);

/// Rejects a model output whose entity field is missing or empty.
///
/// Runs before the generation schema is checked so the caller gets a
/// descriptive message instead of a list of violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityGuard {
    field: String,
    message: String,
}

impl EntityGuard {
    /// Creates a guard on `field` reporting `message` when it is empty.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the guarded field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the user-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if `output` carries a non-empty value in the guarded field.
    pub fn passes(&self, output: &Value) -> bool {
        match output.get(&self.field) {
            None | Some(Value::Null) => false,
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }
}

/// Declarative description of one named flow.
#[derive(Clone)]
pub struct FlowDefinition {
    name: String,
    description: String,
    input_schema: Value,
    generation_schema: Option<Value>,
    output_schema: Value,
    template: Template,
    media_fields: Vec<String>,
    prepare: Option<PrepareFn>,
    guard: Option<EntityGuard>,
    variants: Vec<VariantRule>,
    enrichment: Option<EnrichmentStep>,
    post_process: Option<PostProcessFn>,
}

impl FlowDefinition {
    /// Creates a flow whose model output is returned as-is once validated.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        output_schema: Value,
        template: Template,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            generation_schema: None,
            output_schema,
            template,
            media_fields: Vec::new(),
            prepare: None,
            guard: None,
            variants: Vec::new(),
            enrichment: None,
            post_process: None,
        }
    }

    /// Asks the model for a different shape than the caller receives.
    pub fn with_generation_schema(mut self, schema: Value) -> Self {
        self.generation_schema = Some(schema);
        self
    }

    /// Attaches the data URI in input field `field` to the prompt as media.
    pub fn with_media_field(mut self, field: impl Into<String>) -> Self {
        self.media_fields.push(field.into());
        self
    }

    /// Sets the input preparation hook.
    pub fn with_prepare(mut self, prepare: PrepareFn) -> Self {
        self.prepare = Some(prepare);
        self
    }

    /// Sets the empty-entity guard.
    pub fn with_guard(mut self, guard: EntityGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Adds a variant rule.
    pub fn with_variant(mut self, rule: VariantRule) -> Self {
        self.variants.push(rule);
        self
    }

    /// Sets the per-entity enrichment step.
    pub fn with_enrichment(mut self, step: EnrichmentStep) -> Self {
        self.enrichment = Some(step);
        self
    }

    /// Sets the output post-processing hook.
    pub fn with_post_process(mut self, post_process: PostProcessFn) -> Self {
        self.post_process = Some(post_process);
        self
    }

    /// Returns the flow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the input schema.
    pub fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Returns the output schema before variant resolution.
    pub fn output_schema(&self) -> &Value {
        &self.output_schema
    }

    /// Returns the guard, if any.
    pub fn guard(&self) -> Option<&EntityGuard> {
        self.guard.as_ref()
    }

    /// Returns the variant rules.
    pub fn variants(&self) -> &[VariantRule] {
        &self.variants
    }

    /// Returns the enrichment step, if any.
    pub fn enrichment(&self) -> Option<&EnrichmentStep> {
        self.enrichment.as_ref()
    }

    /// Runs the preparation hook on a validated request.
    pub fn prepare(&self, request: &mut Value) {
        if let Some(prepare) = self.prepare {
            prepare(request);
        }
    }

    /// Renders the prompt for a prepared request.
    ///
    /// Fails only when a media field holds something that is not a data URI.
    pub fn render_prompt(&self, request: &Value) -> Result<Prompt, Violations> {
        let mut prompt = Prompt::new(self.template.render(request));
        let mut violations = Violations::new();

        for field in &self.media_fields {
            let Some(uri) = request.get(field).and_then(Value::as_str) else {
                continue;
            };
            match Media::from_data_uri(uri) {
                Ok(media) => prompt = prompt.with_media(media),
                Err(_) => violations.push(Violation::InvalidFormat {
                    path: field.clone(),
                    format: "data-uri".to_string(),
                }),
            }
        }

        if violations.is_empty() {
            Ok(prompt)
        } else {
            Err(violations)
        }
    }

    /// Returns the schema the model is asked to satisfy for `request`.
    pub fn generation_schema_for(&self, request: &Value) -> Cow<'_, Value> {
        let base = self.generation_schema.as_ref().unwrap_or(&self.output_schema);
        self.resolve_variants(base, request)
    }

    /// Returns the schema the final result must satisfy for `request`.
    pub fn output_schema_for(&self, request: &Value) -> Cow<'_, Value> {
        self.resolve_variants(&self.output_schema, request)
    }

    fn resolve_variants<'a>(&self, schema: &'a Value, request: &Value) -> Cow<'a, Value> {
        let active: Vec<_> = self
            .variants
            .iter()
            .filter(|rule| rule.is_active(request))
            .collect();
        if active.is_empty() {
            return Cow::Borrowed(schema);
        }

        let mut schema = schema.clone();
        for rule in active {
            rule.extend_schema(&mut schema);
        }
        Cow::Owned(schema)
    }

    /// Removes fields owned by variants that `request` does not select.
    pub fn strip_inactive_variants(&self, request: &Value, output: &mut Value) {
        let Some(map) = output.as_object_mut() else {
            return;
        };
        for rule in self.variants.iter().filter(|rule| !rule.is_active(request)) {
            for field in rule.field_names() {
                map.remove(field);
            }
        }
    }

    /// Runs the post-processing hook.
    pub fn post_process(&self, request: &Value, output: &mut Value) {
        if let Some(post_process) = self.post_process {
            post_process(request, output);
        }
    }
}

impl fmt::Debug for FlowDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowDefinition")
            .field("name", &self.name)
            .field("media_fields", &self.media_fields)
            .field("guard", &self.guard)
            .field("variants", &self.variants.len())
            .field("enrichment", &self.enrichment.is_some())
            .field("post_process", &self.post_process.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn definition() -> FlowDefinition {
        FlowDefinition::new(
            "demo",
            "Demo flow",
            json!({ "type": "object" }),
            json!({
                "type": "object",
                "properties": { "items": { "type": "array" } },
                "required": ["items"]
            }),
            Template::parse("Photo for {{name}}").unwrap(),
        )
        .with_media_field("photo")
        .with_variant(
            VariantRule::new("variant", "community")
                .with_field("poster", json!({ "type": "string" })),
        )
    }

    #[test]
    fn guard_rejects_empty_values() {
        let guard = EntityGuard::new("crops", "no crops");
        assert!(!guard.passes(&json!({})));
        assert!(!guard.passes(&json!({ "crops": null })));
        assert!(!guard.passes(&json!({ "crops": [] })));
        assert!(!guard.passes(&json!({ "crops": "  " })));
        assert!(guard.passes(&json!({ "crops": ["Kale"] })));
    }

    #[test]
    fn renders_prompt_with_media() {
        let flow = definition();
        let prompt = flow
            .render_prompt(&json!({ "name": "Amina", "photo": "data:image/png;base64,AAAA" }))
            .unwrap();
        assert_eq!(prompt.text, "Photo for Amina");
        assert_eq!(prompt.media.len(), 1);
        assert_eq!(prompt.media[0].mime_type, "image/png");

        let violations = flow
            .render_prompt(&json!({ "photo": "https://example.com/a.png" }))
            .unwrap_err();
        assert_eq!(violations.paths(), vec!["photo"]);
    }

    #[test]
    fn variant_fields_follow_discriminator() {
        let flow = definition();
        let family = json!({ "variant": "family" });
        let community = json!({ "variant": "community" });

        let schema = flow.output_schema_for(&community);
        assert_eq!(schema["required"], json!(["items", "poster"]));
        assert!(matches!(flow.output_schema_for(&family), Cow::Borrowed(_)));

        let mut output = json!({ "items": [], "poster": "Grow greens" });
        flow.strip_inactive_variants(&community, &mut output);
        assert!(output.get("poster").is_some());
        flow.strip_inactive_variants(&family, &mut output);
        assert!(output.get("poster").is_none());
    }
}
