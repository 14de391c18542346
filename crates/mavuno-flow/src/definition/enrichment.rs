use std::fmt;

use mavuno_core::template::Template;

/// Builds the fallback value for an entity from its key.
///
/// Must be pure: the same key always yields the same value.
pub type FallbackFn = fn(&str) -> String;

/// Per-entity image enrichment declared by a flow.
///
/// For every item of the `entities` list in the validated base result, the
/// engine renders `prompt` against the item, asks the client for an image,
/// and writes the asset URI (or `fallback(key)` on failure) into `target`.
#[derive(Clone)]
pub struct EnrichmentStep {
    entities: String,
    key: String,
    target: String,
    prompt: Template,
    fallback: FallbackFn,
    base_only: Vec<String>,
}

impl EnrichmentStep {
    /// Creates an enrichment step.
    pub fn new(
        entities: impl Into<String>,
        key: impl Into<String>,
        target: impl Into<String>,
        prompt: Template,
        fallback: FallbackFn,
    ) -> Self {
        Self {
            entities: entities.into(),
            key: key.into(),
            target: target.into(),
            prompt,
            fallback,
            base_only: Vec::new(),
        }
    }

    /// Marks a base field as input to the enrichment prompt only.
    ///
    /// Such fields are removed during assembly.
    pub fn with_base_only(mut self, field: impl Into<String>) -> Self {
        self.base_only.push(field.into());
        self
    }

    /// Returns the name of the entity list field.
    pub fn entities(&self) -> &str {
        &self.entities
    }

    /// Returns the identifying field of each entity.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the field the enrichment value is written to.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the per-entity prompt template.
    pub fn prompt(&self) -> &Template {
        &self.prompt
    }

    /// Returns the fields dropped during assembly.
    pub fn base_only(&self) -> &[String] {
        &self.base_only
    }

    /// Computes the fallback value for an entity key.
    pub fn fallback(&self, key: &str) -> String {
        (self.fallback)(key)
    }
}

impl fmt::Debug for EnrichmentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrichmentStep")
            .field("entities", &self.entities)
            .field("key", &self.key)
            .field("target", &self.target)
            .field("base_only", &self.base_only)
            .finish_non_exhaustive()
    }
}
