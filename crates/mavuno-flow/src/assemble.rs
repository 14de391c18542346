//! Merges enrichment outcomes back into the base result.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::definition::EnrichmentStep;
use crate::enrich::{EnrichedEntity, entity_key};

/// Errors raised while merging enriched entities into a base result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    /// The base result is not an object with an entity list.
    #[error("base result has no '{0}' list")]
    MissingEntities(String),

    /// An item of the entity list is not an object.
    #[error("entity {index} is not an object")]
    InvalidEntity {
        /// Position in the entity list.
        index: usize,
    },

    /// The number of enriched entities differs from the base list.
    #[error("expected {expected} enriched entities, got {actual}")]
    CountMismatch {
        /// Entities in the base result.
        expected: usize,
        /// Enriched entities supplied.
        actual: usize,
    },

    /// No enriched entity matches a base entity by index and key.
    #[error("no enriched entity for index {index} with key '{key}'")]
    UnmatchedEntity {
        /// Position in the entity list.
        index: usize,
        /// Key of the base entity.
        key: String,
    },
}

/// Builds the final result from a validated base result and its enrichments.
///
/// Non-entity fields of `base` are copied verbatim. The entity list is
/// rebuilt in base order, pairing each base entity with the enriched entity
/// of the same index and key. Each rebuilt entity keeps its base fields,
/// loses the step's base-only fields and gains the enrichment value under
/// the step's target field.
pub fn assemble(
    base: &Value,
    step: &EnrichmentStep,
    enriched: Vec<EnrichedEntity>,
) -> Result<Value, AssemblyError> {
    let missing = || AssemblyError::MissingEntities(step.entities().to_string());
    let base_map = base.as_object().ok_or_else(missing)?;
    let items = base_map
        .get(step.entities())
        .and_then(Value::as_array)
        .ok_or_else(missing)?;

    if enriched.len() != items.len() {
        return Err(AssemblyError::CountMismatch {
            expected: items.len(),
            actual: enriched.len(),
        });
    }

    let mut slots: Vec<Option<EnrichedEntity>> = (0..items.len()).map(|_| None).collect();
    for entity in enriched {
        if let Some(slot) = slots.get_mut(entity.index) {
            *slot = Some(entity);
        }
    }

    let mut entities = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let mut fields: Map<String, Value> = item
            .as_object()
            .cloned()
            .ok_or(AssemblyError::InvalidEntity { index })?;

        let key = entity_key(item, step.key());
        let entity = slots[index]
            .take()
            .filter(|entity| entity.key == key)
            .ok_or_else(|| AssemblyError::UnmatchedEntity {
                index,
                key: key.clone(),
            })?;

        for field in step.base_only() {
            fields.remove(field);
        }
        fields.insert(step.target().to_string(), entity.value);
        entities.push(Value::Object(fields));
    }

    let mut output = base_map.clone();
    output.insert(step.entities().to_string(), Value::Array(entities));
    Ok(Value::Object(output))
}
