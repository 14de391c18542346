//! Isolated fan-out with local recovery.
//!
//! [`EnrichmentOrchestrator::enrich`] runs one independent call per base
//! entity. A failing call never fails the batch: the entity receives its
//! fallback value instead, and the failure is logged and recorded as
//! [`Provenance::Fallback`]. Results are returned in input order no matter
//! which call finishes first.

use std::fmt;
use std::future::Future;

use futures::StreamExt;
use futures::stream;
use serde::Serialize;
use serde_json::Value;

use crate::TRACING_TARGET_ENRICH;
use crate::definition::EnrichmentStep;

/// Default cap on concurrent enrichment calls per invocation.
pub const DEFAULT_MAX_CONCURRENT_ENRICHMENTS: usize = 8;

/// One entity of a validated base result, ready for enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseEntity {
    /// Position in the base result's entity list.
    pub index: usize,
    /// Identifying field value, e.g. the crop name.
    pub key: String,
    /// The entity object as generated.
    pub fields: Value,
}

impl BaseEntity {
    /// Extracts the entities an enrichment step applies to.
    ///
    /// Returns an empty list if the entity field is missing or not a list.
    pub fn collect(base: &Value, step: &EnrichmentStep) -> Vec<Self> {
        let Some(items) = base.get(step.entities()).and_then(Value::as_array) else {
            return Vec::new();
        };

        items
            .iter()
            .enumerate()
            .map(|(index, fields)| Self {
                index,
                key: entity_key(fields, step.key()),
                fields: fields.clone(),
            })
            .collect()
    }
}

/// Returns the identifying key of an entity object.
pub(crate) fn entity_key(fields: &Value, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Where an entity's enrichment value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    /// Produced by the enrichment call.
    Generated,
    /// Substituted after the enrichment call failed.
    Fallback {
        /// Why the call failed.
        reason: String,
    },
}

impl Provenance {
    /// Returns true for [`Provenance::Fallback`].
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// A base entity together with its enrichment outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedEntity {
    /// Position in the base result's entity list.
    pub index: usize,
    /// Identifying field value.
    pub key: String,
    /// The untouched base entity.
    pub base: Value,
    /// The enrichment value, generated or fallback.
    pub value: Value,
    /// Where `value` came from.
    pub provenance: Provenance,
}

/// Runs enrichment calls concurrently, isolating failures.
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentOrchestrator {
    max_concurrency: usize,
}

impl Default for EnrichmentOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT_ENRICHMENTS)
    }
}

impl EnrichmentOrchestrator {
    /// Creates an orchestrator running at most `max_concurrency` calls at once.
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Returns the concurrency cap.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Enriches every entity and returns the outcomes in input order.
    ///
    /// `enrich_fn` is invoked once per entity. When its future fails, the
    /// entity gets `fallback_fn(entity)`. Never fails, never cancels a call.
    pub async fn enrich<F, Fut, E, B>(
        &self,
        entities: Vec<BaseEntity>,
        enrich_fn: F,
        fallback_fn: B,
    ) -> Vec<EnrichedEntity>
    where
        F: Fn(&BaseEntity) -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: fmt::Display,
        B: Fn(&BaseEntity) -> Value,
    {
        let total = entities.len();
        let enrich_fn = &enrich_fn;
        let fallback_fn = &fallback_fn;

        let tasks = entities.into_iter().map(move |entity| {
            let call = enrich_fn(&entity);
            async move {
                match call.await {
                    Ok(value) => EnrichedEntity {
                        index: entity.index,
                        key: entity.key,
                        base: entity.fields,
                        value,
                        provenance: Provenance::Generated,
                    },
                    Err(error) => {
                        let reason = error.to_string();
                        tracing::warn!(
                            target: TRACING_TARGET_ENRICH,
                            index = entity.index,
                            key = %entity.key,
                            error = %reason,
                            "enrichment failed, substituting fallback"
                        );
                        let value = fallback_fn(&entity);
                        EnrichedEntity {
                            index: entity.index,
                            key: entity.key,
                            base: entity.fields,
                            value,
                            provenance: Provenance::Fallback { reason },
                        }
                    }
                }
            }
        });

        let enriched: Vec<EnrichedEntity> = stream::iter(tasks)
            .buffered(self.max_concurrency)
            .collect()
            .await;

        tracing::debug!(
            target: TRACING_TARGET_ENRICH,
            total,
            fallbacks = enriched.iter().filter(|e| e.provenance.is_fallback()).count(),
            "enrichment joined"
        );

        enriched
    }
}
