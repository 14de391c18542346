//! Per-invocation execution report.

use jiff::Timestamp;
use serde::Serialize;
use uuid::Uuid;

use crate::enrich::{EnrichedEntity, Provenance};
use crate::{FlowState, TRACING_TARGET_ENGINE};

/// Enrichment provenance of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityProvenance {
    /// Position in the entity list.
    pub index: usize,
    /// Identifying key.
    pub key: String,
    /// Whether the value was generated or a fallback.
    pub provenance: Provenance,
}

/// Record of one flow invocation.
///
/// Tracks the states visited and, for flows with enrichment, which entities
/// received a fallback.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    run_id: Uuid,
    flow: String,
    started_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<Timestamp>,
    states: Vec<FlowState>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    enrichments: Vec<EntityProvenance>,
}

impl ExecutionReport {
    /// Starts a report in the `Pending` state.
    pub fn new(flow: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            flow: flow.into(),
            started_at: Timestamp::now(),
            finished_at: None,
            states: vec![FlowState::Pending],
            enrichments: Vec::new(),
        }
    }

    /// Moves to `next` and logs the transition.
    pub(crate) fn transition(&mut self, next: FlowState) {
        let from = self.state();
        debug_assert!(
            from.can_transition_to(next),
            "illegal transition {from} -> {next}"
        );

        tracing::debug!(
            target: TRACING_TARGET_ENGINE,
            run_id = %self.run_id,
            flow = %self.flow,
            from = %from,
            to = %next,
            "flow state transition"
        );

        self.states.push(next);
        if next.is_terminal() {
            self.finished_at = Some(Timestamp::now());
        }
    }

    /// Records the provenance of enriched entities.
    pub(crate) fn record_enrichments(&mut self, enriched: &[EnrichedEntity]) {
        self.enrichments
            .extend(enriched.iter().map(|entity| EntityProvenance {
                index: entity.index,
                key: entity.key.clone(),
                provenance: entity.provenance.clone(),
            }));
    }

    /// Returns the run identifier.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the flow name.
    pub fn flow(&self) -> &str {
        &self.flow
    }

    /// Returns when the invocation started.
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Returns when the invocation reached a terminal state.
    pub fn finished_at(&self) -> Option<Timestamp> {
        self.finished_at
    }

    /// Returns the current state.
    pub fn state(&self) -> FlowState {
        self.states.last().copied().unwrap_or(FlowState::Pending)
    }

    /// Returns every state visited, in order.
    pub fn states(&self) -> &[FlowState] {
        &self.states
    }

    /// Returns the per-entity enrichment provenance.
    pub fn enrichments(&self) -> &[EntityProvenance] {
        &self.enrichments
    }

    /// Returns the keys of entities that received a fallback.
    pub fn fallback_keys(&self) -> Vec<&str> {
        self.enrichments
            .iter()
            .filter(|e| e.provenance.is_fallback())
            .map(|e| e.key.as_str())
            .collect()
    }
}
