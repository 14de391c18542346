//! Commonly used items from mavuno-flow.

pub use crate::catalog::{DietaryNeed, GardenVariant, PlantingMonth, WaterAvailability};
pub use crate::definition::{EnrichmentStep, EntityGuard, FlowDefinition, VariantRule};
pub use crate::engine::{Engine, EngineConfig, ExecutionReport, FlowResult};
pub use crate::enrich::{EnrichmentOrchestrator, Provenance};
pub use crate::registry::FlowRegistry;
pub use crate::service::Planner;
pub use crate::{FlowError, FlowState, Result};
