//! Built-in garden planning flows.
//!
//! Each submodule declares one flow: its name, schemas, prompt template and
//! hooks, plus typed request and response structs for callers that prefer
//! them over raw JSON.

mod common;
pub mod dealers;
pub mod diagnose;
pub mod layout;
pub mod parse_query;
pub mod rationale;
pub mod recipe;
pub mod recommend;
pub mod training;

use mavuno_core::template::TemplateError;

pub use self::common::{DietaryNeed, GardenVariant, PlantingMonth, WaterAvailability};
use crate::definition::FlowDefinition;
use crate::error::{FlowError, Result};

type DefinitionFn = fn() -> Result<FlowDefinition, TemplateError>;

const BUILTIN: [(&str, DefinitionFn); 8] = [
    (recommend::NAME, recommend::definition),
    (diagnose::NAME, diagnose::definition),
    (layout::NAME, layout::definition),
    (dealers::NAME, dealers::definition),
    (training::NAME, training::definition),
    (recipe::NAME, recipe::definition),
    (parse_query::NAME, parse_query::definition),
    (rationale::NAME, rationale::definition),
];

/// Returns the definitions of every built-in flow.
pub fn definitions() -> Result<Vec<FlowDefinition>> {
    BUILTIN
        .iter()
        .map(|(name, definition)| {
            definition().map_err(|source| FlowError::Template {
                flow: (*name).to_string(),
                source,
            })
        })
        .collect()
}
