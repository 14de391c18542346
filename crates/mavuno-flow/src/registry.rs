//! Name to flow definition lookup table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::definition::FlowDefinition;
use crate::error::{FlowError, Result};
use crate::{TRACING_TARGET_REGISTRY, catalog};

/// Registry of immutable flow definitions.
#[derive(Clone, Default)]
pub struct FlowRegistry {
    flows: HashMap<String, Arc<FlowDefinition>>,
}

impl FlowRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in flow.
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();
        for definition in catalog::definitions()? {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// Registers a flow. Names are unique.
    pub fn register(&mut self, definition: FlowDefinition) -> Result<()> {
        let name = definition.name().to_string();
        if self.flows.contains_key(&name) {
            return Err(FlowError::DuplicateFlow(name));
        }

        tracing::debug!(
            target: TRACING_TARGET_REGISTRY,
            flow = %name,
            enrichment = definition.enrichment().is_some(),
            variants = definition.variants().len(),
            "registered flow"
        );
        self.flows.insert(name, Arc::new(definition));
        Ok(())
    }

    /// Looks up a flow by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<FlowDefinition>> {
        self.flows
            .get(name)
            .cloned()
            .ok_or_else(|| FlowError::UnknownFlow(name.to_string()))
    }

    /// Returns true if a flow is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.flows.contains_key(name)
    }

    /// Returns the registered flow names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.flows.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the registered definitions, sorted by name.
    pub fn definitions(&self) -> Vec<&FlowDefinition> {
        let mut definitions: Vec<_> = self.flows.values().map(Arc::as_ref).collect();
        definitions.sort_unstable_by(|a, b| a.name().cmp(b.name()));
        definitions
    }

    /// Returns the number of registered flows.
    pub fn len(&self) -> usize {
        self.flows.len()
    }

    /// Returns true if no flows are registered.
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

impl fmt::Debug for FlowRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowRegistry")
            .field("flows", &self.names())
            .finish()
    }
}
