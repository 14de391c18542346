//! Engine configuration.

#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;

pub use crate::enrich::DEFAULT_MAX_CONCURRENT_ENRICHMENTS;

/// Default maximum number of concurrent flow invocations.
pub const DEFAULT_MAX_CONCURRENT_RUNS: usize = 10;

/// Configuration for the flow execution engine.
#[derive(Debug, Clone, Builder)]
#[builder(
    name = "EngineConfigBuilder",
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "Self::validate_config")
)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct EngineConfig {
    /// Maximum number of concurrent flow invocations.
    #[builder(default = "DEFAULT_MAX_CONCURRENT_RUNS")]
    #[cfg_attr(
        feature = "config",
        arg(
            long = "max-concurrent-runs",
            env = "MAVUNO_MAX_CONCURRENT_RUNS",
            default_value_t = DEFAULT_MAX_CONCURRENT_RUNS
        )
    )]
    pub max_concurrent_runs: usize,

    /// Maximum number of concurrent enrichment calls within one invocation.
    #[builder(default = "DEFAULT_MAX_CONCURRENT_ENRICHMENTS")]
    #[cfg_attr(
        feature = "config",
        arg(
            long = "max-concurrent-enrichments",
            env = "MAVUNO_MAX_CONCURRENT_ENRICHMENTS",
            default_value_t = DEFAULT_MAX_CONCURRENT_ENRICHMENTS
        )
    )]
    pub max_concurrent_enrichments: usize,
}

impl EngineConfigBuilder {
    fn validate_config(&self) -> Result<(), String> {
        if self.max_concurrent_runs == Some(0) {
            return Err("max_concurrent_runs must be at least 1".into());
        }
        if self.max_concurrent_enrichments == Some(0) {
            return Err("max_concurrent_enrichments must be at least 1".into());
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Returns a builder with default values.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_runs: DEFAULT_MAX_CONCURRENT_RUNS,
            max_concurrent_enrichments: DEFAULT_MAX_CONCURRENT_ENRICHMENTS,
        }
    }
}
