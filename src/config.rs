//! # Runtime Configuration
//!
//! Defaults for `SystemDefault` policies and event-system sizing, loadable
//! from the environment or a layered configuration file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_EVENT_CAPACITY, ENV_PREFIX};
use crate::error::{ComponentError, Result};
use crate::model::{ActivationPolicy, CollectionPolicy};

/// Runtime configuration for an assembly controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Effective policy for models declaring `CollectionPolicy::SystemDefault`.
    pub default_collection: CollectionPolicy,
    /// Effective policy for models declaring `ActivationPolicy::SystemDefault`.
    pub default_activation: ActivationPolicy,
    /// Bound of each event subscriber's channel.
    pub event_capacity: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            default_collection: CollectionPolicy::Hard,
            default_activation: ActivationPolicy::Demand,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl AssemblyConfig {
    /// Build a configuration from `ASSEMBLY_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(collection) = std::env::var("ASSEMBLY_DEFAULT_COLLECTION") {
            config.default_collection = collection.parse().map_err(|e| {
                ComponentError::configuration(format!("Invalid default_collection: {e}"))
            })?;
        }

        if let Ok(activation) = std::env::var("ASSEMBLY_DEFAULT_ACTIVATION") {
            config.default_activation = activation.parse().map_err(|e| {
                ComponentError::configuration(format!("Invalid default_activation: {e}"))
            })?;
        }

        if let Ok(capacity) = std::env::var("ASSEMBLY_EVENT_CAPACITY") {
            config.event_capacity = capacity.parse().map_err(|e| {
                ComponentError::configuration(format!("Invalid event_capacity: {e}"))
            })?;
        }

        Ok(config)
    }

    /// Load a configuration file, layered under `ASSEMBLY_*` environment
    /// overrides (`ASSEMBLY_DEFAULT_COLLECTION=weak` beats the file).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|e| ComponentError::configuration(format!("Failed to load config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| ComponentError::configuration(format!("Invalid config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AssemblyConfig::default();
        assert_eq!(config.default_collection, CollectionPolicy::Hard);
        assert_eq!(config.default_activation, ActivationPolicy::Demand);
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
    }

    // Environment mutation is process-global; one test keeps it serialized.
    #[test]
    fn test_from_env_overrides_and_validation() {
        std::env::set_var("ASSEMBLY_DEFAULT_COLLECTION", "weak");
        std::env::set_var("ASSEMBLY_EVENT_CAPACITY", "64");
        let config = AssemblyConfig::from_env().unwrap();
        std::env::remove_var("ASSEMBLY_DEFAULT_COLLECTION");
        std::env::remove_var("ASSEMBLY_EVENT_CAPACITY");

        assert_eq!(config.default_collection, CollectionPolicy::Weak);
        assert_eq!(config.event_capacity, 64);
        assert_eq!(config.default_activation, ActivationPolicy::Demand);

        std::env::set_var("ASSEMBLY_DEFAULT_ACTIVATION", "whenever");
        let err = AssemblyConfig::from_env().unwrap_err();
        std::env::remove_var("ASSEMBLY_DEFAULT_ACTIVATION");
        assert!(matches!(err, ComponentError::Configuration { .. }));
    }
}
