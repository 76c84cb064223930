//! # Builder Configuration
//!
//! Loaded once from TOML:
//!
//! ```toml
//! max_recommended_depth = 5
//!
//! [noise_cache]
//! max_size = 50000
//! grid_size = 10.0
//! ```

use genesis_procedural::NoiseCacheConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AuthoringError, AuthoringResult};

/// Settings for a [`crate::ProceduralSystemBuilder`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Dependency depth above which analysis suggests simplifying.
    pub max_recommended_depth: usize,
    /// Cache for the builder's noise engine.
    pub noise_cache: NoiseCacheConfig,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_recommended_depth: 5,
            noise_cache: NoiseCacheConfig::default(),
        }
    }
}

impl BuilderConfig {
    /// Parses a configuration; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::InvalidConfig`] for malformed TOML or an
    /// unusable noise cache size.
    pub fn from_toml_str(text: &str) -> AuthoringResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| AuthoringError::InvalidConfig(e.to_string()))?;
        config
            .noise_cache
            .validate()
            .map_err(|e| AuthoringError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }
}
