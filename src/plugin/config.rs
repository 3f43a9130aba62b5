//! Registry configuration.

use crate::core::Result;
use serde::{Deserialize, Serialize};

/// Default suffix appended to a root's name to name its composite.
pub const DEFAULT_EXTENDED_SUFFIX: &str = "PluginExtended";

/// What to do when a root's frontier cannot be linearized consistently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearizationPolicy {
    /// Fail with a composition error and leave the cache invalid.
    #[default]
    Strict,
    /// Fall back to a depth-first, last-occurrence-wins order.
    BestEffort,
}

/// Registry configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Suffix used to name composites (`<Root><suffix>`)
    pub extended_suffix: String,
    /// Linearization policy for composites
    pub linearization: LinearizationPolicy,
}

impl RegistryConfig {
    /// Strict linearization (the default).
    pub fn strict() -> Self {
        Self {
            extended_suffix: DEFAULT_EXTENDED_SUFFIX.to_string(),
            linearization: LinearizationPolicy::Strict,
        }
    }

    /// Best-effort linearization.
    pub fn best_effort() -> Self {
        Self {
            linearization: LinearizationPolicy::BestEffort,
            ..Self::strict()
        }
    }

    /// Set the composite name suffix.
    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.extended_suffix = suffix.to_string();
        self
    }

    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Name of the composite built for `root_name`.
    pub fn extended_name(&self, root_name: &str) -> String {
        format!("{}{}", root_name, self.extended_suffix)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::strict()
    }
}
