//! Engine configuration
//!
//! Controls how generated getter and mutation names are formed, the default
//! wrap-before-filter behavior, and the log threshold.

use serde::{Deserialize, Serialize};

use crate::observability::Severity;

/// Configuration for one `Database`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Prefix of generated getter and mutation names (default: "$")
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Whether store paths are `module/name` (default: true)
    #[serde(default = "default_namespaced")]
    pub namespaced: bool,

    /// Wrap records before filtering unless the model type overrides it (default: true)
    #[serde(default = "default_model_before_filter")]
    pub model_before_filter: bool,

    /// Minimum severity written by the logger (default: INFO)
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_prefix() -> String {
    "$".to_string()
}

fn default_namespaced() -> bool {
    true
}

fn default_model_before_filter() -> bool {
    true
}

fn default_log_level() -> Severity {
    Severity::Info
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            namespaced: default_namespaced(),
            model_before_filter: default_model_before_filter(),
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON; missing fields take their defaults.
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Config with the given log threshold
    pub fn with_log_level(level: Severity) -> Self {
        Self {
            log_level: level,
            ..Default::default()
        }
    }

    /// Full store path for a generated name in the given module.
    pub fn store_path(&self, module_path: &str, name: &str) -> String {
        if self.namespaced && !module_path.is_empty() {
            format!("{}/{}", module_path, name)
        } else {
            name.to_string()
        }
    }
}
