//! Tree namespace configuration.

use serde::{Deserialize, Serialize};

/// Settings for the materialized path namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Prefix every root item's path starts with (e.g. `uploads/docs`).
    #[serde(default = "default_namespace_root")]
    pub namespace_root: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            namespace_root: default_namespace_root(),
        }
    }
}

fn default_namespace_root() -> String {
    "uploads".to_string()
}
