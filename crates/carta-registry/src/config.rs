use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// Configuration for an [`ObjectManager`](crate::ObjectManager).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Name of the root path segment; objects live under `/<root>/`.
    pub root: String,
    /// Upper bound on simultaneously live objects. `None` means unbounded.
    pub max_objects: Option<usize>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            root: "CartaObjects".into(),
            max_objects: None,
        }
    }
}

impl ManagerConfig {
    /// Parse a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> RegistryResult<Self> {
        toml::from_str(text).map_err(|e| RegistryError::Config(e.to_string()))
    }

    /// Read a configuration from a TOML file.
    pub fn load(path: &Path) -> RegistryResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
