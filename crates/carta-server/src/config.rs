use std::net::SocketAddr;
use std::path::Path;

use carta_registry::ManagerConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Settings for [`CartaServer`](crate::CartaServer).
///
/// ```toml
/// bind_addr = "0.0.0.0:3002"
/// cors = true
///
/// [manager]
/// root = "CartaObjects"
/// max_objects = 1024
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Answer cross-origin requests from any origin.
    pub cors: bool,
    pub manager: ManagerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3002)),
            cors: false,
            manager: ManagerConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
