//! HTTP server for the CARTA object registry.
//!
//! Exposes one [`ObjectManager`](carta_registry::ObjectManager) over a small
//! JSON API: create and destroy objects, read and replace their state, and
//! dispatch string commands. All requests share the registry through a
//! single async mutex.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use server::CartaServer;
