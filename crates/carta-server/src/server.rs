use carta_registry::ObjectManager;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// HTTP front end for one object registry.
pub struct CartaServer {
    config: ServerConfig,
    state: AppState,
}

impl CartaServer {
    /// Create a server whose registry has the built-in classes registered.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let mut manager = ObjectManager::new(config.manager.clone())?;
        let registered = carta_plugins::register_builtin_classes(&mut manager);
        tracing::debug!(registered, "registered built-in classes");
        Ok(Self::with_manager(config, manager))
    }

    /// Serve an already populated registry.
    pub fn with_manager(config: ServerConfig, manager: ObjectManager) -> Self {
        Self {
            config,
            state: AppState::new(manager),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        let router = build_router(self.state.clone()).layer(TraceLayer::new_for_http());
        if self.config.cors {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("CARTA server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = CartaServer::new(ServerConfig::default()).unwrap();
        assert_eq!(server.config().bind_addr, "127.0.0.1:3002".parse().unwrap());
    }

    #[tokio::test]
    async fn builtin_classes_registered() {
        let server = CartaServer::new(ServerConfig::default()).unwrap();
        let manager = server.state().manager().lock().await;
        assert!(manager.is_registered(carta_plugins::ColorState::CLASS_NAME));
        assert!(manager.is_registered(carta_plugins::ExampleObject::CLASS_NAME));
    }

    #[test]
    fn invalid_root_fails() {
        let mut config = ServerConfig::default();
        config.manager.root = "a/b".into();
        assert!(matches!(CartaServer::new(config), Err(ServerError::Registry(_))));
    }

    #[test]
    fn router_builds_with_cors() {
        let config = ServerConfig {
            cors: true,
            ..Default::default()
        };
        let server = CartaServer::new(config).unwrap();
        let _router = server.router();
    }
}
