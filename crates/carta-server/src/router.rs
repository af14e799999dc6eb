use axum::routing::{delete, get, post};
use axum::Router;

use crate::handler::{self, AppState};

/// Build the axum router with all registry endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/classes", get(handler::classes_handler))
        .route("/v1/objects", post(handler::create_object_handler))
        .route("/v1/objects/:id", delete(handler::destroy_object_handler))
        .route(
            "/v1/objects/:id/state",
            get(handler::get_state_handler).put(handler::put_state_handler),
        )
        .route("/v1/commands", post(handler::command_handler))
        .with_state(state)
}
