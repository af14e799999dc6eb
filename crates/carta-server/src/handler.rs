use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use carta_registry::{ObjectManager, RegistryError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::error::ServerResult;

/// Shared handle to the one registry a server owns.
#[derive(Clone)]
pub struct AppState {
    manager: Arc<Mutex<ObjectManager>>,
}

impl AppState {
    pub fn new(manager: ObjectManager) -> Self {
        Self {
            manager: Arc::new(Mutex::new(manager)),
        }
    }

    pub fn manager(&self) -> &Arc<Mutex<ObjectManager>> {
        &self.manager
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateObjectRequest {
    pub class_name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateObjectResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub parameters: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub result: String,
    pub session_id: String,
}

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> Json<Value> {
    let manager = state.manager.lock().await;
    Json(json!({
        "name": "carta-server",
        "version": env!("CARGO_PKG_VERSION"),
        "root": manager.root_path().to_string(),
        "objects": manager.len(),
    }))
}

pub async fn classes_handler(State(state): State<AppState>) -> Json<Value> {
    let manager = state.manager.lock().await;
    let classes: Vec<&str> = manager.class_names().map(|c| c.as_str()).collect();
    Json(json!({ "classes": classes }))
}

pub async fn create_object_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateObjectRequest>,
) -> ServerResult<(StatusCode, Json<CreateObjectResponse>)> {
    let id = state.manager.lock().await.create_object(&request.class_name)?;
    Ok((StatusCode::CREATED, Json(CreateObjectResponse { id: id.to_string() })))
}

pub async fn destroy_object_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<StatusCode> {
    let mut manager = state.manager.lock().await;
    let id = manager.resolve(&id)?;
    manager.destroy_object(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_state_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<Value>> {
    let manager = state.manager.lock().await;
    let id = manager.resolve(&id)?;
    let object = manager
        .get_object(id)
        .ok_or_else(|| RegistryError::ObjectNotFound { id: id.to_string() })?;
    Ok(Json(object.core().state().root().clone()))
}

/// Replace an object's state and return what it now holds.
pub async fn put_state_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ServerResult<Json<Value>> {
    let mut manager = state.manager.lock().await;
    let id = manager.resolve(&id)?;
    let object = manager
        .get_object_mut(id)
        .ok_or_else(|| RegistryError::ObjectNotFound { id: id.to_string() })?;
    object.reset_state(&body.to_string())?;
    Ok(Json(object.core().state().root().clone()))
}

pub async fn command_handler(
    State(state): State<AppState>,
    Json(request): Json<CommandRequest>,
) -> ServerResult<Json<CommandResponse>> {
    let session_id = request
        .session_id
        .unwrap_or_else(|| uuid::Uuid::now_v7().to_string());
    let result = state
        .manager
        .lock()
        .await
        .dispatch(&request.command, &request.parameters, &session_id)?;
    tracing::debug!(command = %request.command, session = %session_id, "command handled");
    Ok(Json(CommandResponse { result, session_id }))
}
