use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use carta_registry::RegistryError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Registry(e) => match e {
                RegistryError::ObjectNotFound { .. } | RegistryError::ParentNotFound { .. } => {
                    StatusCode::NOT_FOUND
                }
                RegistryError::ClassMismatch { .. } => StatusCode::CONFLICT,
                RegistryError::CapacityExceeded { .. } => StatusCode::SERVICE_UNAVAILABLE,
                RegistryError::ClassNotRegistered { .. }
                | RegistryError::MalformedCommand(_)
                | RegistryError::UnknownCommand { .. }
                | RegistryError::MissingParameter { .. }
                | RegistryError::InvalidParameter { .. }
                | RegistryError::Rejected(_)
                | RegistryError::UnsupportedSnapshotVersion { .. }
                | RegistryError::State(_)
                | RegistryError::Type(_)
                | RegistryError::Serialization(_) => StatusCode::BAD_REQUEST,
                RegistryError::Config(_) | RegistryError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_errors_map_to_statuses() {
        let cases = [
            (RegistryError::ObjectNotFound { id: "c1".into() }, StatusCode::NOT_FOUND),
            (
                RegistryError::ClassNotRegistered { class_name: "X".into() },
                StatusCode::BAD_REQUEST,
            ),
            (RegistryError::MalformedCommand("x".into()), StatusCode::BAD_REQUEST),
            (
                RegistryError::ClassMismatch { expected: "A".into(), actual: "B".into() },
                StatusCode::CONFLICT,
            ),
            (RegistryError::Rejected("no".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).status(), status);
        }
    }

    #[test]
    fn registry_message_passes_through() {
        let err = ServerError::from(RegistryError::ObjectNotFound { id: "c9".into() });
        assert_eq!(err.to_string(), "object not found: c9");
    }
}
