//! Error types for state operations.

use thiserror::Error;

/// Errors that can occur while reading or writing object state.
#[derive(Debug, Error)]
pub enum StateError {
    /// No value exists at the lookup path.
    #[error("state path not found: {path}")]
    PathNotFound { path: String },

    /// The stored value could not be converted to the requested type.
    #[error("type mismatch at {path}: {reason}")]
    TypeMismatch { path: String, reason: String },

    /// An intermediate path segment names a scalar, not an object or array.
    #[error("not a container: {path}")]
    NotAContainer { path: String },

    /// Replacement state was valid JSON but not a JSON object.
    #[error("state must be a JSON object")]
    NotAnObject,

    /// Text could not be parsed as JSON, or a value could not be serialized.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for state operations.
pub type StateResult<T> = std::result::Result<T, StateError>;
