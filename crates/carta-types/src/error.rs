use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("invalid class name: {name}: {reason}")]
    InvalidClassName { name: String, reason: String },

    #[error("invalid object path: {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("unknown snapshot kind: {0}")]
    UnknownSnapshotKind(String),
}
