//! Error types for registry operations.
//!
//! The `Display` form of every variant is the human-readable reply sent back
//! to command issuers.

use carta_state::StateError;
use carta_types::TypeError;
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No factory is registered under this class name.
    #[error("class not registered: {class_name}")]
    ClassNotRegistered { class_name: String },

    /// No live object has this ID.
    #[error("object not found: {id}")]
    ObjectNotFound { id: String },

    /// The parent of a child object does not exist.
    #[error("parent object not found: {id}")]
    ParentNotFound { id: String },

    /// A command named one class but the object belongs to another.
    #[error("class mismatch: expected {expected}, found {actual}")]
    ClassMismatch { expected: String, actual: String },

    /// A command string did not have the `<ClassName>:<id>.<command>` form.
    #[error("malformed command: {0}")]
    MalformedCommand(String),

    /// The object does not handle this command.
    #[error("unknown command for {class_name}: {command}")]
    UnknownCommand { class_name: String, command: String },

    /// A required command parameter was absent.
    #[error("missing parameter: {name}")]
    MissingParameter { name: String },

    /// A command parameter was present but unusable.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The object refused the command; the message explains why.
    #[error("{0}")]
    Rejected(String),

    /// The configured object limit has been reached.
    #[error("object limit reached: {limit}")]
    CapacityExceeded { limit: usize },

    /// A snapshot was written by an incompatible version.
    #[error("unsupported snapshot format version {found} (expected {expected})")]
    UnsupportedSnapshotVersion { found: u32, expected: u32 },

    /// State store failure.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// Invalid identifier, class name, or path.
    #[error("{0}")]
    Type(#[from] TypeError),

    /// JSON encoding or decoding failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error during snapshot or config file access.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
