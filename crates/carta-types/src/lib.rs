//! Foundation types for the CARTA object registry.
//!
//! Every registry-managed object is addressed three ways: by its
//! [`ObjectId`] (stable for the life of the registry, never reused), by its
//! [`ObjectPath`] (slash-delimited, reflecting creation hierarchy), and by an
//! [`ObjectHandle`] (a generation-checked arena index that stops resolving
//! once the object is destroyed).
//!
//! # Key Types
//!
//! - [`ObjectId`] — Monotonic identifier rendered as `c<n>`
//! - [`ObjectHandle`] — Slot plus generation into the object arena
//! - [`ClassName`] — Validated name of a registered object class
//! - [`ObjectPath`] — Absolute slash-delimited location of an object
//! - [`SnapshotKind`] — Category of a state snapshot

pub mod class;
pub mod error;
pub mod id;
pub mod path;
pub mod snapshot;

pub use class::ClassName;
pub use error::TypeError;
pub use id::{ObjectHandle, ObjectId};
pub use path::ObjectPath;
pub use snapshot::SnapshotKind;
