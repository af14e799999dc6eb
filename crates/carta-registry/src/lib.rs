//! Object registry for CARTA.
//!
//! The [`ObjectManager`] owns every application object. Classes are
//! registered by name together with a construction closure; objects are then
//! created by class name, receive a never-reused [`ObjectId`] and a path under
//! the registry root, and live in a generation-checked arena until destroyed.
//!
//! # Architecture
//!
//! - **Classes** map a [`ClassName`] to a [`Factory`]. A name can be
//!   registered once.
//! - **Objects** implement [`CartaObject`] by embedding an [`ObjectCore`]
//!   (identity plus a [`StateInterface`](carta_state::StateInterface)).
//! - **Commands** address objects as `<ClassName>:<id>.<command>` and are
//!   routed by [`ObjectManager::dispatch`].
//! - **Snapshots** capture the serialized state of every live object and
//!   restore it later.
//!
//! # Modules
//!
//! - [`error`] — Error types for registry operations
//! - [`config`] — [`ManagerConfig`], loadable from TOML
//! - [`arena`] — Generation-checked slot arena
//! - [`object`] — The [`CartaObject`] trait and [`ObjectCore`]
//! - [`factory`] — Factories and class registry entries
//! - [`command`] — Command addresses and parameter parsing
//! - [`manager`] — The [`ObjectManager`] itself
//! - [`snapshot`] — [`Snapshot`] capture, persistence, and restore

pub mod arena;
pub mod command;
pub mod config;
pub mod error;
pub mod factory;
pub mod manager;
pub mod object;
pub mod snapshot;

pub use arena::Arena;
pub use command::{parse_params, param, CommandAddress, CREATE_OBJECT, DESTROY_OBJECT};
pub use config::ManagerConfig;
pub use error::{RegistryError, RegistryResult};
pub use factory::{ClassRegistryEntry, Factory};
pub use manager::{ObjectManager, ObjectRegistryEntry};
pub use object::{CartaObject, ObjectCore};
pub use snapshot::{ObjectSnapshot, RestoreReport, Snapshot, SNAPSHOT_FORMAT_VERSION};

pub use carta_types::{ClassName, ObjectHandle, ObjectId, ObjectPath, SnapshotKind};
