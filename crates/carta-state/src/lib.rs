//! Hierarchical key-value state for CARTA objects.
//!
//! Every registry-managed object owns a [`StateInterface`]: a JSON object
//! tree addressed by `/`-separated lookups such as `colorMix/red`. Writers
//! mark the paths they change as dirty; [`StateInterface::flush_state`] then
//! notifies the callbacks subscribed to those paths (or to their ancestors or
//! descendants) and clears the dirty set.
//!
//! # Modules
//!
//! - [`error`] — Error types for state operations
//! - [`lookup`] — Building and relating lookup paths
//! - [`callbacks`] — Change-callback bookkeeping
//! - [`state`] — The [`StateInterface`] store itself

pub mod callbacks;
pub mod error;
pub mod lookup;
pub mod state;

pub use callbacks::{CallbackId, StateCallback};
pub use error::{StateError, StateResult};
pub use lookup::{is_related, lookup};
pub use state::StateInterface;
