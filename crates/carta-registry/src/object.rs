//! The [`CartaObject`] trait and the [`ObjectCore`] every object embeds.

use std::any::Any;

use carta_state::StateInterface;
use carta_types::{ClassName, ObjectId, ObjectPath, SnapshotKind};

use crate::command::CommandAddress;
use crate::error::{RegistryError, RegistryResult};

/// Identity and state shared by every registry-managed object.
///
/// The registry builds the core (class name, ID, path, empty state) and hands
/// it to the class factory, so an object's identity always matches the
/// registry entry that owns it.
#[derive(Debug)]
pub struct ObjectCore {
    class_name: ClassName,
    id: ObjectId,
    path: ObjectPath,
    state: StateInterface,
}

impl ObjectCore {
    pub fn new(class_name: ClassName, id: ObjectId, path: ObjectPath) -> Self {
        Self {
            class_name,
            id,
            path,
            state: StateInterface::new(),
        }
    }

    pub fn class_name(&self) -> &ClassName {
        &self.class_name
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    pub fn state(&self) -> &StateInterface {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StateInterface {
        &mut self.state
    }
}

/// Anything managed by the [`ObjectManager`](crate::ObjectManager).
///
/// Implementors supply access to their [`ObjectCore`] and the `Any` casts
/// used for typed lookups; everything else has a default. Override
/// [`state_string`](Self::state_string) and [`reset_state`](Self::reset_state)
/// to customize serialization, and [`handle_command`](Self::handle_command) to
/// accept commands.
pub trait CartaObject: Any + Send {
    fn core(&self) -> &ObjectCore;

    fn core_mut(&mut self) -> &mut ObjectCore;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn class_name(&self) -> &ClassName {
        self.core().class_name()
    }

    fn id(&self) -> ObjectId {
        self.core().id()
    }

    fn path(&self) -> &ObjectPath {
        self.core().path()
    }

    /// JSON text of the state this object contributes to a `kind` snapshot.
    ///
    /// An empty string means the object contributes nothing.
    fn state_string(&self, _kind: SnapshotKind) -> String {
        self.core().state().to_string()
    }

    /// Replace this object's state from JSON text and notify subscribers.
    fn reset_state(&mut self, state: &str) -> RegistryResult<()> {
        let store = self.core_mut().state_mut();
        store.set_state(state)?;
        store.flush_state();
        Ok(())
    }

    /// Execute a command already stripped of its `<ClassName>:<id>.` prefix.
    fn handle_command(
        &mut self,
        command: &str,
        _parameters: &str,
        _session_id: &str,
    ) -> RegistryResult<String> {
        Err(RegistryError::UnknownCommand {
            class_name: self.class_name().to_string(),
            command: command.to_string(),
        })
    }

    /// Qualify a bare command with this object's class and ID.
    fn add_id_to_command(&self, command: &str) -> String {
        CommandAddress::new(self.class_name().as_str(), self.id(), command).to_string()
    }

    /// Strip this object's `<ClassName>:<id>.` prefix. Text without the
    /// prefix is returned unchanged.
    fn remove_id(&self, command_and_id: &str) -> String {
        let prefix = format!("{}:{}.", self.class_name(), self.id());
        command_and_id
            .strip_prefix(&prefix)
            .unwrap_or(command_and_id)
            .to_string()
    }

    /// Full location of a named piece of this object's state.
    fn state_location(&self, name: &str) -> String {
        format!("{}/{name}", self.path())
    }
}
