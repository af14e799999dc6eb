//! Class factories.

use std::fmt;

use carta_types::ClassName;

use crate::error::RegistryResult;
use crate::object::{CartaObject, ObjectCore};

/// Construction closure for one class.
///
/// Receives the core the registry prepared (class name, fresh ID, path) and
/// returns the finished object, typically after inserting default state.
pub type Factory = Box<dyn Fn(ObjectCore) -> RegistryResult<Box<dyn CartaObject>> + Send + Sync>;

/// A registered class: its name and factory.
///
/// Invariant: the registry stores each entry under `entry.class_name()`.
pub struct ClassRegistryEntry {
    class_name: ClassName,
    factory: Factory,
}

impl ClassRegistryEntry {
    pub fn new(class_name: ClassName, factory: Factory) -> Self {
        Self { class_name, factory }
    }

    pub fn class_name(&self) -> &ClassName {
        &self.class_name
    }

    /// Run the factory.
    pub fn create(&self, core: ObjectCore) -> RegistryResult<Box<dyn CartaObject>> {
        (self.factory)(core)
    }
}

impl fmt::Debug for ClassRegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistryEntry")
            .field("class_name", &self.class_name)
            .finish_non_exhaustive()
    }
}
