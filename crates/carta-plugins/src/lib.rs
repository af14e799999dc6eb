//! Built-in object classes for the CARTA registry.
//!
//! - [`ExampleObject`]: a counter driven by a single command
//! - [`ColorState`]: colormap settings for an image view
//!
//! Call [`register_builtin_classes`] on a fresh
//! [`ObjectManager`](carta_registry::ObjectManager) to make both available.

pub mod color_state;
pub mod example;

pub use color_state::ColorState;
pub use example::ExampleObject;

use carta_registry::ObjectManager;

/// Register every built-in class. Returns how many were newly registered.
pub fn register_builtin_classes(manager: &mut ObjectManager) -> usize {
    let registered = [ExampleObject::register(manager), ColorState::register(manager)];
    registered.into_iter().filter(|r| *r).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use carta_registry::ManagerConfig;

    #[test]
    fn registers_each_class_once() {
        let mut mgr = ObjectManager::new(ManagerConfig::default()).unwrap();
        assert_eq!(register_builtin_classes(&mut mgr), 2);
        assert_eq!(register_builtin_classes(&mut mgr), 0);
        assert!(mgr.is_registered(ColorState::CLASS_NAME));
        assert!(mgr.is_registered(ExampleObject::CLASS_NAME));
    }
}
