use std::any::Any;

use carta_registry::{
    CartaObject, ClassName, ObjectCore, ObjectManager, RegistryError, RegistryResult,
};

const COUNTER: &str = "counter";

/// Smallest useful registry citizen: one state value, one command.
#[derive(Debug)]
pub struct ExampleObject {
    core: ObjectCore,
}

impl ExampleObject {
    pub const CLASS_NAME: &'static str = "ExampleObject";
    pub const DO_SOMETHING: &'static str = "doSomething";

    pub fn register(manager: &mut ObjectManager) -> bool {
        let Ok(class_name) = ClassName::new(Self::CLASS_NAME) else {
            return false;
        };
        manager.register_class(class_name, |core| Ok(Box::new(Self::new(core)?)))
    }

    fn new(mut core: ObjectCore) -> RegistryResult<Self> {
        let state = core.state_mut();
        state.insert_value(COUNTER, 0u64)?;
        state.flush_state();
        Ok(Self { core })
    }

    pub fn counter(&self) -> RegistryResult<u64> {
        Ok(self.core.state().get_value(COUNTER)?)
    }

    fn do_something(&mut self) -> RegistryResult<String> {
        let next = self
            .counter()?
            .checked_add(1)
            .ok_or_else(|| RegistryError::Rejected("counter is at its maximum".into()))?;
        let state = self.core.state_mut();
        state.set_value(COUNTER, next)?;
        state.flush_state();
        Ok(next.to_string())
    }
}

impl CartaObject for ExampleObject {
    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn handle_command(&mut self, command: &str, _parameters: &str, _session_id: &str) -> RegistryResult<String> {
        match command {
            Self::DO_SOMETHING => self.do_something(),
            _ => Err(RegistryError::UnknownCommand {
                class_name: Self::CLASS_NAME.to_string(),
                command: command.to_string(),
            }),
        }
    }
}
