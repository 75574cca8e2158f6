use crate::component::WatchDeclaration;
use crate::error::{ObserverError, ObserverResult};
use crate::property::PropertyListener;
use crate::state::ComponentState;
use filament_common::Value;
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Running,
}

/// Calls a component method whenever a tracked property is written.
///
/// A trigger that arrives while the method is still running (the method
/// wrote the property it watches) is dropped.
#[derive(Debug)]
pub struct Watcher {
    declaration: WatchDeclaration,
    state: Cell<WatcherState>,
}

impl Watcher {
    pub fn new(declaration: WatchDeclaration) -> Self {
        Self {
            declaration,
            state: Cell::new(WatcherState::Idle),
        }
    }

    pub fn declaration(&self) -> &WatchDeclaration {
        &self.declaration
    }

    pub fn state(&self) -> WatcherState {
        self.state.get()
    }

    /// Run the method with `value`. Returns `false` when the trigger was
    /// dropped because the watcher is already running.
    pub fn trigger(&self, component: &ComponentState, value: &Value) -> ObserverResult<bool> {
        if self.state.get() == WatcherState::Running {
            debug!(
                property = %self.declaration.property,
                method = %self.declaration.method,
                "dropped re-entrant watcher trigger"
            );
            return Ok(false);
        }

        self.state.set(WatcherState::Running);
        let result = component.call(&self.declaration.method, &[value.clone()]);
        self.state.set(WatcherState::Idle);
        result.map(|_| true)
    }

    /// Subscribe to the watched property and run an immediate trigger when
    /// requested.
    pub fn install(self: Rc<Self>, component: &Rc<ComponentState>) -> ObserverResult<()> {
        let declaration = &self.declaration;
        if !component.has_property(&declaration.property) {
            return Err(ObserverError::unknown_property(declaration.property.as_str()));
        }
        if !component.has_method(&declaration.method) {
            return Err(ObserverError::unknown_method(declaration.method.as_str()));
        }

        let weak = Rc::downgrade(component);
        let watcher = self.clone();
        let listener: PropertyListener = Rc::new(move |value: &Value| match weak.upgrade() {
            Some(component) => watcher.trigger(&component, value).map(|_| ()),
            None => Ok(()),
        });
        component
            .properties()
            .add_listener(&declaration.property, listener)?;

        debug!(
            property = %declaration.property,
            method = %declaration.method,
            immediate = declaration.immediate,
            "installed watcher"
        );

        if declaration.immediate {
            let current = component.get(&declaration.property)?;
            self.trigger(component, &current)?;
        }
        Ok(())
    }
}
