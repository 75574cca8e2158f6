//! Computed properties.
//!
//! A computed property is a getter plus the names it depends on. Nothing is
//! cached: a consumer is told that the value may have changed and reads the
//! getter again. Dependencies are fixed at definition time, either declared
//! explicitly or found once by scanning the getter's expression source.

use crate::error::{ObserverError, ObserverResult};
use crate::property::{run_all, PropertyListener, PropertyRegistry};
use crate::state::ComponentState;
use filament_common::Value;
use filament_expression::{compile, scan_dependencies};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::debug;

pub type ComputedListener = Rc<dyn Fn() -> ObserverResult<()>>;

pub type Getter = Rc<dyn Fn(&ComponentState) -> ObserverResult<Value>>;

struct ComputedProperty {
    dependencies: Vec<String>,
    getter: Getter,
    listeners: Vec<ComputedListener>,
}

type Entries = RefCell<IndexMap<String, ComputedProperty>>;

#[derive(Default)]
pub struct ComputedRegistry {
    entries: Rc<Entries>,
}

impl ComputedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` with explicit dependencies. Each dependency must be a
    /// tracked property or an already defined computed property.
    pub fn define(
        &self,
        properties: &PropertyRegistry,
        name: &str,
        dependencies: &[String],
        getter: Getter,
    ) -> ObserverResult<()> {
        if properties.has(name) || self.has(name) {
            return Err(ObserverError::duplicate(name));
        }

        let mut unique: Vec<String> = Vec::new();
        for dependency in dependencies {
            if !properties.has(dependency) && !self.has(dependency) {
                return Err(ObserverError::unknown_property(dependency.as_str()));
            }
            if !unique.contains(dependency) {
                unique.push(dependency.clone());
            }
        }

        self.entries.borrow_mut().insert(
            name.to_string(),
            ComputedProperty {
                dependencies: unique.clone(),
                getter,
                listeners: Vec::new(),
            },
        );

        for dependency in &unique {
            let rebroadcast = rebroadcaster(Rc::downgrade(&self.entries), name);
            if properties.has(dependency) {
                let listener: PropertyListener = Rc::new(move |_: &Value| rebroadcast());
                properties.add_listener(dependency, listener)?;
            } else {
                self.add_listener(dependency, rebroadcast)?;
            }
        }

        debug!(computed = %name, dependencies = ?unique, "defined computed property");
        Ok(())
    }

    /// Register `name` from an expression; dependencies are the known names
    /// the source mentions. Computed properties defined later are not seen.
    pub fn define_expression(
        &self,
        properties: &PropertyRegistry,
        name: &str,
        source: &str,
    ) -> ObserverResult<()> {
        let compiled = compile(source).map_err(|err| ObserverError::expression(source, err))?;
        let dependencies = scan_dependencies(source, |candidate| {
            candidate != name && (properties.has(candidate) || self.has(candidate))
        });
        let getter: Getter = Rc::new(move |state: &ComponentState| {
            compiled.evaluate(state).map_err(ObserverError::from)
        });
        self.define(properties, name, &dependencies, getter)
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.borrow().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    pub fn dependencies(&self, name: &str) -> Option<Vec<String>> {
        self.entries
            .borrow()
            .get(name)
            .map(|entry| entry.dependencies.clone())
    }

    pub fn add_listener(&self, name: &str, listener: ComputedListener) -> ObserverResult<()> {
        self.entries
            .borrow_mut()
            .get_mut(name)
            .ok_or_else(|| ObserverError::unknown_property(name))?
            .listeners
            .push(listener);
        Ok(())
    }

    /// Run the getter against `state`
    pub fn get(&self, name: &str, state: &ComponentState) -> ObserverResult<Value> {
        let getter = self
            .entries
            .borrow()
            .get(name)
            .map(|entry| entry.getter.clone())
            .ok_or_else(|| ObserverError::unknown_property(name))?;
        getter(state)
    }

    pub fn notify(&self, name: &str) -> ObserverResult<()> {
        notify_entries(&self.entries, name)
    }
}

fn rebroadcaster(entries: Weak<Entries>, name: &str) -> ComputedListener {
    let name = name.to_string();
    Rc::new(move || match entries.upgrade() {
        Some(entries) => notify_entries(&entries, &name),
        None => Ok(()),
    })
}

fn notify_entries(entries: &Entries, name: &str) -> ObserverResult<()> {
    let listeners = entries
        .borrow()
        .get(name)
        .map(|entry| entry.listeners.clone())
        .unwrap_or_default();
    run_all(name, listeners.iter().map(|listener| listener()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter(registry: &ComputedRegistry, name: &str) -> Rc<Cell<usize>> {
        let count = Rc::new(Cell::new(0));
        let inner = count.clone();
        registry
            .add_listener(
                name,
                Rc::new(move || {
                    inner.set(inner.get() + 1);
                    Ok(())
                }),
            )
            .unwrap();
        count
    }

    #[test]
    fn test_dependency_change_fires_computed_listeners() {
        let state = ComponentState::new("test");
        state.properties().define("first", Value::from("Ada"));
        state.properties().define("last", Value::from("Lovelace"));
        state.properties().define("unrelated", Value::from(0));
        state
            .computed()
            .define_expression(state.properties(), "full", "first + ' ' + last")
            .unwrap();
        assert_eq!(
            state.computed().dependencies("full").unwrap(),
            vec!["first", "last"]
        );

        let fired = counter(state.computed(), "full");
        state.set("first", "Grace").unwrap();
        state.set("last", "Hopper").unwrap();
        state.set("unrelated", 1).unwrap();

        assert_eq!(fired.get(), 2);
        assert_eq!(state.get("full").unwrap(), Value::from("Grace Hopper"));
    }

    #[test]
    fn test_computed_may_depend_on_computed() {
        let state = ComponentState::new("test");
        state.properties().define("n", Value::from(2));
        let deps = vec!["n".to_string()];
        state
            .computed()
            .define(
                state.properties(),
                "double",
                &deps,
                Rc::new(|state: &ComponentState| Ok(Value::from(state.get("n")?.to_number() * 2.0))),
            )
            .unwrap();
        state
            .computed()
            .define_expression(state.properties(), "quad", "double * 2")
            .unwrap();

        let fired = counter(state.computed(), "quad");
        state.set("n", 5).unwrap();
        assert_eq!(fired.get(), 1);
        assert_eq!(state.get("quad").unwrap(), Value::from(20));
    }

    #[test]
    fn test_names_must_be_unique_and_dependencies_known() {
        let state = ComponentState::new("test");
        state.properties().define("a", Value::Null);
        let registry = state.computed();
        assert!(matches!(
            registry.define_expression(state.properties(), "a", "1"),
            Err(ObserverError::DuplicateName { .. })
        ));
        let missing = vec!["missing".to_string()];
        assert!(matches!(
            registry.define(state.properties(), "b", &missing, Rc::new(|_: &ComponentState| Ok(Value::Null))),
            Err(ObserverError::UnknownProperty { .. })
        ));
        assert!(matches!(
            registry.define_expression(state.properties(), "c", "a +"),
            Err(ObserverError::Expression { .. })
        ));
    }
}
