//! Tracked properties.
//!
//! Each property owns its current value and an ordered listener list. Every
//! write goes through the registry, which stores the value and then calls the
//! listeners with the new value in registration order. No borrow of the
//! registry is held while listeners run, so a listener may read or write any
//! property, including the one that fired it.

use crate::error::{ObserverError, ObserverResult};
use crate::list::ObservableList;
use filament_common::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::error;

pub type PropertyListener = Rc<dyn Fn(&Value) -> ObserverResult<()>>;

struct TrackedProperty {
    value: Value,
    listeners: Vec<PropertyListener>,
}

#[derive(Default)]
pub struct PropertyRegistry {
    properties: RefCell<IndexMap<String, TrackedProperty>>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `name`. Returns `false` when it was already tracked, in
    /// which case its current value is kept.
    pub fn define(&self, name: &str, initial: Value) -> bool {
        let mut properties = self.properties.borrow_mut();
        if properties.contains_key(name) {
            return false;
        }
        properties.insert(
            name.to_string(),
            TrackedProperty {
                value: initial,
                listeners: Vec::new(),
            },
        );
        true
    }

    pub fn has(&self, name: &str) -> bool {
        self.properties.borrow().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.properties.borrow().keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> ObserverResult<Value> {
        self.properties
            .borrow()
            .get(name)
            .map(|property| property.value.clone())
            .ok_or_else(|| ObserverError::unknown_property(name))
    }

    /// Store `value` and notify every listener once.
    pub fn set(&self, name: &str, value: Value) -> ObserverResult<()> {
        let listeners = {
            let mut properties = self.properties.borrow_mut();
            let property = properties
                .get_mut(name)
                .ok_or_else(|| ObserverError::unknown_property(name))?;
            property.value = value.clone();
            property.listeners.clone()
        };
        notify(name, &listeners, &value)
    }

    /// Modify the stored value in place, then notify once. When `op` fails
    /// nothing is notified.
    pub fn mutate<R>(
        &self,
        name: &str,
        op: impl FnOnce(&mut Value) -> ObserverResult<R>,
    ) -> ObserverResult<R> {
        let (result, value, listeners) = {
            let mut properties = self.properties.borrow_mut();
            let property = properties
                .get_mut(name)
                .ok_or_else(|| ObserverError::unknown_property(name))?;
            let result = op(&mut property.value)?;
            (result, property.value.clone(), property.listeners.clone())
        };
        notify(name, &listeners, &value)?;
        Ok(result)
    }

    pub fn add_listener(&self, name: &str, listener: PropertyListener) -> ObserverResult<()> {
        self.properties
            .borrow_mut()
            .get_mut(name)
            .ok_or_else(|| ObserverError::unknown_property(name))?
            .listeners
            .push(listener);
        Ok(())
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.properties
            .borrow()
            .get(name)
            .map_or(0, |property| property.listeners.len())
    }

    /// List operations on an array-valued property
    pub fn list(&self, name: &str) -> ObserverResult<ObservableList<'_>> {
        match self.get(name)? {
            Value::Array(_) => Ok(ObservableList::new(self, name)),
            other => Err(ObserverError::NotAList {
                name: name.to_string(),
                found: other.kind(),
            }),
        }
    }
}

/// Call every listener. A failing listener does not stop the others; the
/// first failure is returned once all have run.
fn notify(name: &str, listeners: &[PropertyListener], value: &Value) -> ObserverResult<()> {
    run_all(name, listeners.iter().map(|listener| listener(value)))
}

pub(crate) fn run_all(
    name: &str,
    results: impl Iterator<Item = ObserverResult<()>>,
) -> ObserverResult<()> {
    let mut first = None;
    for result in results {
        if let Err(err) = result {
            if first.is_none() {
                first = Some(err);
            } else {
                error!(property = %name, error = %err, "listener failed");
            }
        }
    }
    match first {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
