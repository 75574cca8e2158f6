//! Name resolution for evaluated expressions.
//!
//! Expressions never see the component directly. Every identifier, write and
//! call goes through a [`Scope`], which lets the observer layer loop variables
//! and `$event` over the component's properties and intercept writes so that
//! change notifications fire.

use crate::error::{EvalError, EvalResult};
use filament_common::Value;
use indexmap::IndexMap;
use std::cell::RefCell;

pub trait Scope {
    /// Look up a name. `Ok(None)` means the name is not bound here.
    fn resolve(&self, name: &str) -> EvalResult<Option<Value>>;

    /// Replace the value bound to `name`.
    fn assign(&self, name: &str, _value: Value) -> EvalResult<()> {
        Err(EvalError::invalid_assignment(format!(
            "'{}' cannot be assigned in this context",
            name
        )))
    }

    /// Modify the value bound to `name` in place (`items.push(x)`,
    /// `user.name = 'x'`). The default reads, applies and writes back.
    fn mutate(
        &self,
        name: &str,
        op: &mut dyn FnMut(&mut Value) -> EvalResult<Value>,
    ) -> EvalResult<Value> {
        let mut value = self.resolve(name)?.ok_or_else(|| EvalError::undefined(name))?;
        let result = op(&mut value)?;
        self.assign(name, value)?;
        Ok(result)
    }

    /// Invoke a named function. `None` means no such function exists here,
    /// and the evaluator falls back to the global builtins.
    fn call(&self, _name: &str, _args: &[Value]) -> Option<EvalResult<Value>> {
        None
    }
}

/// A flat, writable scope backed by an ordered map
#[derive(Debug, Default)]
pub struct MapScope {
    values: RefCell<IndexMap<String, Value>>,
}

impl MapScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.borrow_mut().insert(name.into(), value.into());
        self
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.borrow_mut().insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.borrow().get(name).cloned()
    }
}

impl Scope for MapScope {
    fn resolve(&self, name: &str) -> EvalResult<Option<Value>> {
        Ok(self.get(name))
    }

    fn assign(&self, name: &str, value: Value) -> EvalResult<()> {
        self.set(name, value);
        Ok(())
    }

    fn mutate(
        &self,
        name: &str,
        op: &mut dyn FnMut(&mut Value) -> EvalResult<Value>,
    ) -> EvalResult<Value> {
        let mut values = self.values.borrow_mut();
        let value = values.get_mut(name).ok_or_else(|| EvalError::undefined(name))?;
        op(value)
    }
}

/// Read-only bindings layered over a parent scope (`$event`, loop variables).
/// Writes to a local name are rejected; everything else goes to the parent.
pub struct LocalScope<'a> {
    parent: &'a dyn Scope,
    locals: IndexMap<String, Value>,
}

impl<'a> LocalScope<'a> {
    pub fn new(parent: &'a dyn Scope) -> Self {
        Self {
            parent,
            locals: IndexMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.locals.insert(name.into(), value.into());
        self
    }

    fn reject_local(&self, name: &str) -> EvalResult<()> {
        if self.locals.contains_key(name) {
            Err(EvalError::invalid_assignment(format!(
                "'{}' is a local binding and cannot be assigned",
                name
            )))
        } else {
            Ok(())
        }
    }
}

impl<'a> Scope for LocalScope<'a> {
    fn resolve(&self, name: &str) -> EvalResult<Option<Value>> {
        match self.locals.get(name) {
            Some(value) => Ok(Some(value.clone())),
            None => self.parent.resolve(name),
        }
    }

    fn assign(&self, name: &str, value: Value) -> EvalResult<()> {
        self.reject_local(name)?;
        self.parent.assign(name, value)
    }

    fn mutate(
        &self,
        name: &str,
        op: &mut dyn FnMut(&mut Value) -> EvalResult<Value>,
    ) -> EvalResult<Value> {
        self.reject_local(name)?;
        self.parent.mutate(name, op)
    }

    fn call(&self, name: &str, args: &[Value]) -> Option<EvalResult<Value>> {
        self.parent.call(name, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_shadows_parent() {
        let parent = MapScope::new().with("x", 1).with("y", 2);
        let local = LocalScope::new(&parent).with("x", 10);
        assert_eq!(local.resolve("x").unwrap(), Some(Value::from(10)));
        assert_eq!(local.resolve("y").unwrap(), Some(Value::from(2)));
        assert_eq!(local.resolve("z").unwrap(), None);
    }

    #[test]
    fn test_local_rejects_writes_to_locals_only() {
        let parent = MapScope::new().with("y", 2);
        let local = LocalScope::new(&parent).with("x", 10);
        assert!(matches!(
            local.assign("x", Value::from(1)),
            Err(EvalError::InvalidAssignment { .. })
        ));
        local.assign("y", Value::from(5)).unwrap();
        assert_eq!(parent.get("y"), Some(Value::from(5)));
    }

    #[test]
    fn test_map_scope_mutates_in_place() {
        let scope = MapScope::new().with("items", vec![Value::from(1)]);
        let len = scope
            .mutate("items", &mut |value| {
                let items = value.as_array_mut().expect("array");
                items.push(Value::from(2));
                Ok(Value::from(items.len()))
            })
            .unwrap();
        assert_eq!(len, Value::from(2));
        assert_eq!(scope.get("items"), Some(filament_common::array([1, 2])));
    }
}
