//! Binding contexts.
//!
//! Outside an iteration an expression sees the component. Each iteration
//! body adds a frame holding its loop variable; frames chain, so nested
//! iterations see every enclosing loop variable, innermost first.

use crate::error::ObserverError;
use crate::state::ComponentState;
use filament_common::{Object, Value};
use filament_dom::{Event, HostTree, NodeId};
use filament_expression::{EvalError, EvalResult, Scope};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum BindingContext {
    #[default]
    Root,
    Item {
        parent: Rc<BindingContext>,
        name: String,
        value: Value,
    },
}

impl BindingContext {
    /// A frame binding `name` to `value` on top of this context
    pub fn child(self: &Rc<Self>, name: impl Into<String>, value: Value) -> Rc<Self> {
        Rc::new(BindingContext::Item {
            parent: self.clone(),
            name: name.into(),
            value,
        })
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut current = self;
        loop {
            match current {
                BindingContext::Root => return None,
                BindingContext::Item {
                    parent,
                    name: bound,
                    value,
                } => {
                    if bound == name {
                        return Some(value);
                    }
                    current = parent.as_ref();
                }
            }
        }
    }

    pub fn scope<'a>(&'a self, state: &'a ComponentState) -> ContextScope<'a> {
        ContextScope {
            state,
            context: self,
        }
    }
}

/// [`Scope`] over a binding context: loop variables first, then the component
pub struct ContextScope<'a> {
    state: &'a ComponentState,
    context: &'a BindingContext,
}

impl<'a> ContextScope<'a> {
    fn reject_loop_variable(&self, name: &str) -> EvalResult<()> {
        if self.context.lookup(name).is_some() {
            Err(EvalError::invalid_assignment(format!(
                "loop variable '{}' cannot be assigned",
                name
            )))
        } else {
            Ok(())
        }
    }
}

impl<'a> Scope for ContextScope<'a> {
    fn resolve(&self, name: &str) -> EvalResult<Option<Value>> {
        match self.context.lookup(name) {
            Some(value) => Ok(Some(value.clone())),
            None => self.state.resolve(name),
        }
    }

    fn assign(&self, name: &str, value: Value) -> EvalResult<()> {
        self.reject_loop_variable(name)?;
        self.state.assign(name, value)
    }

    fn mutate(
        &self,
        name: &str,
        op: &mut dyn FnMut(&mut Value) -> EvalResult<Value>,
    ) -> EvalResult<Value> {
        self.reject_loop_variable(name)?;
        Scope::mutate(self.state, name, op)
    }

    fn call(&self, name: &str, args: &[Value]) -> Option<EvalResult<Value>> {
        if !self.state.has_method(name) {
            return None;
        }
        Some(
            self.state
                .call(name, args)
                .map_err(ObserverError::into_eval),
        )
    }
}

/// Script-visible `$event`: `{ type, detail, target: { value, checked } }`
pub fn event_value<H: HostTree>(host: &H, node: NodeId, event: &Event) -> Value {
    let mut target = Object::new();
    target.insert("value".to_string(), Value::String(host.value(node)));
    target.insert("checked".to_string(), Value::Boolean(host.checked(node)));
    if let Some(tag) = host.tag_name(node) {
        target.insert("tagName".to_string(), Value::String(tag));
    }

    let mut value = match event.to_value() {
        Value::Object(map) => map,
        _ => Object::new(),
    };
    value.insert("target".to_string(), Value::Object(target));
    Value::Object(value)
}
