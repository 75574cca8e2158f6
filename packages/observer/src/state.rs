//! The component instance the engine observes.
//!
//! `ComponentState` owns the tracked properties, the computed properties and
//! the methods of one component, and is the [`Scope`] template expressions
//! resolve against. Writes made by expressions land in the property registry
//! and fire its listeners like any other write.

use crate::component::{ComputedDeclaration, Declarations, Method, MethodDeclaration, WatchDeclaration};
use crate::computed::ComputedRegistry;
use crate::error::{ObserverError, ObserverResult};
use crate::list::ObservableList;
use crate::property::PropertyRegistry;
use filament_common::Value;
use filament_expression::{compile, scan_dependencies, EvalError, EvalResult, LocalScope, Scope};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Sends a bubbling custom event from the component's root
pub type Emitter = Rc<dyn Fn(&str, Value) -> ObserverResult<()>>;

const EMIT: &str = "$emit";

pub struct ComponentState {
    name: String,
    properties: PropertyRegistry,
    computed: ComputedRegistry,
    methods: RefCell<IndexMap<String, Method>>,
    emitter: RefCell<Option<Emitter>>,
}

impl ComponentState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: PropertyRegistry::new(),
            computed: ComputedRegistry::new(),
            methods: RefCell::new(IndexMap::new()),
            emitter: RefCell::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &PropertyRegistry {
        &self.properties
    }

    pub fn computed(&self) -> &ComputedRegistry {
        &self.computed
    }

    /// Turn declarations into live properties, methods and computed
    /// properties, in that order. Computed properties are defined after the
    /// computed properties they read, whatever their declaration order. Returns the watch bindings, which are wired
    /// once the tree has been bound.
    pub(crate) fn activate(&self, declarations: Declarations) -> ObserverResult<Vec<WatchDeclaration>> {
        for (name, initial) in declarations.properties {
            self.properties.define(&name, initial);
        }

        for (name, method) in declarations.methods {
            if self.properties.has(&name) || self.has_method(&name) {
                return Err(ObserverError::duplicate(name));
            }
            let method = match method {
                MethodDeclaration::Native(method) => method,
                MethodDeclaration::Expression(source) => expression_method(&source)?,
            };
            self.methods.borrow_mut().insert(name, method);
        }

        for computed in dependency_order(declarations.computed)? {
            let name = computed.name().to_string();
            if self.has_method(&name) {
                return Err(ObserverError::duplicate(name));
            }
            match computed {
                ComputedDeclaration::Native {
                    name,
                    dependencies,
                    getter,
                } => self
                    .computed
                    .define(&self.properties, &name, &dependencies, getter)?,
                ComputedDeclaration::Expression { name, source } => self
                    .computed
                    .define_expression(&self.properties, &name, &source)?,
            }
        }

        debug!(
            component = %self.name,
            properties = self.properties.names().len(),
            computed = self.computed.names().len(),
            methods = self.methods.borrow().len(),
            "activated component state"
        );
        Ok(declarations.watchers)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.has(name)
    }

    pub fn has_computed(&self, name: &str) -> bool {
        self.computed.has(name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.borrow().contains_key(name)
    }

    /// Whether `name` is something a binding can depend on
    pub fn is_known(&self, name: &str) -> bool {
        self.has_property(name) || self.has_computed(name)
    }

    /// Value of a tracked or computed property
    pub fn get(&self, name: &str) -> ObserverResult<Value> {
        if self.properties.has(name) {
            self.properties.get(name)
        } else if self.computed.has(name) {
            self.computed.get(name, self)
        } else {
            Err(ObserverError::unknown_property(name))
        }
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) -> ObserverResult<()> {
        if self.computed.has(name) {
            return Err(ObserverError::type_mismatch(format!(
                "computed property '{}' is read-only",
                name
            )));
        }
        self.properties.set(name, value.into())
    }

    pub fn list(&self, name: &str) -> ObserverResult<ObservableList<'_>> {
        self.properties.list(name)
    }

    pub fn call(&self, name: &str, args: &[Value]) -> ObserverResult<Value> {
        let method = self
            .methods
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| ObserverError::unknown_method(name))?;
        method(self, args)
    }

    pub(crate) fn set_emitter(&self, emitter: Option<Emitter>) {
        *self.emitter.borrow_mut() = emitter;
    }

    /// Dispatch a bubbling custom event `event` carrying `detail` from the
    /// component's root. Nothing happens while the component is not
    /// connected. Expressions reach this as `$emit(event, detail)`.
    pub fn emit(&self, event: &str, detail: impl Into<Value>) -> ObserverResult<()> {
        let emitter = self.emitter.borrow().clone();
        match emitter {
            Some(emitter) => emitter(event, detail.into()),
            None => {
                debug!(component = %self.name, %event, "emit while not connected");
                Ok(())
            }
        }
    }

    /// Subscribe to changes of a tracked or computed property. The listener
    /// is not told the new value.
    pub fn subscribe(
        &self,
        name: &str,
        listener: Rc<dyn Fn() -> ObserverResult<()>>,
    ) -> ObserverResult<()> {
        if self.properties.has(name) {
            self.properties
                .add_listener(name, Rc::new(move |_: &Value| listener()))
        } else {
            self.computed.add_listener(name, listener)
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    Pending,
    Active,
    Done,
}

/// Order computed declarations so each comes after the computed properties
/// it reads. Expression sources are scanned against every declared name.
fn dependency_order(declarations: Vec<ComputedDeclaration>) -> ObserverResult<Vec<ComputedDeclaration>> {
    let names: Vec<String> = declarations.iter().map(|d| d.name().to_string()).collect();
    let edges: Vec<Vec<usize>> = declarations
        .iter()
        .map(|declaration| {
            let reads = match declaration {
                ComputedDeclaration::Native { dependencies, .. } => dependencies.clone(),
                ComputedDeclaration::Expression { name, source } => scan_dependencies(source, |candidate| {
                    candidate != name && names.iter().any(|declared| declared == candidate)
                }),
            };
            reads
                .iter()
                .filter_map(|read| names.iter().position(|declared| declared == read))
                .collect()
        })
        .collect();

    let mut marks = vec![Visit::Pending; names.len()];
    let mut order = Vec::with_capacity(names.len());
    for index in 0..names.len() {
        visit(index, &names, &edges, &mut marks, &mut order)?;
    }

    let mut slots: Vec<Option<ComputedDeclaration>> = declarations.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|index| slots[index].take()).collect())
}

fn visit(
    index: usize,
    names: &[String],
    edges: &[Vec<usize>],
    marks: &mut [Visit],
    order: &mut Vec<usize>,
) -> ObserverResult<()> {
    match marks[index] {
        Visit::Done => return Ok(()),
        Visit::Active => {
            return Err(ObserverError::ComputedCycle {
                name: names[index].clone(),
            })
        }
        Visit::Pending => {}
    }
    marks[index] = Visit::Active;
    for &next in &edges[index] {
        visit(next, names, edges, marks, order)?;
    }
    marks[index] = Visit::Done;
    order.push(index);
    Ok(())
}

fn expression_method(source: &str) -> ObserverResult<Method> {
    let compiled = compile(source).map_err(|err| ObserverError::expression(source, err))?;
    Ok(Rc::new(move |state: &ComponentState, args: &[Value]| {
        let scope = LocalScope::new(state)
            .with("$args", Value::Array(args.to_vec()))
            .with("$event", args.first().cloned().unwrap_or_default());
        compiled.evaluate(&scope).map_err(ObserverError::from)
    }))
}

impl Scope for ComponentState {
    fn resolve(&self, name: &str) -> EvalResult<Option<Value>> {
        if self.is_known(name) {
            self.get(name).map(Some).map_err(ObserverError::into_eval)
        } else {
            Ok(None)
        }
    }

    fn assign(&self, name: &str, value: Value) -> EvalResult<()> {
        if !self.is_known(name) {
            return Err(EvalError::invalid_assignment(format!(
                "'{}' is not a property of {}",
                name, self.name
            )));
        }
        self.set(name, value).map_err(ObserverError::into_eval)
    }

    fn mutate(
        &self,
        name: &str,
        op: &mut dyn FnMut(&mut Value) -> EvalResult<Value>,
    ) -> EvalResult<Value> {
        if !self.properties.has(name) {
            return Err(EvalError::invalid_assignment(format!(
                "'{}' is not a tracked property of {}",
                name, self.name
            )));
        }
        self.properties
            .mutate(name, |value| op(value).map_err(ObserverError::from))
            .map_err(ObserverError::into_eval)
    }

    fn call(&self, name: &str, args: &[Value]) -> Option<EvalResult<Value>> {
        if name == EMIT {
            let event = args.first().map(Value::to_string).unwrap_or_default();
            let detail = args.get(1).cloned().unwrap_or_default();
            return Some(
                self.emit(&event, detail)
                    .map(|()| Value::Null)
                    .map_err(ObserverError::into_eval),
            );
        }
        if !self.has_method(name) {
            return None;
        }
        Some(ComponentState::call(self, name, args).map_err(ObserverError::into_eval))
    }
}
