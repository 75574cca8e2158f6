//! Component declaration.
//!
//! A component states up front which fields are reactive, which values are
//! computed and which methods templates may call. Nothing is discovered by
//! inspecting the component at runtime.

use crate::computed::Getter;
use crate::error::ObserverResult;
use crate::state::ComponentState;
use filament_common::Value;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Native method body; receives the component state and the call arguments
pub type Method = Rc<dyn Fn(&ComponentState, &[Value]) -> ObserverResult<Value>>;

pub trait Component {
    fn name(&self) -> &str;

    fn declare(&self, declarations: &mut Declarations);
}

/// Watch binding: call `method` with the new value whenever `property` is written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchDeclaration {
    pub property: String,
    pub method: String,
    /// Also call the method once with the current value during connect
    #[serde(default = "default_immediate")]
    pub immediate: bool,
}

fn default_immediate() -> bool {
    true
}

pub(crate) enum ComputedDeclaration {
    Native {
        name: String,
        dependencies: Vec<String>,
        getter: Getter,
    },
    Expression {
        name: String,
        source: String,
    },
}

impl ComputedDeclaration {
    pub(crate) fn name(&self) -> &str {
        match self {
            Self::Native { name, .. } | Self::Expression { name, .. } => name,
        }
    }
}

pub(crate) enum MethodDeclaration {
    Native(Method),
    /// Statements run with `$args` (all arguments) and `$event` (the first)
    Expression(String),
}

/// Builder a [`Component`] fills in. Declarations are only checked when the
/// observer connects.
#[derive(Default)]
pub struct Declarations {
    pub(crate) properties: Vec<(String, Value)>,
    pub(crate) computed: Vec<ComputedDeclaration>,
    pub(crate) methods: Vec<(String, MethodDeclaration)>,
    pub(crate) watchers: Vec<WatchDeclaration>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(&mut self, name: impl Into<String>, initial: impl Into<Value>) -> &mut Self {
        self.properties.push((name.into(), initial.into()));
        self
    }

    pub fn computed(
        &mut self,
        name: impl Into<String>,
        dependencies: &[&str],
        getter: impl Fn(&ComponentState) -> ObserverResult<Value> + 'static,
    ) -> &mut Self {
        self.computed.push(ComputedDeclaration::Native {
            name: name.into(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            getter: Rc::new(getter),
        });
        self
    }

    /// Computed property whose dependencies are scanned from `source`
    pub fn computed_expression(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> &mut Self {
        self.computed.push(ComputedDeclaration::Expression {
            name: name.into(),
            source: source.into(),
        });
        self
    }

    pub fn method(
        &mut self,
        name: impl Into<String>,
        body: impl Fn(&ComponentState, &[Value]) -> ObserverResult<Value> + 'static,
    ) -> &mut Self {
        self.methods
            .push((name.into(), MethodDeclaration::Native(Rc::new(body))));
        self
    }

    pub fn method_expression(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> &mut Self {
        self.methods
            .push((name.into(), MethodDeclaration::Expression(source.into())));
        self
    }

    pub fn watch(
        &mut self,
        property: impl Into<String>,
        method: impl Into<String>,
        immediate: bool,
    ) -> &mut Self {
        self.watchers.push(WatchDeclaration {
            property: property.into(),
            method: method.into(),
            immediate,
        });
        self
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(name, _)| name.as_str())
    }
}
