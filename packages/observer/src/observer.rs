//! # Component observer
//!
//! Connects a component to the node tree rendered from its template.
//!
//! ## Connect pass
//!
//! `connect()` runs once, in this order:
//!
//! 1. Declared properties, methods and computed properties become live.
//! 2. The tree is walked depth first. Every element gets its directives
//!    bound; text nodes containing interpolation delimiters are collected.
//!    `iterate` elements are swapped for a marker and rendered per item.
//!    Watch bindings are installed once the walk is done.
//! 3. Collected text nodes are split and replaced by reactive text nodes.
//!    This waits for the walk so the tree is not rewritten under it.
//! 4. Every `if` predicate is evaluated. Conditionals can remove whole
//!    subtrees, so they go last.
//!
//! A failure anywhere detaches the node listeners attached so far and is
//! returned to the caller.
//!
//! ## Ownership
//!
//! Bindings live in listener closures stored in the component's registries
//! and in the host's listener lists. They hold a `Weak` reference to the
//! observer, so dropping the observer stops every binding. No `RefCell`
//! borrow of the host or of the state is held while a listener, getter or
//! method runs.

use crate::component::{Component, Declarations};
use crate::computed::ComputedListener;
use crate::config::ObserverConfig;
use crate::context::BindingContext;
use crate::error::{ObserverError, ObserverResult};
use crate::events::NodeEventMap;
use crate::property::PropertyListener;
use crate::state::{ComponentState, Emitter};
use crate::watcher::Watcher;
use filament_common::Value;
use filament_dom::{dispatch_event, Event, EventHandler, HandlerError, HostTree, NodeId, NodeKind};
use filament_expression::{compile, scan_dependencies, CompiledExpression};
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Connected,
    Disconnected,
}

impl Lifecycle {
    pub fn as_str(self) -> &'static str {
        match self {
            Lifecycle::Created => "not connected",
            Lifecycle::Connected => "connected",
            Lifecycle::Disconnected => "disconnected",
        }
    }
}

/// Work collected during a tree walk and applied once the walk is done
#[derive(Default)]
pub(crate) struct ConnectPass {
    pub(crate) interpolations: Vec<(NodeId, Rc<BindingContext>)>,
    pub(crate) conditionals: Vec<ComputedListener>,
}

pub struct ComponentObserver<H: HostTree + 'static> {
    pub(crate) name: String,
    pub(crate) state: Rc<ComponentState>,
    pub(crate) host: Rc<RefCell<H>>,
    pub(crate) root: NodeId,
    pub(crate) config: ObserverConfig,
    declarations: RefCell<Option<Declarations>>,
    lifecycle: Cell<Lifecycle>,
    pub(crate) events: RefCell<NodeEventMap>,
    /// `if` elements and the comment standing in for them while hidden
    pub(crate) placeholders: RefCell<IndexMap<NodeId, NodeId>>,
    pub(crate) this: Weak<Self>,
}

impl<H: HostTree + 'static> ComponentObserver<H> {
    /// Observe `component` rendered under `root`. Nothing is bound until
    /// [`connect`](Self::connect).
    pub fn new(
        component: &dyn Component,
        host: Rc<RefCell<H>>,
        root: NodeId,
        config: ObserverConfig,
    ) -> Rc<Self> {
        let mut declarations = Declarations::new();
        component.declare(&mut declarations);
        let name = component.name().to_string();

        Rc::new_cyclic(|this| Self {
            state: Rc::new(ComponentState::new(name.clone())),
            name,
            host,
            root,
            config,
            declarations: RefCell::new(Some(declarations)),
            lifecycle: Cell::new(Lifecycle::Created),
            events: RefCell::new(NodeEventMap::new()),
            placeholders: RefCell::new(IndexMap::new()),
            this: this.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &Rc<ComponentState> {
        &self.state
    }

    pub fn host(&self) -> &Rc<RefCell<H>> {
        &self.host
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.get()
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.state.has_property(name)
    }

    /// Number of node event listeners currently attached by this observer
    pub fn event_listener_count(&self) -> usize {
        self.events.borrow().len()
    }

    #[instrument(skip(self), fields(component = %self.name))]
    pub fn connect(&self) -> ObserverResult<()> {
        if self.lifecycle.get() != Lifecycle::Created {
            return Err(ObserverError::Lifecycle {
                operation: "connect",
                state: self.lifecycle.get().as_str(),
            });
        }

        self.state.set_emitter(Some(self.emitter()));
        match self.connect_pass() {
            Ok(()) => {
                self.lifecycle.set(Lifecycle::Connected);
                info!(listeners = self.event_listener_count(), "connected");
                Ok(())
            }
            Err(err) => {
                self.lifecycle.set(Lifecycle::Disconnected);
                self.state.set_emitter(None);
                match self.release_all() {
                    Ok(released) => debug!(released, "rolled back node listeners"),
                    Err(release_err) => warn!(error = %release_err, "rollback failed"),
                }
                Err(err)
            }
        }
    }

    fn connect_pass(&self) -> ObserverResult<()> {
        let declarations = self
            .declarations
            .borrow_mut()
            .take()
            .unwrap_or_default();
        let watchers = self.state.activate(declarations)?;

        let context = Rc::new(BindingContext::Root);
        let mut pass = ConnectPass::default();
        let children = self.host.borrow().children(self.root);
        for child in children {
            self.bind_node(child, &context, &mut pass)?;
        }

        for declaration in watchers {
            Rc::new(Watcher::new(declaration)).install(&self.state)?;
        }

        self.finish_pass(pass)
    }

    /// Detach every node event listener this observer attached
    #[instrument(skip(self), fields(component = %self.name))]
    pub fn disconnect(&self) -> ObserverResult<()> {
        if self.lifecycle.get() != Lifecycle::Connected {
            return Err(ObserverError::Lifecycle {
                operation: "disconnect",
                state: self.lifecycle.get().as_str(),
            });
        }
        self.lifecycle.set(Lifecycle::Disconnected);
        self.state.set_emitter(None);
        let released = self.release_all()?;
        info!(released, "disconnected");
        Ok(())
    }

    /// `$emit` target: a bubbling custom event dispatched at the root
    fn emitter(&self) -> Emitter {
        let this = self.this.clone();
        Rc::new(move |name: &str, detail: Value| -> ObserverResult<()> {
            let Some(observer) = this.upgrade() else {
                return Ok(());
            };
            let event = Event::custom(name, detail).bubbling();
            let invoked = dispatch_event(&observer.host, observer.root, &event)?;
            debug!(component = %observer.name, event = %name, invoked, "emitted event");
            Ok(())
        })
    }

    fn release_all(&self) -> ObserverResult<usize> {
        let listeners = self.events.borrow_mut().drain();
        let mut host = self.host.borrow_mut();
        for (node, listener) in &listeners {
            host.remove_event_listener(*node, *listener)?;
        }
        Ok(listeners.len())
    }

    /// Detach the listeners of `root` and its descendants and retire their
    /// `if` placeholders
    pub(crate) fn release_subtree(&self, root: NodeId) -> ObserverResult<usize> {
        let mut host = self.host.borrow_mut();
        let mut events = self.events.borrow_mut();
        let mut placeholders = self.placeholders.borrow_mut();
        let mut stack = vec![root];
        let mut released = 0;
        while let Some(node) = stack.pop() {
            for listener in events.take_node(node) {
                host.remove_event_listener(node, listener)?;
                released += 1;
            }
            if let Some(placeholder) = placeholders.shift_remove(&node) {
                if host.parent(placeholder).is_some() {
                    host.remove(placeholder)?;
                }
            }
            // a hidden element is reachable only through its placeholder
            let hidden = placeholders
                .iter()
                .find(|(_, placeholder)| **placeholder == node)
                .map(|(element, _)| *element);
            stack.extend(hidden);
            stack.extend(host.children(node));
        }
        Ok(released)
    }

    /// Walk `node` and its subtree, binding directives depth first.
    pub(crate) fn bind_node(
        &self,
        node: NodeId,
        context: &Rc<BindingContext>,
        pass: &mut ConnectPass,
    ) -> ObserverResult<()> {
        let (kind, iterates, children) = {
            let host = self.host.borrow();
            (
                host.kind(node)?,
                host.has_attribute(node, "iterate"),
                host.children(node),
            )
        };

        if kind == NodeKind::Element && iterates {
            return self.bind_iteration(node, context);
        }

        for child in children {
            self.bind_node(child, context, pass)?;
        }

        match kind {
            NodeKind::Text => {
                let text = self.host.borrow().text(node).unwrap_or_default();
                if self.has_interpolation(&text) {
                    pass.interpolations.push((node, context.clone()));
                }
            }
            NodeKind::Element => self.bind_element(node, context, pass)?,
            NodeKind::Comment | NodeKind::Fragment => {}
        }
        Ok(())
    }

    /// Rewrite collected interpolations, then run conditionals
    pub(crate) fn finish_pass(&self, pass: ConnectPass) -> ObserverResult<()> {
        for (node, context) in pass.interpolations {
            self.interpolate(node, &context)?;
        }
        for conditional in pass.conditionals {
            conditional()?;
        }
        Ok(())
    }

    pub(crate) fn compile_fragment(&self, source: &str) -> ObserverResult<Rc<CompiledExpression>> {
        compile(source)
            .map(Rc::new)
            .map_err(|err| ObserverError::expression(source, err))
    }

    pub(crate) fn evaluate(
        &self,
        compiled: &CompiledExpression,
        context: &BindingContext,
    ) -> ObserverResult<Value> {
        Ok(compiled.evaluate(&context.scope(&self.state))?)
    }

    /// Tracked and computed names `source` mentions
    pub(crate) fn dependencies(&self, source: &str) -> Vec<String> {
        scan_dependencies(source, |name| self.state.is_known(name))
    }

    /// Compile `source` and subscribe a listener that evaluates it in
    /// `context` and hands the result to `apply` whenever a dependency
    /// changes. The listener is returned so the caller decides when it first
    /// runs.
    pub(crate) fn effect(
        &self,
        source: &str,
        context: &Rc<BindingContext>,
        apply: impl Fn(&Self, Value) -> ObserverResult<()> + 'static,
    ) -> ObserverResult<ComputedListener> {
        let compiled = self.compile_fragment(source)?;
        let weak = self.this.clone();
        let context = context.clone();
        let listener: ComputedListener = Rc::new(move || {
            let Some(observer) = weak.upgrade() else {
                return Ok(());
            };
            let value = observer.evaluate(&compiled, &context)?;
            apply(&*observer, value)
        });

        let dependencies = self.dependencies(source);
        debug!(fragment = %source, ?dependencies, "bound expression");
        for dependency in &dependencies {
            self.state.subscribe(dependency, listener.clone())?;
        }
        Ok(listener)
    }

    /// Run `apply` with the new value whenever `property` is written
    pub(crate) fn on_property(
        &self,
        property: &str,
        apply: impl Fn(&Self, &Value) -> ObserverResult<()> + 'static,
    ) -> ObserverResult<PropertyListener> {
        let weak = self.this.clone();
        let listener: PropertyListener = Rc::new(move |value: &Value| match weak.upgrade() {
            Some(observer) => apply(&*observer, value),
            None => Ok(()),
        });
        self.state
            .properties()
            .add_listener(property, listener.clone())?;
        Ok(listener)
    }

    /// Attach an event listener to `node` and record it for disconnect
    pub(crate) fn on_event(
        &self,
        node: NodeId,
        kind: &str,
        handle: impl Fn(&Self, &Event) -> ObserverResult<()> + 'static,
    ) -> ObserverResult<()> {
        let weak = self.this.clone();
        let handler: EventHandler = Rc::new(move |event: &Event| -> Result<(), HandlerError> {
            match weak.upgrade() {
                Some(observer) => handle(&*observer, event).map_err(HandlerError::from),
                None => Ok(()),
            }
        });
        let listener = self
            .host
            .borrow_mut()
            .add_event_listener(node, kind, handler)?;
        self.events.borrow_mut().record(node, kind, listener);
        Ok(())
    }
}
