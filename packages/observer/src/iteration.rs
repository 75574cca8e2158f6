//! `iterate="item in items"`
//!
//! The template element is swapped for a comment marker. Each distinct item
//! of the list gets a deep clone of the template, placed after the marker in
//! list order and bound with the item in scope. When the list changes, nodes
//! of items that are still present keep their identity and are only moved.

use crate::context::BindingContext;
use crate::error::{ObserverError, ObserverResult};
use crate::observer::{ComponentObserver, ConnectPass};
use filament_common::Value;
use filament_dom::{HostTree, NodeId};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, instrument, warn};

const ITERATE: &str = "iterate";

/// Split `item in items` into the loop variable and the list property
pub fn parse_iteration(source: &str) -> ObserverResult<(String, String)> {
    let Some((item, list)) = source.split_once(" in ") else {
        return Err(ObserverError::malformed(
            ITERATE,
            source,
            "expected `item in property`",
        ));
    };
    let (item, list) = (item.trim(), list.trim());
    if !is_identifier(item) {
        return Err(ObserverError::malformed(
            ITERATE,
            source,
            format!("'{}' is not a valid loop variable", item),
        ));
    }
    if !is_identifier(list) {
        return Err(ObserverError::malformed(
            ITERATE,
            source,
            format!("'{}' is not a property name", list),
        ));
    }
    Ok((item.to_string(), list.to_string()))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => chars
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$'),
        _ => false,
    }
}

struct Iteration {
    template: NodeId,
    marker: NodeId,
    item: String,
    list: String,
    context: Rc<BindingContext>,
    /// Rendered items in order, with the node standing for each
    rendered: RefCell<Vec<(Value, NodeId)>>,
}

impl<H: HostTree + 'static> ComponentObserver<H> {
    #[instrument(skip(self, context), fields(component = %self.name))]
    pub(crate) fn bind_iteration(
        &self,
        template: NodeId,
        context: &Rc<BindingContext>,
    ) -> ObserverResult<()> {
        let source = self
            .host
            .borrow()
            .get_attribute(template, ITERATE)
            .unwrap_or_default();
        let (item, list) = parse_iteration(&source)?;
        if !self.state.has_property(&list) {
            return Err(ObserverError::unknown_property(list));
        }

        let marker = {
            let mut host = self.host.borrow_mut();
            let marker = host.create_comment(&format!("{}: {}", ITERATE, source.trim()));
            host.remove_attribute(template, ITERATE)?;
            host.replace(template, marker)?;
            marker
        };

        let iteration = Rc::new(Iteration {
            template,
            marker,
            item,
            list,
            context: context.clone(),
            rendered: RefCell::new(Vec::new()),
        });
        debug!(item = %iteration.item, list = %iteration.list, "bound iteration");

        let listened = iteration.clone();
        self.on_property(&iteration.list, move |observer, value| {
            observer.render_iteration(&listened, value)
        })?;

        let current = self.state.get(&iteration.list)?;
        self.render_iteration(&iteration, &current)
    }

    fn render_iteration(&self, iteration: &Iteration, value: &Value) -> ObserverResult<()> {
        let items = match value {
            Value::Null => Vec::new(),
            Value::Array(items) => {
                let mut distinct: Vec<Value> = Vec::with_capacity(items.len());
                for item in items {
                    if !distinct.contains(item) {
                        distinct.push(item.clone());
                    }
                }
                distinct
            }
            other => {
                return Err(ObserverError::InvalidIterationSource {
                    property: iteration.list.clone(),
                    found: other.kind(),
                })
            }
        };

        let Some(parent) = self.host.borrow().parent(iteration.marker) else {
            warn!(list = %iteration.list, "iteration marker is detached, skipping render");
            return Ok(());
        };

        let mut previous = std::mem::take(&mut *iteration.rendered.borrow_mut());
        let mut next = Vec::with_capacity(items.len());
        let mut created = Vec::new();
        for item in items {
            let node = match previous.iter().position(|(rendered, _)| *rendered == item) {
                Some(index) => previous.remove(index).1,
                None => {
                    let clone = self.host.borrow_mut().clone_node(iteration.template, true)?;
                    created.push((clone, item.clone()));
                    clone
                }
            };
            next.push((item, node));
        }

        for (_, node) in &previous {
            self.release_subtree(*node)?;
            let mut host = self.host.borrow_mut();
            if host.parent(*node).is_some() {
                host.remove(*node)?;
            }
        }

        {
            let mut host = self.host.borrow_mut();
            let placeholders = self.placeholders.borrow();
            let mut last = iteration.marker;
            for (_, node) in &next {
                // an item hidden by its own `if` moves through its placeholder
                let placed = match placeholders.get(node) {
                    Some(placeholder) if host.parent(*node).is_none() => *placeholder,
                    _ => *node,
                };
                let reference = host.next_sibling(last);
                if reference != Some(placed) {
                    host.insert_before(parent, placed, reference)?;
                }
                last = placed;
            }
        }

        debug!(
            list = %iteration.list,
            rendered = next.len(),
            created = created.len(),
            removed = previous.len(),
            "rendered iteration"
        );
        *iteration.rendered.borrow_mut() = next;

        for (node, item) in created {
            let context = iteration.context.child(iteration.item.as_str(), item);
            let mut pass = ConnectPass::default();
            self.bind_node(node, &context, &mut pass)?;
            self.finish_pass(pass)?;
        }
        Ok(())
    }
}
