//! The node tree contract the binding engine drives.
//!
//! A host owns the nodes; the engine only ever holds `NodeId`s. Everything the
//! engine needs, from attribute access to live form state and listener
//! registration, goes through this trait so the engine can run against a real
//! document, a test double or the in-memory [`MemoryTree`](crate::MemoryTree).

use crate::error::DomResult;
use crate::event::{EventHandler, ListenerId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
    Fragment,
}

pub trait HostTree {
    fn kind(&self, node: NodeId) -> DomResult<NodeKind>;

    /// Lowercase tag name, `None` for non-elements
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn attribute_names(&self, node: NodeId) -> Vec<String>;

    fn get_attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.get_attribute(node, name).is_some()
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> DomResult<()>;

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> DomResult<()>;

    /// Data of a text or comment node
    fn text(&self, node: NodeId) -> Option<String>;

    fn set_text(&mut self, node: NodeId, text: &str) -> DomResult<()>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    fn create_element(&mut self, tag: &str) -> NodeId;

    fn create_text(&mut self, text: &str) -> NodeId;

    fn create_comment(&mut self, text: &str) -> NodeId;

    /// Copy a node (and with `deep`, its subtree). Listeners are not copied.
    fn clone_node(&mut self, node: NodeId, deep: bool) -> DomResult<NodeId>;

    /// Insert `child` under `parent` before `reference`, or last when
    /// `reference` is `None`. A child that already has a parent is moved.
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()>;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Detach `node` from its parent; detached nodes are left alone.
    fn remove(&mut self, node: NodeId) -> DomResult<()>;

    /// Put `new` where `old` is and detach `old`.
    fn replace(&mut self, old: NodeId, new: NodeId) -> DomResult<()>;

    fn clear_children(&mut self, node: NodeId) -> DomResult<()> {
        for child in self.children(node) {
            self.remove(child)?;
        }
        Ok(())
    }

    fn add_class(&mut self, node: NodeId, class: &str) -> DomResult<()>;

    fn remove_class(&mut self, node: NodeId, class: &str) -> DomResult<()>;

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    /// Set one inline style property; `None` or an empty value clears it.
    /// camelCase names are accepted and converted.
    fn set_style(&mut self, node: NodeId, property: &str, value: Option<&str>) -> DomResult<()>;

    /// Live value of a form control
    fn value(&self, node: NodeId) -> String;

    fn set_value(&mut self, node: NodeId, value: &str) -> DomResult<()>;

    /// Live checkedness of a checkbox or radio
    fn checked(&self, node: NodeId) -> bool;

    fn set_checked(&mut self, node: NodeId, checked: bool) -> DomResult<()>;

    fn add_event_listener(
        &mut self,
        node: NodeId,
        kind: &str,
        handler: EventHandler,
    ) -> DomResult<ListenerId>;

    fn remove_event_listener(&mut self, node: NodeId, listener: ListenerId) -> DomResult<()>;

    /// Handlers on `node` for `kind`, cloned so they can run without a borrow
    fn handlers(&self, node: NodeId, kind: &str) -> Vec<EventHandler>;
}

/// `fontSize` -> `font-size`; custom properties (`--x`) are kept as is
pub fn kebab_case(property: &str) -> String {
    if property.starts_with("--") {
        return property.to_string();
    }
    let mut out = String::with_capacity(property.len() + 4);
    for ch in property.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case() {
        assert_eq!(kebab_case("fontSize"), "font-size");
        assert_eq!(kebab_case("background-color"), "background-color");
        assert_eq!(kebab_case("--mainColor"), "--mainColor");
    }
}
