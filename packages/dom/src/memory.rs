//! Arena-backed implementation of [`HostTree`].
//!
//! Nodes are never freed: a removed node is only detached, so its `NodeId`
//! stays valid and it can be reinserted (conditionals rely on that).

use crate::error::{DomError, DomResult};
use crate::event::{Event, EventHandler, ListenerId};
use crate::host::{kebab_case, HostTree, NodeId, NodeKind};
use crate::selector::Selector;
use indexmap::IndexMap;

struct Listener {
    id: ListenerId,
    kind: String,
    handler: EventHandler,
}

struct NodeData {
    kind: NodeKind,
    tag: Option<String>,
    attributes: IndexMap<String, String>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    /// Dirty value of a form control; `None` falls back to the markup
    value: Option<String>,
    checked: Option<bool>,
    /// Selectedness of an `<option>`; `None` falls back to the attribute
    selected: Option<bool>,
    listeners: Vec<Listener>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            tag: None,
            attributes: IndexMap::new(),
            text: String::new(),
            children: Vec::new(),
            parent: None,
            value: None,
            checked: None,
            selected: None,
            listeners: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct MemoryTree {
    nodes: Vec<NodeData>,
    next_listener: u64,
}

impl std::fmt::Debug for MemoryTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTree")
            .field("nodes", &self.nodes.len())
            .field("next_listener", &self.next_listener)
            .finish()
    }
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `source` into a new tree, returning it with the fragment holding
    /// the parsed nodes.
    pub fn from_markup(source: &str) -> DomResult<(Self, NodeId)> {
        let mut tree = Self::new();
        let root = tree.parse_markup(source)?;
        Ok((tree, root))
    }

    /// Parse `source` into a fresh fragment of this tree
    pub fn parse_markup(&mut self, source: &str) -> DomResult<NodeId> {
        let fragment = self.create_fragment();
        crate::markup::parse_into(self, fragment, source)?;
        Ok(fragment)
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.push(NodeData::new(NodeKind::Fragment))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(data);
        NodeId(self.nodes.len() - 1)
    }

    fn node(&self, id: NodeId) -> DomResult<&NodeData> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut NodeData> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> DomResult<&mut NodeData> {
        let node = self.node_mut(id)?;
        if node.kind != NodeKind::Element {
            return Err(DomError::NotAnElement(id));
        }
        Ok(node)
    }

    fn detach(&mut self, child: NodeId) -> DomResult<()> {
        if let Some(parent) = self.node(child)?.parent {
            self.node_mut(parent)?.children.retain(|c| *c != child);
            self.node_mut(child)?.parent = None;
        }
        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Topmost ancestor of `node`
    pub fn root_of(&self, node: NodeId) -> NodeId {
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Descendants of `node` in document order, `node` excluded
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).into_iter().rev());
        }
        out
    }

    /// Concatenated text of every descendant text node
    pub fn text_content(&self, node: NodeId) -> String {
        match self.kind(node) {
            Ok(NodeKind::Text) | Ok(NodeKind::Comment) => self.text(node).unwrap_or_default(),
            _ => self
                .descendants(node)
                .into_iter()
                .filter(|id| matches!(self.kind(*id), Ok(NodeKind::Text)))
                .filter_map(|id| self.text(id))
                .collect(),
        }
    }

    pub fn to_html(&self, node: NodeId) -> String {
        crate::html::to_html(self, node)
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        crate::html::inner_html(self, node)
    }

    pub fn query(&self, root: NodeId, selector: &str) -> DomResult<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .descendants(root)
            .into_iter()
            .find(|id| selector.matches(self, *id)))
    }

    pub fn query_all(&self, root: NodeId, selector: &str) -> DomResult<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .descendants(root)
            .into_iter()
            .filter(|id| selector.matches(self, *id))
            .collect())
    }

    /// Inline style declarations in order
    pub fn styles(&self, node: NodeId) -> Vec<(String, String)> {
        parse_style(&self.get_attribute(node, "style").unwrap_or_default())
    }

    pub fn get_style(&self, node: NodeId, property: &str) -> Option<String> {
        let property = kebab_case(property);
        self.styles(node)
            .into_iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| value)
    }

    pub fn listener_count(&self, node: NodeId) -> usize {
        self.nodes.get(node.0).map_or(0, |n| n.listeners.len())
    }

    pub fn total_listener_count(&self) -> usize {
        self.nodes.iter().map(|n| n.listeners.len()).sum()
    }

    /// `<option>` descendants of a `<select>`, optgroups included
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|id| self.tag_name(*id).as_deref() == Some("option"))
            .collect()
    }

    fn option_value(&self, option: NodeId) -> String {
        self.get_attribute(option, "value").unwrap_or_else(|| {
            self.text_content(option)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
    }

    pub fn is_selected(&self, option: NodeId) -> bool {
        self.nodes.get(option.0).map_or(false, |n| {
            n.selected
                .unwrap_or_else(|| n.attributes.contains_key("selected"))
        })
    }

    /// Index of the selected option, the first option when nothing was ever
    /// selected explicitly
    pub fn selected_index(&self, select: NodeId) -> Option<usize> {
        let options = self.options(select);
        if let Some(index) = options.iter().position(|o| self.is_selected(*o)) {
            return Some(index);
        }
        let untouched = options
            .iter()
            .all(|o| self.nodes.get(o.0).map_or(true, |n| n.selected.is_none()));
        if untouched && !options.is_empty() {
            Some(0)
        } else {
            None
        }
    }

    fn set_select_value(&mut self, select: NodeId, value: &str) {
        let mut matched = false;
        for option in self.options(select) {
            let selected = !matched && self.option_value(option) == value;
            matched |= selected;
            if let Some(data) = self.nodes.get_mut(option.0) {
                data.selected = Some(selected);
            }
        }
    }

    fn uncheck_radio_group(&mut self, radio: NodeId) {
        let name = match self.get_attribute(radio, "name") {
            Some(name) if !name.is_empty() => name,
            _ => return,
        };
        let root = self.root_of(radio);
        for other in self.descendants(root) {
            if other != radio
                && self.tag_name(other).as_deref() == Some("input")
                && self.get_attribute(other, "type").as_deref() == Some("radio")
                && self.get_attribute(other, "name").as_deref() == Some(name.as_str())
            {
                if let Some(data) = self.nodes.get_mut(other.0) {
                    data.checked = Some(false);
                }
            }
        }
    }
}

/// Split a `style` attribute into `(property, value)` pairs
fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() {
                None
            } else {
                Some((name.to_string(), value.to_string()))
            }
        })
        .collect()
}

fn write_style(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(name, value)| format!("{}: {};", name, value))
        .collect::<Vec<_>>()
        .join(" ")
}

impl HostTree for MemoryTree {
    fn kind(&self, node: NodeId) -> DomResult<NodeKind> {
        Ok(self.node(node)?.kind)
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.nodes.get(node.0).and_then(|n| n.tag.clone())
    }

    fn attribute_names(&self, node: NodeId) -> Vec<String> {
        self.nodes
            .get(node.0)
            .map_or_else(Vec::new, |n| n.attributes.keys().cloned().collect())
    }

    fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes
            .get(node.0)
            .and_then(|n| n.attributes.get(name).cloned())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        self.element_mut(node)?
            .attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> DomResult<()> {
        self.element_mut(node)?.attributes.shift_remove(name);
        Ok(())
    }

    fn text(&self, node: NodeId) -> Option<String> {
        self.nodes.get(node.0).and_then(|n| match n.kind {
            NodeKind::Text | NodeKind::Comment => Some(n.text.clone()),
            _ => None,
        })
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> DomResult<()> {
        match self.node(node)?.kind {
            NodeKind::Text | NodeKind::Comment => {
                self.node_mut(node)?.text = text.to_string();
                Ok(())
            }
            _ => {
                // textContent on a container replaces its children
                let created = self.create_text(text);
                self.clear_children(node)?;
                self.append_child(node, created)
            }
        }
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map_or_else(Vec::new, |n| n.children.clone())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = &self.nodes.get(parent.0)?.children;
        let index = siblings.iter().position(|c| *c == node)?;
        siblings.get(index + 1).copied()
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Element);
        data.tag = Some(tag.to_ascii_lowercase());
        self.push(data)
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Text);
        data.text = text.to_string();
        self.push(data)
    }

    fn create_comment(&mut self, text: &str) -> NodeId {
        let mut data = NodeData::new(NodeKind::Comment);
        data.text = text.to_string();
        self.push(data)
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> DomResult<NodeId> {
        let source = self.node(node)?;
        let mut copy = NodeData::new(source.kind);
        copy.tag = source.tag.clone();
        copy.attributes = source.attributes.clone();
        copy.text = source.text.clone();
        copy.value = source.value.clone();
        copy.checked = source.checked;
        copy.selected = source.selected;
        let children = if deep { source.children.clone() } else { Vec::new() };

        let id = self.push(copy);
        for child in children {
            let child_copy = self.clone_node(child, true)?;
            self.append_child(id, child_copy)?;
        }
        Ok(id)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        self.node(parent)?;
        self.node(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if reference == Some(child) {
            return Ok(());
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    child: reference,
                });
            }
        }

        self.detach(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let index = match reference {
            Some(reference) => siblings
                .iter()
                .position(|c| *c == reference)
                .unwrap_or(siblings.len()),
            None => siblings.len(),
        };
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn remove(&mut self, node: NodeId) -> DomResult<()> {
        self.detach(node)
    }

    fn replace(&mut self, old: NodeId, new: NodeId) -> DomResult<()> {
        if old == new {
            return Ok(());
        }
        let parent = self.parent(old).ok_or(DomError::NoParent(old))?;
        self.insert_before(parent, new, Some(old))?;
        self.detach(old)
    }

    fn add_class(&mut self, node: NodeId, class: &str) -> DomResult<()> {
        let data = self.element_mut(node)?;
        let current = data.attributes.get("class").cloned().unwrap_or_default();
        if current.split_whitespace().any(|c| c == class) {
            return Ok(());
        }
        let updated = if current.trim().is_empty() {
            class.to_string()
        } else {
            format!("{} {}", current.trim(), class)
        };
        data.attributes.insert("class".to_string(), updated);
        Ok(())
    }

    fn remove_class(&mut self, node: NodeId, class: &str) -> DomResult<()> {
        let data = self.element_mut(node)?;
        if let Some(current) = data.attributes.get_mut("class") {
            *current = current
                .split_whitespace()
                .filter(|c| *c != class)
                .collect::<Vec<_>>()
                .join(" ");
        }
        Ok(())
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.get_attribute(node, "class")
            .map_or(false, |c| c.split_whitespace().any(|c| c == class))
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: Option<&str>) -> DomResult<()> {
        let property = kebab_case(property);
        let data = self.element_mut(node)?;
        let mut declarations = parse_style(data.attributes.get("style").map_or("", |s| s.as_str()));
        let value = value.map(str::trim).filter(|v| !v.is_empty());

        match (declarations.iter().position(|(name, _)| *name == property), value) {
            (Some(index), Some(value)) => declarations[index].1 = value.to_string(),
            (None, Some(value)) => declarations.push((property, value.to_string())),
            (Some(index), None) => {
                declarations.remove(index);
            }
            (None, None) => {}
        }

        if declarations.is_empty() {
            data.attributes.shift_remove("style");
        } else {
            data.attributes
                .insert("style".to_string(), write_style(&declarations));
        }
        Ok(())
    }

    fn value(&self, node: NodeId) -> String {
        let Some(data) = self.nodes.get(node.0) else {
            return String::new();
        };
        match data.tag.as_deref() {
            Some("select") => self
                .selected_index(node)
                .and_then(|i| self.options(node).get(i).copied())
                .map(|option| self.option_value(option))
                .unwrap_or_default(),
            Some("textarea") => data
                .value
                .clone()
                .unwrap_or_else(|| self.text_content(node)),
            Some("option") => self.option_value(node),
            Some("input") => data.value.clone().unwrap_or_else(|| {
                match (
                    data.attributes.get("value"),
                    data.attributes.get("type").map(|t| t.as_str()),
                ) {
                    (Some(value), _) => value.clone(),
                    (None, Some("checkbox" | "radio")) => "on".to_string(),
                    (None, _) => String::new(),
                }
            }),
            _ => data.value.clone().unwrap_or_default(),
        }
    }

    fn set_value(&mut self, node: NodeId, value: &str) -> DomResult<()> {
        if self.tag_name(node).as_deref() == Some("select") {
            self.set_select_value(node, value);
            return Ok(());
        }
        self.element_mut(node)?.value = Some(value.to_string());
        Ok(())
    }

    fn checked(&self, node: NodeId) -> bool {
        self.nodes.get(node.0).map_or(false, |n| {
            n.checked
                .unwrap_or_else(|| n.attributes.contains_key("checked"))
        })
    }

    fn set_checked(&mut self, node: NodeId, checked: bool) -> DomResult<()> {
        self.element_mut(node)?.checked = Some(checked);
        if checked && self.get_attribute(node, "type").as_deref() == Some("radio") {
            self.uncheck_radio_group(node);
        }
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        kind: &str,
        handler: EventHandler,
    ) -> DomResult<ListenerId> {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.node_mut(node)?.listeners.push(Listener {
            id,
            kind: kind.to_string(),
            handler,
        });
        Ok(id)
    }

    fn remove_event_listener(&mut self, node: NodeId, listener: ListenerId) -> DomResult<()> {
        self.node_mut(node)?.listeners.retain(|l| l.id != listener);
        Ok(())
    }

    fn handlers(&self, node: NodeId, kind: &str) -> Vec<EventHandler> {
        self.nodes.get(node.0).map_or_else(Vec::new, |n| {
            n.listeners
                .iter()
                .filter(|l| l.kind == kind)
                .map(|l| l.handler.clone())
                .collect()
        })
    }
}
