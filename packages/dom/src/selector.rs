//! Minimal selector matching for tree queries.
//!
//! Supports compound selectors built from a tag name, `#id`, `.class`,
//! `[attr]` and `[attr=value]`, joined into lists with commas. Combinators
//! are not supported.

use crate::error::{DomError, DomResult};
use crate::host::{HostTree, NodeId, NodeKind};
use crate::memory::MemoryTree;

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Tag(String),
    Id(String),
    Class(String),
    HasAttribute(String),
    AttributeEquals(String, String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    /// Alternatives; each one is a list of conditions that must all hold
    alternatives: Vec<Vec<Condition>>,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':' || c == '@'
}

impl Selector {
    pub fn parse(source: &str) -> DomResult<Self> {
        let alternatives = source
            .split(',')
            .map(|part| parse_compound(source, part.trim()))
            .collect::<DomResult<Vec<_>>>()?;
        Ok(Self { alternatives })
    }

    pub fn matches(&self, tree: &MemoryTree, node: NodeId) -> bool {
        if !matches!(tree.kind(node), Ok(NodeKind::Element)) {
            return false;
        }
        self.alternatives
            .iter()
            .any(|conditions| conditions.iter().all(|c| condition_matches(c, tree, node)))
    }
}

fn condition_matches(condition: &Condition, tree: &MemoryTree, node: NodeId) -> bool {
    match condition {
        Condition::Tag(tag) => tree.tag_name(node).as_deref() == Some(tag.as_str()),
        Condition::Id(id) => tree.get_attribute(node, "id").as_deref() == Some(id.as_str()),
        Condition::Class(class) => tree.has_class(node, class),
        Condition::HasAttribute(name) => tree.has_attribute(node, name),
        Condition::AttributeEquals(name, value) => {
            tree.get_attribute(node, name).as_deref() == Some(value.as_str())
        }
    }
}

fn parse_compound(selector: &str, part: &str) -> DomResult<Vec<Condition>> {
    if part.is_empty() {
        return Err(DomError::invalid_selector(selector, "empty selector"));
    }

    let mut conditions = Vec::new();
    let mut rest = part;

    while let Some(first) = rest.chars().next() {
        match first {
            '*' => {
                rest = &rest[1..];
            }
            '#' | '.' => {
                let name = take_name(&rest[1..]);
                if name.is_empty() {
                    return Err(DomError::invalid_selector(
                        selector,
                        format!("expected a name after '{}'", first),
                    ));
                }
                conditions.push(if first == '#' {
                    Condition::Id(name.to_string())
                } else {
                    Condition::Class(name.to_string())
                });
                rest = &rest[1 + name.len()..];
            }
            '[' => {
                let end = rest
                    .find(']')
                    .ok_or_else(|| DomError::invalid_selector(selector, "unterminated '['"))?;
                conditions.push(parse_attribute(selector, &rest[1..end])?);
                rest = &rest[end + 1..];
            }
            c if is_name_char(c) => {
                let name = take_name(rest);
                conditions.push(Condition::Tag(name.to_ascii_lowercase()));
                rest = &rest[name.len()..];
            }
            c => {
                return Err(DomError::invalid_selector(
                    selector,
                    format!("unsupported character '{}'", c),
                ));
            }
        }
    }

    Ok(conditions)
}

fn take_name(source: &str) -> &str {
    let len = source
        .char_indices()
        .find(|(_, c)| !is_name_char(*c))
        .map_or(source.len(), |(i, _)| i);
    &source[..len]
}

fn parse_attribute(selector: &str, body: &str) -> DomResult<Condition> {
    match body.split_once('=') {
        None => {
            let name = body.trim();
            if name.is_empty() {
                return Err(DomError::invalid_selector(selector, "empty attribute selector"));
            }
            Ok(Condition::HasAttribute(name.to_ascii_lowercase()))
        }
        Some((name, value)) => {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            Ok(Condition::AttributeEquals(
                name.trim().to_ascii_lowercase(),
                value.to_string(),
            ))
        }
    }
}
