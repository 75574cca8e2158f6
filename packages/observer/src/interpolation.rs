//! Text interpolation: `Hello {{ user.name }}!`

use crate::context::BindingContext;
use crate::error::ObserverResult;
use crate::observer::ComponentObserver;
use filament_dom::{HostTree, NodeId};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Static(String),
    /// Expression source between the delimiters, trimmed
    Dynamic(String),
}

pub fn has_interpolation(text: &str, open: &str, close: &str) -> bool {
    if open.is_empty() || close.is_empty() {
        return false;
    }
    match text.find(open) {
        Some(start) => text[start + open.len()..].contains(close),
        None => false,
    }
}

/// Split `text` into static and dynamic segments. Delimiters without a
/// partner, and empty `{{ }}` pairs, stay in the static text.
pub fn split_segments(text: &str, open: &str, close: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut pending = String::new();
    let mut rest = text;

    if !open.is_empty() && !close.is_empty() {
        while let Some(start) = rest.find(open) {
            let inner_start = start + open.len();
            let Some(length) = rest[inner_start..].find(close) else {
                break;
            };
            let inner = &rest[inner_start..inner_start + length];
            let end = inner_start + length + close.len();

            if inner.trim().is_empty() {
                pending.push_str(&rest[..end]);
            } else {
                pending.push_str(&rest[..start]);
                if !pending.is_empty() {
                    segments.push(Segment::Static(std::mem::take(&mut pending)));
                }
                segments.push(Segment::Dynamic(inner.trim().to_string()));
            }
            rest = &rest[end..];
        }
    }

    pending.push_str(rest);
    if !pending.is_empty() {
        segments.push(Segment::Static(pending));
    }
    segments
}

impl<H: HostTree + 'static> ComponentObserver<H> {
    pub(crate) fn has_interpolation(&self, text: &str) -> bool {
        has_interpolation(
            text,
            &self.config.interpolation_open,
            &self.config.interpolation_close,
        )
    }

    /// Replace `node` with one text node per segment. Dynamic nodes follow
    /// their expression.
    pub(crate) fn interpolate(&self, node: NodeId, context: &Rc<BindingContext>) -> ObserverResult<()> {
        let text = self.host.borrow().text(node).unwrap_or_default();
        let segments = split_segments(
            &text,
            &self.config.interpolation_open,
            &self.config.interpolation_close,
        );
        if !segments.iter().any(|s| matches!(s, Segment::Dynamic(_))) {
            return Ok(());
        }

        let mut replacements = Vec::with_capacity(segments.len());
        for segment in &segments {
            let created = match segment {
                Segment::Static(text) => self.host.borrow_mut().create_text(text),
                Segment::Dynamic(source) => {
                    let compiled = self.compile_fragment(source)?;
                    let initial = self.evaluate(&compiled, context)?.to_string();
                    let created = self.host.borrow_mut().create_text(&initial);
                    self.effect(source, context, move |observer, value| {
                        let text = value.to_string();
                        let mut host = observer.host.borrow_mut();
                        if host.text(created).as_deref() != Some(text.as_str()) {
                            host.set_text(created, &text)?;
                        }
                        Ok(())
                    })?;
                    created
                }
            };
            replacements.push(created);
        }

        let mut host = self.host.borrow_mut();
        let Some(parent) = host.parent(node) else {
            return Ok(());
        };
        let mut replacements = replacements.into_iter();
        if let Some(first) = replacements.next() {
            host.replace(node, first)?;
            let mut last = first;
            for next in replacements {
                let reference = host.next_sibling(last);
                host.insert_before(parent, next, reference)?;
                last = next;
            }
        }
        Ok(())
    }
}
