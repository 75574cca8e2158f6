use crate::host::{HostTree, NodeId, NodeKind};
use crate::markup::{is_raw_text_element, is_void_element};
use crate::memory::MemoryTree;

/// Serialize `node` and its subtree. Fragments serialize as their children.
pub fn to_html(tree: &MemoryTree, node: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, node, false, &mut out);
    out
}

/// Serialize the children of `node`
pub fn inner_html(tree: &MemoryTree, node: NodeId) -> String {
    let raw = tree
        .tag_name(node)
        .map_or(false, |tag| is_raw_text_element(&tag) && tag != "textarea");
    let mut out = String::new();
    for child in tree.children(node) {
        write_node(tree, child, raw, &mut out);
    }
    out
}

fn write_node(tree: &MemoryTree, node: NodeId, raw_text: bool, out: &mut String) {
    match tree.kind(node) {
        Ok(NodeKind::Text) => {
            let text = tree.text(node).unwrap_or_default();
            if raw_text {
                out.push_str(&text);
            } else {
                out.push_str(&escape_text(&text));
            }
        }
        Ok(NodeKind::Comment) => {
            out.push_str("<!--");
            out.push_str(&tree.text(node).unwrap_or_default());
            out.push_str("-->");
        }
        Ok(NodeKind::Fragment) => {
            for child in tree.children(node) {
                write_node(tree, child, false, out);
            }
        }
        Ok(NodeKind::Element) => {
            let tag = tree.tag_name(node).unwrap_or_default();
            out.push('<');
            out.push_str(&tag);
            for name in tree.attribute_names(node) {
                let value = tree.get_attribute(node, &name).unwrap_or_default();
                out.push(' ');
                out.push_str(&name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(&value));
                    out.push('"');
                }
            }
            out.push('>');

            if is_void_element(&tag) {
                return;
            }

            out.push_str(&inner_html(tree, node));
            out.push_str("</");
            out.push_str(&tag);
            out.push('>');
        }
        Err(_) => {}
    }
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
