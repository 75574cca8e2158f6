//! Template markup parser.
//!
//! A forgiving HTML subset: attribute names are lowercased, quoted, unquoted
//! and bare attributes are accepted, void elements never take children,
//! `script`/`style`/`textarea` content is raw text, and elements still open
//! at end of input are closed implicitly. A closing tag that matches no open
//! element is an error.

use crate::error::{DomError, DomResult};
use crate::host::{HostTree, NodeId};
use crate::memory::MemoryTree;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea"];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

struct MarkupParser<'t, 'src> {
    tree: &'t mut MemoryTree,
    source: &'src str,
    pos: usize,
    /// Open elements, innermost last
    open: Vec<(NodeId, String)>,
    root: NodeId,
}

/// Parse `source` and append the resulting nodes to `root`
pub(crate) fn parse_into(tree: &mut MemoryTree, root: NodeId, source: &str) -> DomResult<()> {
    let mut parser = MarkupParser {
        tree,
        source,
        pos: 0,
        open: Vec::new(),
        root,
    };
    parser.parse()
}

impl<'t, 'src> MarkupParser<'t, 'src> {
    fn parse(&mut self) -> DomResult<()> {
        while !self.is_at_end() {
            if self.starts_with("<!--") {
                self.parse_comment()?;
            } else if self.starts_with("</") {
                self.parse_closing_tag()?;
            } else if self.starts_with("<!") {
                // doctype and friends are dropped
                self.skip_past(">")?;
            } else if self.starts_with("<") && self.peek_char(1).map_or(false, |c| c.is_ascii_alphabetic()) {
                self.parse_element()?;
            } else {
                self.parse_text()?;
            }
        }
        Ok(())
    }

    fn current_parent(&self) -> NodeId {
        self.open.last().map(|(id, _)| *id).unwrap_or(self.root)
    }

    fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.rest().chars().nth(offset)
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    fn skip_past(&mut self, needle: &str) -> DomResult<()> {
        match self.rest().find(needle) {
            Some(index) => {
                self.pos += index + needle.len();
                Ok(())
            }
            None => Err(DomError::malformed(self.pos, format!("expected '{}'", needle))),
        }
    }

    /// Consume characters while `pred` holds
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'src str {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !pred(*c))
            .map_or(rest.len(), |(i, _)| i);
        self.pos += len;
        &rest[..len]
    }

    fn append(&mut self, node: NodeId) -> DomResult<()> {
        let parent = self.current_parent();
        self.tree.append_child(parent, node)
    }

    fn parse_comment(&mut self) -> DomResult<()> {
        let start = self.pos;
        self.pos += "<!--".len();
        let body = match self.rest().find("-->") {
            Some(index) => {
                let body = &self.rest()[..index];
                self.pos += index + "-->".len();
                body
            }
            None => return Err(DomError::malformed(start, "unterminated comment")),
        };
        let comment = self.tree.create_comment(body);
        self.append(comment)
    }

    fn parse_text(&mut self) -> DomResult<()> {
        let start = self.pos;
        // a lone '<' that does not open a tag is text
        if self.starts_with("<") {
            self.pos += 1;
        }
        self.take_while(|c| c != '<');
        let text = decode_entities(&self.source[start..self.pos]);
        let node = self.tree.create_text(&text);
        self.append(node)
    }

    fn parse_closing_tag(&mut self) -> DomResult<()> {
        let start = self.pos;
        self.pos += "</".len();
        let tag = self
            .take_while(|c| !c.is_whitespace() && c != '>')
            .to_ascii_lowercase();
        self.skip_past(">")
            .map_err(|_| DomError::malformed(start, format!("unterminated closing tag </{}", tag)))?;

        match self.open.iter().rposition(|(_, open)| *open == tag) {
            Some(index) => {
                // implicitly close anything opened inside it
                self.open.truncate(index);
                Ok(())
            }
            None => Err(DomError::UnexpectedClosingTag { tag, pos: start }),
        }
    }

    fn parse_element(&mut self) -> DomResult<()> {
        let start = self.pos;
        self.pos += 1;
        let tag = self
            .take_while(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
            .to_ascii_lowercase();
        let element = self.tree.create_element(&tag);

        let self_closing = loop {
            self.skip_whitespace();
            if self.is_at_end() {
                return Err(DomError::malformed(start, format!("unterminated tag <{}", tag)));
            }
            if self.starts_with("/>") {
                self.pos += 2;
                break true;
            }
            if self.starts_with(">") {
                self.pos += 1;
                break false;
            }
            if self.starts_with("/") {
                self.pos += 1;
                continue;
            }
            self.parse_attribute(element)?;
        };

        self.append(element)?;

        if self_closing || is_void_element(&tag) {
            return Ok(());
        }

        if is_raw_text_element(&tag) {
            return self.parse_raw_text(element, &tag);
        }

        self.open.push((element, tag));
        Ok(())
    }

    fn parse_attribute(&mut self, element: NodeId) -> DomResult<()> {
        let name = self
            .take_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/')
            .to_ascii_lowercase();
        if name.is_empty() {
            return Err(DomError::malformed(self.pos, "expected attribute name"));
        }

        self.skip_whitespace();
        let value = if self.starts_with("=") {
            self.pos += 1;
            self.skip_whitespace();
            match self.peek_char(0) {
                Some(quote @ ('"' | '\'')) => {
                    let value_start = self.pos;
                    self.pos += 1;
                    let raw = self.take_while(|c| c != quote);
                    if self.is_at_end() {
                        return Err(DomError::malformed(value_start, "unterminated attribute value"));
                    }
                    self.pos += 1;
                    decode_entities(raw)
                }
                _ => decode_entities(self.take_while(|c| !c.is_whitespace() && c != '>')),
            }
        } else {
            String::new()
        };

        // first occurrence wins, like the HTML tokenizer
        if !self.tree.has_attribute(element, &name) {
            self.tree.set_attribute(element, &name, &value)?;
        }
        Ok(())
    }

    fn parse_raw_text(&mut self, element: NodeId, tag: &str) -> DomResult<()> {
        let close = format!("</{}", tag);
        let rest = self.rest();
        let end = rest
            .to_ascii_lowercase()
            .find(&close)
            .unwrap_or(rest.len());
        let raw = &rest[..end];
        self.pos += end;

        if !raw.is_empty() {
            let text = if tag == "textarea" {
                decode_entities(raw)
            } else {
                raw.to_string()
            };
            let node = self.tree.create_text(&text);
            self.tree.append_child(element, node)?;
        }

        if !self.is_at_end() {
            self.skip_past(">")?;
        }
        Ok(())
    }
}

/// Decode character references (`&amp;`, `&#39;`, `&#x41;`)
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(index) = rest.find('&') {
        out.push_str(&rest[..index]);
        rest = &rest[index..];

        let decoded = rest.find(';').filter(|end| *end <= 10).and_then(|end| {
            let entity = &rest[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse::<u32>().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|ch| (ch, end))
        });

        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(markup: &str) -> (MemoryTree, NodeId) {
        MemoryTree::from_markup(markup).expect("markup should parse")
    }

    #[test]
    fn test_attributes_are_lowercased_and_kept_in_order() {
        let (tree, root) = parse(r#"<button @Click="go()" :class='{a: b}' disabled data-x=1>Go</button>"#);
        let button = tree.children(root)[0];
        assert_eq!(
            tree.attribute_names(button),
            vec!["@click", ":class", "disabled", "data-x"]
        );
        assert_eq!(tree.get_attribute(button, ":class").as_deref(), Some("{a: b}"));
        assert_eq!(tree.get_attribute(button, "disabled").as_deref(), Some(""));
        assert_eq!(tree.get_attribute(button, "data-x").as_deref(), Some("1"));
    }

    #[test]
    fn test_void_and_self_closing_elements() {
        let (tree, root) = parse("<p>a<br>b<img src=x.png/><span/>c</p>");
        let p = tree.children(root)[0];
        let tags: Vec<_> = tree
            .children(p)
            .into_iter()
            .map(|id| tree.tag_name(id).unwrap_or_else(|| "#text".to_string()))
            .collect();
        assert_eq!(tags, vec!["#text", "br", "#text", "img", "span", "#text"]);
    }

    #[test]
    fn test_comments_and_entities() {
        let (tree, root) = parse("<!-- note --><p>a &amp; b &lt;c&gt; &#39;d&#x27; &bogus;</p>");
        let children = tree.children(root);
        assert_eq!(tree.text(children[0]).as_deref(), Some(" note "));
        assert_eq!(tree.text_content(children[1]), "a & b <c> 'd' &bogus;");
    }

    #[test]
    fn test_raw_text_elements() {
        let (tree, root) = parse("<textarea>{{ note }} &amp; <b>x</b></textarea><style>a > b {}</style>");
        let children = tree.children(root);
        assert_eq!(tree.text_content(children[0]), "{{ note }} & <b>x</b>");
        assert_eq!(tree.text_content(children[1]), "a > b {}");
    }

    #[test]
    fn test_unclosed_elements_close_at_end() {
        let (tree, root) = parse("<ul><li>one<li>two");
        let ul = tree.children(root)[0];
        assert_eq!(tree.text_content(ul), "onetwo");
    }

    #[test]
    fn test_closing_tag_closes_inner_elements() {
        let (tree, root) = parse("<div><span>x</div><p>y</p>");
        assert_eq!(tree.children(root).len(), 2);
    }

    #[test]
    fn test_stray_closing_tag_is_an_error() {
        let err = MemoryTree::from_markup("<div></span></div>").unwrap_err();
        assert!(matches!(err, DomError::UnexpectedClosingTag { ref tag, pos: 5 } if tag == "span"));
    }

    #[test]
    fn test_unterminated_tag_is_an_error() {
        assert!(matches!(
            MemoryTree::from_markup("<div class=\"a"),
            Err(DomError::MalformedMarkup { .. })
        ));
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        let (tree, root) = parse("<p>1 < 2</p>");
        assert_eq!(tree.text_content(root), "1 < 2");
    }
}
