//! Whitespace collapsing ahead of conversion.
//!
//! Browsers render runs of whitespace as one space and drop whitespace at
//! block boundaries. This walks the fragment once in document order and
//! records, for each text node, the text as it would be rendered. The tree
//! itself is left untouched; text below `<pre>` is not visited.

use std::collections::HashMap;

use ego_tree::{NodeId, NodeRef};
use scraper::Node;

use super::{is_block, is_void};

/// Collapsed text per text node id. Text nodes that collapse to nothing map
/// to an empty string.
pub(crate) type CollapsedText = HashMap<NodeId, String>;

pub(crate) fn collapse_whitespace(root: NodeRef<'_, Node>) -> CollapsedText {
    let mut collapser = Collapser::default();
    if !is_pre(root) {
        collapser.walk(root);
        collapser.trim_prev_text();
    }
    collapser.texts
}

#[derive(Default)]
struct Collapser {
    texts: CollapsedText,
    prev_text: Option<NodeId>,
    keep_leading_ws: bool,
}

impl Collapser {
    fn walk(&mut self, node: NodeRef<'_, Node>) {
        for child in node.children() {
            match child.value() {
                Node::Text(text) => self.visit_text(child.id(), &text.text),
                Node::Element(element) => {
                    let name = element.name();
                    self.visit_element(name);
                    if !is_pre(child) && child.has_children() {
                        self.walk(child);
                        self.visit_element(name);
                    }
                }
                _ => {}
            }
        }
    }

    fn visit_text(&mut self, id: NodeId, raw: &str) {
        let mut text = squash(raw);

        let prev_ends_with_space = self
            .prev_text
            .and_then(|prev| self.texts.get(&prev))
            .is_none_or(|prev| prev.ends_with(' '));

        if prev_ends_with_space && !self.keep_leading_ws && text.starts_with(' ') {
            text.remove(0);
        }

        if text.is_empty() {
            self.texts.insert(id, text);
            return;
        }

        self.texts.insert(id, text);
        self.prev_text = Some(id);
    }

    fn visit_element(&mut self, name: &str) {
        if is_block(name) || name == "br" {
            self.trim_prev_text();
            self.prev_text = None;
            self.keep_leading_ws = false;
        } else if is_void(name) {
            self.prev_text = None;
            self.keep_leading_ws = true;
        } else if self.prev_text.is_some() {
            self.keep_leading_ws = false;
        }
    }

    fn trim_prev_text(&mut self) {
        if let Some(prev) = self.prev_text
            && let Some(text) = self.texts.get_mut(&prev)
            && text.ends_with(' ')
        {
            text.pop();
        }
    }
}

fn is_pre(node: NodeRef<'_, Node>) -> bool {
    matches!(node.value(), Node::Element(el) if el.name() == "pre")
}

/// Replace each run of ASCII whitespace with a single space.
fn squash(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_space = false;
    for c in raw.chars() {
        if matches!(c, ' ' | '\t' | '\r' | '\n') {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}
