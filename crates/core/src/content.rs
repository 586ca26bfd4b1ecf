//! Detached, owned content subtrees.
//!
//! A [`ContentNode`] is a private copy of one element of a [`Document`]:
//! the element's markup is serialized and re-parsed into a standalone
//! fragment, so the cleaning and normalizing stages can mutate it freely
//! without any path back to the page it came from.
//!
//! ```rust
//! use pagemark_core::{ContentNode, Document};
//!
//! let doc = Document::parse("<article><p>Keep</p><nav>Drop</nav></article>").unwrap();
//! let article = doc.select_first("article").unwrap().unwrap();
//!
//! let mut content = ContentNode::from_element(&article);
//! content.remove_matching("nav").unwrap();
//!
//! assert_eq!(content.text(), "Keep");
//! assert_eq!(doc.select("nav").unwrap().len(), 1);
//! ```

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Node, Selector};

use crate::Result;
use crate::parse::{Element, parse_selector};

/// An exclusively owned copy of a DOM subtree.
///
/// The fragment root is a synthetic `<html>` element; the copied element (or
/// its children, for `<body>`) hangs below it.
pub struct ContentNode {
    html: Html,
}

impl ContentNode {
    /// Clones an element of a document into a detached fragment.
    pub fn from_element(element: &Element<'_>) -> Self {
        Self::from_html(&element.outer_html())
    }

    /// Parses a markup fragment into a detached fragment.
    pub fn from_html(fragment: &str) -> Self {
        Self { html: Html::parse_fragment(fragment) }
    }

    /// Gets the fragment root element.
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// Serializes the fragment contents.
    pub fn inner_html(&self) -> String {
        self.root().inner_html()
    }

    /// Gets the concatenated text of the fragment.
    pub fn text(&self) -> String {
        self.root().text().collect()
    }

    /// Gets the character count of the trimmed fragment text.
    pub fn text_len(&self) -> usize {
        self.text().trim().chars().count()
    }

    /// Collects the ids of all elements below the root matching `selector`,
    /// in document order.
    pub fn select_ids(&self, selector: &Selector) -> Vec<NodeId> {
        let root_id = self.root().id();
        self.html.select(selector).map(|el| el.id()).filter(|id| *id != root_id).collect()
    }

    /// Gets an element by id, if it is still an element of this fragment.
    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    /// Removes every element matching a CSS selector.
    ///
    /// Returns how many elements were detached. Elements nested in an
    /// already detached match are counted once with their ancestor.
    ///
    /// # Errors
    ///
    /// Returns [`PagemarkError::HtmlParseError`](crate::PagemarkError::HtmlParseError)
    /// if the selector is invalid.
    pub fn remove_matching(&mut self, selector: &str) -> Result<usize> {
        let selector = parse_selector(selector)?;
        let ids = self.select_ids(&selector);
        let mut removed = 0;
        for id in ids {
            if self.is_attached(id) {
                self.remove(id);
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Detaches a node and its subtree.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    /// Replaces an element with its children.
    pub fn unwrap(&mut self, id: NodeId) {
        let children: Vec<NodeId> = match self.html.tree.get(id) {
            Some(node) => node.children().map(|c| c.id()).collect(),
            None => return,
        };

        if let Some(mut node) = self.html.tree.get_mut(id) {
            for child in children {
                node.insert_id_before(child);
            }
            node.detach();
        }
    }

    /// Trims leading whitespace of a text node in place.
    pub fn trim_text_start(&mut self, id: NodeId) {
        self.edit_text(id, |text| text.trim_start().to_string());
    }

    /// Trims trailing whitespace of a text node in place.
    pub fn trim_text_end(&mut self, id: NodeId) {
        self.edit_text(id, |text| text.trim_end().to_string());
    }

    fn edit_text(&mut self, id: NodeId, edit: impl FnOnce(&str) -> String) {
        if let Some(mut node) = self.html.tree.get_mut(id)
            && let Node::Text(text) = node.value()
        {
            let edited = edit(&text.text);
            text.text = edited.as_str().into();
        }
    }

    /// Whether a node is still reachable from the fragment root.
    fn is_attached(&self, id: NodeId) -> bool {
        let root_id = self.root().id();
        match self.html.tree.get(id) {
            Some(node) => node.ancestors().any(|a| a.id() == root_id),
            None => false,
        }
    }
}
