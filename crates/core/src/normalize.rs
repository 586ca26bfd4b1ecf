//! Bold-emphasis repair.
//!
//! Bold runs that wrap nothing, wrap block content, or start and end with
//! whitespace turn into stray or broken `**` markers once converted. This
//! pass rewrites `<strong>`/`<b>` elements of a [`ContentNode`] so every
//! surviving one holds trimmed inline text.

use scraper::{ElementRef, Node, Selector};
use tracing::debug;

use crate::content::ContentNode;

/// Descendants that make a bold element unsafe to keep.
const BLOCK_TAGS: &[&str] = &["p", "ul", "ol", "li", "h1", "h2", "h3", "h4", "h5", "h6", "br", "div"];

/// Normalize bold elements of a content fragment in place.
///
/// In document order, each bold element is unwrapped when its text is blank
/// or it contains block content; otherwise its first and last text children
/// are trimmed, and it is unwrapped if that leaves it empty.
pub fn normalize_emphasis(content: &mut ContentNode) {
    let Ok(selector) = Selector::parse("strong, b") else {
        return;
    };

    let mut unwrapped = 0;
    for id in content.select_ids(&selector) {
        let Some(element) = content.element(id) else {
            continue;
        };

        if is_blank(&element) || has_block_descendant(&element) {
            content.unwrap(id);
            unwrapped += 1;
            continue;
        }

        let first_text = element.first_child().filter(|c| c.value().is_text()).map(|c| c.id());
        let last_text = element.last_child().filter(|c| c.value().is_text()).map(|c| c.id());

        if let Some(text_id) = first_text {
            content.trim_text_start(text_id);
        }
        if let Some(text_id) = last_text {
            content.trim_text_end(text_id);
        }

        if content.element(id).is_some_and(|el| is_blank(&el)) {
            content.unwrap(id);
            unwrapped += 1;
        }
    }

    debug!(unwrapped, "normalized bold elements");
}

/// Normalize bold elements of a markup fragment.
///
/// The fragment is parsed standalone; the returned markup is the repaired
/// fragment.
pub fn normalize_html(fragment: &str) -> String {
    let mut content = ContentNode::from_html(fragment);
    normalize_emphasis(&mut content);
    content.inner_html()
}

fn is_blank(element: &ElementRef<'_>) -> bool {
    element.text().all(|t| t.trim().is_empty())
}

fn has_block_descendant(element: &ElementRef<'_>) -> bool {
    element.descendants().skip(1).any(|node| match node.value() {
        Node::Element(el) => BLOCK_TAGS.contains(&el.name()),
        _ => false,
    })
}
