//! Main content location.
//!
//! Picks the subtree of a [`Document`] most likely to hold the article:
//!
//! 1. the site-specific selectors of a matching [`SiteRules`] entry, trusted
//!    as soon as one matches an element with enough text;
//! 2. an ordered list of generic selectors, each accepted only when its text
//!    is at least a fixed share of the whole body's text;
//! 3. the whole `<body>`.
//!
//! The winner is cloned into a [`ContentNode`]; nothing here scores or
//! compares candidates.

use tracing::debug;

use crate::content::ContentNode;
use crate::parse::{Document, Element};
use crate::sites::SiteRules;
use crate::{PagemarkError, Result};

/// Minimum trimmed text length (exclusive) of a content candidate.
pub const MIN_TEXT_LEN: usize = 100;

/// Minimum share of the body text a generic candidate must hold.
pub const MIN_BODY_RATIO: f64 = 0.3;

/// Generic content selectors, semantic landmarks first.
pub const GENERIC_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role=\"main\"]",
    "[itemprop=\"articleBody\"]",
    ".post-content",
    ".article-content",
    ".entry-content",
    ".article-body",
    ".post-body",
    ".story-body",
    ".content",
    "#content",
    ".post",
    ".article",
    "#main",
];

/// Configuration for content location
#[derive(Debug, Clone, PartialEq)]
pub struct LocatorConfig {
    /// Candidates need strictly more trimmed characters than this (default: 100)
    pub min_text_len: usize,
    /// Generic candidates need at least this share of body text (default: 0.3)
    pub min_body_ratio: f64,
    /// Generic selectors, tried in order
    pub generic_selectors: Vec<String>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            min_text_len: MIN_TEXT_LEN,
            min_body_ratio: MIN_BODY_RATIO,
            generic_selectors: GENERIC_SELECTORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Where the located content came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// A site-specific selector matched
    Site(String),
    /// A generic selector matched and passed the ratio check
    Generic(String),
    /// Nothing qualified; the whole body was used
    Body,
}

/// The located content and the rule that picked it
pub struct LocatedContent {
    pub content: ContentNode,
    pub source: ContentSource,
}

/// Locate the main content of a document.
///
/// `site` is the entry matching the document's hostname, if any. Invalid
/// selectors are skipped.
///
/// # Errors
///
/// Returns [`PagemarkError::NoContent`] when no candidate qualifies and the
/// document has no `<body>`.
pub fn locate_content(doc: &Document, site: Option<&SiteRules>, config: &LocatorConfig) -> Result<LocatedContent> {
    if let Some(site) = site {
        for selector in &site.content_selectors {
            if let Some(element) = first_match(doc, selector)
                && element.text_len() > config.min_text_len
            {
                debug!(host = %site.host, selector = %selector, "using site content selector");
                return Ok(located(&element, ContentSource::Site(selector.clone())));
            }
        }
    }

    let body_len = doc.body_text_len();
    let min_len = config.min_body_ratio * body_len as f64;

    for selector in &config.generic_selectors {
        let Some(element) = first_match(doc, selector) else {
            continue;
        };

        let len = element.text_len();
        if len <= config.min_text_len {
            continue;
        }

        if (len as f64) < min_len {
            debug!(selector = %selector, len, body_len, "candidate below body ratio, skipping");
            continue;
        }

        debug!(selector = %selector, len, body_len, "using generic content selector");
        return Ok(located(&element, ContentSource::Generic(selector.clone())));
    }

    let body = doc.body().ok_or(PagemarkError::NoContent)?;
    debug!(body_len, "no candidate qualified, using body");
    Ok(located(&body, ContentSource::Body))
}

fn first_match<'a>(doc: &'a Document, selector: &str) -> Option<Element<'a>> {
    match doc.select_first(selector) {
        Ok(element) => element,
        Err(e) => {
            debug!(error = %e, "skipping content selector");
            None
        }
    }
}

fn located(element: &Element<'_>, source: ContentSource) -> LocatedContent {
    LocatedContent { content: ContentNode::from_element(element), source }
}
