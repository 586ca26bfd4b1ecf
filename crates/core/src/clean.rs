//! Content cleaning.
//!
//! Removes known non-content fragments from a located [`ContentNode`]. Site
//! removals only run when the page's host matches the entry; the generic
//! set is limited to navigation landmarks. Text nodes are never removed on
//! their own, only the elements holding them.

use tracing::debug;

use crate::content::ContentNode;
use crate::sites::SiteRules;

/// Removal selectors applied to every page.
pub const GENERIC_REMOVALS: &[&str] = &["nav", "[role=\"navigation\"]"];

/// Remove site-specific and generic non-content elements in place.
///
/// Invalid selectors are skipped. Returns the number of elements removed.
pub fn clean_content(content: &mut ContentNode, site: Option<&SiteRules>) -> usize {
    let site_selectors = site.map(|s| s.remove_selectors.as_slice()).unwrap_or_default();
    let generic = GENERIC_REMOVALS.iter().copied();

    let mut removed = 0;
    for selector in site_selectors.iter().map(String::as_str).chain(generic) {
        match content.remove_matching(selector) {
            Ok(0) => {}
            Ok(count) => {
                debug!(selector, count, "removed elements");
                removed += count;
            }
            Err(e) => debug!(error = %e, "skipping removal selector"),
        }
    }
    removed
}
