//! Conversion rules and the override rule set.
//!
//! A [`Rule`] pairs a [`Filter`] deciding whether it applies to an element
//! with an [`Action`]. Rules are plain data evaluated by linear scan; the
//! first matching rule decides how an element is rendered.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use super::ConvertOptions;
use super::image::resolve_image_url;

/// Predicate over an element.
pub type FilterFn = fn(&ElementRef<'_>, &ConvertOptions) -> bool;

/// Renders an element given its already converted content.
pub type ReplaceFn = fn(&str, &ElementRef<'_>, &ConvertOptions) -> String;

/// Which elements a rule applies to.
#[derive(Clone, Copy)]
pub enum Filter {
    /// Elements with one of these (lowercase) tag names.
    Tags(&'static [&'static str]),
    /// Elements accepted by a predicate.
    Matches(FilterFn),
}

impl Filter {
    pub fn matches(&self, element: &ElementRef<'_>, options: &ConvertOptions) -> bool {
        match self {
            Filter::Tags(tags) => tags.contains(&element.value().name()),
            Filter::Matches(predicate) => predicate(element, options),
        }
    }
}

/// What a rule does with a matching element.
#[derive(Clone, Copy)]
pub enum Action {
    /// Drop the element and everything below it.
    Remove,
    /// Replace the element with the function's output.
    Replace(ReplaceFn),
}

/// A named conversion rule.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub filter: Filter,
    pub action: Action,
}

impl Rule {
    pub const fn replace(name: &'static str, filter: Filter, replacement: ReplaceFn) -> Self {
        Self { name, filter, action: Action::Replace(replacement) }
    }

    pub const fn remove(name: &'static str, filter: Filter) -> Self {
        Self { name, filter, action: Action::Remove }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let action = match self.action {
            Action::Remove => "remove",
            Action::Replace(_) => "replace",
        };
        f.debug_struct("Rule").field("name", &self.name).field("action", &action).finish()
    }
}

/// Tags whose content is never part of an article.
pub const UNWANTED_TAGS: &[&str] = &["script", "style", "noscript", "iframe", "nav", "footer", "aside", "header"];

static HIDDEN_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").expect("hidden style regex should compile")
});

static PUNCTUATION_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\p{P}]+$").expect("punctuation regex should compile"));

/// Rules evaluated ahead of the built-in defaults, in order.
pub fn override_rules() -> Vec<Rule> {
    vec![
        Rule::remove("unwanted", Filter::Matches(is_unwanted)),
        Rule::remove("hidden", Filter::Matches(is_hidden)),
        Rule::remove("emptyLink", Filter::Matches(is_empty_link)),
        Rule::replace("strong", Filter::Tags(&["strong", "b"]), strong),
        Rule::replace("image", Filter::Matches(is_image), image),
        Rule::replace("listItem", Filter::Tags(&["li"]), list_item),
    ]
}

fn is_unwanted(element: &ElementRef<'_>, options: &ConvertOptions) -> bool {
    let name = element.value().name();
    UNWANTED_TAGS.contains(&name) || (name == "img" && !options.include_images)
}

fn is_hidden(element: &ElementRef<'_>, _: &ConvertOptions) -> bool {
    element.value().attr("style").is_some_and(|style| HIDDEN_STYLE.is_match(style))
}

fn is_empty_link(element: &ElementRef<'_>, _: &ConvertOptions) -> bool {
    element.value().name() == "a" && element.text().all(|t| t.trim().is_empty())
}

fn is_image(element: &ElementRef<'_>, options: &ConvertOptions) -> bool {
    options.include_images
        && element.value().name() == "img"
        && element.value().attr("src").is_some_and(|src| !src.trim().is_empty())
}

/// Bold text, unless the content is blank or only punctuation.
pub fn strong(content: &str, _: &ElementRef<'_>, options: &ConvertOptions) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if PUNCTUATION_ONLY.is_match(trimmed) {
        return trimmed.to_string();
    }
    format!("{d}{trimmed}{d}", d = options.strong_delimiter)
}

/// `![alt](src)` with CDN proxy URLs unwrapped.
pub fn image(_: &str, element: &ElementRef<'_>, _: &ConvertOptions) -> String {
    let src = element.value().attr("src").unwrap_or_default().trim();
    let alt = element.value().attr("alt").unwrap_or_default();
    let alt = alt.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("![{}]({})", alt, resolve_image_url(src))
}

/// List item with a numeric or bullet prefix and four-space continuation
/// indent.
pub fn list_item(content: &str, element: &ElementRef<'_>, options: &ConvertOptions) -> String {
    let content = content.trim_start_matches('\n');
    let body = content.trim_end_matches('\n');
    let mut text = body.replace('\n', "\n    ");
    if body.len() < content.len() {
        text.push('\n');
    }

    let parent = element.parent().and_then(ElementRef::wrap);
    let prefix = match parent {
        Some(list) if list.value().name() == "ol" => {
            let start = list.value().attr("start").and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1);
            let index = element
                .prev_siblings()
                .filter_map(ElementRef::wrap)
                .filter(|sibling| sibling.value().name() == "li")
                .count();
            format!("{}. ", start.saturating_add(index as i64))
        }
        _ => format!("{} ", options.bullet_list_marker),
    };

    let has_next = element.next_siblings().any(|sibling| match sibling.value().as_text() {
        Some(text) => !text.trim().is_empty(),
        None => sibling.value().is_element(),
    });

    if has_next && !text.ends_with('\n') {
        text.push('\n');
    }

    format!("{prefix}{text}")
}
