//! Text-level repairs of converted Markdown.
//!
//! Conversion leaves a few systematic artifacts behind: bold markers with
//! nothing between them, sentences glued together when inline markup was
//! flattened, concatenated button labels, empty links and stacked thematic
//! breaks. Each repair is a named [`Step`]; [`postprocess_markdown`] applies
//! [`STEPS`] in order and repeats the sequence until the text stops changing.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::trace;

/// One named text repair
#[derive(Clone, Copy)]
pub struct Step {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// Repairs in application order
pub const STEPS: [Step; 7] = [
    Step { name: "emphasis-artifacts", apply: collapse_emphasis_artifacts },
    Step { name: "bold-heading-break", apply: break_before_bold_heading },
    Step { name: "sentence-break", apply: break_glued_sentences },
    Step { name: "ui-text", apply: remove_ui_text },
    Step { name: "empty-links", apply: remove_empty_links },
    Step { name: "thematic-breaks", apply: collapse_thematic_breaks },
    Step { name: "whitespace", apply: normalize_whitespace },
];

/// Concatenated button labels removed verbatim
pub const UI_TEXT_PATTERNS: &[&str] = &["SubscribeSign in", "Sign inSubscribe"];

static EMPTY_BOLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(^|[^*\w])\*\*[ \t]*\*\*([^*\w]|$)").expect("empty bold regex should compile")
});
static QUAD_ASTERISK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*{4}").expect("quad asterisk regex should compile"));
static LONE_BOLD_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\*\*[ \t]*$\n?").expect("lone bold regex should compile"));
static BOLD_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?])[ \t]*(\*\*[A-Z])").expect("bold heading regex should compile"));
static GLUED_SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.([A-Z])").expect("glued sentence regex should compile"));
static EMPTY_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^!])\[\]\([^)]*\)").expect("empty link regex should compile"));
static REPEATED_BREAKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:---[ \t]*\n(?:[ \t]*\n)*)+---[ \t]*$").expect("thematic break regex should compile")
});
static TRAILING_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").expect("trailing space regex should compile"));
static EXTRA_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("newline regex should compile"));

/// Apply every repair step until the text is stable.
pub fn postprocess_markdown(markdown: &str) -> String {
    // Steps 2 and 3 only insert breaks where they consume their own pattern
    // and every other step deletes text, so this reaches a fixpoint.
    let mut text = markdown.to_string();
    loop {
        let next = STEPS.iter().fold(text.clone(), |acc, step| {
            let repaired = (step.apply)(&acc);
            if repaired != acc {
                trace!(step = step.name, "applied repair");
            }
            repaired
        });
        if next == text {
            return text;
        }
        text = next;
    }
}

/// Drop empty bold pairs, turn `****` between bold runs into a space and
/// delete lines holding only a bold marker.
pub fn collapse_emphasis_artifacts(text: &str) -> String {
    let text = EMPTY_BOLD.replace_all(text, "$1$2");
    let text = QUAD_ASTERISK.replace_all(&text, " ");
    LONE_BOLD_LINE.replace_all(&text, "").into_owned()
}

/// Start a new paragraph when a sentence ends right before a bold run
/// starting with a capital letter.
pub fn break_before_bold_heading(text: &str) -> String {
    BOLD_HEADING.replace_all(text, "$1\n\n$2").into_owned()
}

/// Split `end.Start` into two paragraphs, except inside URLs, paths and
/// e-mail addresses.
pub fn break_glued_sentences(text: &str) -> String {
    GLUED_SENTENCE
        .replace_all(text, |caps: &Captures<'_>| {
            let (Some(whole), Some(start)) = (caps.get(0), caps.get(1)) else {
                return String::new();
            };

            if in_address_token(text, whole.start(), whole.end()) {
                whole.as_str().to_string()
            } else {
                format!(".\n\n{}", start.as_str())
            }
        })
        .into_owned()
}

fn in_address_token(text: &str, start: usize, end: usize) -> bool {
    let token_start = text[..start].rfind(char::is_whitespace).map(|i| i + 1).unwrap_or(0);
    let token_end = text[end..].find(char::is_whitespace).map(|i| end + i).unwrap_or(text.len());
    text[token_start..token_end].contains(['/', ':', '@'])
}

/// Remove known concatenated button labels.
pub fn remove_ui_text(text: &str) -> String {
    UI_TEXT_PATTERNS.iter().fold(text.to_string(), |acc, pattern| acc.replace(pattern, ""))
}

/// Remove `[]()` links, including links left empty by removing an inner
/// one; images (`![]()`) are kept.
pub fn remove_empty_links(text: &str) -> String {
    let mut text = text.to_string();
    while EMPTY_LINK.is_match(&text) {
        text = EMPTY_LINK.replace_all(&text, "$1").into_owned();
    }
    text
}

/// Collapse consecutive `---` lines (blank lines between them included)
/// into one.
pub fn collapse_thematic_breaks(text: &str) -> String {
    REPEATED_BREAKS.replace_all(text, "---").into_owned()
}

/// Strip trailing spaces, collapse blank line runs and trim the document.
pub fn normalize_whitespace(text: &str) -> String {
    let text = TRAILING_SPACE.replace_all(text, "");
    let text = EXTRA_NEWLINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}
