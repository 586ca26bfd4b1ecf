//! Rule-driven HTML to Markdown conversion.
//!
//! The [`Converter`] walks a [`ContentNode`] bottom-up. For every element it
//! picks the first [`Rule`] whose filter matches, converts the element's
//! children, and hands the result to the rule's replacement function. The
//! rule table holds the override rules first, then the CommonMark defaults;
//! elements no rule claims are padded with blank lines when they are blocks
//! and passed through otherwise.
//!
//! # Example
//!
//! ```rust
//! use pagemark_core::{ConvertOptions, Converter};
//!
//! let converter = Converter::new(ConvertOptions::default());
//! let markdown = converter.convert_html("<h2>Intro</h2><p>Hello <b> world </b>!</p>");
//! assert_eq!(markdown, "## Intro\n\nHello **world** !");
//! ```

mod defaults;
mod image;
mod rules;
mod whitespace;

pub use image::resolve_image_url;
pub use rules::{Action, Filter, FilterFn, ReplaceFn, Rule, UNWANTED_TAGS};

use std::sync::LazyLock;

use ego_tree::NodeRef;
use regex::Regex;
use scraper::{ElementRef, Node};
use tracing::trace;

use crate::content::ContentNode;
use whitespace::{CollapsedText, collapse_whitespace};

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "audio", "blockquote", "body", "canvas", "center", "dd", "dir", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "frameset", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hgroup", "hr", "html", "li", "main", "menu", "nav", "noframes", "ol", "output", "p", "pre", "section", "table",
    "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link", "meta", "param", "source",
    "track", "wbr",
];

const MEANINGFUL_WHEN_BLANK: &[&str] =
    &["a", "table", "thead", "tbody", "tfoot", "th", "td", "iframe", "script", "audio", "video"];

pub(crate) fn is_block(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name)
}

pub(crate) fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Converter base configuration.
///
/// Headings are always ATX and links always inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Render `<img>` elements (default: true)
    pub include_images: bool,
    /// Thematic break (default: `---`)
    pub hr: String,
    /// Bullet list marker (default: `-`)
    pub bullet_list_marker: String,
    /// Code block fence (default: three backticks)
    pub fence: String,
    /// Emphasis delimiter (default: `*`)
    pub em_delimiter: String,
    /// Strong delimiter (default: `**`)
    pub strong_delimiter: String,
    /// Hard line break marker placed before the newline (default: two spaces)
    pub br: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            include_images: true,
            hr: "---".to_string(),
            bullet_list_marker: "-".to_string(),
            fence: "```".to_string(),
            em_delimiter: "*".to_string(),
            strong_delimiter: "**".to_string(),
            br: "  ".to_string(),
        }
    }
}

/// HTML to Markdown converter with an ordered rule table.
#[derive(Debug, Clone)]
pub struct Converter {
    options: ConvertOptions,
    rules: Vec<Rule>,
}

impl Converter {
    /// Create a converter with the override and default rules.
    pub fn new(options: ConvertOptions) -> Self {
        let mut rules = rules::override_rules();
        rules.extend(defaults::default_rules());
        Self { options, rules }
    }

    /// Add a rule ahead of every existing rule.
    ///
    /// Rules added later take precedence over rules added earlier.
    ///
    /// ```rust
    /// use pagemark_core::{ConvertOptions, Converter, Filter, Rule};
    ///
    /// let converter = Converter::new(ConvertOptions::default())
    ///     .with_rule(Rule::replace("mark", Filter::Tags(&["mark"]), |content, _, _| format!("=={content}==")));
    ///
    /// assert_eq!(converter.convert_html("<p><mark>hi</mark></p>"), "==hi==");
    /// ```
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Convert a content fragment to Markdown.
    pub fn convert(&self, content: &ContentNode) -> String {
        let root = content.root();
        let pass = Pass { converter: self, texts: collapse_whitespace(*root) };
        let output = pass.process(root);
        output.trim_start_matches(['\t', '\r', '\n']).trim_end().to_string()
    }

    /// Convert a markup fragment to Markdown.
    pub fn convert_html(&self, fragment: &str) -> String {
        self.convert(&ContentNode::from_html(fragment))
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

enum Resolved {
    Blank,
    Remove,
    Replace(ReplaceFn),
    Default,
}

/// State for one conversion of one fragment.
struct Pass<'c> {
    converter: &'c Converter,
    texts: CollapsedText,
}

impl Pass<'_> {
    fn process(&self, node: ElementRef<'_>) -> String {
        let mut output = String::new();
        for child in node.children() {
            let replacement = match child.value() {
                Node::Text(text) => {
                    let collapsed = self.texts.get(&child.id()).map(String::as_str).unwrap_or(&text.text);
                    if in_code(child) { collapsed.to_string() } else { escape(collapsed) }
                }
                Node::Element(_) => ElementRef::wrap(child).map(|el| self.replacement_for(el)).unwrap_or_default(),
                _ => String::new(),
            };
            output = join(&output, &replacement);
        }
        output
    }

    fn replacement_for(&self, element: ElementRef<'_>) -> String {
        let options = &self.converter.options;
        let replace: ReplaceFn = match self.resolve(element) {
            Resolved::Remove => return String::new(),
            Resolved::Blank => blank_replacement,
            Resolved::Replace(replace) => replace,
            Resolved::Default => default_replacement,
        };

        let mut content = self.process(element);
        let (leading, trailing) = self.flanking_whitespace(element);
        if !leading.is_empty() || !trailing.is_empty() {
            content = content.trim().to_string();
        }

        format!("{leading}{}{trailing}", replace(&content, &element, options))
    }

    fn resolve(&self, element: ElementRef<'_>) -> Resolved {
        if is_blank(element) {
            return Resolved::Blank;
        }

        let options = &self.converter.options;
        match self.converter.rules.iter().find(|rule| rule.filter.matches(&element, options)) {
            Some(rule) => {
                trace!(rule = rule.name, tag = element.value().name(), "rule matched");
                match rule.action {
                    Action::Remove => Resolved::Remove,
                    Action::Replace(replace) => Resolved::Replace(replace),
                }
            }
            None => Resolved::Default,
        }
    }

    fn collapsed_text(&self, node: NodeRef<'_, Node>) -> String {
        node.descendants()
            .filter_map(|n| match n.value() {
                Node::Text(text) => Some(self.texts.get(&n.id()).map(String::as_str).unwrap_or(&text.text).to_string()),
                _ => None,
            })
            .collect()
    }

    /// Whitespace at the edges of an inline element, moved outside of its
    /// rendered form. ASCII whitespace already present on the neighbouring
    /// side is not repeated.
    fn flanking_whitespace(&self, element: ElementRef<'_>) -> (String, String) {
        if is_block(element.value().name()) {
            return (String::new(), String::new());
        }

        let text = self.collapsed_text(*element);
        let body = text.trim_start();
        let mut leading = text[..text.len() - body.len()].to_string();
        let mut trailing = if body.is_empty() { String::new() } else { body[body.trim_end().len()..].to_string() };

        if !leading.is_empty() && self.neighbour_text(element.prev_siblings()).is_some_and(|t| t.ends_with(' ')) {
            leading = leading.trim_start_matches(is_ascii_ws).to_string();
        }
        if !trailing.is_empty() && self.neighbour_text(element.next_siblings()).is_some_and(|t| t.starts_with(' ')) {
            trailing = trailing.trim_end_matches(is_ascii_ws).to_string();
        }

        (leading, trailing)
    }

    /// Collapsed text of the nearest non-empty sibling, if that sibling is
    /// text or an inline element.
    fn neighbour_text<'a>(&self, mut siblings: impl Iterator<Item = NodeRef<'a, Node>>) -> Option<String> {
        siblings.find_map(|sibling| match sibling.value() {
            Node::Text(_) => Some(self.collapsed_text(sibling)).filter(|t| !t.is_empty()),
            Node::Element(el) if is_block(el.name()) => Some(String::new()),
            Node::Element(_) => Some(self.collapsed_text(sibling)),
            _ => None,
        })
    }
}

fn is_ascii_ws(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn blank_replacement(_: &str, element: &ElementRef<'_>, _: &ConvertOptions) -> String {
    if is_block(element.value().name()) { "\n\n".to_string() } else { String::new() }
}

fn default_replacement(content: &str, element: &ElementRef<'_>, _: &ConvertOptions) -> String {
    if is_block(element.value().name()) { format!("\n\n{content}\n\n") } else { content.to_string() }
}

/// An element renders as nothing when it has no text and holds nothing that
/// is meaningful without text.
fn is_blank(element: ElementRef<'_>) -> bool {
    let name = element.value().name();
    if is_void(name) || MEANINGFUL_WHEN_BLANK.contains(&name) {
        return false;
    }
    if !element.text().all(|t| t.trim().is_empty()) {
        return false;
    }
    !element.descendants().skip(1).any(|node| match node.value() {
        Node::Element(el) => is_void(el.name()) || MEANINGFUL_WHEN_BLANK.contains(&el.name()),
        _ => false,
    })
}

fn in_code(node: NodeRef<'_, Node>) -> bool {
    node.ancestors().any(|a| matches!(a.value(), Node::Element(el) if el.name() == "code"))
}

/// Join two converted fragments, keeping at most two newlines between them.
fn join(output: &str, replacement: &str) -> String {
    let left = output.trim_end_matches('\n');
    let right = replacement.trim_start_matches('\n');
    let newlines = (output.len() - left.len()).max(replacement.len() - right.len()).min(2);
    format!("{left}{}{right}", &"\n\n"[..newlines])
}

static ESCAPES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\\", r"\\"),
        (r"\*", r"\*"),
        (r"^-", r"\-"),
        (r"^\+ ", r"\+ "),
        (r"^(=+)", r"\${1}"),
        (r"^(#{1,6}) ", r"\${1} "),
        (r"`", r"\`"),
        (r"^~~~", r"\~~~"),
        (r"\[", r"\["),
        (r"\]", r"\]"),
        (r"^>", r"\>"),
        (r"_", r"\_"),
        (r"^(\d+)\. ", r"${1}\. "),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("escape regex should compile"), replacement))
    .collect()
});

/// Escape Markdown syntax in a text node.
fn escape(text: &str) -> String {
    ESCAPES
        .iter()
        .fold(text.to_string(), |acc, (pattern, replacement)| pattern.replace_all(&acc, *replacement).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(html: &str) -> String {
        Converter::default().convert_html(html)
    }

    fn convert_without_images(html: &str) -> String {
        Converter::new(ConvertOptions { include_images: false, ..ConvertOptions::default() }).convert_html(html)
    }

    #[test]
    fn test_join() {
        assert_eq!(join("a\n\n\n", "\nb"), "a\n\nb");
        assert_eq!(join("a", "\nb"), "a\nb");
        assert_eq!(join("a", "b"), "ab");
        assert_eq!(join("", "\n\nb"), "\n\nb");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("1. not a list"), "1\\. not a list");
        assert_eq!(escape("a*b_c [x]"), "a\\*b\\_c \\[x\\]");
        assert_eq!(escape("- item"), "\\- item");
        assert_eq!(escape("# title"), "\\# title");
        assert_eq!(escape("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_bold_trimmed_and_wrapped() {
        assert_eq!(convert("<p>Hello <b>world</b>.</p>"), "Hello **world**.");
    }

    #[test]
    fn test_bold_flanking_whitespace_kept_outside() {
        assert_eq!(convert("<p>a<b> b </b>c</p>"), "a **b** c");
    }

    #[test]
    fn test_punctuation_bold_not_wrapped() {
        assert_eq!(convert("<p>a <strong>.</strong> b</p>"), "a . b");
    }

    #[test]
    fn test_unwanted_tags_removed() {
        let html = "<div><script>var x = 1;</script><style>p{}</style><nav>Menu</nav><p>Text</p>\
                    <footer>Foot</footer><aside>Side</aside><header>Head</header><noscript>NS</noscript>\
                    <iframe src=\"x\"></iframe></div>";
        assert_eq!(convert(html), "Text");
    }

    #[test]
    fn test_hidden_elements_removed() {
        let html = "<p>Shown</p><div style=\"display:none\">Secret</div><span style=\"visibility: hidden\">Ghost</span>";
        assert_eq!(convert(html), "Shown");
    }

    #[test]
    fn test_empty_links_removed() {
        assert_eq!(convert("<p>Go <a href=\"/x\"> </a>home</p>"), "Go home");
        assert_eq!(convert("<p><a href=\"/x\">home</a></p>"), "[home](/x)");
    }

    #[test]
    fn test_images() {
        assert_eq!(convert("<p><img src=\"https://e.com/a.png\" alt=\"A\"></p>"), "![A](https://e.com/a.png)");
        assert_eq!(convert_without_images("<p>x<img src=\"https://e.com/a.png\" alt=\"A\"></p>"), "x");
    }

    #[test]
    fn test_ordered_list_start_and_index() {
        let html = "<ol start=\"5\"><li>One</li><li>Two</li><li>Three</li></ol>";
        assert_eq!(convert(html), "5. One\n6. Two\n7. Three");
    }

    #[test]
    fn test_unordered_list() {
        assert_eq!(convert("<ul>\n  <li>One</li>\n  <li>Two</li>\n</ul>"), "- One\n- Two");
    }

    #[test]
    fn test_list_item_paragraphs_indented() {
        let html = "<ul><li><p>First</p><p>Second</p></li><li>Next</li></ul>";
        assert_eq!(convert(html), "- First\n    \n    Second\n- Next");
    }

    #[test]
    fn test_blank_elements() {
        assert_eq!(convert("<p>a</p><div> </div><p>b</p>"), "a\n\nb");
        assert_eq!(convert("<p>a<span> </span>b</p>"), "a b");
    }

    #[test]
    fn test_unknown_block_padded() {
        assert_eq!(convert("<section>one</section><section>two</section>"), "one\n\ntwo");
    }

    #[test]
    fn test_custom_rule_precedes_builtin() {
        let converter = Converter::default().with_rule(Rule::remove("noParagraphs", Filter::Tags(&["p"])));
        assert_eq!(converter.convert_html("<p>gone</p><h2>kept</h2>"), "## kept");
        assert_eq!(converter.rules()[0].name, "noParagraphs");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(convert("<p>\n   lots   of\n\n space  </p>"), "lots of space");
    }
}
