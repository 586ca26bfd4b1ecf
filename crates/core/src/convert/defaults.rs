//! Built-in CommonMark rules, consulted after the override rules.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use super::ConvertOptions;
use super::rules::{Filter, Rule};

static CODE_LANGUAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)(?:language|lang)-(\S+)").expect("code language regex should compile"));

static BACKTICKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`+").expect("backtick regex should compile"));

pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::replace("paragraph", Filter::Tags(&["p"]), paragraph),
        Rule::replace("lineBreak", Filter::Tags(&["br"]), line_break),
        Rule::replace("heading", Filter::Tags(&["h1", "h2", "h3", "h4", "h5", "h6"]), heading),
        Rule::replace("blockquote", Filter::Tags(&["blockquote"]), blockquote),
        Rule::replace("list", Filter::Tags(&["ul", "ol"]), list),
        Rule::replace("fencedCodeBlock", Filter::Tags(&["pre"]), fenced_code_block),
        Rule::replace("horizontalRule", Filter::Tags(&["hr"]), horizontal_rule),
        Rule::replace("inlineLink", Filter::Matches(is_inline_link), inline_link),
        Rule::replace("emphasis", Filter::Tags(&["em", "i"]), emphasis),
        Rule::replace("code", Filter::Tags(&["code"]), code),
    ]
}

fn paragraph(content: &str, _: &ElementRef<'_>, _: &ConvertOptions) -> String {
    format!("\n\n{content}\n\n")
}

fn line_break(_: &str, _: &ElementRef<'_>, options: &ConvertOptions) -> String {
    format!("{}\n", options.br)
}

fn heading(content: &str, element: &ElementRef<'_>, _: &ConvertOptions) -> String {
    let level = element.value().name()[1..].parse::<usize>().unwrap_or(1);
    format!("\n\n{} {}\n\n", "#".repeat(level), content)
}

fn blockquote(content: &str, _: &ElementRef<'_>, _: &ConvertOptions) -> String {
    let quoted = content
        .trim_matches('\n')
        .lines()
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n\n{quoted}\n\n")
}

fn list(content: &str, element: &ElementRef<'_>, _: &ConvertOptions) -> String {
    let parent = element.parent().and_then(ElementRef::wrap);
    let is_last_in_item = parent.is_some_and(|p| {
        p.value().name() == "li" && p.children().filter_map(ElementRef::wrap).last().is_some_and(|last| last.id() == element.id())
    });

    if is_last_in_item { format!("\n{content}") } else { format!("\n\n{content}\n\n") }
}

fn fenced_code_block(_: &str, element: &ElementRef<'_>, options: &ConvertOptions) -> String {
    let code_child = element
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "code");

    let code: String = match code_child {
        Some(child) => child.text().collect(),
        None => element.text().collect(),
    };

    let class = code_child
        .and_then(|child| child.value().attr("class"))
        .or_else(|| element.value().attr("class"))
        .unwrap_or_default();
    let language = CODE_LANGUAGE
        .captures(class)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default();

    let fence_char = options.fence.chars().next().unwrap_or('`');
    let longest_run = code
        .lines()
        .map(|line| line.chars().take_while(|c| *c == fence_char).count())
        .max()
        .unwrap_or(0);
    let fence_size = options.fence.chars().count().max(3).max(if longest_run >= 3 { longest_run + 1 } else { 0 });
    let fence = fence_char.to_string().repeat(fence_size);

    let code = code.strip_suffix('\n').unwrap_or(&code);
    format!("\n\n{fence}{language}\n{code}\n{fence}\n\n")
}

fn horizontal_rule(_: &str, _: &ElementRef<'_>, options: &ConvertOptions) -> String {
    format!("\n\n{}\n\n", options.hr)
}

fn is_inline_link(element: &ElementRef<'_>, _: &ConvertOptions) -> bool {
    element.value().name() == "a" && element.value().attr("href").is_some_and(|href| !href.is_empty())
}

fn inline_link(content: &str, element: &ElementRef<'_>, _: &ConvertOptions) -> String {
    let href = element.value().attr("href").unwrap_or_default().replace('(', "\\(").replace(')', "\\)");
    let title = element
        .value()
        .attr("title")
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .map(|t| format!(" \"{}\"", t.replace('"', "\\\"")))
        .unwrap_or_default();
    format!("[{content}]({href}{title})")
}

fn emphasis(content: &str, _: &ElementRef<'_>, options: &ConvertOptions) -> String {
    if content.trim().is_empty() {
        return String::new();
    }
    format!("{d}{content}{d}", d = options.em_delimiter)
}

fn code(content: &str, _: &ElementRef<'_>, _: &ConvertOptions) -> String {
    if content.is_empty() {
        return String::new();
    }

    let content = content.replace("\r\n", " ").replace(['\n', '\r'], " ");
    let needs_space = content.starts_with('`')
        || content.ends_with('`')
        || (content.starts_with(' ') && content.ends_with(' ') && !content.trim().is_empty());
    let space = if needs_space { " " } else { "" };

    let mut delimiter = "`".to_string();
    while BACKTICKS.find_iter(&content).any(|run| run.as_str() == delimiter) {
        delimiter.push('`');
    }

    format!("{delimiter}{space}{content}{space}{delimiter}")
}
