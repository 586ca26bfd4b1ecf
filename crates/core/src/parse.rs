//! HTML parsing and read-only DOM access.
//!
//! This module provides the [`Document`] and [`Element`] types the pipeline
//! reads from. A `Document` is the page as the caller saw it: parsed markup
//! plus the URL it was loaded from. Nothing in this module mutates the tree;
//! stages that need to edit content work on a detached
//! [`ContentNode`](crate::ContentNode) instead.
//!
//! # Example
//!
//! ```rust
//! use pagemark_core::Document;
//!
//! let html = r#"
//!     <html>
//!         <head><title>Title</title></head>
//!         <body><p class="content">Paragraph</p></body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse_with_url(html, "https://www.example.com/post").unwrap();
//! assert_eq!(doc.title(), Some("Title".to_string()));
//! assert_eq!(doc.hostname(), Some("www.example.com"));
//! assert_eq!(doc.select("p.content").unwrap().len(), 1);
//! ```

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{PagemarkError, Result};

/// Represents a parsed HTML page.
///
/// A Document wraps the page markup and the optional URL it was loaded
/// from, and provides CSS-selector queries and `<meta>` lookups.
pub struct Document {
    html: Html,
    url: Option<Url>,
}

impl Document {
    /// Parses HTML from a string with no page URL.
    ///
    /// Hostname-dependent behaviour (site rules, site name fallback) is
    /// disabled for such documents.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pagemark_core::Document;
    ///
    /// let doc = Document::parse("<html><body><h1>Title</h1></body></html>").unwrap();
    /// assert!(doc.url().is_none());
    /// ```
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html, url: None })
    }

    /// Parses HTML loaded from `url`.
    ///
    /// # Errors
    ///
    /// Returns [`PagemarkError::InvalidUrl`] if the URL cannot be parsed.
    pub fn parse_with_url(html: &str, url: &str) -> Result<Self> {
        let url = Url::parse(url.trim()).map_err(|e| PagemarkError::InvalidUrl(format!("{}: {}", url, e)))?;
        let html = Html::parse_document(html);
        Ok(Self { html, url: Some(url) })
    }

    /// Gets the page URL, if one was supplied.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Gets the page URL as a string, or an empty string when unknown.
    pub fn url_string(&self) -> String {
        self.url.as_ref().map(|u| u.to_string()).unwrap_or_default()
    }

    /// Gets the page hostname, if the URL has one.
    pub fn hostname(&self) -> Option<&str> {
        self.url.as_ref().and_then(|u| u.host_str())
    }

    /// Gets the underlying `scraper::Html`.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PagemarkError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pagemark_core::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html).unwrap();
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Selects the first element matching a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PagemarkError::HtmlParseError`] if the selector is invalid.
    pub fn select_first(&'_ self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).next().map(|el| Element { element: el }))
    }

    /// Gets the text of the `<title>` element with whitespace collapsed.
    ///
    /// Returns `None` when the element is missing or blank.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        let raw = self.html.select(&selector).next()?.text().collect::<String>();
        let title = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if title.is_empty() { None } else { Some(title) }
    }

    /// Gets the `<body>` element.
    pub fn body(&self) -> Option<Element<'_>> {
        let selector = Selector::parse("body").ok()?;
        self.html.select(&selector).next().map(|el| Element { element: el })
    }

    /// Gets the trimmed character length of the body text.
    pub fn body_text_len(&self) -> usize {
        self.body().map(|b| b.text_len()).unwrap_or(0)
    }

    /// Looks up a `<meta>` tag whose `name` or `property` equals `key`.
    ///
    /// Returns the trimmed `content`, or `None` if the tag is absent or its
    /// content is empty. The first tag in document order wins.
    pub fn meta_content(&self, key: &str) -> Option<String> {
        let selector = Selector::parse("meta").ok()?;
        let meta = self.html.select(&selector).find(|el| {
            let value = el.value();
            value.attr("name") == Some(key) || value.attr("property") == Some(key)
        })?;

        let content = meta.value().attr("content")?.trim();
        if content.is_empty() { None } else { Some(content.to_string()) }
    }
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| PagemarkError::HtmlParseError(format!("Invalid selector {}: {}", selector, e)))
}

/// A wrapper around scraper's ElementRef for read-only access.
///
/// # Example
///
/// ```rust
/// use pagemark_core::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html).unwrap();
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the outer HTML of this element, including its own tags.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Gets the concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the character count of the trimmed text content.
    pub fn text_len(&self) -> usize {
        self.text().trim().chars().count()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <title>  Test
                Page </title>
            <meta name="author" content="  Jane Doe ">
            <meta property="og:site_name" content="Example">
            <meta name="category" content="   ">
        </head>
        <body>
            <h1>Heading</h1>
            <p class="content">Paragraph 1</p>
            <p class="content">Paragraph 2</p>
            <a href="https://example.com">Link</a>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), Some("Test Page".to_string()));
        assert!(doc.hostname().is_none());
        assert_eq!(doc.url_string(), "");
    }

    #[test]
    fn test_parse_with_url() {
        let doc = Document::parse_with_url(SAMPLE_HTML, "https://blog.example.com/a?b=1").unwrap();
        assert_eq!(doc.hostname(), Some("blog.example.com"));
        assert_eq!(doc.url_string(), "https://blog.example.com/a?b=1");
    }

    #[test]
    fn test_parse_with_invalid_url() {
        let result = Document::parse_with_url(SAMPLE_HTML, "not a url");
        assert!(matches!(result, Err(PagemarkError::InvalidUrl(_))));
    }

    #[test]
    fn test_select_elements() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let elements = doc.select("p.content").unwrap();

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text(), "Paragraph 1");
        assert_eq!(elements[1].text(), "Paragraph 2");
        assert_eq!(elements[0].tag_name(), "p");
    }

    #[test]
    fn test_select_first() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let first = doc.select_first("p").unwrap().unwrap();
        assert_eq!(first.text(), "Paragraph 1");
        assert!(doc.select_first("table").unwrap().is_none());
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(PagemarkError::HtmlParseError(_))));
    }

    #[test]
    fn test_meta_content_by_name_and_property() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.meta_content("author"), Some("Jane Doe".to_string()));
        assert_eq!(doc.meta_content("og:site_name"), Some("Example".to_string()));
        assert_eq!(doc.meta_content("category"), None);
        assert_eq!(doc.meta_content("missing"), None);
    }

    #[test]
    fn test_body_text_len() {
        let doc = Document::parse("<html><body>  abc  </body></html>").unwrap();
        assert_eq!(doc.body_text_len(), 3);
    }
}
