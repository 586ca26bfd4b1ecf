use chrono::NaiveDateTime;
use serde::Serialize;

use crate::Document;

/// Format of the extraction timestamp, e.g. `2025-01-31 at 14:05`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d at %H:%M";

/// Page metadata shown in the Markdown header.
///
/// Derived read-only from a [`Document`]; extraction never fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub title: String,
    pub url: String,
    pub extracted_at: String,
    pub site_name: String,
    pub author: Option<String>,
    pub section: Option<String>,
}

impl Metadata {
    /// Extracts metadata using the local clock for the timestamp.
    pub fn extract(doc: &Document) -> Self {
        Self::extract_at(doc, chrono::Local::now().naive_local())
    }

    /// Extracts metadata with an explicit extraction time.
    pub fn extract_at(doc: &Document, now: NaiveDateTime) -> Self {
        Self {
            title: doc.extract_title(),
            url: doc.url_string(),
            extracted_at: now.format(TIMESTAMP_FORMAT).to_string(),
            site_name: doc.extract_site_name(),
            author: doc.extract_author(),
            section: doc.extract_section(),
        }
    }
}

impl Document {
    /// Extract title with priority fallback:
    /// 1. `<title>` element
    /// 2. Open Graph `og:title`
    /// 3. First `<h1>` element
    /// 4. `"Untitled"`
    pub fn extract_title(&self) -> String {
        if let Some(title) = self.title() {
            return title;
        }

        if let Some(title) = self.meta_content("og:title") {
            return title;
        }

        if let Ok(Some(h1)) = self.select_first("h1") {
            let text = h1.text().split_whitespace().collect::<Vec<_>>().join(" ");
            if !text.is_empty() {
                return text;
            }
        }

        "Untitled".to_string()
    }

    /// Extract site name with priority fallback:
    /// 1. Open Graph `og:site_name`
    /// 2. Meta `application-name`
    /// 3. Meta `publisher`
    /// 4. Hostname without a leading `www.`
    ///
    /// Empty when none of these are available.
    pub fn extract_site_name(&self) -> String {
        ["og:site_name", "application-name", "publisher"]
            .iter()
            .find_map(|key| self.meta_content(key))
            .or_else(|| {
                self.hostname()
                    .map(|host| host.strip_prefix("www.").unwrap_or(host).to_string())
            })
            .unwrap_or_default()
    }

    /// Extract author from `author`, `article:author` or `twitter:creator`.
    pub fn extract_author(&self) -> Option<String> {
        ["author", "article:author", "twitter:creator"]
            .iter()
            .find_map(|key| self.meta_content(key))
    }

    /// Extract section from `article:section` or `category`.
    pub fn extract_section(&self) -> Option<String> {
        ["article:section", "category"].iter().find_map(|key| self.meta_content(key))
    }
}
