//! Page to Markdown pipeline.
//!
//! This module sequences the stages of a conversion and is the single entry
//! point for callers. The main entry point is the [`Pipeline`] struct, along
//! with the convenience function [`extract`].
//!
//! Stages run strictly in order on one invocation:
//! metadata → locate → clean → normalize → convert → header → post-process.
//! Any stage error aborts the run and becomes a [`PipelineResult::Failure`];
//! no partial Markdown is returned.
//!
//! # Example
//!
//! ```rust
//! use pagemark_core::{PageOptions, PipelineResult, extract};
//!
//! let html = "<html><head><title>Test</title></head>\
//!             <body><article><h1>Test</h1><p>Hello <b>  world  </b>.</p></article></body></html>";
//!
//! match extract(html, Some("https://www.example.com/post"), &PageOptions { include_images: false }) {
//!     PipelineResult::Success { markdown, title, .. } => {
//!         assert_eq!(title, "Test");
//!         assert!(markdown.starts_with("# Test\n\n**Source:** https://www.example.com/post\n**Site:** example.com\n"));
//!         assert!(markdown.ends_with("Hello **world**."));
//!     }
//!     PipelineResult::Failure { message } => panic!("{message}"),
//! }
//! ```

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::clean::clean_content;
use crate::convert::{ConvertOptions, Converter};
use crate::formatters::assemble_document;
use crate::locate::{LocatorConfig, locate_content};
use crate::metadata::Metadata;
use crate::normalize::normalize_emphasis;
use crate::parse::Document;
use crate::postprocess::postprocess_markdown;
use crate::sites::SiteTable;
use crate::Result;

/// Message used when a failure carries no message of its own
pub const UNKNOWN_ERROR: &str = "Unknown error during extraction";

/// Per-invocation options supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOptions {
    /// Render images as Markdown images (default: true).
    pub include_images: bool,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self { include_images: true }
    }
}

/// Outcome of one pipeline run: exactly one of success or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum PipelineResult {
    #[serde(rename = "ok")]
    Success { markdown: String, title: String, url: String },
    #[serde(rename = "err")]
    Failure { message: String },
}

impl PipelineResult {
    fn failure(message: String) -> Self {
        let message = if message.trim().is_empty() { UNKNOWN_ERROR.to_string() } else { message };
        PipelineResult::Failure { message }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PipelineResult::Success { .. })
    }

    /// The Markdown of a successful run.
    pub fn markdown(&self) -> Option<&str> {
        match self {
            PipelineResult::Success { markdown, .. } => Some(markdown),
            PipelineResult::Failure { .. } => None,
        }
    }
}

impl From<Result<PipelineResult>> for PipelineResult {
    fn from(result: Result<PipelineResult>) -> Self {
        result.unwrap_or_else(|e| PipelineResult::failure(e.to_string()))
    }
}

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Configuration for the pipeline.
///
/// # Example
///
/// ```rust
/// use pagemark_core::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .min_text_len(200)
///     .min_body_ratio(0.5)
///     .build();
/// assert_eq!(config.locator.min_text_len, 200);
/// ```
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Content location thresholds and generic selectors.
    pub locator: LocatorConfig,

    /// Site-specific selectors and removals.
    pub sites: SiteTable,

    /// Source of the extraction timestamp (default: local clock).
    pub clock: fn() -> NaiveDateTime,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { locator: LocatorConfig::default(), sites: SiteTable::builtin(), clock: local_now }
    }
}

impl PipelineConfig {
    /// Creates a new builder for PipelineConfig.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }
}

/// Builder for PipelineConfig.
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: PipelineConfig::default() }
    }

    /// Sets the whole locator configuration.
    pub fn locator(mut self, value: LocatorConfig) -> Self {
        self.config.locator = value;
        self
    }

    /// Sets the minimum candidate text length.
    pub fn min_text_len(mut self, value: usize) -> Self {
        self.config.locator.min_text_len = value;
        self
    }

    /// Sets the minimum share of body text for generic candidates.
    pub fn min_body_ratio(mut self, value: f64) -> Self {
        self.config.locator.min_body_ratio = value;
        self
    }

    /// Sets the site table.
    pub fn sites(mut self, value: SiteTable) -> Self {
        self.config.sites = value;
        self
    }

    /// Sets the timestamp source.
    pub fn clock(mut self, value: fn() -> NaiveDateTime) -> Self {
        self.config.clock = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Main entry point for page conversion.
///
/// # Example
///
/// ```rust
/// use pagemark_core::{Document, PageOptions, Pipeline};
///
/// let doc = Document::parse("<html><body><p>Content</p></body></html>").unwrap();
/// let result = Pipeline::new().run(&doc, &PageOptions::default());
/// assert!(result.markdown().unwrap().starts_with("# Untitled"));
/// ```
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline with default settings.
    pub fn new() -> Self {
        Self { config: PipelineConfig::default() }
    }

    /// Creates a pipeline with a custom configuration.
    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Converts a parsed document.
    pub fn run(&self, doc: &Document, options: &PageOptions) -> PipelineResult {
        self.try_run(doc, options).into()
    }

    /// Parses and converts HTML loaded from `url`.
    ///
    /// An invalid URL yields a failure result.
    pub fn run_html(&self, html: &str, url: Option<&str>, options: &PageOptions) -> PipelineResult {
        let doc = match url {
            Some(url) => Document::parse_with_url(html, url),
            None => Document::parse(html),
        };
        doc.and_then(|doc| self.try_run(&doc, options)).into()
    }

    fn try_run(&self, doc: &Document, options: &PageOptions) -> Result<PipelineResult> {
        let metadata = Metadata::extract_at(doc, (self.config.clock)());
        let site = doc.hostname().and_then(|host| self.config.sites.matching(host));
        if let Some(site) = site {
            debug!(host = %site.host, "matched site rules");
        }

        let located = locate_content(doc, site, &self.config.locator)?;
        debug!(source = ?located.source, "located content");

        let mut content = located.content;
        let removed = clean_content(&mut content, site);
        debug!(removed, "cleaned content");

        normalize_emphasis(&mut content);

        let converter = Converter::new(ConvertOptions { include_images: options.include_images, ..Default::default() });
        let body = converter.convert(&content);

        let markdown = postprocess_markdown(&assemble_document(&metadata, &body));
        debug!(chars = markdown.len(), "converted document");

        Ok(PipelineResult::Success { markdown, title: metadata.title, url: metadata.url })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function for one-off conversion with defaults.
pub fn extract(html: &str, url: Option<&str>, options: &PageOptions) -> PipelineResult {
    Pipeline::new().run_html(html, url, options)
}
