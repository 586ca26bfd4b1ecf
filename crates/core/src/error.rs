//! Error types for pagemark operations.
//!
//! This module defines the main error type [`PagemarkError`] which represents
//! the failures that can abort a conversion. Recoverable problems (a selector
//! the engine cannot parse, an image URL that fails to decode) never surface
//! here; the stages that meet them skip the offending item and carry on.
//!
//! # Example
//!
//! ```rust
//! use pagemark_core::{PagemarkError, Result};
//!
//! fn require_html(html: &str) -> Result<&str> {
//!     if html.trim().is_empty() {
//!         return Err(PagemarkError::NoContent);
//!     }
//!     Ok(html)
//! }
//! # assert!(require_html("").is_err());
//! ```

use thiserror::Error;

/// Main error type for extraction and conversion.
///
/// The pipeline orchestrator turns any of these into a
/// [`PipelineResult::Failure`](crate::PipelineResult::Failure) whose message is
/// the error's `Display` output.
#[derive(Error, Debug)]
pub enum PagemarkError {
    /// Invalid page URL provided.
    ///
    /// Returned when the caller-supplied URL cannot be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML or selector errors.
    ///
    /// Returned when a CSS selector is rejected by the selector engine or the
    /// markup cannot be used at all.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// Site rules file errors.
    ///
    /// Returned when a user-supplied site table is not valid JSON or has the
    /// wrong shape.
    #[error("Site configuration error: {0}")]
    SiteConfigError(String),

    /// Output serialization errors.
    #[error("Failed to serialize output: {0}")]
    Serialization(String),

    /// I/O errors while reading configuration files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No content could be extracted from the document.
    ///
    /// Returned when the document has neither a content candidate nor a body.
    #[error("No content could be extracted from the document")]
    NoContent,
}

impl From<serde_json::Error> for PagemarkError {
    fn from(err: serde_json::Error) -> Self {
        PagemarkError::SiteConfigError(err.to_string())
    }
}

/// Result type alias for PagemarkError.
pub type Result<T> = std::result::Result<T, PagemarkError>;
