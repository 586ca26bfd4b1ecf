//! Page loading from URLs, files, and stdin.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use reqwest::Client;
use tracing::debug;
use url::Url;

/// HTTP client settings for fetching pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: format!("Mozilla/5.0 (compatible; Pagemark/{})", crate::VERSION) }
    }
}

/// Where the HTML comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(Url),
    File(String),
    Stdin,
}

impl Source {
    /// Classify a command-line input: `-` is stdin, an http(s) URL is fetched,
    /// anything else is a file path.
    pub fn from_input(input: &str) -> anyhow::Result<Self> {
        if input == "-" {
            Ok(Source::Stdin)
        } else if input.starts_with("http://") || input.starts_with("https://") {
            let url = Url::parse(input).with_context(|| format!("Invalid URL: {input}"))?;
            Ok(Source::Url(url))
        } else {
            Ok(Source::File(input.to_string()))
        }
    }
}

/// Fetch a page over HTTP and return the response body.
pub async fn fetch_url(url: &Url, config: &FetchConfig) -> anyhow::Result<String> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(url.clone())
        .header("User-Agent", &config.user_agent)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                anyhow::anyhow!("Request timed out after {} seconds", config.timeout)
            } else {
                anyhow::Error::new(e)
            }
        })
        .with_context(|| format!("Failed to fetch {url}"))?;

    let status = response.status();
    if !status.is_success() {
        bail!("Failed to fetch {url}: HTTP {status}");
    }
    debug!(%url, %status, "fetched page");

    response.text().await.context("Failed to read response body")
}

/// Read a local HTML file.
pub fn fetch_file(path: &str) -> anyhow::Result<String> {
    if !Path::new(path).exists() {
        bail!("File not found: {path}");
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))
}

/// Read all of standard input.
pub fn fetch_stdin() -> anyhow::Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).context("Failed to read from stdin")?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.contains("Pagemark"));
    }

    #[test]
    fn test_source_from_input() {
        assert_eq!(Source::from_input("-").unwrap(), Source::Stdin);
        assert_eq!(Source::from_input("page.html").unwrap(), Source::File("page.html".to_string()));
        assert!(matches!(Source::from_input("https://example.com/a").unwrap(), Source::Url(_)));
        assert!(Source::from_input("https://").is_err());
    }

    #[test]
    fn test_fetch_file_not_found() {
        let err = fetch_file("/nonexistent/path/file.html").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_fetch_file_reads_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "<p>hi</p>").unwrap();

        assert_eq!(fetch_file(path.to_str().unwrap()).unwrap(), "<p>hi</p>");
    }
}
