//! Curated per-site selector rules.
//!
//! Some platforms wrap articles in markup the generic heuristics get wrong,
//! or surround them with widgets that survive generic cleaning. A
//! [`SiteRules`] entry names, for one host key, where the article lives and
//! which fragments to strip. Host keys match by substring, so `medium.com`
//! also covers `blog.medium.com`.
//!
//! The built-in table can be extended with a JSON file:
//!
//! ```json
//! [
//!   {
//!     "host": "example.org",
//!     "content_selectors": [".story"],
//!     "remove_selectors": [".newsletter-signup"]
//!   }
//! ]
//! ```
//!
//! User rules are consulted before built-in ones.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Selector rules for one host key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRules {
    /// Hostname substring this entry applies to.
    pub host: String,

    /// Ordered selectors tried before generic content detection.
    #[serde(default)]
    pub content_selectors: Vec<String>,

    /// Selectors for UI fragments to strip from the content.
    #[serde(default)]
    pub remove_selectors: Vec<String>,
}

impl SiteRules {
    /// Whether this entry applies to the given hostname.
    pub fn matches(&self, hostname: &str) -> bool {
        !self.host.is_empty() && hostname.contains(&self.host)
    }
}

/// Ordered table of [`SiteRules`]; the first matching entry wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTable {
    sites: Vec<SiteRules>,
}

impl SiteTable {
    /// Creates a table with no entries.
    pub fn empty() -> Self {
        Self { sites: Vec::new() }
    }

    /// Creates the built-in table.
    pub fn builtin() -> Self {
        Self { sites: builtin_sites() }
    }

    /// Parses a list of rules from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PagemarkError::SiteConfigError`](crate::PagemarkError::SiteConfigError)
    /// if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        let sites: Vec<SiteRules> = serde_json::from_str(json)?;
        Ok(Self { sites })
    }

    /// Reads a list of rules from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Places `user` rules ahead of the rules already in this table.
    pub fn with_user_rules(mut self, user: SiteTable) -> Self {
        let mut sites = user.sites;
        sites.append(&mut self.sites);
        self.sites = sites;
        self
    }

    /// Gets the first entry matching a hostname.
    pub fn matching(&self, hostname: &str) -> Option<&SiteRules> {
        self.sites.iter().find(|site| site.matches(hostname))
    }

    /// Gets all entries in lookup order.
    pub fn sites(&self) -> &[SiteRules] {
        &self.sites
    }

    /// Default location of the user rules file: `~/.config/pagemark/sites.json`.
    pub fn default_user_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("pagemark").join("sites.json"))
    }
}

impl Default for SiteTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn rules(host: &str, content: &[&str], remove: &[&str]) -> SiteRules {
    SiteRules {
        host: host.to_string(),
        content_selectors: content.iter().map(|s| s.to_string()).collect(),
        remove_selectors: remove.iter().map(|s| s.to_string()).collect(),
    }
}

fn builtin_sites() -> Vec<SiteRules> {
    vec![
        rules(
            "substack.com",
            &[".available-content", ".body.markup", "article.post", ".post-content"],
            &[
                ".subscription-widget-wrap",
                ".subscription-widget",
                ".subscribe-widget",
                "[data-component-name=\"SubscribeWidget\"]",
                ".share-dialog",
                ".post-ufi",
                ".button-wrapper",
                ".captioned-button-wrap",
                ".paywall",
                "[data-testid=\"paywall\"]",
                ".post-footer",
                ".recommendations",
            ],
        ),
        rules(
            "medium.com",
            &["article", "section[data-field=\"body\"]", ".postArticle-content"],
            &[
                "[data-testid=\"headerClapButton\"]",
                "[data-testid=\"headerSocialShareButton\"]",
                "[data-testid=\"audioPlayButton\"]",
                "[data-testid=\"storyReadTime\"]",
                "[aria-label=\"responses\"]",
                ".pw-multi-vote-icon",
                ".speechify-ignore",
                ".meteredContent",
            ],
        ),
        rules(
            "linkedin.com",
            &[".article-main__content", ".reader-article-content", "[data-test-id=\"article-content\"]", "article"],
            &[
                ".share-article",
                ".reader-social-bar",
                ".social-actions",
                ".article-recommendations",
                "[data-test-id=\"article-social-actions\"]",
                "[data-test-id=\"follow-button\"]",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[rstest]
    #[case("example.substack.com", Some("substack.com"))]
    #[case("medium.com", Some("medium.com"))]
    #[case("blog.medium.com", Some("medium.com"))]
    #[case("www.linkedin.com", Some("linkedin.com"))]
    #[case("example.com", None)]
    fn test_builtin_matching(#[case] hostname: &str, #[case] expected: Option<&str>) {
        let table = SiteTable::builtin();
        assert_eq!(table.matching(hostname).map(|s| s.host.as_str()), expected);
    }

    #[test]
    fn test_from_json_defaults_missing_lists() {
        let table = SiteTable::from_json(r#"[{"host": "example.org", "content_selectors": [".story"]}]"#).unwrap();
        let site = table.matching("news.example.org").unwrap();

        assert_eq!(site.content_selectors, vec![".story".to_string()]);
        assert!(site.remove_selectors.is_empty());
    }

    #[test]
    fn test_from_json_rejects_bad_shape() {
        let result = SiteTable::from_json(r#"{"host": "example.org"}"#);
        assert!(matches!(result, Err(crate::PagemarkError::SiteConfigError(_))));
    }

    #[test]
    fn test_user_rules_take_precedence() {
        let user = SiteTable::from_json(r#"[{"host": "medium.com", "content_selectors": [".mine"]}]"#).unwrap();
        let table = SiteTable::builtin().with_user_rules(user);

        assert_eq!(table.matching("medium.com").unwrap().content_selectors, vec![".mine".to_string()]);
        assert!(table.matching("substack.com").is_some());
    }

    #[test]
    fn test_empty_host_never_matches() {
        let table = SiteTable::from_json(r#"[{"host": ""}]"#).unwrap();
        assert!(table.matching("example.com").is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"host": "example.net", "remove_selectors": [".ad"]}}]"#).unwrap();

        let table = SiteTable::load(file.path()).unwrap();
        assert_eq!(table.sites().len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let result = SiteTable::load(Path::new("/nonexistent/pagemark/sites.json"));
        assert!(matches!(result, Err(crate::PagemarkError::Io(_))));
    }

    #[test]
    fn test_default_user_path() {
        if let Some(path) = SiteTable::default_user_path() {
            assert!(path.ends_with(".config/pagemark/sites.json"));
        }
    }
}
