//! Site configuration management.

use std::{collections::BTreeSet, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Site-wide configuration loaded from `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site version, exposed to every template.
    #[serde(default = "default_version")]
    pub version: String,

    /// Whether analytics snippets should be rendered.
    #[serde(default)]
    pub enable_analytics: bool,

    /// Whether rendered HTML is minified.
    #[serde(default)]
    pub minify_html: bool,

    /// Whether copied JavaScript is minified.
    #[serde(default)]
    pub minify_js: bool,

    /// Base URL for the site (e.g., "https://example.com").
    #[serde(default)]
    pub base_url: String,

    /// Whether `sitemap.xml` is generated.
    #[serde(default)]
    pub generate_sitemap: bool,

    /// Whether `robots.txt` is generated.
    #[serde(default)]
    pub generate_robots: bool,

    /// Page paths never listed in the sitemap.
    #[serde(default)]
    pub sitemap_exclude_list: BTreeSet<String>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            enable_analytics: false,
            minify_html: false,
            minify_js: false,
            base_url: String::new(),
            generate_sitemap: false,
            generate_robots: false,
            sitemap_exclude_list: BTreeSet::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a YAML file.
    ///
    /// An empty document yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::not_found(path));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Option<SiteConfig> =
            serde_yaml::from_str(&content).map_err(|e| CoreError::parse(path, e))?;

        Ok(config.unwrap_or_default())
    }

    /// Load configuration, substituting defaults when the document is
    /// missing or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        let config = match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "using default site configuration");
                Self::default()
            }
        };
        config.log_summary();
        config
    }

    fn log_summary(&self) {
        tracing::info!(version = %self.version, "site version");
        tracing::info!(
            analytics = on_off(self.enable_analytics),
            html_minification = on_off(self.minify_html),
            js_minification = on_off(self.minify_js),
            "site features"
        );
    }

    /// Join `base_url` and a page path.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Whether a page path is excluded from the sitemap.
    #[must_use]
    pub fn is_sitemap_excluded(&self, page_path: &str) -> bool {
        self.sitemap_exclude_list.contains(page_path)
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "enabled" } else { "disabled" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, content).expect("write");
        (dir, path)
    }

    #[test]
    fn test_load_config() {
        let (_dir, path) = write_config(
            r#"
version: "2.3.1"
enable_analytics: true
minify_html: true
minify_js: true
base_url: "https://example.com"
generate_sitemap: true
generate_robots: true
sitemap_exclude_list:
  - "404"
  - drafts/wip
"#,
        );

        let config = SiteConfig::load(&path).expect("load config");

        assert_eq!(config.version, "2.3.1");
        assert!(config.enable_analytics);
        assert!(config.minify_html);
        assert!(config.minify_js);
        assert_eq!(config.base_url, "https://example.com");
        assert!(config.generate_sitemap);
        assert!(config.generate_robots);
        assert!(config.is_sitemap_excluded("404"));
        assert!(config.is_sitemap_excluded("drafts/wip"));
        assert!(!config.is_sitemap_excluded("about"));
    }

    #[test]
    fn test_config_defaults() {
        let (_dir, path) = write_config("base_url: https://example.com\n");

        let config = SiteConfig::load(&path).expect("load config");

        assert_eq!(config.version, "1.0.0");
        assert!(!config.enable_analytics);
        assert!(!config.minify_html);
        assert!(!config.minify_js);
        assert!(!config.generate_sitemap);
        assert!(!config.generate_robots);
        assert!(config.sitemap_exclude_list.is_empty());
    }

    #[test]
    fn test_empty_document_is_default() {
        let (_dir, path) = write_config("");
        let config = SiteConfig::load(&path).expect("load config");
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn test_config_not_found() {
        let result = SiteConfig::load(Path::new("/nonexistent/config.yaml"));
        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn test_malformed_falls_back_to_defaults() {
        let (_dir, path) = write_config("version: [unterminated\n");

        assert!(SiteConfig::load(&path).is_err());
        assert_eq!(SiteConfig::load_or_default(&path), SiteConfig::default());
    }

    #[test]
    fn test_missing_falls_back_to_defaults() {
        let config = SiteConfig::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(config.version, "1.0.0");
        assert!(!config.minify_html);
    }

    #[test]
    fn test_url_for() {
        let config = SiteConfig {
            base_url: "https://example.com".to_string(),
            ..SiteConfig::default()
        };

        assert_eq!(config.url_for("contact"), "https://example.com/contact");
        assert_eq!(config.url_for("blog/first"), "https://example.com/blog/first");
        assert_eq!(config.url_for(""), "https://example.com/");
    }
}
