//! Per-page metadata loaded from `data/pages.yaml`.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{CoreError, Result};

/// Metadata record for a single page.
///
/// Every recognized field is optional and may hold any YAML value, so a
/// list of keywords or a structured image is passed to the template as is.
/// Unrecognized keys are kept in [`PageMeta::extra`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    pub title: Option<Value>,
    pub description: Option<Value>,
    pub keywords: Option<Value>,
    pub author: Option<Value>,
    pub og_title: Option<Value>,
    pub og_description: Option<Value>,
    pub og_image: Option<Value>,
    pub og_url: Option<Value>,
    pub twitter_title: Option<Value>,
    pub twitter_description: Option<Value>,
    pub twitter_image: Option<Value>,
    pub favicon: Option<Value>,
    pub canonical_url: Option<Value>,

    /// Last modification date used by the sitemap (`YYYY-MM-DD`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_mod: Option<Value>,

    /// Any other keys present in the page record.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PageMeta {
    /// Names of the recognized metadata fields, in declaration order.
    pub const FIELDS: [&'static str; 13] = [
        "title",
        "description",
        "keywords",
        "author",
        "og_title",
        "og_description",
        "og_image",
        "og_url",
        "twitter_title",
        "twitter_description",
        "twitter_image",
        "favicon",
        "canonical_url",
    ];

    fn field(&self, name: &str) -> Option<&Value> {
        match name {
            "title" => self.title.as_ref(),
            "description" => self.description.as_ref(),
            "keywords" => self.keywords.as_ref(),
            "author" => self.author.as_ref(),
            "og_title" => self.og_title.as_ref(),
            "og_description" => self.og_description.as_ref(),
            "og_image" => self.og_image.as_ref(),
            "og_url" => self.og_url.as_ref(),
            "twitter_title" => self.twitter_title.as_ref(),
            "twitter_description" => self.twitter_description.as_ref(),
            "twitter_image" => self.twitter_image.as_ref(),
            "favicon" => self.favicon.as_ref(),
            "canonical_url" => self.canonical_url.as_ref(),
            _ => None,
        }
    }

    /// Recognized fields that are absent or null in this record.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        Self::FIELDS
            .iter()
            .copied()
            .filter(|name| self.field(name).is_none_or(Value::is_null))
            .collect()
    }

    /// The `last_mod` date as text, if it is a scalar.
    #[must_use]
    pub fn last_mod_text(&self) -> Option<String> {
        match self.last_mod.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Mapping from page identifier to its metadata record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageConfig {
    pages: BTreeMap<String, PageMeta>,
}

impl PageConfig {
    /// Load page metadata from a YAML file.
    ///
    /// An empty document yields an empty mapping.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::not_found(path));
        }

        let content = std::fs::read_to_string(path)?;
        let pages: Option<PageConfig> =
            serde_yaml::from_str(&content).map_err(|e| CoreError::parse(path, e))?;

        Ok(pages.unwrap_or_default())
    }

    /// Load page metadata, substituting an empty mapping when the document
    /// is missing or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(pages) => {
                tracing::info!(pages = pages.len(), "page metadata loaded");
                pages
            }
            Err(e) => {
                tracing::warn!(error = %e, "using empty page metadata");
                Self::default()
            }
        }
    }

    /// Metadata for a page, if the page has an entry.
    #[must_use]
    pub fn get(&self, page_id: &str) -> Option<&PageMeta> {
        self.pages.get(page_id)
    }

    /// Insert or replace a page entry.
    pub fn insert(&mut self, page_id: impl Into<String>, meta: PageMeta) {
        self.pages.insert(page_id.into(), meta);
    }

    /// Number of pages with an entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether no page has an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_pages() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("pages.yaml");
        std::fs::write(
            &path,
            r#"
index:
  title: Home
  description: Welcome
  last_mod: "2024-05-01"
  hero_image: /images/hero.png
about:
  title: About us
"#,
        )
        .expect("write");

        let pages = PageConfig::load(&path).expect("load pages");

        assert_eq!(pages.len(), 2);
        let index = pages.get("index").expect("index entry");
        assert_eq!(index.title.as_ref().and_then(Value::as_str), Some("Home"));
        assert_eq!(index.last_mod_text().as_deref(), Some("2024-05-01"));
        assert_eq!(
            index.extra.get("hero_image"),
            Some(&Value::String("/images/hero.png".to_string()))
        );
        assert!(pages.get("contact").is_none());
    }

    #[test]
    fn test_missing_fields_in_order() {
        let meta = PageMeta {
            title: Some(Value::from("About")),
            canonical_url: Some(Value::from("https://example.com/about")),
            ..PageMeta::default()
        };

        let missing = meta.missing_fields();
        assert_eq!(missing.len(), 11);
        assert_eq!(missing.first(), Some(&"description"));
        assert_eq!(missing.last(), Some(&"favicon"));
        assert!(!missing.contains(&"title"));
        assert!(!missing.contains(&"canonical_url"));
    }

    #[test]
    fn test_structured_values_keep_other_pages() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("pages.yaml");
        std::fs::write(
            &path,
            r#"
index:
  title: Home
about:
  title: About
  keywords: [rust, web]
  og_image:
    url: /images/about.png
    alt: Team photo
"#,
        )
        .expect("write");

        let pages = PageConfig::load_or_default(&path);

        assert_eq!(pages.len(), 2);
        let index = pages.get("index").expect("index entry");
        assert_eq!(index.title.as_ref().and_then(Value::as_str), Some("Home"));

        let about = pages.get("about").expect("about entry");
        assert_eq!(about.title.as_ref().and_then(Value::as_str), Some("About"));
        let keywords = about
            .keywords
            .as_ref()
            .and_then(Value::as_sequence)
            .expect("keywords list");
        assert_eq!(keywords.len(), 2);
        assert_eq!(keywords[0].as_str(), Some("rust"));
        assert!(about.og_image.as_ref().is_some_and(Value::is_mapping));
        assert!(!about.missing_fields().contains(&"keywords"));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let meta: PageMeta =
            serde_yaml::from_str("title: ~\ndescription: Hello\n").expect("parse record");

        let missing = meta.missing_fields();
        assert!(missing.contains(&"title"));
        assert!(!missing.contains(&"description"));
    }

    #[test]
    fn test_last_mod_text() {
        let meta: PageMeta = serde_yaml::from_str("last_mod: 2024-01-15\n").expect("parse record");
        assert_eq!(meta.last_mod_text().as_deref(), Some("2024-01-15"));

        let meta: PageMeta = serde_yaml::from_str("last_mod: [2024]\n").expect("parse record");
        assert_eq!(meta.last_mod_text(), None);
    }

    #[test]
    fn test_empty_record_misses_everything() {
        assert_eq!(PageMeta::default().missing_fields(), PageMeta::FIELDS.to_vec());
    }

    #[test]
    fn test_empty_document() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("pages.yaml");
        std::fs::write(&path, "").expect("write");

        let pages = PageConfig::load(&path).expect("load pages");
        assert!(pages.is_empty());
    }

    #[test]
    fn test_malformed_falls_back_to_empty() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("pages.yaml");
        std::fs::write(&path, "index: [title").expect("write");

        assert!(PageConfig::load(&path).is_err());
        assert!(PageConfig::load_or_default(&path).is_empty());
        assert!(PageConfig::load_or_default(&dir.path().join("missing.yaml")).is_empty());
    }
}
