//! Sitemap generation.
//!
//! Generates an XML sitemap from the rendered output tree.

use std::{fmt::Write as _, fs, path::Path};

use chrono::Local;
use pagesmith_core::{PageConfig, PageMeta, SiteConfig};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Sitemap generation errors.
#[derive(Debug, Error)]
pub enum SitemapError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sitemap operations.
pub type Result<T> = std::result::Result<T, SitemapError>;

/// Sitemap XML namespace.
pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// A sitemap URL entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapUrl {
    /// URL location.
    pub loc: String,

    /// Last modification date (`YYYY-MM-DD`).
    pub lastmod: String,

    /// Priority, either "1.0" or "0.8".
    pub priority: &'static str,
}

/// Sitemap generator.
#[derive(Debug)]
pub struct SitemapGenerator<'a> {
    site: &'a SiteConfig,
    pages: &'a PageConfig,
    today: String,
}

impl<'a> SitemapGenerator<'a> {
    /// Create a new sitemap generator dated today.
    #[must_use]
    pub fn new(site: &'a SiteConfig, pages: &'a PageConfig) -> Self {
        Self {
            site,
            pages,
            today: Local::now().format("%Y-%m-%d").to_string(),
        }
    }

    /// Use a fixed date for pages without `last_mod`.
    #[must_use]
    pub fn with_today(mut self, today: impl Into<String>) -> Self {
        self.today = today.into();
        self
    }

    /// Collect sitemap entries for every HTML page under `output_dir`.
    #[must_use]
    pub fn collect(&self, output_dir: &Path) -> Vec<SitemapUrl> {
        html_pages(output_dir)
            .into_iter()
            .filter(|path| !self.site.is_sitemap_excluded(path))
            .map(|path| self.page_to_url(&path))
            .collect()
    }

    /// Convert a page path to a sitemap URL entry.
    fn page_to_url(&self, page_path: &str) -> SitemapUrl {
        let base_url = &self.site.base_url;
        let loc = self.site.url_for(page_path);

        let lastmod = self
            .pages
            .get(page_path)
            .and_then(PageMeta::last_mod_text)
            .unwrap_or_else(|| self.today.clone());

        let priority = if loc == *base_url || loc == format!("{base_url}/") {
            "1.0"
        } else {
            "0.8"
        };

        SitemapUrl {
            loc,
            lastmod,
            priority,
        }
    }

    /// Generate sitemap XML for the output tree.
    #[must_use]
    pub fn generate(&self, output_dir: &Path) -> String {
        let urls = self.collect(output_dir);
        debug!(count = urls.len(), "generating sitemap");

        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        let _ = writeln!(xml, r#"<urlset xmlns="{SITEMAP_NS}">"#);

        for url in &urls {
            xml.push_str("  <url>\n");
            let _ = writeln!(xml, "    <loc>{}</loc>", escape_xml(&url.loc));
            let _ = writeln!(xml, "    <lastmod>{}</lastmod>", escape_xml(&url.lastmod));
            let _ = writeln!(xml, "    <priority>{}</priority>", url.priority);
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }

    /// Write `sitemap.xml` into the output root.
    pub fn write(&self, output_dir: &Path) -> Result<()> {
        let xml = self.generate(output_dir);
        let path = output_dir.join("sitemap.xml");
        fs::write(&path, xml)?;
        info!(path = %path.display(), "sitemap created");
        Ok(())
    }
}

/// Page paths of every HTML file under `output_dir`, sorted.
///
/// `about.html` becomes `about`, `blog/post.html` becomes `blog/post`, and
/// the top-level `index.html` becomes the empty path.
#[must_use]
pub fn html_pages(output_dir: &Path) -> Vec<String> {
    WalkDir::new(output_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != "node_modules")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let relative = e.path().strip_prefix(output_dir).ok()?;
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let stem_len = relative.len().checked_sub(".html".len())?;
            if !relative.is_char_boundary(stem_len)
                || !relative[stem_len..].eq_ignore_ascii_case(".html")
            {
                return None;
            }
            let page = &relative[..stem_len];
            Some(if page == "index" {
                String::new()
            } else {
                page.to_string()
            })
        })
        .collect()
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
