//! Page rendering.
//!
//! Every `*.html` file at the top of the content directory is a page. Its
//! template is rendered with the page's metadata record and the site-wide
//! flags, optionally minified, and written to the output root under the
//! same file name.

use std::{
    fs,
    path::{Path, PathBuf},
};

use pagesmith_core::{PageConfig, PageMeta, SiteConfig};
use serde::Serialize;
use tera::Context;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    minify::minify_html,
    template::{TemplateError, TemplateSet},
};

/// Errors for a single page.
#[derive(Debug, Error)]
pub enum PageError {
    /// Template lookup or rendering failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The metadata record could not be turned into a template context.
    #[error("invalid page metadata: {0}")]
    Context(tera::Error),

    /// Writing the rendered page failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of rendering every page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Pages written to the output root.
    pub rendered: Vec<String>,

    /// Pages skipped because of an error.
    pub failed: Vec<String>,
}

/// Template context for one page.
#[derive(Serialize)]
struct PageContext<'a> {
    #[serde(flatten)]
    meta: &'a PageMeta,
    version: &'a str,
    enable_analytics: bool,
}

/// Renders content pages into the output root.
#[derive(Debug)]
pub struct PageRenderer<'a> {
    templates: &'a TemplateSet,
    site: &'a SiteConfig,
    pages: &'a PageConfig,
}

impl<'a> PageRenderer<'a> {
    /// Create a renderer over the given templates and configuration.
    #[must_use]
    pub fn new(templates: &'a TemplateSet, site: &'a SiteConfig, pages: &'a PageConfig) -> Self {
        Self {
            templates,
            site,
            pages,
        }
    }

    /// Render every page in `content_dir` into `output_dir`.
    ///
    /// A failing page is logged and skipped; it never stops the others.
    pub fn render_all(&self, content_dir: &Path, output_dir: &Path) -> RenderSummary {
        let mut summary = RenderSummary::default();

        for file_name in page_files(content_dir) {
            match self.render_to(&file_name, output_dir) {
                Ok(()) => {
                    info!(
                        page = %file_name,
                        minified = self.site.minify_html,
                        "rendered page"
                    );
                    summary.rendered.push(file_name);
                }
                Err(e) => {
                    error!(page = %file_name, error = %e, "failed to render page");
                    summary.failed.push(file_name);
                }
            }
        }

        summary
    }

    fn render_to(&self, file_name: &str, output_dir: &Path) -> Result<(), PageError> {
        let html = self.render(file_name)?;
        let output_path = output_dir.join(file_name);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, html)?;
        Ok(())
    }

    /// Render one page template to a string.
    pub fn render(&self, file_name: &str) -> Result<String, PageError> {
        let page_id = page_id(file_name);
        let empty = PageMeta::default();

        let meta = match self.pages.get(page_id) {
            Some(meta) => meta,
            None => {
                warn!(
                    page = %page_id,
                    "no page metadata found, rendering with defaults"
                );
                &empty
            }
        };

        let missing = meta.missing_fields();
        if !missing.is_empty() {
            warn!(
                page = %page_id,
                missing = %missing.join(", "),
                "page metadata is missing fields"
            );
        }

        let context = Context::from_serialize(PageContext {
            meta,
            version: &self.site.version,
            enable_analytics: self.site.enable_analytics,
        })
        .map_err(PageError::Context)?;

        let html = self.templates.render(file_name, &context)?;

        Ok(if self.site.minify_html {
            minify_html(&html)
        } else {
            html
        })
    }
}

/// Page identifier for a content file name.
#[must_use]
pub fn page_id(file_name: &str) -> &str {
    file_name.strip_suffix(".html").unwrap_or(file_name)
}

/// Names of the page templates at the top of `content_dir`, sorted.
#[must_use]
pub fn page_files(content_dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(content_dir) else {
        warn!(dir = %content_dir.display(), "content directory not readable");
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter_map(|p: PathBuf| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .filter(|n| n.ends_with(".html"))
        .collect();
    names.sort();
    names
}
