//! On-disk layout of a pagesmith project.

use std::path::{Path, PathBuf};

/// Paths of every input and output location, resolved against a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Create a layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Site configuration document (`config.yaml`).
    #[must_use]
    pub fn site_config(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    /// Per-page metadata document (`data/pages.yaml`).
    #[must_use]
    pub fn page_config(&self) -> PathBuf {
        self.data_dir().join("pages.yaml")
    }

    /// Directory holding data documents.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Source tree holding templates and content.
    #[must_use]
    pub fn source_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    /// Shared templates (layouts, partials).
    #[must_use]
    pub fn templates_dir(&self) -> PathBuf {
        self.source_dir().join("templates")
    }

    /// One template per rendered page.
    #[must_use]
    pub fn content_dir(&self) -> PathBuf {
        self.source_dir().join("content")
    }

    /// Static assets.
    #[must_use]
    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    /// Stylesheet fed to the CSS compiler.
    #[must_use]
    pub fn css_input(&self) -> PathBuf {
        self.assets_dir().join("css").join("styles.css")
    }

    /// Tailwind configuration passed to the CSS compiler.
    #[must_use]
    pub fn tailwind_config(&self) -> PathBuf {
        self.root.join("tailwind.config.js")
    }

    /// Output root of the generated site.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.root.join("public")
    }

    /// Compiled stylesheet.
    #[must_use]
    pub fn css_output(&self) -> PathBuf {
        self.output_dir().join("styles.css")
    }

    /// Directories watched recursively in development mode.
    #[must_use]
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        vec![self.source_dir(), self.data_dir(), self.assets_dir()]
    }
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self::new(".")
    }
}
