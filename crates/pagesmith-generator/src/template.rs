//! Template loading and rendering.
//!
//! Shared templates (layouts, partials) are loaded once from the templates
//! directory. Page templates are looked up by name in the content directory
//! when they are rendered, so a broken page only ever fails itself.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tera::{Context, Tera};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Template not found in any search directory.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Template could not be read.
    #[error("failed to read template {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Parsing, inheritance or rendering failed.
    #[error("{}", error_chain(.0))]
    Tera(#[from] tera::Error),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Flatten a tera error and its causes into one line.
fn error_chain(err: &tera::Error) -> String {
    let mut chain = vec![err.to_string()];
    let mut source = std::error::Error::source(err);

    while let Some(err) = source {
        chain.push(err.to_string());
        source = err.source();
    }

    chain.join(": ")
}

/// Templates available to page rendering.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    shared: Vec<(String, String)>,
    content_dir: PathBuf,
}

impl TemplateSet {
    /// Load shared templates from `templates_dir` and look up pages in
    /// `content_dir`.
    ///
    /// A missing templates directory simply yields no shared templates.
    #[must_use]
    pub fn load(templates_dir: &Path, content_dir: &Path) -> Self {
        let shared = read_templates(templates_dir);
        debug!(
            count = shared.len(),
            dir = %templates_dir.display(),
            "loaded shared templates"
        );

        Self {
            shared,
            content_dir: content_dir.to_path_buf(),
        }
    }

    /// Whether a shared template with this name is loaded.
    #[must_use]
    pub fn has_shared(&self, name: &str) -> bool {
        self.shared.iter().any(|(n, _)| n == name)
    }

    /// Render the template `name` with the given context.
    ///
    /// Shared templates take precedence over page templates of the same
    /// name.
    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        let mut sources = self.shared.clone();

        if !self.has_shared(name) {
            let path = self.content_dir.join(name);
            if !path.is_file() {
                return Err(TemplateError::NotFound(name.to_string()));
            }

            let content = fs::read_to_string(&path).map_err(|source| TemplateError::Read {
                name: name.to_string(),
                source,
            })?;
            sources.push((name.to_string(), content));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(sources)?;

        Ok(tera.render(name, context)?)
    }
}

/// Read every file below `dir`, named by its `/`-separated relative path.
fn read_templates(dir: &Path) -> Vec<(String, String)> {
    let mut templates = Vec::new();

    if !dir.is_dir() {
        return templates;
    }

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        match fs::read_to_string(entry.path()) {
            Ok(content) => templates.push((name, content)),
            Err(e) => warn!(template = %name, error = %e, "skipping unreadable template"),
        }
    }

    templates
}
