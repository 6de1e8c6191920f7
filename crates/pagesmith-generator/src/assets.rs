//! Static asset processing.
//!
//! Copies images and icons verbatim and JavaScript files with optional
//! minification.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};

use crate::minify::minify_js;

/// Asset processing errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid asset path.
    #[error("invalid asset path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Asset directories copied verbatim, relative to the assets and output roots.
const COPIED_DIRS: [(&str, &str); 2] = [("images", "images"), ("icons", "icons")];

/// Asset processor for copying static files into the output tree.
#[derive(Debug)]
pub struct AssetProcessor {
    /// Whether JavaScript is minified while copying.
    minify_js: bool,
}

impl AssetProcessor {
    /// Create a new asset processor.
    #[must_use]
    pub fn new(minify_js: bool) -> Self {
        Self { minify_js }
    }

    /// Copy every asset group from `assets_dir` into `output_dir`.
    ///
    /// Returns the number of files written.
    pub fn process(&self, assets_dir: &Path, output_dir: &Path) -> Result<usize> {
        let mut count = 0;

        for (src, dest) in COPIED_DIRS {
            let source = assets_dir.join(src);
            if !source.is_dir() {
                continue;
            }
            let dest = output_dir.join(dest);
            let copied = self.copy_tree(&source, &dest)?;
            info!(
                source = %source.display(),
                dest = %dest.display(),
                count = copied,
                "copied assets"
            );
            count += copied;
        }

        let js_dir = assets_dir.join("js");
        if js_dir.is_dir() {
            let dest = output_dir.join("js");
            let copied = self.copy_scripts(&js_dir, &dest)?;
            info!(
                source = %js_dir.display(),
                dest = %dest.display(),
                count = copied,
                minified = self.minify_js,
                "copied scripts"
            );
            count += copied;
        }

        Ok(count)
    }

    /// Recursively copy a directory, skipping hidden entries.
    fn copy_tree(&self, source_dir: &Path, dest_dir: &Path) -> Result<usize> {
        Self::ensure_dir(dest_dir)?;
        self.copy_dir(source_dir, source_dir, dest_dir)
    }

    fn copy_dir(&self, base_dir: &Path, current_dir: &Path, dest_base: &Path) -> Result<usize> {
        let mut count = 0;

        for entry in fs::read_dir(current_dir)? {
            let entry = entry?;
            let path = entry.path();

            // Skip hidden files/directories
            if path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with('.'))
            {
                continue;
            }

            if path.is_dir() {
                count += self.copy_dir(base_dir, &path, dest_base)?;
            } else if path.is_file() {
                let relative = path
                    .strip_prefix(base_dir)
                    .map_err(|_| AssetError::InvalidPath(path.clone()))?;
                let dest_path = dest_base.join(relative);
                Self::copy_file(&path, &dest_path)?;
                debug!(src = %path.display(), dest = %dest_path.display(), "copied asset");
                count += 1;
            }
        }

        Ok(count)
    }

    /// Copy top-level `*.js` files, minifying them when enabled.
    fn copy_scripts(&self, source_dir: &Path, dest_dir: &Path) -> Result<usize> {
        Self::ensure_dir(dest_dir)?;
        let mut count = 0;

        for entry in fs::read_dir(source_dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "js") {
                continue;
            }
            let Some(name) = path.file_name() else {
                continue;
            };

            let source = fs::read_to_string(&path)?;
            let output = if self.minify_js {
                minify_js(&source)
            } else {
                source
            };
            fs::write(dest_dir.join(name), output)?;
            count += 1;
        }

        Ok(count)
    }

    /// Copy a single file, creating parent directories.
    pub fn copy_file(source: &Path, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, dest)?;
        Ok(())
    }

    /// Create a directory if it doesn't exist.
    pub fn ensure_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }
}
