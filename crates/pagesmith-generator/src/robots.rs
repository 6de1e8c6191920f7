//! Robots.txt generation.
//!
//! Generates the robots.txt file for search engine crawlers.

use std::{fs::File, io::Write, path::Path};

use pagesmith_core::SiteConfig;
use thiserror::Error;
use tracing::info;

/// Robots generation errors.
#[derive(Debug, Error)]
pub enum RobotsError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for robots generation.
pub type Result<T> = std::result::Result<T, RobotsError>;

/// Robots.txt generator.
#[derive(Debug)]
pub struct RobotsGenerator<'a> {
    site: &'a SiteConfig,
}

impl<'a> RobotsGenerator<'a> {
    /// Create a new robots generator.
    #[must_use]
    pub fn new(site: &'a SiteConfig) -> Self {
        Self { site }
    }

    /// Write robots.txt into the output root.
    pub fn generate(&self, output_dir: &Path) -> Result<()> {
        let path = output_dir.join("robots.txt");
        let mut file = File::create(&path)?;

        writeln!(file, "User-agent: *")?;
        writeln!(file, "Allow: /")?;
        writeln!(file, "Sitemap: {}", self.site.url_for("sitemap.xml"))?;

        info!(path = %path.display(), "robots.txt created");
        Ok(())
    }
}
