//! Build orchestration.
//!
//! Coordinates the full site build process.

use std::{fs, time::Instant};

use pagesmith_core::{PageConfig, ProjectLayout, SiteConfig};
use thiserror::Error;
use tracing::{error, info};

use crate::{
    assets::AssetProcessor,
    css::CssCompiler,
    pages::PageRenderer,
    robots::{RobotsError, RobotsGenerator},
    sitemap::{SitemapError, SitemapGenerator},
    template::TemplateSet,
};

/// Build errors.
///
/// Only failures that would leave the site half generated surface here;
/// page, asset and stylesheet failures are logged and the build goes on.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Sitemap generation error.
    #[error("sitemap error: {0}")]
    Sitemap(#[from] SitemapError),

    /// Robots generation error.
    #[error("robots.txt error: {0}")]
    Robots(#[from] RobotsError),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of pages rendered.
    pub pages: usize,

    /// Number of pages skipped because of errors.
    pub failed_pages: usize,

    /// Number of assets copied.
    pub assets: usize,

    /// Whether the stylesheet was compiled.
    pub css: bool,

    /// Whether sitemap.xml was written.
    pub sitemap: bool,

    /// Whether robots.txt was written.
    pub robots: bool,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Site builder that orchestrates the build process.
#[derive(Debug, Clone)]
pub struct Builder {
    layout: ProjectLayout,
    base_url: Option<String>,
    css_program: Option<String>,
}

impl Builder {
    /// Create a new builder for the project at `layout`.
    #[must_use]
    pub fn new(layout: ProjectLayout) -> Self {
        Self {
            layout,
            base_url: None,
            css_program: None,
        }
    }

    /// Override `base_url` from the site configuration.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Use a different CSS compiler program.
    #[must_use]
    pub fn with_css_program(mut self, program: impl Into<String>) -> Self {
        self.css_program = Some(program.into());
        self
    }

    /// Project layout this builder reads from and writes to.
    #[must_use]
    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Execute the full build process.
    ///
    /// Configuration is re-read on every call.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();
        let mut stats = BuildStats::default();
        let layout = &self.layout;
        let output_dir = layout.output_dir();

        info!(
            root = %layout.root().display(),
            output = %output_dir.display(),
            "starting build"
        );

        // 1. Load configuration
        let pages = PageConfig::load_or_default(&layout.page_config());
        let mut site = SiteConfig::load_or_default(&layout.site_config());
        if let Some(ref base_url) = self.base_url {
            info!(base_url = %base_url, "overriding site base_url");
            site.base_url = base_url.clone();
        }

        fs::create_dir_all(&output_dir)?;

        // 2. Compile CSS
        stats.css = self.compile_css();

        // 3. Render pages
        let templates = TemplateSet::load(&layout.templates_dir(), &layout.content_dir());
        let summary =
            PageRenderer::new(&templates, &site, &pages).render_all(&layout.content_dir(), &output_dir);
        stats.pages = summary.rendered.len();
        stats.failed_pages = summary.failed.len();

        // 4. Copy static assets
        match AssetProcessor::new(site.minify_js).process(&layout.assets_dir(), &output_dir) {
            Ok(count) => stats.assets = count,
            Err(e) => error!(error = %e, "failed to copy assets"),
        }

        // 5. Generate sitemap and robots.txt
        self.generate_site_assets(&site, &pages, &mut stats)?;

        stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            pages = stats.pages,
            failed_pages = stats.failed_pages,
            assets = stats.assets,
            css = stats.css,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Compile the stylesheet; failures are logged and reported as `false`.
    fn compile_css(&self) -> bool {
        let layout = &self.layout;
        let mut compiler =
            CssCompiler::new(layout.css_input(), layout.css_output(), layout.tailwind_config());
        if let Some(ref program) = self.css_program {
            compiler = compiler.with_program(program.clone());
        }

        match compiler.compile() {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "failed to build CSS");
                false
            }
        }
    }

    /// Generate sitemap.xml and robots.txt.
    fn generate_site_assets(
        &self,
        site: &SiteConfig,
        pages: &PageConfig,
        stats: &mut BuildStats,
    ) -> Result<()> {
        if site.base_url.is_empty() {
            error!("base_url not found in config.yaml, skipping sitemap and robots.txt");
            return Ok(());
        }

        let output_dir = self.layout.output_dir();

        if site.generate_sitemap {
            SitemapGenerator::new(site, pages).write(&output_dir)?;
            stats.sitemap = true;
        } else {
            info!("sitemap generation is disabled in config");
        }

        if site.generate_robots {
            RobotsGenerator::new(site).generate(&output_dir)?;
            stats.robots = true;
        } else {
            info!("robots.txt generation is disabled in config");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;

    fn project(config: &str) -> TempDir {
        let root = TempDir::new().unwrap();
        let p = root.path();
        fs::create_dir_all(p.join("src/templates")).unwrap();
        fs::create_dir_all(p.join("src/content")).unwrap();
        fs::create_dir_all(p.join("data")).unwrap();
        fs::write(p.join("config.yaml"), config).unwrap();
        fs::write(
            p.join("src/templates/base.html"),
            "<html><body>{% block body %}{% endblock body %}</body></html>",
        )
        .unwrap();
        fs::write(
            p.join("src/content/index.html"),
            "{% extends \"base.html\" %}{% block body %}home {{ version }}{% endblock body %}",
        )
        .unwrap();
        root
    }

    fn read(root: &Path, file: &str) -> String {
        fs::read_to_string(root.join(file)).unwrap()
    }

    #[test]
    fn test_build_empty_project() {
        let root = TempDir::new().unwrap();
        let stats = Builder::new(ProjectLayout::new(root.path())).build().unwrap();

        assert_eq!(stats.pages, 0);
        assert!(!stats.sitemap);
        assert!(root.path().join("public").is_dir());
    }

    #[test]
    fn test_build_renders_and_generates() {
        let root = project(
            "version: 2.0.0\nbase_url: https://example.com\ngenerate_sitemap: true\ngenerate_robots: true\n",
        );

        let stats = Builder::new(ProjectLayout::new(root.path())).build().unwrap();

        assert_eq!(stats.pages, 1);
        assert!(stats.sitemap);
        assert!(stats.robots);
        assert_eq!(
            read(root.path(), "public/index.html"),
            "<html><body>home 2.0.0</body></html>"
        );
        assert!(read(root.path(), "public/sitemap.xml").contains("<priority>1.0</priority>"));
        assert!(read(root.path(), "public/robots.txt").contains("Sitemap: https://example.com/sitemap.xml"));
    }

    #[test]
    fn test_build_without_base_url_skips_site_assets() {
        let root = project("generate_sitemap: true\ngenerate_robots: true\n");

        let stats = Builder::new(ProjectLayout::new(root.path())).build().unwrap();

        assert_eq!(stats.pages, 1);
        assert!(!stats.sitemap);
        assert!(!root.path().join("public/sitemap.xml").exists());
        assert!(!root.path().join("public/robots.txt").exists());
    }

    #[test]
    fn test_base_url_override() {
        let root = project("base_url: https://old.example\ngenerate_robots: true\n");

        Builder::new(ProjectLayout::new(root.path()))
            .with_base_url("https://new.example")
            .build()
            .unwrap();

        assert!(read(root.path(), "public/robots.txt").contains("https://new.example/sitemap.xml"));
    }

    #[test]
    fn test_css_failure_does_not_abort_build() {
        let root = project("");
        fs::create_dir_all(root.path().join("assets/css")).unwrap();
        fs::write(root.path().join("assets/css/styles.css"), "@tailwind base;").unwrap();

        let stats = Builder::new(ProjectLayout::new(root.path()))
            .with_css_program("pagesmith-no-such-css-tool")
            .build()
            .unwrap();

        assert!(!stats.css);
        assert_eq!(stats.pages, 1);
    }

    #[test]
    fn test_malformed_config_uses_defaults() {
        let root = project("version: [oops\n");

        let stats = Builder::new(ProjectLayout::new(root.path())).build().unwrap();

        assert_eq!(stats.pages, 1);
        assert_eq!(
            read(root.path(), "public/index.html"),
            "<html><body>home 1.0.0</body></html>"
        );
    }
}
