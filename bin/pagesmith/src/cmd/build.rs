//! Build command - generates the static site

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use pagesmith_core::ProjectLayout;
use pagesmith_generator::{BuildStats, Builder};

/// Run the build command.
///
/// Builds the site under `root` into its output directory.
pub fn run(root: &Path, base_url: Option<&str>) -> Result<BuildStats> {
    tracing::info!(?root, ?base_url, "Starting build");

    let layout = ProjectLayout::new(root);
    let output = layout.output_dir();

    let mut builder = Builder::new(layout);
    if let Some(url) = base_url {
        builder = builder.with_base_url(url);
    }

    let stats = builder.build().wrap_err("Build failed")?;

    super::print_build_summary(&stats, &output);
    tracing::info!(?stats, "Build completed");

    Ok(stats)
}
