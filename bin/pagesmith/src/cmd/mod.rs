//! Command implementations.

pub mod build;
pub mod dev;

use std::{fmt::Write as _, path::Path};

use pagesmith_generator::BuildStats;

/// Human readable build summary shared by `build` and the dev sessions.
pub(crate) fn build_summary(stats: &BuildStats, output: &Path) -> String {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };

    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "  Build completed!");
    let _ = writeln!(out);
    let _ = writeln!(out, "  Pages:      {}", stats.pages);
    if stats.failed_pages > 0 {
        let _ = writeln!(out, "  Failed:     {}", stats.failed_pages);
    }
    let _ = writeln!(out, "  Assets:     {}", stats.assets);
    let _ = writeln!(
        out,
        "  CSS:        {}",
        if stats.css { "built" } else { "skipped" }
    );
    let _ = writeln!(out, "  Sitemap:    {}", yes_no(stats.sitemap));
    let _ = writeln!(out, "  robots.txt: {}", yes_no(stats.robots));
    let _ = writeln!(out);
    let _ = writeln!(out, "  Duration:   {}ms", stats.duration_ms);
    let _ = writeln!(out, "  Output:     {}", output.display());
    out
}

pub(crate) fn print_build_summary(stats: &BuildStats, output: &Path) {
    println!("{}", build_summary(stats, output));
}
