//! Pagesmith CLI Library
//!
//! This library provides the command layer and the development server for
//! the Pagesmith static site generator. It is used by the binary entry point
//! and exposes the dev-mode building blocks for integration tests.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, dev)
//! - [`server`] - Static file server with clean-URL fallback
//! - [`livereload`] - WebSocket live reload channel and snippet injection
//! - [`watcher`] - Debounced change detector
//! - [`session`] - Dev session orchestration
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use pagesmith::cmd;
//!
//! // Build the site in the current directory
//! cmd::build::run(Path::new("."), None).unwrap();
//! ```

pub mod cmd;
pub mod livereload;
pub mod server;
pub mod session;
pub mod watcher;

// Re-export core types for convenience
pub use pagesmith_core::{PageConfig, ProjectLayout, SiteConfig};
pub use pagesmith_generator::{BuildStats, Builder};

use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Default log level for a `-v` count. `RUST_LOG` overrides it.
fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global log subscriber.
///
/// ```no_run
/// pagesmith::init_tracing(1);
/// ```
pub fn init_tracing(verbose: u8) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_for(verbose).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose > 1)
        .init();
}
