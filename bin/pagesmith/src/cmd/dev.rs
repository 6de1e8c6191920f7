//! Dev command - build, serve and rebuild on change

use std::path::Path;

use color_eyre::eyre::Result;
use pagesmith_core::ProjectLayout;
use pagesmith_generator::Builder;

use crate::session::{DevOptions, DevSession};

/// Run `dev serve` until Ctrl-C.
pub async fn serve(root: &Path, options: DevOptions) -> Result<()> {
    tracing::info!(?root, ?options, "Starting dev server");

    let builder = Builder::new(ProjectLayout::new(root));
    let mut session = DevSession::new(builder, options);
    session.serve(shutdown_signal()).await
}

/// Run `dev watch` until Ctrl-C.
pub async fn watch(root: &Path) -> Result<()> {
    tracing::info!(?root, "Starting watch mode");

    let builder = Builder::new(ProjectLayout::new(root));
    let mut session = DevSession::new(builder, DevOptions::default());
    session.watch(shutdown_signal()).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
