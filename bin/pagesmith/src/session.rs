//! Dev session orchestration.
//!
//! A session runs one full build, then keeps the file server, the live
//! reload channel and the change detector alive until it is asked to stop.
//! All three share a single [`ServerLifecycle`].

use std::future::Future;

use color_eyre::eyre::{Result, WrapErr, eyre};
use pagesmith_generator::{BuildStats, Builder};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    cmd,
    livereload::{self, DEFAULT_RELOAD_PORT, LiveReload, ReloadHandle},
    server::{self, DEFAULT_PORT},
    watcher::{ChangeDetector, Rebuild},
};

/// Shared stop signal for everything a session starts.
#[derive(Debug, Clone, Default)]
pub struct ServerLifecycle {
    token: CancellationToken,
}

impl ServerLifecycle {
    /// Create a running lifecycle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every component to stop.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Whether [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the lifecycle is stopped.
    pub async fn stopped(&self) {
        self.token.cancelled().await;
    }
}

/// Session states, in the order a session moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Building,
    ServingWatching,
    Stopping,
    Stopped,
}

/// Options for `dev serve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevOptions {
    /// First port probed for the file server.
    pub port: u16,

    /// Live reload WebSocket port.
    pub reload_port: u16,

    /// Open the site in a browser once it is served.
    pub open: bool,
}

impl Default for DevOptions {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            reload_port: DEFAULT_RELOAD_PORT,
            open: false,
        }
    }
}

/// Rebuild hook used by the change detector.
///
/// In serve mode it re-injects the live reload snippet after every build,
/// failed ones included, and notifies browsers when the build succeeded.
#[derive(Debug)]
pub struct SiteRebuild {
    builder: Builder,
    reload: Option<ReloadHandle>,
}

impl SiteRebuild {
    /// Rebuild only.
    #[must_use]
    pub fn new(builder: Builder) -> Self {
        Self {
            builder,
            reload: None,
        }
    }

    /// Rebuild, re-inject and broadcast through `reload`.
    #[must_use]
    pub fn with_reload(mut self, reload: ReloadHandle) -> Self {
        self.reload = Some(reload);
        self
    }
}

impl Rebuild for SiteRebuild {
    fn rebuild(&self) -> Result<()> {
        let result = self.builder.build();

        // Pages may have been rewritten even when a later step failed.
        if let Some(ref reload) = self.reload {
            let output_dir = self.builder.layout().output_dir();
            let injected = livereload::inject_into_tree(&output_dir, reload.snippet());
            debug!(injected, "live reload snippet injected");
            if result.is_ok() {
                reload.broadcast_reload();
            }
        }

        let stats = result.wrap_err("Rebuild failed")?;
        debug!(?stats, "rebuild finished");
        Ok(())
    }
}

/// A single dev session.
#[derive(Debug)]
pub struct DevSession {
    builder: Builder,
    options: DevOptions,
    lifecycle: ServerLifecycle,
    state: SessionState,
}

impl DevSession {
    /// Create an idle session.
    #[must_use]
    pub fn new(builder: Builder, options: DevOptions) -> Self {
        Self {
            builder,
            options,
            lifecycle: ServerLifecycle::new(),
            state: SessionState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handle to the session lifecycle.
    #[must_use]
    pub fn lifecycle(&self) -> ServerLifecycle {
        self.lifecycle.clone()
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.state == SessionState::Idle {
            Ok(())
        } else {
            Err(eyre!("dev session already started ({:?})", self.state))
        }
    }

    /// Build, then serve and watch until `shutdown` resolves.
    pub async fn serve(&mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        self.ensure_idle()?;
        self.transition(SessionState::Building);

        let output_dir = self.builder.layout().output_dir();
        let stats = self.initial_build().await?;
        cmd::print_build_summary(&stats, &output_dir);

        let live_reload = LiveReload::start(self.options.reload_port)
            .await
            .wrap_err("Failed to start live reload server")?;
        let reload = live_reload.handle();
        let injected = livereload::inject_into_tree(&output_dir, reload.snippet());
        debug!(injected, "live reload snippet injected");

        let port = server::spawn(output_dir, self.options.port, self.lifecycle.clone())
            .await
            .wrap_err("Failed to start file server")?;

        let rebuild = SiteRebuild::new(self.builder.clone()).with_reload(reload);
        let detector = ChangeDetector::new(self.builder.layout(), rebuild)
            .start(self.lifecycle.clone())
            .wrap_err("Failed to start change detector")?;

        self.transition(SessionState::ServingWatching);

        let url = format!("http://localhost:{port}");
        println!();
        println!("  Serving at {url}");
        println!("  Live reload on ws://localhost:{}", live_reload.port());
        println!("  Press Ctrl+C to stop");
        println!();

        if self.options.open {
            if let Err(e) = open::that(&url) {
                warn!(url = %url, error = %e, "failed to open browser");
            }
        }

        shutdown.await;

        self.transition(SessionState::Stopping);
        self.lifecycle.stop();
        if let Err(e) = detector.await {
            warn!(error = %e, "change detector task failed");
        }
        live_reload.shutdown().await;
        self.transition(SessionState::Stopped);

        info!("dev session stopped");
        Ok(())
    }

    /// Build, then rebuild on change until `shutdown` resolves.
    ///
    /// Nothing is served and no snippet is injected.
    pub async fn watch(&mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        self.ensure_idle()?;
        self.transition(SessionState::Building);

        let stats = self.initial_build().await?;
        cmd::print_build_summary(&stats, &self.builder.layout().output_dir());

        let rebuild = SiteRebuild::new(self.builder.clone());
        let detector = ChangeDetector::new(self.builder.layout(), rebuild)
            .start(self.lifecycle.clone())
            .wrap_err("Failed to start change detector")?;

        self.transition(SessionState::ServingWatching);

        println!("  Watching for changes, press Ctrl+C to stop");

        shutdown.await;

        self.transition(SessionState::Stopping);
        self.lifecycle.stop();
        if let Err(e) = detector.await {
            warn!(error = %e, "change detector task failed");
        }
        self.transition(SessionState::Stopped);

        info!("watch session stopped");
        Ok(())
    }

    async fn initial_build(&self) -> Result<BuildStats> {
        info!("Running initial build...");
        let builder = self.builder.clone();
        tokio::task::spawn_blocking(move || builder.build())
            .await
            .wrap_err("Build task failed")?
            .wrap_err("Build failed")
    }
}
