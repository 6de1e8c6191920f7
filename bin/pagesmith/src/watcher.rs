//! Change detection and debounced rebuilds.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

use color_eyre::eyre::{Result, WrapErr};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use pagesmith_core::ProjectLayout;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, trace, warn};

use crate::session::ServerLifecycle;

/// Minimum time between two accepted rebuild triggers.
pub const COOLDOWN: Duration = Duration::from_secs(1);

/// File extensions whose changes trigger a rebuild.
pub const WATCHED_EXTENSIONS: [&str; 6] = ["html", "css", "js", "md", "yml", "yaml"];

/// Something that can rebuild the site.
pub trait Rebuild: Send + Sync + 'static {
    /// Run one rebuild to completion.
    fn rebuild(&self) -> Result<()>;
}

/// Debounce state.
#[derive(Debug, Clone)]
pub struct WatchState {
    last_trigger: Option<Instant>,
    cooldown: Duration,
}

impl WatchState {
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_trigger: None,
            cooldown,
        }
    }

    /// Accept a trigger at `now` unless the previous one is too recent.
    pub fn try_trigger(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_trigger
            && now.saturating_duration_since(last) < self.cooldown
        {
            return false;
        }
        self.last_trigger = Some(now);
        true
    }
}

impl Default for WatchState {
    fn default() -> Self {
        Self::new(COOLDOWN)
    }
}

fn has_watched_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| WATCHED_EXTENSIONS.contains(&ext))
}

/// Whether `event` should trigger a rebuild.
#[must_use]
pub fn is_relevant(event: &Event) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    if event.paths.iter().all(|p| p.is_dir()) {
        return false;
    }
    event.paths.iter().any(|p| has_watched_extension(p))
}

/// Watches the project sources and rebuilds on change.
#[derive(Debug)]
pub struct ChangeDetector<R> {
    targets: Vec<(PathBuf, RecursiveMode)>,
    rebuild: Arc<R>,
    state: WatchState,
}

impl<R: Rebuild> ChangeDetector<R> {
    /// Watch the source, data and asset directories that exist, plus the
    /// project root itself.
    pub fn new(layout: &ProjectLayout, rebuild: R) -> Self {
        let mut targets: Vec<_> = layout
            .watched_dirs()
            .into_iter()
            .filter(|dir| dir.is_dir())
            .map(|dir| (dir, RecursiveMode::Recursive))
            .collect();
        targets.push((layout.root().to_path_buf(), RecursiveMode::NonRecursive));

        Self {
            targets,
            rebuild: Arc::new(rebuild),
            state: WatchState::default(),
        }
    }

    /// Use a different debounce interval.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.state = WatchState::new(cooldown);
        self
    }

    /// Paths that will be watched.
    pub fn targets(&self) -> impl Iterator<Item = &Path> {
        self.targets.iter().map(|(path, _)| path.as_path())
    }

    /// Start watching with the platform file watcher.
    pub fn start(self, lifecycle: ServerLifecycle) -> Result<JoinHandle<()>> {
        let (tx, rx) = mpsc::channel(64);
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = tx.blocking_send(res);
            },
            notify::Config::default(),
        )
        .wrap_err("Failed to create file watcher")?;

        self.start_with(watcher, rx, lifecycle)
    }

    /// Start watching with `watcher`, whose events arrive on `events`.
    pub fn start_with<W>(
        self,
        mut watcher: W,
        events: mpsc::Receiver<notify::Result<Event>>,
        lifecycle: ServerLifecycle,
    ) -> Result<JoinHandle<()>>
    where
        W: Watcher + Send + 'static,
    {
        for (path, mode) in &self.targets {
            watcher
                .watch(path, *mode)
                .wrap_err_with(|| format!("Failed to watch {}", path.display()))?;
            debug!(path = %path.display(), ?mode, "watching");
        }

        let watched: Vec<PathBuf> = self.targets.iter().map(|(p, _)| p.clone()).collect();
        info!(paths = watched.len(), "change detector started");

        Ok(tokio::spawn(async move {
            self.run(events, lifecycle).await;

            for path in &watched {
                if let Err(e) = watcher.unwatch(path) {
                    debug!(path = %path.display(), error = %e, "unwatch failed");
                }
            }
            info!("change detector stopped");
        }))
    }

    async fn run(
        mut self,
        mut events: mpsc::Receiver<notify::Result<Event>>,
        lifecycle: ServerLifecycle,
    ) {
        loop {
            let event = tokio::select! {
                _ = lifecycle.stopped() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            match event {
                Ok(event) => {
                    self.handle(event).await;
                }
                Err(e) => warn!(error = %e, "watch error"),
            }
        }
    }

    /// Rebuild for `event` if it qualifies. Returns whether a rebuild ran.
    pub async fn handle(&mut self, event: Event) -> bool {
        if !is_relevant(&event) {
            trace!(kind = ?event.kind, paths = ?event.paths, "ignoring event");
            return false;
        }
        if !self.state.try_trigger(Instant::now()) {
            debug!(paths = ?event.paths, "change within cooldown, skipping");
            return false;
        }

        info!(paths = ?event.paths, "change detected, rebuilding");
        let rebuild = Arc::clone(&self.rebuild);
        match tokio::task::spawn_blocking(move || rebuild.rebuild()).await {
            Ok(Ok(())) => info!("rebuild complete"),
            Ok(Err(e)) => error!(error = ?e, "rebuild failed"),
            Err(e) => error!(error = %e, "rebuild task failed"),
        }
        true
    }
}
