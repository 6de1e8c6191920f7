//! Live reload over WebSocket.
//!
//! Browsers load a small snippet that connects to the reload channel and
//! refreshes the page whenever a `reload` message arrives.

use std::{
    collections::HashSet,
    fs,
    net::{Ipv4Addr, SocketAddr},
    path::Path,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use color_eyre::eyre::{Result, WrapErr};
use tokio::{
    net::TcpListener,
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use walkdir::WalkDir;

/// Default live reload WebSocket port.
pub const DEFAULT_RELOAD_PORT: u16 = 9000;

/// Message that tells a browser to reload.
pub const RELOAD_MESSAGE: &str = "reload";

const SNIPPET_TEMPLATE: &str = r#"<script>
(function () {
  function connect(reconnecting) {
    var socket = new WebSocket("ws://localhost:__PORT__");
    socket.onopen = function () {
      if (reconnecting) {
        location.reload();
      }
    };
    socket.onmessage = function (event) {
      if (event.data === "reload") {
        location.reload();
      }
    };
    socket.onclose = function () {
      setTimeout(function () {
        connect(true);
      }, 2000);
    };
  }
  connect(false);
})();
</script>
"#;

/// Live reload snippet for a channel on `port`.
#[must_use]
pub fn snippet(port: u16) -> String {
    SNIPPET_TEMPLATE.replace("__PORT__", &port.to_string())
}

/// Insert `snippet` before `</body>` in every HTML file under `output_dir`.
///
/// Files that already contain the snippet or have no `</body>` are left
/// alone. Returns the number of files changed.
pub fn inject_into_tree(output_dir: &Path, snippet: &str) -> usize {
    let mut injected = 0;

    for entry in WalkDir::new(output_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "html"))
    {
        let path = entry.path();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read HTML file");
                continue;
            }
        };

        if content.contains(snippet) {
            trace!(path = %path.display(), "snippet already present");
            continue;
        }

        let Some(pos) = content.rfind("</body>") else {
            warn!(path = %path.display(), "no </body> tag, live reload not injected");
            continue;
        };

        let mut html = String::with_capacity(content.len() + snippet.len());
        html.push_str(&content[..pos]);
        html.push_str(snippet);
        html.push_str(&content[pos..]);

        if let Err(e) = fs::write(path, html) {
            warn!(path = %path.display(), error = %e, "cannot write HTML file");
            continue;
        }
        injected += 1;
    }

    debug!(dir = %output_dir.display(), injected, "live reload injection done");
    injected
}

/// Connected live reload clients.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    next_id: AtomicU64,
    clients: Mutex<HashSet<u64>>,
}

impl ClientRegistry {
    fn clients(&self) -> std::sync::MutexGuard<'_, HashSet<u64>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new client and return its id.
    pub fn register(&self) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.clients().insert(id);
        id
    }

    /// Forget a client.
    pub fn unregister(&self, id: u64) {
        self.clients().remove(&id);
    }

    /// Number of connected clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cloneable handle for notifying browsers.
#[derive(Debug, Clone)]
pub struct ReloadHandle {
    sender: broadcast::Sender<&'static str>,
    clients: Arc<ClientRegistry>,
    snippet: Arc<str>,
}

impl ReloadHandle {
    /// Tell every connected browser to reload.
    ///
    /// Returns the number of clients notified.
    pub fn broadcast_reload(&self) -> usize {
        match self.sender.send(RELOAD_MESSAGE) {
            Ok(count) => {
                info!(clients = count, "reload sent");
                count
            }
            Err(_) => {
                debug!("no live reload clients connected");
                0
            }
        }
    }

    /// Number of connected clients.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Snippet that connects to this channel.
    #[must_use]
    pub fn snippet(&self) -> &str {
        &self.snippet
    }
}

#[derive(Clone)]
struct ChannelState {
    sender: broadcast::Sender<&'static str>,
    clients: Arc<ClientRegistry>,
    shutdown: CancellationToken,
}

/// Running live reload WebSocket server.
#[derive(Debug)]
pub struct LiveReload {
    port: u16,
    handle: ReloadHandle,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl LiveReload {
    /// Start the channel on `127.0.0.1:port`.
    ///
    /// Port `0` picks any free port; [`port`](Self::port) reports it.
    pub async fn start(port: u16) -> Result<Self> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        let listener = TcpListener::bind(addr)
            .await
            .wrap_err_with(|| format!("Failed to bind to {addr}"))?;
        let port = listener
            .local_addr()
            .wrap_err("Failed to read live reload address")?
            .port();

        let (sender, _) = broadcast::channel(16);
        let clients = Arc::new(ClientRegistry::default());
        let shutdown = CancellationToken::new();

        let state = ChannelState {
            sender: sender.clone(),
            clients: Arc::clone(&clients),
            shutdown: shutdown.clone(),
        };
        let app = Router::new().route("/", get(upgrade)).with_state(state);

        let stop = shutdown.clone();
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { stop.cancelled().await })
                .await;
            if let Err(e) = result {
                error!(error = %e, "live reload server error");
            }
        });

        info!(port, "live reload listening");

        Ok(Self {
            port,
            handle: ReloadHandle {
                sender,
                clients,
                snippet: snippet(port).into(),
            },
            shutdown,
            task,
        })
    }

    /// Bound port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Handle for broadcasting from other tasks.
    #[must_use]
    pub fn handle(&self) -> ReloadHandle {
        self.handle.clone()
    }

    /// Tell every connected browser to reload.
    pub fn broadcast_reload(&self) -> usize {
        self.handle.broadcast_reload()
    }

    /// Close every socket, stop accepting and wait for the server task.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "live reload task failed");
        }
        info!("live reload stopped");
    }
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<ChannelState>) -> Response {
    ws.on_upgrade(move |socket| client_session(socket, state))
}

async fn client_session(mut socket: WebSocket, state: ChannelState) {
    let mut reloads = state.sender.subscribe();
    let id = state.clients.register();
    info!(client = id, "live reload client connected");

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            message = reloads.recv() => match message {
                Ok(text) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(client = id, skipped, "client lagged behind");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.clients.unregister(id);
    info!(client = id, "live reload client disconnected");
}
