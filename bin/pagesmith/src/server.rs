//! Development file server.
//!
//! Serves the output directory with clean-URL fallback and caching
//! disabled, so a browser always sees the latest build.

use std::{
    net::{Ipv4Addr, TcpListener as StdTcpListener},
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use color_eyre::eyre::{Result, WrapErr, eyre};
use percent_encoding::percent_decode_str;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::{services::ServeFile, set_header::SetResponseHeaderLayer};
use tracing::{debug, error, info, trace};

use crate::session::ServerLifecycle;

/// First port probed for the file server.
pub const DEFAULT_PORT: u16 = 8000;

/// Bind the first free port on all interfaces, starting at `start`.
pub fn bind_first_free(start: u16) -> Result<(StdTcpListener, u16)> {
    for port in start..=u16::MAX {
        match StdTcpListener::bind((Ipv4Addr::UNSPECIFIED, port)) {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => trace!(port, error = %e, "port unavailable"),
        }
    }
    Err(eyre!("no free port between {start} and {}", u16::MAX))
}

/// Map a request path onto a file under `root`.
///
/// Tries the file itself, then the same path with `.html` appended, then
/// the site's `index.html`.
#[must_use]
pub fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(request_path).decode_utf8_lossy();
    let relative: PathBuf = Path::new(decoded.trim_end_matches('/'))
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();

    if !relative.as_os_str().is_empty() {
        let candidate = root.join(&relative);
        if candidate.is_file() {
            return Some(candidate);
        }

        let mut html = candidate.into_os_string();
        html.push(".html");
        let html = PathBuf::from(html);
        if html.is_file() {
            return Some(html);
        }
    }

    let index = root.join("index.html");
    index.is_file().then_some(index)
}

/// Create the file server router for `root`.
pub fn router(root: PathBuf) -> Router {
    Router::new()
        .fallback(serve_path)
        .with_state(Arc::new(root))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
}

async fn serve_path(State(root): State<Arc<PathBuf>>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    let Some(file) = resolve(&root, &path) else {
        debug!(path = %path, "not found");
        return StatusCode::NOT_FOUND.into_response();
    };

    trace!(path = %path, file = %file.display(), "serving");
    match ServeFile::new(&file).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

/// Start serving `root` on the first free port from `start_port`.
///
/// The server runs until `lifecycle` is stopped. Returns the bound port.
pub async fn spawn(root: PathBuf, start_port: u16, lifecycle: ServerLifecycle) -> Result<u16> {
    let (listener, port) = bind_first_free(start_port)?;
    listener
        .set_nonblocking(true)
        .wrap_err("Failed to configure listener")?;
    let listener = TcpListener::from_std(listener).wrap_err("Failed to register listener")?;

    info!(port, root = %root.display(), "file server listening");

    let app = router(root);
    tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { lifecycle.stopped().await })
            .await;
        if let Err(e) = result {
            error!(error = %e, "file server error");
        }
        debug!("file server stopped");
    });

    Ok(port)
}
