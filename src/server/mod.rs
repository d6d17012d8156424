//! Favorites daemon — resolves and toggles favorites over a Unix socket.
//!
//! Architecture: channel-based actor. A single server loop owns all
//! mutable state ([`state::ServerState`]). Per-connection tasks forward
//! requests via an mpsc channel and await the reply on a oneshot.

mod connection;
mod handler;
pub mod state;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

use connection::{Closed, Request};
use state::{ConnectionId, ServerState};

use crate::catalog::{Catalog, CatalogError, InMemoryStore};
use crate::favorite::{FavoriteEngine, ResolverChain};
use crate::resolver::{Collaborators, MultiBranchResolver};

/// Server startup/runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("$XDG_RUNTIME_DIR is not set and no --socket was given")]
    NoRuntimeDir,
    #[error("server already running at {0}")]
    AlreadyRunning(PathBuf),
    #[error("failed to create directory {path}: {source}")]
    MkdirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to bind socket {path}: {source}")]
    BindFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wire a catalog into a favorite engine: the catalog serves items,
/// links and pipelines, favorites live in memory, and multi-branch
/// projects resolve through their default branch.
pub fn build_engine(catalog: Catalog) -> FavoriteEngine {
    let collaborators =
        Collaborators::from_catalog(Arc::new(catalog), Arc::new(InMemoryStore::new()));
    FavoriteEngine::new(
        ResolverChain::new(vec![Box::new(MultiBranchResolver)]),
        collaborators,
    )
}

/// Load the catalog and run the daemon until SIGTERM or SIGINT.
///
/// # Errors
///
/// Returns `ServerError` if the catalog cannot be loaded, no socket
/// path can be determined, the bind fails, or another server is
/// already running on the socket.
pub async fn run(catalog_path: &Path, socket: Option<&Path>) -> Result<(), ServerError> {
    let catalog = Catalog::from_path(catalog_path)?;
    tracing::info!(
        catalog = %catalog_path.display(),
        organization = catalog.organization(),
        items = catalog.len(),
        "catalog loaded"
    );

    let socket_path = crate::ipc::socket_path(socket).ok_or(ServerError::NoRuntimeDir)?;
    let listener = bind_socket(&socket_path).await?;
    tracing::info!(path = %socket_path.display(), "server listening");

    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;
    let shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
        }
    };

    serve(listener, ServerState::new(build_engine(catalog)), shutdown).await;

    if let Err(e) = std::fs::remove_file(&socket_path) {
        tracing::warn!(error = %e, path = %socket_path.display(), "failed to remove socket");
    }
    tracing::info!("server stopped");
    Ok(())
}

/// Accept connections and dispatch their requests until `shutdown`
/// completes.
async fn serve(listener: UnixListener, mut state: ServerState, shutdown: impl Future<Output = ()>) {
    let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Request>();
    let (closed_tx, mut closed_rx) = mpsc::unbounded_channel::<Closed>();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, _addr)) => {
                    let conn_id = ConnectionId::new();
                    tracing::debug!(?conn_id, "client connected");
                    connection::spawn_connection(stream, conn_id, request_tx.clone(), closed_tx.clone());
                }
                Err(e) => tracing::warn!(error = %e, "accept failed"),
            },

            Some(Request { from, message, reply }) = request_rx.recv() => {
                let _ = reply.send(handler::handle_message(&mut state, message, from));
            }

            Some(Closed(conn_id)) = closed_rx.recv() => {
                state.remove_connection(conn_id);
                tracing::debug!(?conn_id, open = state.connection_count(), "client disconnected");
            }

            _ = &mut shutdown => break,
        }
    }
}

// -- Socket setup --

/// Bind the Unix listener, creating the socket directory (mode 0700)
/// if needed.
///
/// On EADDRINUSE, a successful connect means another server is live;
/// otherwise the socket is stale and is replaced.
async fn bind_socket(path: &Path) -> Result<UnixListener, ServerError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            create_private_dir(parent).map_err(|e| ServerError::MkdirFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let bind_failed = |e| ServerError::BindFailed {
        path: path.to_path_buf(),
        source: e,
    };

    match UnixListener::bind(path) {
        Ok(listener) => Ok(listener),
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            if UnixStream::connect(path).await.is_ok() {
                return Err(ServerError::AlreadyRunning(path.to_path_buf()));
            }
            tracing::info!(path = %path.display(), "removing stale socket");
            std::fs::remove_file(path).map_err(bind_failed)?;
            UnixListener::bind(path).map_err(bind_failed)
        }
        Err(e) => Err(bind_failed(e)),
    }
}

fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}
