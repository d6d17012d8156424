//! CLI client for daemon operations.
//!
//! One-shot commands: connect, perform a single request, print the
//! result and exit.

mod format;
mod server_client;

use crate::cli::{ClientAction, ClientArgs};
use server_client::ServerClient;

/// Client error type.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("$XDG_RUNTIME_DIR is not set and no --socket was given")]
    NoSocket,
    #[error("server: {0}")]
    Server(String),
    #[error("{op} failed: {reason}")]
    Rejected { op: String, reason: String },
    #[error("--user is required for {0}")]
    UserRequired(&'static str),
    #[error("JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Run the client command.
pub async fn run(args: ClientArgs) -> Result<(), ClientError> {
    if let Some(op) = requires_user(&args.action) {
        if args.user.is_none() {
            return Err(ClientError::UserRequired(op));
        }
    }

    let mut server = ServerClient::connect(args.socket.as_deref(), args.user.as_deref()).await?;

    match args.action {
        ClientAction::Get { name, anchor, json } => {
            let favorite = server
                .get_favorite(&encode_twice(&name), anchor.as_deref())
                .await?;
            format::print_favorite(&name, favorite.as_ref(), json)?;
        }
        ClientAction::Toggle { name, on, .. } => {
            let favorite = server.toggle(&name, on).await?;
            format::print_toggle(&name, on, favorite.as_ref());
        }
        ClientAction::List { json } => {
            let favorites = server.list_favorites().await?;
            format::print_favorites(&favorites, json)?;
        }
    }

    Ok(())
}

/// Actions that change or read a user's own favorites.
fn requires_user(action: &ClientAction) -> Option<&'static str> {
    match action {
        ClientAction::Get { .. } => None,
        ClientAction::Toggle { .. } => Some("toggle"),
        ClientAction::List { .. } => Some("list"),
    }
}

/// Encode a full name the way it arrives through the routing layer:
/// once for the name itself, once more on top.
fn encode_twice(full_name: &str) -> String {
    let once = urlencoding::encode(full_name);
    urlencoding::encode(&once).into_owned()
}
