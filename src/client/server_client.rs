//! Connection to the favorites daemon for one-shot CLI commands.
//!
//! Performs the handshake (announcing the user, if any) and exposes one
//! method per request type. Each CLI invocation runs a single
//! request-response cycle.

use std::path::Path;

use futures::{SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio_util::codec::Framed;

use crate::favorite::Favorite;
use crate::ipc::codec::LengthPrefixedCodec;
use crate::ipc::protocol::{Message, PROTOCOL_VERSION, Status};

use super::ClientError;

pub struct ServerClient {
    framed: Framed<UnixStream, LengthPrefixedCodec>,
    next_id: u32,
}

impl ServerClient {
    /// Connect to the daemon and perform the handshake.
    pub async fn connect(socket: Option<&Path>, user: Option<&str>) -> Result<Self, ClientError> {
        let socket_path = crate::ipc::socket_path(socket).ok_or(ClientError::NoSocket)?;

        let stream = UnixStream::connect(&socket_path)
            .await
            .map_err(|e| ClientError::Server(format!("connect {}: {e}", socket_path.display())))?;
        let mut framed = Framed::new(stream, LengthPrefixedCodec::new());

        framed
            .send(Message::Hello {
                id: 0,
                version: PROTOCOL_VERSION,
                user: user.map(String::from),
            })
            .await
            .map_err(|e| ClientError::Server(format!("send hello: {e}")))?;

        match framed.next().await {
            Some(Ok(Message::HelloAck {
                status: Status::Ok, ..
            })) => {}
            Some(Ok(Message::HelloAck { error, .. })) => {
                return Err(ClientError::Server(format!(
                    "handshake rejected: {}",
                    error.unwrap_or_default()
                )));
            }
            other => {
                return Err(ClientError::Server(format!(
                    "unexpected handshake response: {other:?}"
                )));
            }
        }

        Ok(Self {
            framed,
            next_id: 1, // 0 = Hello
        })
    }

    /// Resolve the favorite of a twice-encoded full name.
    pub async fn get_favorite(
        &mut self,
        encoded_name: &str,
        anchor: Option<&str>,
    ) -> Result<Option<Favorite>, ClientError> {
        let id = self.take_id();
        let reply = self
            .request(
                "get_favorite",
                Message::GetFavorite {
                    id,
                    name: encoded_name.into(),
                    anchor: anchor.map(String::from),
                },
            )
            .await?;
        Ok(reply.favorite)
    }

    /// Add or remove a favorite; returns the toggled item's favorite.
    pub async fn toggle(
        &mut self,
        full_name: &str,
        favorite: bool,
    ) -> Result<Option<Favorite>, ClientError> {
        let id = self.take_id();
        let reply = self
            .request(
                "toggle",
                Message::Toggle {
                    id,
                    item: full_name.into(),
                    favorite,
                },
            )
            .await?;
        Ok(reply.favorite)
    }

    pub async fn list_favorites(&mut self) -> Result<Vec<Favorite>, ClientError> {
        let id = self.take_id();
        let reply = self
            .request("list_favorites", Message::ListFavorites { id })
            .await?;
        Ok(reply.favorites.unwrap_or_default())
    }

    fn take_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Send one request and unpack the matching successful response.
    async fn request(&mut self, op: &str, msg: Message) -> Result<Reply, ClientError> {
        self.framed
            .send(msg)
            .await
            .map_err(|e| ClientError::Server(format!("send {op}: {e}")))?;

        match self.framed.next().await {
            Some(Ok(Message::Response {
                status: Status::Ok,
                favorite,
                favorites,
                ..
            })) => Ok(Reply {
                favorite,
                favorites,
            }),
            Some(Ok(Message::Response { error, .. })) => Err(ClientError::Rejected {
                op: op.to_string(),
                reason: error.unwrap_or_default(),
            }),
            other => Err(ClientError::Server(format!(
                "unexpected {op} response: {other:?}"
            ))),
        }
    }
}

/// Payload of a successful response.
struct Reply {
    favorite: Option<Favorite>,
    favorites: Option<Vec<Favorite>>,
}
