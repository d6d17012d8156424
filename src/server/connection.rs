//! Per-connection task — reads frames, relays them to the server loop,
//! writes the replies back.
//!
//! The first frame must be a `hello`; the server loop validates it and
//! registers the connection's principal. A rejected handshake closes the
//! connection after the `hello_ack` is written. When the task ends for
//! any reason the server loop receives a [`Closed`] notice.

use futures::{SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::Framed;

use crate::ipc::codec::{CodecError, DecodeResult, FrameCodec, decode_frame};
use crate::ipc::protocol::{Message, Status};

use super::state::ConnectionId;

/// A request relayed to the server loop, with the channel for its reply.
#[derive(Debug)]
pub struct Request {
    pub from: ConnectionId,
    pub message: Message,
    pub reply: oneshot::Sender<Message>,
}

/// Sent once when a connection task exits.
#[derive(Debug)]
pub struct Closed(pub ConnectionId);

#[derive(Debug, thiserror::Error)]
enum ConnectionError {
    #[error("client left before the handshake")]
    NoHello,
    #[error("handshake must start with hello")]
    NotHello,
    #[error("undecodable frame: {0}")]
    Garbage(#[from] rmp_serde::decode::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("server loop is gone")]
    ServerGone,
}

/// Serve one client in its own task.
pub fn spawn_connection(
    stream: UnixStream,
    id: ConnectionId,
    requests: mpsc::UnboundedSender<Request>,
    closed: mpsc::UnboundedSender<Closed>,
) {
    tokio::spawn(async move {
        let mut conn = Connection {
            id,
            framed: Framed::new(stream, FrameCodec::new()),
            requests,
        };
        let outcome = match conn.handshake().await {
            Ok(true) => conn.serve().await,
            Ok(false) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            tracing::debug!(conn_id = ?id, error = %e, "connection ended");
        }
        let _ = closed.send(Closed(id));
    });
}

struct Connection {
    id: ConnectionId,
    framed: Framed<UnixStream, FrameCodec>,
    requests: mpsc::UnboundedSender<Request>,
}

impl Connection {
    /// Relay the opening `hello`. Returns whether it was accepted.
    async fn handshake(&mut self) -> Result<bool, ConnectionError> {
        let frame = self.framed.next().await.ok_or(ConnectionError::NoHello)??;
        let hello = match decode_frame(&frame) {
            DecodeResult::Ok(msg @ Message::Hello { .. }) => msg,
            DecodeResult::Ok(_) | DecodeResult::UnknownType(_) => {
                return Err(ConnectionError::NotHello);
            }
            DecodeResult::Malformed(e) => return Err(e.into()),
        };

        let ack = self.relay(hello).await?;
        let accepted = matches!(
            ack,
            Message::HelloAck {
                status: Status::Ok,
                ..
            }
        );
        self.framed.send(ack).await?;
        Ok(accepted)
    }

    /// Answer requests until the client hangs up.
    async fn serve(&mut self) -> Result<(), ConnectionError> {
        while let Some(frame) = self.framed.next().await {
            let reply = match decode_frame(&frame?) {
                DecodeResult::Ok(msg) => self.relay(msg).await?,
                DecodeResult::UnknownType(envelope) => {
                    tracing::debug!(
                        conn_id = ?self.id,
                        msg_type = %envelope.msg_type,
                        "unknown message type"
                    );
                    Message::error(envelope.id, "unknown_type")
                }
                DecodeResult::Malformed(e) => return Err(e.into()),
            };
            self.framed.send(reply).await?;
        }
        Ok(())
    }

    async fn relay(&self, message: Message) -> Result<Message, ConnectionError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(Request {
                from: self.id,
                message,
                reply,
            })
            .map_err(|_| ConnectionError::ServerGone)?;
        response.await.map_err(|_| ConnectionError::ServerGone)
    }
}
