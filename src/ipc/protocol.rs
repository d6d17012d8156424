//! Wire protocol message types for favoritesd IPC.
//!
//! All messages are MessagePack-encoded maps with at minimum `type` and
//! `id` fields. Favorite payloads use the same shape as the REST view:
//! `{ item, _links: { self: { href } } }`.

use serde::{Deserialize, Serialize};

use crate::favorite::Favorite;

/// All wire protocol messages.
///
/// Serialized as a tagged union on the `type` field via MessagePack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Message {
    // -- Handshake --
    /// `user` identifies the principal for the rest of the connection.
    /// Anonymous connections may resolve favorites but not change them.
    #[serde(rename = "hello")]
    Hello {
        id: u32,
        version: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
    },

    #[serde(rename = "hello_ack")]
    HelloAck {
        id: u32,
        status: Status,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    // -- Favorites --
    /// Add or remove `item` (plain full name) from the caller's favorites.
    #[serde(rename = "toggle")]
    Toggle {
        id: u32,
        item: String,
        #[serde(alias = "isFavorite")]
        favorite: bool,
    },

    /// Resolve the favorite for a twice-encoded full name, optionally
    /// linked below `anchor`.
    #[serde(rename = "get_favorite")]
    GetFavorite {
        id: u32,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        anchor: Option<String>,
    },

    #[serde(rename = "list_favorites")]
    ListFavorites { id: u32 },

    // -- Generic response --
    #[serde(rename = "response")]
    Response {
        id: u32,
        status: Status,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        favorite: Option<Favorite>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        favorites: Option<Vec<Favorite>>,
    },
}

impl Message {
    /// Bare success response.
    #[cfg(test)]
    pub fn ok(id: u32) -> Self {
        Message::Response {
            id,
            status: Status::Ok,
            error: None,
            favorite: None,
            favorites: None,
        }
    }

    /// Error response carrying a machine-readable reason.
    pub fn error(id: u32, reason: &str) -> Self {
        Message::Response {
            id,
            status: Status::Error,
            error: Some(reason.into()),
            favorite: None,
            favorites: None,
        }
    }
}

/// Response status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Protocol version.
pub const PROTOCOL_VERSION: u32 = 1;

/// Maximum payload size (16 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Minimal envelope for extracting `{type, id}` from unknown messages.
///
/// Used by the server as a fallback when [`Message`] deserialization
/// fails (e.g., unknown `type` tag), so the error response can echo the
/// request `id`.
#[derive(Debug, Deserialize)]
pub struct RawEnvelope {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub id: u32,
}
