//! Favorite resolution core.
//!
//! Turns an item of the CI object graph into exactly one linkable
//! favorite representation, and toggles a principal's favorites in the
//! membership store. Resolution runs the [`chain::ResolverChain`] first
//! and falls back to the generic pipeline mapping.

pub mod branch;
pub mod chain;
pub mod engine;
pub mod model;

pub use branch::select_default_branch;
pub use chain::{FavoriteResolver, ResolverChain};
pub use engine::{FavoriteEngine, decode_full_name};
pub use model::{
    AncestorOf, Favorite, FavoriteAction, Item, ItemKind, Link, Pipeline, PipelineKind, Principal,
    Reachable,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by favorite operations.
///
/// "Not found" is never an error: resolution returns `Ok(None)` instead.
#[derive(Debug, thiserror::Error)]
pub enum FavoriteError {
    /// No principal available for an operation that needs one.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Caller input has the wrong shape (e.g. folder without a default
    /// branch).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal failure; the cause is preserved.
    #[error("{message}")]
    Unexpected {
        message: String,
        #[source]
        source: BoxError,
    },
}

impl FavoriteError {
    pub fn unexpected(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Unexpected {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Machine-readable reason for wire responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "forbidden",
            Self::BadRequest(_) => "bad_request",
            Self::Unexpected { .. } => "unexpected_error",
        }
    }
}
