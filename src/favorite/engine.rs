//! Favorite engine — resolution and toggling.
//!
//! Resolution is two-tier: the [`ResolverChain`] gets the first say,
//! then the generic pipeline mapping. Every "not found" outcome is
//! `Ok(None)`; only genuine failures are errors.

use std::borrow::Cow;

use super::FavoriteError;
use super::chain::ResolverChain;
use super::model::{AncestorOf, Favorite, FavoriteAction, Item, Principal, Reachable};
use crate::resolver::Collaborators;

/// Percent-decoding failure.
#[derive(Debug, thiserror::Error)]
enum DecodeError {
    #[error("malformed percent escape at byte {0}")]
    MalformedEscape(usize),
    #[error("decoded name is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Decode a full name that arrives percent-encoded twice.
///
/// The routing layer encodes on top of the name's own encoding, so
/// decoding runs exactly twice. A name without escapes is returned
/// unchanged; `+` is not treated as a space.
pub fn decode_full_name(name: &str) -> Result<String, FavoriteError> {
    percent_decode(name)
        .and_then(|once| percent_decode(&once).map(Cow::into_owned))
        .map_err(|e| {
            FavoriteError::unexpected(
                format!("something went wrong URL decoding fullName: {name}"),
                e,
            )
        })
}

fn percent_decode(input: &str) -> Result<Cow<'_, str>, DecodeError> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(DecodeError::MalformedEscape(i));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(urlencoding::decode(input)?)
}

/// Resolves and toggles favorites on top of the injected collaborators.
pub struct FavoriteEngine {
    chain: ResolverChain,
    collaborators: Collaborators,
}

impl FavoriteEngine {
    pub fn new(chain: ResolverChain, collaborators: Collaborators) -> Self {
        Self {
            chain,
            collaborators,
        }
    }

    /// Look up an item by (decoded) full name.
    pub fn item(&self, full_name: &str) -> Option<&Item> {
        self.collaborators.items.item(full_name)
    }

    /// Resolve the favorite for `item`, linked relative to `parent`.
    ///
    /// Without a parent, the anchor is the ancestor of the item's own
    /// canonical link, so the favorite sits next to the item. Items
    /// without a canonical link cannot be favorited.
    pub fn resolve(
        &self,
        item: Option<&Item>,
        parent: Option<&dyn Reachable>,
    ) -> Result<Option<Favorite>, FavoriteError> {
        let Some(item) = item else {
            return Ok(None);
        };

        let derived;
        let parent: &dyn Reachable = match parent {
            Some(parent) => parent,
            None => match self.collaborators.links.resolve_link(item) {
                Some(link) => {
                    derived = AncestorOf(link);
                    &derived
                }
                None => {
                    tracing::debug!(item = %item.full_name, "item has no canonical link");
                    return Ok(None);
                }
            },
        };

        if let Some(favorite) = self.chain.resolve(item, parent)? {
            return Ok(Some(favorite));
        }

        match self.collaborators.pipelines.pipeline(item, parent) {
            Some(pipeline) => Ok(Some(Favorite::of(pipeline))),
            None => {
                tracing::debug!(item = %item.full_name, "item is not favoritable");
                Ok(None)
            }
        }
    }

    /// Resolve with an anchor derived from the item's own link.
    pub fn resolve_item(&self, item: &Item) -> Result<Option<Favorite>, FavoriteError> {
        self.resolve(Some(item), None)
    }

    /// Decode a twice-encoded full name, look the item up and resolve it.
    pub fn resolve_by_encoded_name(
        &self,
        encoded: &str,
        parent: Option<&dyn Reachable>,
    ) -> Result<Option<Favorite>, FavoriteError> {
        let full_name = decode_full_name(encoded)?;
        self.resolve(self.item(&full_name), parent)
    }

    /// Add or remove `item` from the principal's favorites.
    ///
    /// Exactly one store call is made. Idempotence is the store's
    /// business.
    pub fn toggle(
        &self,
        action: FavoriteAction,
        item: &Item,
        principal: Option<&Principal>,
    ) -> Result<(), FavoriteError> {
        let user = require_principal(principal)?;
        let store = &self.collaborators.store;

        if action.favorite {
            store.add(user, item).map_err(|e| {
                FavoriteError::unexpected("something went wrong setting the favorite", e)
            })?;
        } else {
            store.remove(user, item).map_err(|e| {
                FavoriteError::unexpected("something went wrong removing the favorite", e)
            })?;
        }

        tracing::info!(
            user = %user.id,
            item = %item.full_name,
            favorite = action.favorite,
            "favorite toggled"
        );
        Ok(())
    }

    /// The principal's stored favorites that still resolve.
    pub fn favorites(&self, principal: Option<&Principal>) -> Result<Vec<Favorite>, FavoriteError> {
        let user = require_principal(principal)?;
        let names = self.collaborators.store.favorites(user).map_err(|e| {
            FavoriteError::unexpected("something went wrong listing favorites", e)
        })?;

        let mut favorites = Vec::with_capacity(names.len());
        for name in names {
            match self.resolve(self.item(&name), None) {
                Ok(Some(favorite)) => favorites.push(favorite),
                Ok(None) => tracing::debug!(item = %name, "stored favorite no longer resolves"),
                Err(e) => {
                    tracing::warn!(
                        item = %name,
                        error = %e,
                        "skipping favorite that fails to resolve"
                    );
                }
            }
        }
        Ok(favorites)
    }
}

fn require_principal(principal: Option<&Principal>) -> Result<&Principal, FavoriteError> {
    principal
        .ok_or_else(|| FavoriteError::Forbidden("must be logged in to use set favorites".into()))
}
