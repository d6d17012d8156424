//! Collaborator abstractions — the narrow contracts the favorite core
//! consumes.
//!
//! Item lookup, canonical link resolution, pipeline mapping and the
//! favorite membership store live outside the core. Implementations are
//! composed at startup into a [`Collaborators`] set and handed to
//! [`crate::favorite::FavoriteEngine`]. The in-memory catalog in
//! [`crate::catalog`] is the reference implementation.

pub mod multibranch;

use std::sync::Arc;

use crate::favorite::model::{Item, Link, Pipeline, Principal, Reachable};

pub use multibranch::MultiBranchResolver;

/// Errors returned by the membership store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or its state is unusable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Looks up items by full name.
pub trait ItemRegistry: Send + Sync {
    fn item(&self, full_name: &str) -> Option<&Item>;
}

/// Resolves the canonical API link of an item, or `None` if the item
/// is not routable.
pub trait LinkResolver: Send + Sync {
    fn resolve_link(&self, item: &Item) -> Option<Link>;
}

/// Maps an item to its pipeline representation below `parent`, or
/// `None` if the item is not pipeline-like.
pub trait PipelineAdapter: Send + Sync {
    fn pipeline(&self, item: &Item, parent: &dyn Reachable) -> Option<Pipeline>;
}

/// Per-user favorite membership.
///
/// Implementations own their concurrency discipline. Adding an existing
/// favorite or removing a missing one must succeed.
pub trait MembershipStore: Send + Sync {
    fn add(&self, user: &Principal, item: &Item) -> Result<(), StoreError>;

    fn remove(&self, user: &Principal, item: &Item) -> Result<(), StoreError>;

    /// Full names of the user's favorites, in store order.
    fn favorites(&self, user: &Principal) -> Result<Vec<String>, StoreError>;
}

/// Something that is at once an item registry, link resolver and
/// pipeline adapter, like an in-memory catalog.
pub trait ItemCatalog: ItemRegistry + LinkResolver + PipelineAdapter {}

impl<T: ItemRegistry + LinkResolver + PipelineAdapter> ItemCatalog for T {}

/// A composed set of collaborators.
///
/// Constructed at startup and passed to the favorite engine. Only one
/// implementation per contract is active at runtime.
#[derive(Clone)]
pub struct Collaborators {
    pub items: Arc<dyn ItemRegistry>,
    pub links: Arc<dyn LinkResolver>,
    pub pipelines: Arc<dyn PipelineAdapter>,
    pub store: Arc<dyn MembershipStore>,
}

impl Collaborators {
    /// Use one catalog for items, links and pipelines.
    pub fn from_catalog<C: ItemCatalog + 'static>(
        catalog: Arc<C>,
        store: Arc<dyn MembershipStore>,
    ) -> Self {
        Self {
            items: catalog.clone(),
            links: catalog.clone(),
            pipelines: catalog,
            store,
        }
    }
}
