//! Resolver chain — ordered, first-match-wins favorite resolvers.
//!
//! Resolvers let special item kinds override how they are favorited
//! (a multi-branch project favorites its default branch, for instance)
//! without the engine knowing about those kinds.

use super::FavoriteError;
use super::model::{Favorite, Item, Reachable};

/// Attempts to produce a favorite for an item.
///
/// Return `Ok(None)` to decline; declining is the normal outcome for
/// items a resolver does not recognize. Errors are reserved for genuine
/// failures and abort the whole resolution.
pub trait FavoriteResolver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn resolve(
        &self,
        item: &Item,
        parent: &dyn Reachable,
    ) -> Result<Option<Favorite>, FavoriteError>;
}

/// Ordered list of resolvers. Construction order is priority order.
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn FavoriteResolver>>,
}

impl ResolverChain {
    pub fn new(resolvers: Vec<Box<dyn FavoriteResolver>>) -> Self {
        Self { resolvers }
    }

    /// Append a resolver with the lowest priority so far.
    #[cfg(test)]
    pub fn with(mut self, resolver: impl FavoriteResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Return the first resolver's favorite, in order. Later resolvers
    /// are not invoked once one claims the item.
    pub fn resolve(
        &self,
        item: &Item,
        parent: &dyn Reachable,
    ) -> Result<Option<Favorite>, FavoriteError> {
        for resolver in &self.resolvers {
            if let Some(favorite) = resolver.resolve(item, parent)? {
                tracing::debug!(
                    resolver = resolver.name(),
                    item = %item.full_name,
                    "favorite claimed by resolver"
                );
                return Ok(Some(favorite));
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.resolvers.iter().map(|r| r.name()))
            .finish()
    }
}
