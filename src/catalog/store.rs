//! In-memory favorite membership store.
//!
//! Per-user set of favorited full names, kept in insertion order. All
//! state is lost on exit.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::favorite::model::{Item, Principal};
use crate::resolver::{MembershipStore, StoreError};

/// Mutex-guarded map of user id → favorited full names.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    favorites: Mutex<HashMap<String, Vec<String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_map<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Vec<String>>) -> T,
    ) -> Result<T, StoreError> {
        let mut map = self
            .favorites
            .lock()
            .map_err(|_| StoreError::Unavailable("favorite map lock poisoned".into()))?;
        Ok(f(&mut *map))
    }
}

impl MembershipStore for InMemoryStore {
    fn add(&self, user: &Principal, item: &Item) -> Result<(), StoreError> {
        self.with_map(|map| {
            let names = map.entry(user.id.clone()).or_default();
            if !names.contains(&item.full_name) {
                names.push(item.full_name.clone());
            }
        })
    }

    fn remove(&self, user: &Principal, item: &Item) -> Result<(), StoreError> {
        self.with_map(|map| {
            if let Some(names) = map.get_mut(&user.id) {
                names.retain(|n| n != &item.full_name);
                if names.is_empty() {
                    map.remove(&user.id);
                }
            }
        })
    }

    fn favorites(&self, user: &Principal) -> Result<Vec<String>, StoreError> {
        self.with_map(|map| map.get(&user.id).cloned().unwrap_or_default())
    }
}
