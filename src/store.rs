// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # In-Memory Store Adapter
//!
//! A concrete [`UserRepository`] backed by a concurrent map. Saves are
//! upserts keyed by the record identity: the first insert assigns a
//! revision from a process-wide sequence, later saves of the same identity
//! overwrite the descriptive fields and keep the revision, so redelivery
//! converges on the state a single delivery would have produced.

use crate::{
    domain::{PersistedUser, User},
    errors::StoreError,
    repository::UserRepository,
};
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Concurrent in-memory upsert store.
#[derive(Default)]
pub struct InMemoryUserStore {
    entries: DashMap<String, PersistedUser>,
    sequence: AtomicU64,
}

impl InMemoryUserStore {
    pub fn new() -> InMemoryUserStore {
        InMemoryUserStore::default()
    }

    /// Returns the stored record for an identity, if any.
    pub fn get(&self, id: &str) -> Option<PersistedUser> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    /// Number of logical entities currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserStore {
    async fn save(&self, user: &User) -> Result<PersistedUser, StoreError> {
        let persisted = match self.entries.entry(user.id.clone()) {
            Entry::Occupied(mut occupied) => {
                let revision = occupied.get().revision;
                let persisted = PersistedUser {
                    id: user.id.clone(),
                    name: user.name.clone(),
                    revision,
                };
                occupied.insert(persisted.clone());
                persisted
            }
            Entry::Vacant(vacant) => {
                let revision = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
                let persisted = PersistedUser {
                    id: user.id.clone(),
                    name: user.name.clone(),
                    revision,
                };
                vacant.insert(persisted.clone());
                persisted
            }
        };

        debug!(id = persisted.id, revision = persisted.revision, "record stored");

        Ok(persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn saving_assigns_a_revision_on_first_insert() {
        let store = InMemoryUserStore::new();

        let persisted = store.save(&User::new("u1", "Alice")).await.unwrap();

        assert_eq!(persisted.id, "u1");
        assert_eq!(persisted.name, "Alice");
        assert_eq!(persisted.revision, 1);
    }

    #[tokio::test]
    async fn saving_the_same_identity_twice_keeps_one_entity() {
        let store = InMemoryUserStore::new();

        store.save(&User::new("u1", "Alice")).await.unwrap();
        store.save(&User::new("u1", "Alice")).await.unwrap();

        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn redelivered_record_leaves_the_single_delivery_state() {
        let store = InMemoryUserStore::new();

        let first = store.save(&User::new("u1", "Alice")).await.unwrap();
        let second = store.save(&User::new("u1", "Alice")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.get("u1"), Some(first));
    }

    #[tokio::test]
    async fn overwrite_by_identity_replaces_descriptive_fields() {
        let store = InMemoryUserStore::new();

        let first = store.save(&User::new("u1", "Alice")).await.unwrap();
        let renamed = store.save(&User::new("u1", "Alicia")).await.unwrap();

        assert_eq!(renamed.name, "Alicia");
        assert_eq!(renamed.revision, first.revision);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn distinct_identities_store_distinct_entities() {
        let store = InMemoryUserStore::new();

        store.save(&User::new("u1", "Alice")).await.unwrap();
        store.save(&User::new("u2", "Bob")).await.unwrap();

        assert_eq!(store.len(), 2);
        assert_ne!(
            store.get("u1").unwrap().revision,
            store.get("u2").unwrap().revision,
        );
    }
}
