// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory entity store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Entity, EntityPredicate, EntityStore, StoredEntity};
use crate::errors::StoreError;
use crate::TimestampMillis;

/// In-memory store, lost when the process exits
///
/// All records sit in one `HashMap` behind a single async lock. Operations
/// never fail.
pub struct MemoryStore<E: Entity> {
    entries: Mutex<HashMap<E::Key, StoredEntity<E>>>,
}

impl<E: Entity> MemoryStore<E> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<E: Entity> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for MemoryStore<E> {
    async fn get(&self, key: &E::Key) -> Result<Option<StoredEntity<E>>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn find_where(
        &self,
        predicate: EntityPredicate<'_, E>,
    ) -> Result<Option<StoredEntity<E>>, StoreError> {
        let entries = self.entries.lock().await;
        Ok(entries.values().find(|e| predicate(&e.entity)).cloned())
    }

    async fn put(&self, entity: StoredEntity<E>) -> Result<Option<E>, StoreError> {
        let key = entity.entity.key();
        let previous = self.entries.lock().await.insert(key, entity);
        Ok(previous.map(|p| p.entity))
    }

    async fn insert_if_absent(&self, entity: StoredEntity<E>) -> Result<E, StoreError> {
        let mut entries = self.entries.lock().await;
        let stored = entries.entry(entity.entity.key()).or_insert(entity);
        Ok(stored.entity.clone())
    }

    async fn remove(&self, key: &E::Key) -> Result<bool, StoreError> {
        Ok(self.entries.lock().await.remove(key).is_some())
    }

    async fn remove_if_stored_at(
        &self,
        key: &E::Key,
        stored_at: TimestampMillis,
    ) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().await;
        if entries.get(key).is_some_and(|e| e.stored_at == stored_at) {
            entries.remove(key);
            return Ok(true);
        }
        Ok(false)
    }

    async fn remove_where(&self, predicate: EntityPredicate<'_, E>) -> Result<usize, StoreError> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, e| !predicate(&e.entity));
        Ok(before - entries.len())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.lock().await.len())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries.lock().await.clear();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
