// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Find-or-fetch entity caches
//!
//! One [`EntityCache`] exists per entity kind (gauges, tokens, pairs). The
//! cache owns the lookup policy (TTL, statistics, stampede protection) and
//! delegates storage to an [`EntityStore`] backend:
//!
//! - [`MemoryStore`]: in-process `HashMap` behind a single async lock
//! - [`DiskStore`]: versioned JSON snapshot, rewritten atomically on change
//!
//! # Examples
//!
//! ```rust,ignore
//! use gaugescan::{DiskStore, EntityCache, Gauge};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! // In-memory, no expiry
//! let gauges: EntityCache<Gauge> = EntityCache::in_memory();
//!
//! // Persistent, entries expire after an hour
//! let gauges = EntityCache::new(Arc::new(DiskStore::<Gauge>::new("gauges.json")))
//!     .with_ttl(Duration::from_secs(3600));
//! ```

use std::fmt;
use std::hash::Hash;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::TimestampMillis;

mod disk;
mod entity_cache;
mod memory;

pub use disk::DiskStore;
pub use entity_cache::EntityCache;
pub use memory::MemoryStore;

/// A record that can live in an [`EntityCache`]
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Primary key type
    type Key: Clone
        + Eq
        + Hash
        + fmt::Display
        + fmt::Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Entity kind, used in logs and `NotFound` errors
    const KIND: &'static str;

    /// Primary key of this record
    fn key(&self) -> Self::Key;
}

/// An entity together with the time it was written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntity<E> {
    /// The record
    pub entity: E,
    /// When the record was written
    pub stored_at: TimestampMillis,
}

impl<E> StoredEntity<E> {
    /// Wrap `entity` with its write time
    pub fn new(entity: E, stored_at: TimestampMillis) -> Self {
        Self { entity, stored_at }
    }
}

/// Predicate used for secondary lookups and bulk deletes
pub type EntityPredicate<'a, E> = &'a (dyn Fn(&E) -> bool + Send + Sync);

/// Storage backend for one entity kind
///
/// Every method is atomic with respect to the others: implementations hold a
/// single lock per call, so a reader never observes a half-applied write.
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Record stored under `key`
    async fn get(&self, key: &E::Key) -> Result<Option<StoredEntity<E>>, StoreError>;

    /// First record matching `predicate`
    async fn find_where(
        &self,
        predicate: EntityPredicate<'_, E>,
    ) -> Result<Option<StoredEntity<E>>, StoreError>;

    /// Store `entity` under its key, returning the record it displaced
    async fn put(&self, entity: StoredEntity<E>) -> Result<Option<E>, StoreError>;

    /// Store `entity` unless its key is taken; returns whichever record is stored
    async fn insert_if_absent(&self, entity: StoredEntity<E>) -> Result<E, StoreError>;

    /// Remove the record under `key`
    async fn remove(&self, key: &E::Key) -> Result<bool, StoreError>;

    /// Remove the record under `key` only if it was written at `stored_at`
    ///
    /// Returns `false` when the key is absent or holds a newer write.
    async fn remove_if_stored_at(
        &self,
        key: &E::Key,
        stored_at: TimestampMillis,
    ) -> Result<bool, StoreError>;

    /// Remove every record matching `predicate`
    async fn remove_where(&self, predicate: EntityPredicate<'_, E>) -> Result<usize, StoreError>;

    /// Number of stored records
    async fn len(&self) -> Result<usize, StoreError>;

    /// Remove every record
    async fn clear(&self) -> Result<(), StoreError>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Counters for one [`EntityCache`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of lookups answered from the store
    pub hits: u64,
    /// Number of lookups that found nothing usable
    pub misses: u64,
    /// Number of entries dropped because their TTL elapsed
    pub expirations: u64,
    /// Number of remote fetches performed on behalf of the cache
    pub fetches: u64,
    /// Current number of entries
    pub entries: usize,
}

impl CacheStats {
    /// Share of lookups answered from the store, in percent
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={}, misses={}, expirations={}, fetches={}, entries={}, hit_rate={:.1}%",
            self.hits,
            self.misses,
            self.expirations,
            self.fetches,
            self.entries,
            self.hit_rate()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.hit_rate(), 75.0);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_stats_display() {
        let stats = CacheStats {
            hits: 1,
            misses: 1,
            entries: 1,
            ..Default::default()
        };
        assert_eq!(
            stats.to_string(),
            "hits=1, misses=1, expirations=0, fetches=0, entries=1, hit_rate=50.0%"
        );
    }
}
