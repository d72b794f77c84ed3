// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Find-or-fetch cache over an [`EntityStore`]

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, trace, warn, Instrument};

use super::{CacheStats, Entity, EntityPredicate, EntityStore, MemoryStore, StoredEntity};
use crate::clock::{Clock, SystemClock};
use crate::errors::StoreError;
use crate::tracing::spans;

/// Per-key fetch serialization
#[derive(Debug, Default)]
struct KeyLock {
    mutex: Mutex<()>,
    /// Fetches completed while this lock existed
    completed: AtomicU64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
    fetches: AtomicU64,
}

/// Repository for one entity kind
///
/// Lookups go through the store; misses are filled by caller-supplied fetch
/// futures. Concurrent [`get_or_fetch`](Self::get_or_fetch) calls for the same
/// key run at most one fetch at a time: later callers wait on a per-key lock
/// and re-check the store once they hold it.
///
/// Writes replace whole records. A fetch that fails or is dropped leaves the
/// stored record exactly as it was.
pub struct EntityCache<E: Entity> {
    store: Arc<dyn EntityStore<E>>,
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
    fetch_locks: Mutex<HashMap<E::Key, Arc<KeyLock>>>,
    counters: Counters,
}

impl<E: Entity> EntityCache<E> {
    /// Create a cache over `store` with no expiry
    pub fn new(store: Arc<dyn EntityStore<E>>) -> Self {
        Self {
            store,
            ttl: None,
            clock: Arc::new(SystemClock),
            fetch_locks: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// Create a cache over a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Treat records older than `ttl` as absent
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Apply an optional TTL
    pub fn with_optional_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Read time from `clock` instead of the wall clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn is_expired(&self, stored: &StoredEntity<E>) -> bool {
        self.ttl
            .is_some_and(|ttl| self.clock.now().duration_since(stored.stored_at) >= ttl)
    }

    fn stamp(&self, entity: E) -> StoredEntity<E> {
        StoredEntity::new(entity, self.clock.now())
    }

    /// Record stored under `key`, if present and not expired
    ///
    /// Expired records are removed, unless a newer write replaced them since
    /// they were read.
    pub async fn find(&self, key: &E::Key) -> Result<Option<E>, StoreError> {
        match self.store.get(key).await? {
            Some(stored) if self.is_expired(&stored) => {
                debug!(kind = E::KIND, key = %key, "Cache entry expired");
                self.store.remove_if_stored_at(key, stored.stored_at).await?;
                self.counters.expirations.fetch_add(1, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Some(stored) => {
                trace!(kind = E::KIND, key = %key, "Cache hit");
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(stored.entity))
            }
            None => {
                trace!(kind = E::KIND, key = %key, "Cache miss");
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    /// Unexpired record under `key`, without touching the counters
    async fn peek(&self, key: &E::Key) -> Result<Option<E>, StoreError> {
        Ok(self
            .store
            .get(key)
            .await?
            .filter(|stored| !self.is_expired(stored))
            .map(|stored| stored.entity))
    }

    /// First unexpired record matching `predicate`
    pub async fn find_where(&self, predicate: EntityPredicate<'_, E>) -> Result<Option<E>, StoreError> {
        let found = self.store.find_where(predicate).await?;
        Ok(found
            .filter(|stored| !self.is_expired(stored))
            .map(|stored| stored.entity))
    }

    /// Store `entity` under its key, returning the record it displaced
    ///
    /// The swap happens under the store's lock; readers see either the old
    /// record or the new one.
    pub async fn replace(&self, entity: E) -> Result<Option<E>, StoreError> {
        self.store.put(self.stamp(entity)).await
    }

    /// Remove every record matching `predicate`
    pub async fn delete_where(&self, predicate: EntityPredicate<'_, E>) -> Result<usize, StoreError> {
        let removed = self.store.remove_where(predicate).await?;
        if removed > 0 {
            debug!(kind = E::KIND, removed, "Deleted cache entries");
        }
        Ok(removed)
    }

    /// Insert `entity` unless its key is taken; returns the stored record
    pub async fn create(&self, entity: E) -> Result<E, StoreError> {
        self.store.insert_if_absent(self.stamp(entity)).await
    }

    /// Write `entity` as a full record
    pub async fn save(&self, entity: E) -> Result<(), StoreError> {
        self.store.put(self.stamp(entity)).await.map(|_| ())
    }

    /// Cached record for `key`, or the result of `fetch` stored under it
    ///
    /// Concurrent misses for one key run `fetch` once; the others wait and
    /// return the stored record. If `fetch` fails the error is returned, nothing
    /// is stored, and the next waiter gets its own attempt.
    pub async fn get_or_fetch<F, Fut, Err>(&self, key: &E::Key, fetch: F) -> Result<E, Err>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<E, Err>>,
        Err: From<StoreError>,
    {
        if let Some(entity) = self.find(key).await? {
            return Ok(entity);
        }

        let span = spans::get_or_fetch(E::KIND, &key.to_string());
        let lock = self.fetch_lock(key).await;
        let result = self.fetch_if_missing(key, &lock, fetch).instrument(span).await;
        self.release_fetch_lock(key, &lock).await;
        result
    }

    async fn fetch_if_missing<F, Fut, Err>(
        &self,
        key: &E::Key,
        lock: &KeyLock,
        fetch: F,
    ) -> Result<E, Err>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<E, Err>>,
        Err: From<StoreError>,
    {
        let _guard = lock.mutex.lock().await;

        // Another caller may have filled the entry while we waited
        if let Some(entity) = self.peek(key).await? {
            return Ok(entity);
        }

        self.fetch_and_store(key, lock, fetch).await
    }

    /// Fetch and replace, sharing the result of a fetch that completes while waiting
    ///
    /// Callers that queue behind an in-flight fetch for `key` return the record
    /// that fetch stored instead of starting another one. On failure the
    /// previous record stays untouched.
    pub async fn fetch_shared<F, Fut, Err>(&self, key: &E::Key, fetch: F) -> Result<E, Err>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<E, Err>>,
        Err: From<StoreError>,
    {
        let lock = self.fetch_lock(key).await;
        let seen = lock.completed.load(Ordering::SeqCst);
        let result = self.fetch_unless_completed(key, &lock, seen, fetch).await;
        self.release_fetch_lock(key, &lock).await;
        result
    }

    async fn fetch_unless_completed<F, Fut, Err>(
        &self,
        key: &E::Key,
        lock: &KeyLock,
        seen: u64,
        fetch: F,
    ) -> Result<E, Err>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<E, Err>>,
        Err: From<StoreError>,
    {
        let _guard = lock.mutex.lock().await;

        if lock.completed.load(Ordering::SeqCst) != seen {
            if let Some(entity) = self.peek(key).await? {
                trace!(kind = E::KIND, key = %key, "Sharing result of concurrent fetch");
                return Ok(entity);
            }
        }

        self.fetch_and_store(key, lock, fetch).await
    }

    /// Run `fetch` and replace the record under `key` with its result
    ///
    /// Always fetches, waiting for any in-flight fetch of the same key first.
    /// On failure the previous record stays untouched.
    pub async fn refresh_with<F, Fut, Err>(&self, key: &E::Key, fetch: F) -> Result<E, Err>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<E, Err>>,
        Err: From<StoreError>,
    {
        let lock = self.fetch_lock(key).await;
        let result = async {
            let _guard = lock.mutex.lock().await;
            self.fetch_and_store(key, &lock, fetch).await
        }
        .await;
        self.release_fetch_lock(key, &lock).await;
        result
    }

    /// Caller must hold `lock.mutex`
    async fn fetch_and_store<F, Fut, Err>(&self, key: &E::Key, lock: &KeyLock, fetch: F) -> Result<E, Err>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<E, Err>>,
        Err: From<StoreError>,
    {
        self.counters.fetches.fetch_add(1, Ordering::Relaxed);

        match fetch().await {
            Ok(entity) => {
                self.store.put(self.stamp(entity.clone())).await?;
                lock.completed.fetch_add(1, Ordering::SeqCst);
                Ok(entity)
            }
            Err(e) => {
                warn!(kind = E::KIND, key = %key, "Fetch failed, keeping previous entry");
                Err(e)
            }
        }
    }

    async fn fetch_lock(&self, key: &E::Key) -> Arc<KeyLock> {
        self.fetch_locks
            .lock()
            .await
            .entry(key.clone())
            .or_default()
            .clone()
    }

    async fn release_fetch_lock(&self, key: &E::Key, lock: &Arc<KeyLock>) {
        let mut locks = self.fetch_locks.lock().await;
        // The map and `lock` hold two references; more means someone is waiting
        if Arc::strong_count(lock) <= 2 {
            locks.remove(key);
        }
    }

    /// Remove every record
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.clear().await
    }

    /// Current statistics
    pub async fn stats(&self) -> CacheStats {
        let entries = match self.store.len().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(kind = E::KIND, error = %e, "Failed to count cache entries");
                0
            }
        };

        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            expirations: self.counters.expirations.load(Ordering::Relaxed),
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            entries,
        }
    }

    /// Name of the backing store
    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::AtomicBool;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: u32,
        owner: u32,
        text: String,
    }

    impl Entity for Note {
        type Key = u32;
        const KIND: &'static str = "note";

        fn key(&self) -> u32 {
            self.id
        }
    }

    fn note(id: u32, owner: u32, text: &str) -> Note {
        Note {
            id,
            owner,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_replace_swaps_whole_record() {
        let cache = EntityCache::<Note>::in_memory();
        cache.save(note(1, 7, "old")).await.unwrap();

        let previous = cache.replace(note(1, 8, "new")).await.unwrap();

        assert_eq!(previous, Some(note(1, 7, "old")));
        assert_eq!(cache.find(&1).await.unwrap(), Some(note(1, 8, "new")));
    }

    #[tokio::test]
    async fn test_create_keeps_existing() {
        let cache = EntityCache::<Note>::in_memory();
        assert_eq!(cache.create(note(1, 0, "a")).await.unwrap(), note(1, 0, "a"));
        assert_eq!(cache.create(note(1, 0, "b")).await.unwrap(), note(1, 0, "a"));
    }

    #[tokio::test]
    async fn test_find_where_and_delete_where() {
        let cache = EntityCache::<Note>::in_memory();
        for (id, owner) in [(1, 10), (2, 10), (3, 20)] {
            cache.save(note(id, owner, "x")).await.unwrap();
        }

        let found = cache.find_where(&|n: &Note| n.owner == 20).await.unwrap();
        assert_eq!(found.map(|n| n.id), Some(3));

        let removed = cache.delete_where(&|n: &Note| n.owner == 10).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.stats().await.entries, 1);
    }

    #[tokio::test]
    async fn test_ttl_expiry_counts_as_miss() {
        let clock = ManualClock::new();
        let cache = EntityCache::<Note>::in_memory()
            .with_ttl(Duration::from_secs(60))
            .with_clock(Arc::new(clock.clone()));

        cache.save(note(1, 0, "a")).await.unwrap();
        clock.advance(Duration::from_secs(59));
        assert!(cache.find(&1).await.unwrap().is_some());

        clock.advance(Duration::from_secs(1));
        assert!(cache.find(&1).await.unwrap().is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.entries, 0);
    }

    /// Reads the record, then stalls before returning it when armed
    #[derive(Default)]
    struct StallingStore {
        inner: MemoryStore<Note>,
        stall: AtomicBool,
    }

    #[async_trait::async_trait]
    impl EntityStore<Note> for StallingStore {
        async fn get(&self, key: &u32) -> Result<Option<StoredEntity<Note>>, StoreError> {
            let found = self.inner.get(key).await?;
            if self.stall.swap(false, Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Ok(found)
        }

        async fn find_where(
            &self,
            predicate: EntityPredicate<'_, Note>,
        ) -> Result<Option<StoredEntity<Note>>, StoreError> {
            self.inner.find_where(predicate).await
        }

        async fn put(&self, entity: StoredEntity<Note>) -> Result<Option<Note>, StoreError> {
            self.inner.put(entity).await
        }

        async fn insert_if_absent(&self, entity: StoredEntity<Note>) -> Result<Note, StoreError> {
            self.inner.insert_if_absent(entity).await
        }

        async fn remove(&self, key: &u32) -> Result<bool, StoreError> {
            self.inner.remove(key).await
        }

        async fn remove_if_stored_at(
            &self,
            key: &u32,
            stored_at: crate::TimestampMillis,
        ) -> Result<bool, StoreError> {
            self.inner.remove_if_stored_at(key, stored_at).await
        }

        async fn remove_where(&self, predicate: EntityPredicate<'_, Note>) -> Result<usize, StoreError> {
            self.inner.remove_where(predicate).await
        }

        async fn len(&self) -> Result<usize, StoreError> {
            self.inner.len().await
        }

        async fn clear(&self) -> Result<(), StoreError> {
            self.inner.clear().await
        }

        fn name(&self) -> &'static str {
            "stalling"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_find_keeps_a_concurrent_refresh() {
        let clock = ManualClock::new();
        let store = Arc::new(StallingStore::default());
        let cache = EntityCache::<Note>::new(store.clone())
            .with_ttl(Duration::from_secs(60))
            .with_clock(Arc::new(clock.clone()));

        cache.save(note(1, 0, "stale")).await.unwrap();
        clock.advance(Duration::from_secs(61));
        store.stall.store(true, Ordering::SeqCst);

        let (found, refreshed) = tokio::join!(cache.find(&1), async {
            tokio::task::yield_now().await;
            cache
                .refresh_with(&1, || async { Ok::<_, StoreError>(note(1, 0, "fresh")) })
                .await
        });

        assert!(found.unwrap().is_none());
        assert_eq!(refreshed.unwrap().text, "fresh");
        assert_eq!(
            cache.find(&1).await.unwrap().map(|n| n.text),
            Some("fresh".to_string())
        );
    }

    #[tokio::test]
    async fn test_remove_if_stored_at_ignores_newer_writes() {
        let store = MemoryStore::<Note>::new();
        let old = crate::TimestampMillis::from_millis(1_000);
        let new = crate::TimestampMillis::from_millis(2_000);
        store.put(StoredEntity::new(note(1, 0, "a"), new)).await.unwrap();

        assert!(!store.remove_if_stored_at(&1, old).await.unwrap());
        assert!(store.remove_if_stored_at(&1, new).await.unwrap());
        assert!(!store.remove_if_stored_at(&1, new).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_or_fetch_fetches_once() {
        let cache = EntityCache::<Note>::in_memory();

        let first: Result<Note, StoreError> =
            cache.get_or_fetch(&5, || async { Ok(note(5, 0, "fetched")) }).await;
        let second: Result<Note, StoreError> = cache
            .get_or_fetch(&5, || async { panic!("should be served from cache") })
            .await;

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(cache.stats().await.fetches, 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous() {
        let cache = EntityCache::<Note>::in_memory();
        cache.save(note(1, 0, "good")).await.unwrap();

        let result: Result<Note, StoreError> = cache
            .refresh_with(&1, || async {
                Err(StoreError::serialization(
                    "boom",
                    serde_json::from_str::<u8>("x").unwrap_err(),
                ))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(cache.find(&1).await.unwrap(), Some(note(1, 0, "good")));
    }

    #[tokio::test]
    async fn test_fetch_locks_are_released() {
        let cache = EntityCache::<Note>::in_memory();
        let _: Result<Note, StoreError> = cache.get_or_fetch(&1, || async { Ok(note(1, 0, "a")) }).await;
        let _: Result<Note, StoreError> = cache.refresh_with(&1, || async { Ok(note(1, 0, "b")) }).await;
        assert!(cache.fetch_locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_shared_coalesces_concurrent_callers() {
        let cache = EntityCache::<Note>::in_memory();

        let slow = cache.fetch_shared(&1, || async {
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            Ok::<_, StoreError>(note(1, 0, "first"))
        });
        let queued = cache.fetch_shared(&1, || async { Ok::<_, StoreError>(note(1, 0, "second")) });

        let (a, b) = tokio::join!(slow, queued);

        assert_eq!(a.unwrap().text, "first");
        assert_eq!(b.unwrap().text, "first");
        assert_eq!(cache.stats().await.fetches, 1);
    }

    #[tokio::test]
    async fn test_refresh_with_always_fetches() {
        let cache = EntityCache::<Note>::in_memory();
        cache.save(note(1, 0, "cached")).await.unwrap();

        let refreshed: Result<Note, StoreError> =
            cache.refresh_with(&1, || async { Ok(note(1, 0, "fresh")) }).await;

        assert_eq!(refreshed.unwrap().text, "fresh");
        assert_eq!(cache.find(&1).await.unwrap().unwrap().text, "fresh");
    }
}
