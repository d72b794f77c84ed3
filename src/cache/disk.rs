// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Disk-backed entity store with a versioned JSON snapshot

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{Entity, EntityPredicate, EntityStore, StoredEntity};
use crate::errors::StoreError;
use crate::TimestampMillis;

/// Current snapshot format version
const SNAPSHOT_VERSION: u32 = 1;

/// Serialized snapshot (versioned)
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot<E> {
    version: u32,
    kind: String,
    entries: Vec<StoredEntity<E>>,
}

/// Persistent store keeping every record of one kind in a JSON file
///
/// The file is read lazily on first access and rewritten after each
/// mutation: the new snapshot goes to a temp file which is then renamed over
/// the old one, so a crash never leaves a truncated file behind. A snapshot
/// with an unknown version is ignored with a warning.
///
/// # File Locking
///
/// Processes sharing one snapshot coordinate through an advisory lock on a
/// sibling `.lock` file: shared while loading, exclusive for the whole
/// read-modify-write of a mutation. Each mutation re-reads the snapshot under
/// the exclusive lock, so writes from other processes are merged rather than
/// overwritten.
///
/// # Examples
///
/// ```rust,ignore
/// use gaugescan::{DiskStore, EntityCache, Token};
/// use std::sync::Arc;
///
/// let tokens = EntityCache::new(Arc::new(DiskStore::<Token>::new("/var/cache/tokens.json")));
/// ```
pub struct DiskStore<E: Entity> {
    path: PathBuf,
    state: Mutex<Option<HashMap<E::Key, StoredEntity<E>>>>,
}

impl<E: Entity> DiskStore<E> {
    /// Create a store backed by `path`
    ///
    /// Nothing is read until the first operation; the file is created on
    /// the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(None),
        }
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<E::Key, StoredEntity<E>>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Store file does not exist, starting empty");
                return Ok(HashMap::new());
            }
            Err(e) => {
                return Err(StoreError::io(
                    self.path.display().to_string(),
                    "failed to read store file",
                    e,
                ))
            }
        };

        let snapshot: Snapshot<E> = serde_json::from_slice(&bytes).map_err(|e| {
            StoreError::serialization(format!("failed to parse {}", self.path.display()), e)
        })?;

        if snapshot.version != SNAPSHOT_VERSION || snapshot.kind != E::KIND {
            warn!(
                path = %self.path.display(),
                stored_version = snapshot.version,
                current_version = SNAPSHOT_VERSION,
                stored_kind = %snapshot.kind,
                "Store snapshot incompatible, ignoring stored data"
            );
            return Ok(HashMap::new());
        }

        debug!(
            path = %self.path.display(),
            kind = E::KIND,
            entries = snapshot.entries.len(),
            "Loaded entity store"
        );

        Ok(snapshot
            .entries
            .into_iter()
            .map(|e| (e.entity.key(), e))
            .collect())
    }

    async fn persist(&self, entries: &HashMap<E::Key, StoredEntity<E>>) -> Result<(), StoreError> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            kind: E::KIND.to_string(),
            entries: entries.values().cloned().collect(),
        };
        let json = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| StoreError::serialization("failed to encode snapshot", e))?;

        self.ensure_parent().await?;

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &json).await.map_err(|e| {
            StoreError::io(temp_path.display().to_string(), "failed to write snapshot", e)
        })?;
        tokio::fs::rename(&temp_path, &self.path).await.map_err(|e| {
            StoreError::io(self.path.display().to_string(), "failed to replace snapshot", e)
        })?;

        debug!(path = %self.path.display(), entries = entries.len(), "Saved entity store");
        Ok(())
    }

    async fn ensure_parent(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::io(parent.display().to_string(), "failed to create store directory", e)
            })?;
        }
        Ok(())
    }

    /// Take the advisory lock on the sibling lock file
    ///
    /// The lock is released when the returned file is dropped.
    async fn lock_file(&self, exclusive: bool) -> Result<File, StoreError> {
        self.ensure_parent().await?;

        let lock_path = self.path.with_extension("lock");
        let display = lock_path.display().to_string();
        let locked = tokio::task::spawn_blocking(move || {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)?;
            if exclusive {
                file.lock()?;
            } else {
                file.lock_shared()?;
            }
            Ok::<_, std::io::Error>(file)
        })
        .await
        .map_err(std::io::Error::other)
        .and_then(|locked| locked);

        locked.map_err(|e| StoreError::io(display, "failed to lock store file", e))
    }

    /// Run a read-only `f` over the loaded entries
    async fn with_entries<T>(
        &self,
        f: impl FnOnce(&HashMap<E::Key, StoredEntity<E>>) -> T + Send,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock().await;
        if state.is_none() {
            let _file_lock = self.lock_file(false).await?;
            *state = Some(self.load().await?);
        }
        Ok(f(state.get_or_insert_with(HashMap::new)))
    }

    /// Re-read the snapshot under the exclusive lock, apply `f`, and persist
    /// if it reports a change
    async fn mutate_entries<T>(
        &self,
        f: impl FnOnce(&mut HashMap<E::Key, StoredEntity<E>>) -> (T, bool) + Send,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock().await;
        let _file_lock = self.lock_file(true).await?;

        let mut entries = self.load().await?;
        let (result, changed) = f(&mut entries);
        if changed {
            if let Err(e) = self.persist(&entries).await {
                // The file may be half-way; reload on next access
                *state = None;
                return Err(e);
            }
        }
        *state = Some(entries);
        Ok(result)
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for DiskStore<E> {
    async fn get(&self, key: &E::Key) -> Result<Option<StoredEntity<E>>, StoreError> {
        self.with_entries(|entries| entries.get(key).cloned()).await
    }

    async fn find_where(
        &self,
        predicate: EntityPredicate<'_, E>,
    ) -> Result<Option<StoredEntity<E>>, StoreError> {
        self.with_entries(|entries| entries.values().find(|e| predicate(&e.entity)).cloned())
            .await
    }

    async fn put(&self, entity: StoredEntity<E>) -> Result<Option<E>, StoreError> {
        self.mutate_entries(|entries| {
            let previous = entries.insert(entity.entity.key(), entity);
            (previous.map(|p| p.entity), true)
        })
        .await
    }

    async fn insert_if_absent(&self, entity: StoredEntity<E>) -> Result<E, StoreError> {
        self.mutate_entries(|entries| {
            let key = entity.entity.key();
            match entries.get(&key) {
                Some(existing) => (existing.entity.clone(), false),
                None => {
                    let stored = entity.entity.clone();
                    entries.insert(key, entity);
                    (stored, true)
                }
            }
        })
        .await
    }

    async fn remove(&self, key: &E::Key) -> Result<bool, StoreError> {
        self.mutate_entries(|entries| {
            let removed = entries.remove(key).is_some();
            (removed, removed)
        })
        .await
    }

    async fn remove_if_stored_at(
        &self,
        key: &E::Key,
        stored_at: TimestampMillis,
    ) -> Result<bool, StoreError> {
        self.mutate_entries(|entries| {
            let stale = entries.get(key).is_some_and(|e| e.stored_at == stored_at);
            if stale {
                entries.remove(key);
            }
            (stale, stale)
        })
        .await
    }

    async fn remove_where(&self, predicate: EntityPredicate<'_, E>) -> Result<usize, StoreError> {
        self.mutate_entries(|entries| {
            let before = entries.len();
            entries.retain(|_, e| !predicate(&e.entity));
            let removed = before - entries.len();
            (removed, removed > 0)
        })
        .await
    }

    async fn len(&self) -> Result<usize, StoreError> {
        self.with_entries(|entries| entries.len()).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.mutate_entries(|entries| {
            entries.clear();
            ((), true)
        })
        .await
    }

    fn name(&self) -> &'static str {
        "disk"
    }
}
