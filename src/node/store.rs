//! Per-node versioned key-value store.
//!
//! Keys map to version sets that are antichains at rest. Writers never
//! overwrite a set directly; every mutation goes through [`reconcile`].
//! Access is split into a shared [`StoreView`] and an exclusive
//! [`StoreWriter`] so a caller can hold either across a peer fan-out.

use dynamo_proto::{ObjectEntry, Reconciled, StoreSnapshot, VersionSet, reconcile};
use std::collections::HashMap;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct ReplicatedStore {
    keys: RwLock<HashMap<String, VersionSet>>,
}

impl ReplicatedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take shared access.
    pub async fn read(&self) -> StoreView<'_> {
        StoreView(self.keys.read().await)
    }

    /// Take exclusive access.
    pub async fn write(&self) -> StoreWriter<'_> {
        StoreWriter(self.keys.write().await)
    }

    /// Copy of every version set.
    pub async fn snapshot(&self) -> StoreSnapshot {
        self.read().await.snapshot()
    }
}

/// Shared access to the store.
pub struct StoreView<'a>(RwLockReadGuard<'a, HashMap<String, VersionSet>>);

impl StoreView<'_> {
    pub fn entries(&self, key: &str) -> Option<&VersionSet> {
        self.0.get(key)
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Exclusive access to the store.
pub struct StoreWriter<'a>(RwLockWriteGuard<'a, HashMap<String, VersionSet>>);

impl StoreWriter<'_> {
    pub fn entries(&self, key: &str) -> Option<&VersionSet> {
        self.0.get(key)
    }

    /// Reconcile `incoming` into the versions held for `key`.
    ///
    /// The merged set replaces the stored one only when `incoming`
    /// contributed something; otherwise the store is left as it was.
    pub fn merge(&mut self, key: &str, incoming: &[ObjectEntry]) -> Reconciled {
        let existing = self.0.get(key).map(Vec::as_slice).unwrap_or(&[]);
        let merged = reconcile(existing, incoming);
        if merged.changed() {
            self.0.insert(key.to_string(), merged.versions.clone());
        }
        merged
    }
}
