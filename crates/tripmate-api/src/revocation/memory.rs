// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-process revocation store.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::Instant;

use super::{RevocationStore, StoreResult};

/// Revocation store backed by a concurrent map.
///
/// Suitable for a single instance and for tests. Expired entries are dropped
/// lazily on access and by [`purge_expired`](Self::purge_expired).
#[derive(Debug, Default)]
pub struct MemoryRevocationStore {
    entries: DashMap<String, Instant>,
}

impl MemoryRevocationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every expired entry.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, expires| *expires > now);
        before - self.entries.len()
    }

    /// Returns the number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn put(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let now = Instant::now();
        let expires = now + ttl;

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() > now {
                    Ok(false)
                } else {
                    entry.insert(expires);
                    Ok(true)
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(expires);
                Ok(true)
            }
        }
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let now = Instant::now();
        let live = match self.entries.get(key) {
            Some(expires) => *expires > now,
            None => return Ok(false),
        };

        if !live {
            self.entries.remove_if(key, |_, expires| *expires <= now);
        }
        Ok(live)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, expires)| expires > now))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_put_exists_delete() {
        let store = MemoryRevocationStore::new();

        assert!(store.put("k", Duration::from_secs(10)).await.unwrap());
        assert!(store.exists("k").await.unwrap());
        assert!(store.delete("k").await.unwrap());
        assert!(!store.exists("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_is_insert_if_absent() {
        let store = MemoryRevocationStore::new();

        assert!(store.put("k", Duration::from_secs(10)).await.unwrap());
        assert!(!store.put("k", Duration::from_secs(1000)).await.unwrap());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let store = MemoryRevocationStore::new();
        store.put("k", Duration::from_secs(5)).await.unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(store.exists("k").await.unwrap());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!store.exists("k").await.unwrap());
        assert!(store.is_empty());

        // An expired key can be inserted again.
        store.put("k", Duration::from_secs(5)).await.unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = MemoryRevocationStore::new();
        store.put("short", Duration::from_secs(1)).await.unwrap();
        store.put("long", Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_delete_consumes_once() {
        let store = Arc::new(MemoryRevocationStore::new());
        store.put("k", Duration::from_secs(60)).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.delete("k").await.unwrap() })
            })
            .collect();

        let mut consumed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                consumed += 1;
            }
        }
        assert_eq!(consumed, 1);
    }
}
