// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Redis-backed revocation store.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};

use super::{RevocationStore, StoreError, StoreResult};

/// Revocation store backed by Redis key expiry.
///
/// Inserts use `SET key 1 NX PX <ttl>`, so insertion is atomic and a live key
/// is never overwritten. Deletes use `DEL`, which reports the removal to
/// exactly one caller.
#[derive(Clone)]
pub struct RedisRevocationStore {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisRevocationStore {
    /// Connects to `url` and verifies the server answers `PING`.
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> StoreResult<Self> {
        let client = Client::open(url)
            .map_err(|e| StoreError::Connection(format!("Invalid Redis URL: {}", e)))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Connection(format!("Redis ping failed: {}", e)))?;

        tracing::debug!("Redis connection established");

        Ok(Self {
            conn,
            key_prefix: key_prefix.into(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

fn store_error(err: RedisError) -> StoreError {
    if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        StoreError::Connection(err.to_string())
    } else {
        StoreError::Command(err.to_string())
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn put(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let millis = ttl.as_millis().max(1) as u64;

        let reply: Option<String> = redis::cmd("SET")
            .arg(self.key(key))
            .arg(1)
            .arg("NX")
            .arg("PX")
            .arg(millis)
            .query_async(&mut conn)
            .await
            .map_err(store_error)?;

        Ok(reply.is_some())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        conn.exists(self.key(key)).await.map_err(store_error)
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(self.key(key)).await.map_err(store_error)?;
        Ok(removed > 0)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

impl std::fmt::Debug for RedisRevocationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRevocationStore")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_is_connection_error() {
        let err = RedisRevocationStore::connect("not-a-url", "tripmate:")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
    }
}
