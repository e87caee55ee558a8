// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Expiring key store for refresh tokens and blacklisted access tokens.
//!
//! Two logical namespaces share one store:
//!
//! - `refresh:<session_id>`: present while the session's refresh token may
//!   still be rotated.
//! - `blacklist:<token_id>`: present while a logged-out access token would
//!   otherwise still verify.
//!
//! Entries expire with the token they describe, so nothing is ever swept.
//! Every store call goes through [`RevocationRegistry`], which bounds it with
//! a timeout and turns failures into [`AuthError::StoreUnavailable`] so that
//! callers fail closed.

mod memory;
mod redis;

pub use self::memory::MemoryRevocationStore;
pub use self::redis::RedisRevocationStore;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tripmate_core::{AuthError, AuthResult};

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Backend failure.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Could not reach the backend.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The backend rejected or failed a command.
    #[error("Command error: {0}")]
    Command(String),
}

// =============================================================================
// RevocationStore
// =============================================================================

/// Capability interface over an expiring key store.
#[async_trait]
pub trait RevocationStore: Send + Sync + 'static {
    /// Inserts `key` with the given TTL unless it is already present.
    ///
    /// Returns `true` if the key was inserted. Inserting a live key is a no-op.
    async fn put(&self, key: &str, ttl: Duration) -> StoreResult<bool>;

    /// Returns `true` if `key` is present and unexpired.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Removes `key`, returning `true` if this call removed a live entry.
    ///
    /// Concurrent deletes of the same key see `true` at most once.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}

// =============================================================================
// Keys
// =============================================================================

/// Key of a session's active refresh token.
pub fn refresh_key(session_id: &str) -> String {
    format!("refresh:{}", session_id)
}

/// Key of a blacklisted access token.
pub fn blacklist_key(token_id: &str) -> String {
    format!("blacklist:{}", token_id)
}

/// Entries always live at least this long.
const MIN_TTL: Duration = Duration::from_secs(1);

// =============================================================================
// RevocationRegistry
// =============================================================================

/// Namespaced, timeout-guarded access to a [`RevocationStore`].
#[derive(Clone)]
pub struct RevocationRegistry {
    store: Arc<dyn RevocationStore>,
    timeout: Duration,
}

impl RevocationRegistry {
    /// Creates a registry over `store`, bounding each call by `timeout`.
    pub fn new(store: Arc<dyn RevocationStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Records a session's refresh token as active.
    pub async fn register_refresh(&self, session_id: &str, ttl: Duration) -> AuthResult<()> {
        let key = refresh_key(session_id);
        self.guard("put", self.store.put(&key, ttl.max(MIN_TTL)))
            .await
            .map(|_| ())
    }

    /// Returns `true` if the session's refresh token is still active.
    pub async fn is_refresh_active(&self, session_id: &str) -> AuthResult<bool> {
        let key = refresh_key(session_id);
        self.guard("exists", self.store.exists(&key)).await
    }

    /// Atomically takes the session's refresh entry.
    ///
    /// Returns `false` if it was already consumed, revoked or expired.
    pub async fn consume_refresh(&self, session_id: &str) -> AuthResult<bool> {
        let key = refresh_key(session_id);
        self.guard("delete", self.store.delete(&key)).await
    }

    /// Removes the session's refresh entry if present.
    pub async fn revoke_refresh(&self, session_id: &str) -> AuthResult<()> {
        self.consume_refresh(session_id).await.map(|_| ())
    }

    /// Blacklists an access token for the rest of its lifetime.
    ///
    /// Idempotent: blacklisting an already blacklisted token is a no-op.
    pub async fn blacklist(&self, token_id: &str, remaining: Duration) -> AuthResult<()> {
        let key = blacklist_key(token_id);
        let inserted = self
            .guard("put", self.store.put(&key, remaining.max(MIN_TTL)))
            .await?;
        if !inserted {
            tracing::debug!(token_id, "Token already blacklisted");
        }
        Ok(())
    }

    /// Returns `true` if the access token was blacklisted.
    pub async fn is_blacklisted(&self, token_id: &str) -> AuthResult<bool> {
        let key = blacklist_key(token_id);
        self.guard("exists", self.store.exists(&key)).await
    }

    /// Performs one store round trip.
    pub async fn ping(&self) -> AuthResult<()> {
        self.guard("exists", self.store.exists("ping")).await.map(|_| ())
    }

    /// Returns the backend name.
    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Returns the per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn guard<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = StoreResult<T>>,
    ) -> AuthResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::error!(
                    backend = self.store.backend(),
                    op,
                    error = %e,
                    "Revocation store call failed"
                );
                Err(AuthError::store_unavailable(e.to_string()))
            }
            Err(_) => {
                tracing::error!(
                    backend = self.store.backend(),
                    op,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Revocation store call timed out"
                );
                Err(AuthError::store_unavailable(format!(
                    "{} timed out after {:?}",
                    op, self.timeout
                )))
            }
        }
    }
}

impl std::fmt::Debug for RevocationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevocationRegistry")
            .field("backend", &self.store.backend())
            .field("timeout", &self.timeout)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
