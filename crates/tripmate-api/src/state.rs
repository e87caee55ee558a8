// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use tripmate_core::{
    AccountStore, AdminEmailAuthorityResolver, Argon2PasswordEncoder, AuthorityResolver,
    InMemoryAccountStore, PasswordEncoder,
};

use crate::auth::{AuthorizationGate, SessionManager, TokenCodec};
use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::revocation::{MemoryRevocationStore, RevocationRegistry, RevocationStore};

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// This is the central state container that is passed to all handlers via
/// Axum's state extraction mechanism.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Member accounts.
    pub accounts: Arc<dyn AccountStore>,
    /// One-way secret comparison.
    pub encoder: Arc<dyn PasswordEncoder>,
    /// Role assignment at signup.
    pub authority: Arc<dyn AuthorityResolver>,
    /// Session minting, rotation and logout.
    pub sessions: SessionManager,
    /// Route role rules.
    pub gate: AuthorizationGate,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the token codec.
    pub fn codec(&self) -> &TokenCodec {
        self.sessions.codec()
    }

    /// Returns the revocation registry.
    pub fn revocations(&self) -> &RevocationRegistry {
        self.sessions.revocations()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("sessions", &self.sessions)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    accounts: Option<Arc<dyn AccountStore>>,
    encoder: Option<Arc<dyn PasswordEncoder>>,
    authority: Option<Arc<dyn AuthorityResolver>>,
    revocation_store: Option<Arc<dyn RevocationStore>>,
    gate: Option<AuthorizationGate>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the account store.
    pub fn accounts(mut self, accounts: Arc<dyn AccountStore>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    /// Sets the password encoder.
    pub fn encoder(mut self, encoder: Arc<dyn PasswordEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Sets the authority resolver.
    pub fn authority(mut self, authority: Arc<dyn AuthorityResolver>) -> Self {
        self.authority = Some(authority);
        self
    }

    /// Sets the revocation store.
    pub fn revocation_store(mut self, store: Arc<dyn RevocationStore>) -> Self {
        self.revocation_store = Some(store);
        self
    }

    /// Sets the authorization gate.
    pub fn gate(mut self, gate: AuthorizationGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Builds the AppState.
    ///
    /// Components that were not set fall back to in-memory stores, argon2
    /// with the configured cost, and the member route rules.
    pub fn build(self) -> ApiResult<AppState> {
        let config = self.config.unwrap_or_default();

        let codec = TokenCodec::new(config.token.clone())?;

        let store = self
            .revocation_store
            .unwrap_or_else(|| Arc::new(MemoryRevocationStore::new()));
        let revocations = RevocationRegistry::new(store, config.revocation_timeout);

        let accounts = self
            .accounts
            .unwrap_or_else(|| Arc::new(InMemoryAccountStore::new()));

        let encoder: Arc<dyn PasswordEncoder> = match self.encoder {
            Some(encoder) => encoder,
            None => Arc::new(Argon2PasswordEncoder::with_cost(
                config.password_memory_kib,
                config.password_iterations,
            )?),
        };

        let authority = self.authority.unwrap_or_else(|| {
            Arc::new(AdminEmailAuthorityResolver::new(&config.admin_emails))
        });

        let gate = self.gate.unwrap_or_else(AuthorizationGate::member_routes);

        tracing::debug!(
            revocation_backend = revocations.backend(),
            "Application state built"
        );

        Ok(AppState {
            config: Arc::new(config),
            sessions: SessionManager::new(codec, revocations, accounts.clone()),
            accounts,
            encoder,
            authority,
            gate,
        })
    }
}

// =============================================================================
// FromRef implementations for extracting parts of state
// =============================================================================

impl axum::extract::FromRef<AppState> for SessionManager {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<ApiConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ApiConfig {
        ApiConfig::default()
            .with_token_secret("test-secret-key-that-is-long-enough-for-testing")
            .with_password_cost(256, 1)
    }

    #[test]
    fn test_app_state_builder() {
        let state = AppState::builder().config(test_config()).build().unwrap();

        assert_eq!(state.revocations().backend(), "memory");
        assert_eq!(state.codec().issuer(), "tripmate");
        assert!(!state.gate.is_empty());
    }

    #[test]
    fn test_missing_secret_fails() {
        assert!(AppState::builder().build().is_err());
    }
}
