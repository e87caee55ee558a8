// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! A fully wired application over in-memory stores with three seeded
//! accounts, plus request helpers for driving the router.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use tripmate_api::{
    auth::REFRESH_HEADER,
    revocation::{StoreError, StoreResult},
    ApiConfig, ApiServer, AppState, RevocationStore,
};
use tripmate_core::{AccountStatus, AccountStore, InMemoryAccountStore, NewAccount};

// =============================================================================
// Constants
// =============================================================================

/// Signing secret used by every fixture.
pub const TEST_SECRET: &str = "integration-test-secret-that-is-long-enough";

/// Active member with the `USER` role.
pub const USER_EMAIL: &str = "traveler@tripmate.io";

/// Active member with `ADMIN` and `USER`.
pub const ADMIN_EMAIL: &str = "admin@tripmate.io";

/// Member whose account was suspended.
pub const SUSPENDED_EMAIL: &str = "suspended@tripmate.io";

/// Password of every seeded account.
pub const PASSWORD: &str = "correct-horse-battery";

// =============================================================================
// TestApp
// =============================================================================

/// Tokens minted by a successful login or refresh.
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// Access token without the `Bearer ` prefix.
    pub access: String,
    /// Refresh token.
    pub refresh: String,
}

/// The assembled router and its state.
pub struct TestApp {
    /// Router with every layer applied.
    pub router: Router,
    /// Shared state behind the router.
    pub state: AppState,
    /// The account store, for direct manipulation.
    pub accounts: Arc<InMemoryAccountStore>,
}

impl TestApp {
    /// Builds the application with an in-memory revocation store.
    pub async fn spawn() -> Self {
        Self::build(None).await
    }

    /// Builds the application over the given revocation store.
    pub async fn spawn_with_store(store: Arc<dyn RevocationStore>) -> Self {
        Self::build(Some(store)).await
    }

    async fn build(store: Option<Arc<dyn RevocationStore>>) -> Self {
        super::init_test_logging();

        let accounts = Arc::new(InMemoryAccountStore::new());
        let config = ApiConfig::default()
            .with_token_secret(TEST_SECRET)
            .with_password_cost(256, 1)
            .with_admin_emails([ADMIN_EMAIL]);

        let mut builder = ApiServer::builder()
            .config(config)
            .accounts(accounts.clone());
        if let Some(store) = store {
            builder = builder.revocation_store(store);
        }
        let server = builder.build().expect("server should build");

        let app = Self {
            router: server.router(),
            state: server.state().clone(),
            accounts,
        };

        app.seed(USER_EMAIL, "Traveler").await;
        app.seed(ADMIN_EMAIL, "Admin").await;
        let suspended = app.seed(SUSPENDED_EMAIL, "Suspended").await;
        app.accounts
            .update_status(suspended, AccountStatus::Suspended)
            .await
            .expect("status update");

        app
    }

    async fn seed(&self, email: &str, name: &str) -> tripmate_core::AccountId {
        let password_hash = self.state.encoder.encode(PASSWORD).expect("encode");
        let roles = self.state.authority.roles_for(email);
        self.accounts
            .insert(NewAccount {
                email: email.to_string(),
                display_name: name.to_string(),
                password_hash,
                roles,
            })
            .await
            .expect("seed account")
            .id
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Sends a request through the router.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Sends a request with an optional bearer token and JSON body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("request")).await
    }

    /// GET with an optional bearer token.
    pub async fn get(&self, path: &str, token: Option<&str>) -> Response {
        self.request(Method::GET, path, token, None).await
    }

    /// POST with an optional bearer token and no body.
    pub async fn post(&self, path: &str, token: Option<&str>) -> Response {
        self.request(Method::POST, path, token, None).await
    }

    /// POST /members/login.
    pub async fn login(&self, email: &str, password: &str) -> Response {
        let body = serde_json::json!({ "email": email, "password": password });
        self.request(Method::POST, "/members/login", None, Some(body))
            .await
    }

    /// Logs in and returns the minted tokens, panicking on failure.
    pub async fn login_ok(&self, email: &str, password: &str) -> TokenPair {
        let response = self.login(email, password).await;
        assert_eq!(response.status(), StatusCode::OK, "login should succeed");
        tokens_from(&response)
    }

    /// POST /members/refresh with the given refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/members/refresh")
            .header(REFRESH_HEADER, refresh_token)
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }

    /// Signs an access token for `email` that expired `ago` seconds ago.
    pub fn expired_access_token(&self, email: &str, roles: Vec<String>, ago: i64) -> String {
        let codec = self.state.codec();
        let issued_at = chrono::Utc::now().timestamp() - codec.access_lifetime_secs() - ago;
        let claims = codec.access_claims(email, roles, "expired-session", issued_at);
        codec.issue(&claims).expect("issue")
    }
}

// =============================================================================
// Response Helpers
// =============================================================================

/// Reads the token pair from the login or refresh response headers.
pub fn tokens_from(response: &Response) -> TokenPair {
    let access = response
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .expect("Authorization header")
        .to_string();
    let refresh = response
        .headers()
        .get(REFRESH_HEADER)
        .and_then(|v| v.to_str().ok())
        .expect("Refresh header")
        .to_string();
    TokenPair { access, refresh }
}

/// Reads the response body as JSON.
pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Returns `error.code` of an error response.
pub async fn error_code(response: Response) -> String {
    json_body(response).await["error"]["code"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

// =============================================================================
// Mocks
// =============================================================================

/// Revocation store whose every call fails, for fail-closed tests.
#[derive(Debug, Default)]
pub struct UnavailableRevocationStore;

#[async_trait]
impl RevocationStore for UnavailableRevocationStore {
    async fn put(&self, _key: &str, _ttl: Duration) -> StoreResult<bool> {
        Err(StoreError::Connection("connection refused".to_string()))
    }

    async fn exists(&self, _key: &str) -> StoreResult<bool> {
        Err(StoreError::Connection("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> StoreResult<bool> {
        Err(StoreError::Connection("connection refused".to_string()))
    }

    fn backend(&self) -> &'static str {
        "unavailable"
    }
}
