// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Credential authentication for the login route.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tripmate_core::{Account, AccountStore, AuthError, AuthResult, PasswordEncoder};
use uuid::Uuid;

use super::{RequestContext, Stage};
use crate::auth::{IssuedTokens, SessionManager};

// =============================================================================
// Request / Outcome
// =============================================================================

/// Login credentials.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    /// Account identity.
    #[serde(alias = "identity", alias = "username")]
    pub email: String,
    /// Secret phrase.
    #[serde(alias = "secret")]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Result of a successful login, handed to the login handler.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The authenticated account.
    pub account: Account,
    /// The minted token pair.
    pub tokens: IssuedTokens,
}

// =============================================================================
// Callbacks
// =============================================================================

/// Shapes the response of a successful login.
pub trait AuthenticationSuccessHandler: Send + Sync + 'static {
    /// Called once the token pair has been minted and recorded.
    fn on_success(&self, ctx: &mut RequestContext, outcome: LoginOutcome) -> AuthResult<()>;
}

/// Decides what a failed login reports.
///
/// Implementations must not reveal whether the identity exists.
pub trait AuthenticationFailureHandler: Send + Sync + 'static {
    /// Returns the error the request fails with.
    fn on_failure(&self, ctx: &RequestContext, identity: Option<&str>, error: AuthError)
        -> AuthError;
}

/// Puts the tokens in the `Authorization` and `Refresh` response headers and
/// the outcome in the request extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoginResponseHandler;

impl AuthenticationSuccessHandler for LoginResponseHandler {
    fn on_success(&self, ctx: &mut RequestContext, outcome: LoginOutcome) -> AuthResult<()> {
        ctx.response_headers.extend(outcome.tokens.headers()?);

        tracing::info!(
            request_id = %ctx.request_id,
            subject = %outcome.account.email,
            session_id = %outcome.tokens.session_id(),
            "Login succeeded"
        );

        ctx.extensions.insert(outcome);
        Ok(())
    }
}

/// Logs the precise failure and passes it on unchanged.
///
/// Unknown identities and wrong secrets already share
/// [`AuthError::InvalidCredentials`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformFailureHandler;

impl AuthenticationFailureHandler for UniformFailureHandler {
    fn on_failure(
        &self,
        ctx: &RequestContext,
        identity: Option<&str>,
        error: AuthError,
    ) -> AuthError {
        if error.is_server_error() {
            tracing::error!(
                request_id = %ctx.request_id,
                kind = error.kind(),
                error = %error,
                "Login failed"
            );
        } else {
            tracing::info!(
                request_id = %ctx.request_id,
                identity = identity.unwrap_or("-"),
                kind = error.kind(),
                "Login failed"
            );
        }
        error
    }
}

// =============================================================================
// CredentialAuthenticationStage
// =============================================================================

/// Authenticates login credentials and opens a session.
///
/// The secret is always compared, against a decoy hash when the identity is
/// unknown, so the response time does not reveal whether an account exists.
/// Account status is checked only after the secret matched.
pub struct CredentialAuthenticationStage {
    accounts: Arc<dyn AccountStore>,
    encoder: Arc<dyn PasswordEncoder>,
    sessions: SessionManager,
    decoy_hash: Arc<str>,
    success: Arc<dyn AuthenticationSuccessHandler>,
    failure: Arc<dyn AuthenticationFailureHandler>,
}

impl CredentialAuthenticationStage {
    /// Creates a new stage with the default callbacks.
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        encoder: Arc<dyn PasswordEncoder>,
        sessions: SessionManager,
    ) -> AuthResult<Self> {
        let decoy_hash = encoder.encode(&Uuid::new_v4().to_string())?;

        Ok(Self {
            accounts,
            encoder,
            sessions,
            decoy_hash: decoy_hash.into(),
            success: Arc::new(LoginResponseHandler),
            failure: Arc::new(UniformFailureHandler),
        })
    }

    /// Replaces the success callback.
    pub fn with_success_handler(mut self, handler: impl AuthenticationSuccessHandler) -> Self {
        self.success = Arc::new(handler);
        self
    }

    /// Replaces the failure callback.
    pub fn with_failure_handler(mut self, handler: impl AuthenticationFailureHandler) -> Self {
        self.failure = Arc::new(handler);
        self
    }

    fn parse(ctx: &RequestContext) -> AuthResult<LoginRequest> {
        let body = ctx
            .body
            .as_deref()
            .ok_or_else(|| AuthError::malformed_request("missing request body"))?;

        let request: LoginRequest = serde_json::from_slice(body)
            .map_err(|e| AuthError::malformed_request(e.to_string()))?;

        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AuthError::malformed_request("email and password are required"));
        }
        Ok(request)
    }

    async fn authenticate(&self, request: &LoginRequest) -> AuthResult<LoginOutcome> {
        let account = self.accounts.find_by_email(request.email.trim()).await?;

        let hash = match &account {
            Some(account) => Arc::from(account.password_hash.as_str()),
            None => self.decoy_hash.clone(),
        };
        let matched = self.verify_secret(request.password.clone(), hash).await?;

        let account = match account {
            Some(account) if matched => account,
            _ => return Err(AuthError::InvalidCredentials),
        };

        if !account.status.is_active() {
            return Err(AuthError::AccountNotActive {
                status: account.status,
            });
        }

        let tokens = self.sessions.open(&account).await?;
        Ok(LoginOutcome { account, tokens })
    }

    async fn verify_secret(&self, raw: String, hash: Arc<str>) -> AuthResult<bool> {
        let encoder = self.encoder.clone();
        tokio::task::spawn_blocking(move || encoder.matches(&raw, &hash))
            .await
            .map_err(|e| AuthError::internal(format!("password check task failed: {}", e)))
    }
}

#[async_trait]
impl Stage for CredentialAuthenticationStage {
    fn name(&self) -> &'static str {
        "credential_authentication"
    }

    fn needs_body(&self) -> bool {
        true
    }

    async fn process(&self, mut ctx: RequestContext) -> AuthResult<RequestContext> {
        let request = match Self::parse(&ctx) {
            Ok(request) => request,
            Err(e) => return Err(self.failure.on_failure(&ctx, None, e)),
        };

        match self.authenticate(&request).await {
            Ok(outcome) => {
                self.success.on_success(&mut ctx, outcome)?;
                Ok(ctx)
            }
            Err(e) => Err(self.failure.on_failure(&ctx, Some(&request.email), e)),
        }
    }
}

impl std::fmt::Debug for CredentialAuthenticationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialAuthenticationStage")
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::{header, Method};
    use tripmate_core::{AccountStatus, Argon2PasswordEncoder, InMemoryAccountStore, NewAccount};

    use super::*;
    use crate::auth::{TokenCodec, TokenCodecConfig, REFRESH_HEADER};
    use crate::revocation::{MemoryRevocationStore, RevocationRegistry};

    struct Fixture {
        stage: CredentialAuthenticationStage,
        accounts: Arc<InMemoryAccountStore>,
        sessions: SessionManager,
    }

    async fn fixture() -> Fixture {
        let accounts = Arc::new(InMemoryAccountStore::new());
        let encoder = Arc::new(Argon2PasswordEncoder::with_cost(256, 1).unwrap());

        accounts
            .insert(NewAccount {
                email: "a@x.com".to_string(),
                display_name: "A".to_string(),
                password_hash: encoder.encode("correct").unwrap(),
                roles: vec!["USER".to_string()],
            })
            .await
            .unwrap();

        let codec = TokenCodec::new(TokenCodecConfig::new(
            "test-secret-key-that-is-long-enough-for-testing",
        ))
        .unwrap();
        let revocations = RevocationRegistry::new(
            Arc::new(MemoryRevocationStore::new()),
            Duration::from_millis(250),
        );
        let sessions = SessionManager::new(codec, revocations, accounts.clone());

        let stage =
            CredentialAuthenticationStage::new(accounts.clone(), encoder, sessions.clone())
                .unwrap();

        Fixture {
            stage,
            accounts,
            sessions,
        }
    }

    fn login(body: &str) -> RequestContext {
        RequestContext::new(Method::POST, "/members/login".parse().unwrap())
            .with_body(body.to_string())
    }

    #[tokio::test]
    async fn test_login_success() {
        let f = fixture().await;

        let ctx = f
            .stage
            .process(login(r#"{"email":"a@x.com","password":"correct"}"#))
            .await
            .unwrap();

        let outcome = ctx.extensions.get::<LoginOutcome>().unwrap();
        assert_eq!(outcome.account.email, "a@x.com");

        let bearer = ctx.response_headers[header::AUTHORIZATION].to_str().unwrap();
        let access = bearer.strip_prefix("Bearer ").unwrap();
        let claims = f.sessions.codec().verify(access).unwrap();
        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.roles, vec!["USER"]);

        let refresh = ctx.response_headers[REFRESH_HEADER].to_str().unwrap();
        let refresh_claims = f.sessions.codec().verify(refresh).unwrap();
        assert!(f
            .sessions
            .revocations()
            .is_refresh_active(&refresh_claims.sid)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_identity_alias_accepted() {
        let f = fixture().await;
        assert!(f
            .stage
            .process(login(r#"{"identity":"a@x.com","secret":"correct"}"#))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_unknown_identity_and_wrong_password_look_the_same() {
        let f = fixture().await;

        let unknown = f
            .stage
            .process(login(r#"{"email":"b@x.com","password":"correct"}"#))
            .await
            .unwrap_err();
        let wrong = f
            .stage
            .process(login(r#"{"email":"a@x.com","password":"wrong"}"#))
            .await
            .unwrap_err();

        assert_eq!(unknown, AuthError::InvalidCredentials);
        assert_eq!(wrong, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_suspended_account() {
        let f = fixture().await;
        let account = f.accounts.find_by_email("a@x.com").await.unwrap().unwrap();
        f.accounts
            .update_status(account.id, AccountStatus::Suspended)
            .await
            .unwrap();

        let err = f
            .stage
            .process(login(r#"{"email":"a@x.com","password":"correct"}"#))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::AccountNotActive {
                status: AccountStatus::Suspended
            }
        );

        // A wrong secret on an inactive account reveals nothing about its status.
        let err = f
            .stage
            .process(login(r#"{"email":"a@x.com","password":"wrong"}"#))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let f = fixture().await;

        for body in ["", "not json", r#"{"email":"a@x.com"}"#, r#"{"email":"","password":"x"}"#] {
            let err = f.stage.process(login(body)).await.unwrap_err();
            assert!(matches!(err, AuthError::MalformedRequest { .. }), "{body}");
        }

        let no_body = RequestContext::new(Method::POST, "/members/login".parse().unwrap());
        assert!(matches!(
            f.stage.process(no_body).await,
            Err(AuthError::MalformedRequest { .. })
        ));
    }
}
