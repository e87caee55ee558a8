// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bearer token verification for protected routes.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use tripmate_core::{AuthError, AuthResult};

use super::{RequestContext, RouteRule, Stage};
use crate::auth::{AuthContext, TokenCodec, TokenKind};
use crate::revocation::RevocationRegistry;

/// Verifies the bearer token and attaches the principal.
///
/// Never reads the account store: roles are as fresh as the token.
#[derive(Debug, Clone)]
pub struct TokenVerificationStage {
    codec: TokenCodec,
    revocations: RevocationRegistry,
    revoked_allowed: Vec<RouteRule>,
}

impl TokenVerificationStage {
    /// Creates a new stage.
    pub fn new(codec: TokenCodec, revocations: RevocationRegistry) -> Self {
        Self {
            codec,
            revocations,
            revoked_allowed: Vec::new(),
        }
    }

    /// Lets an already blacklisted token through on the given routes.
    ///
    /// The token must still be well formed, signed and unexpired. Only
    /// routes whose handler is idempotent on a revoked token belong here.
    pub fn allow_revoked_on(mut self, rules: impl IntoIterator<Item = RouteRule>) -> Self {
        self.revoked_allowed.extend(rules);
        self
    }

    fn allows_revoked(&self, ctx: &RequestContext) -> bool {
        self.revoked_allowed
            .iter()
            .any(|rule| rule.matches(&ctx.method, ctx.uri.path()))
    }

    async fn verify(&self, ctx: &RequestContext) -> AuthResult<AuthContext> {
        let token = bearer_token(&ctx.headers).ok_or(AuthError::MissingToken)?;

        let claims = self.codec.verify(token)?;
        if claims.typ != TokenKind::Access {
            return Err(AuthError::malformed_token("refresh token used as bearer"));
        }

        if self.revocations.is_blacklisted(&claims.jti).await? {
            if !self.allows_revoked(ctx) {
                return Err(AuthError::RevokedToken);
            }
            tracing::debug!(
                request_id = %ctx.request_id,
                token_id = %claims.jti,
                "Revoked token accepted on idempotent route"
            );
        }

        Ok(AuthContext::from_claims(&claims, ctx.request_id).with_client_ip(ctx.client_ip))
    }
}

#[async_trait]
impl Stage for TokenVerificationStage {
    fn name(&self) -> &'static str {
        "token_verification"
    }

    async fn process(&self, mut ctx: RequestContext) -> AuthResult<RequestContext> {
        match self.verify(&ctx).await {
            Ok(auth) => {
                tracing::debug!(
                    request_id = %ctx.request_id,
                    subject = %auth.identity(),
                    session_id = %auth.session_id,
                    "Token verified"
                );
                ctx.auth = Some(auth);
                Ok(ctx)
            }
            Err(e) => {
                if e.is_token_rejection() {
                    tracing::warn!(
                        request_id = %ctx.request_id,
                        path = %ctx.uri.path(),
                        kind = e.kind(),
                        reason = %e,
                        "Token verification failed"
                    );
                }
                Err(e)
            }
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::http::{HeaderValue, Method};
    use chrono::Utc;

    use super::*;
    use crate::auth::{Claims, TokenCodecConfig};
    use crate::revocation::MemoryRevocationStore;

    fn stage() -> TokenVerificationStage {
        let codec = TokenCodec::new(TokenCodecConfig::new(
            "test-secret-key-that-is-long-enough-for-testing",
        ))
        .unwrap();
        let revocations = RevocationRegistry::new(
            Arc::new(MemoryRevocationStore::new()),
            Duration::from_millis(250),
        );
        TokenVerificationStage::new(codec, revocations)
    }

    fn request(token: Option<&str>) -> RequestContext {
        request_to(Method::GET, "/members/me", token)
    }

    fn request_to(method: Method, path: &str, token: Option<&str>) -> RequestContext {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            headers.insert(
                header::AUTHORIZATION,
                HeaderValue::try_from(format!("Bearer {}", token)).unwrap(),
            );
        }
        RequestContext::new(method, path.parse().unwrap()).with_headers(headers)
    }

    fn access_token(stage: &TokenVerificationStage, issued_at: i64) -> (String, Claims) {
        let claims =
            stage
                .codec
                .access_claims("a@x.com", vec!["USER".to_string()], "sid-1", issued_at);
        (stage.codec.issue(&claims).unwrap(), claims)
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer mytoken123"),
        );
        assert_eq!(bearer_token(&headers), Some("mytoken123"));
    }

    #[tokio::test]
    async fn test_valid_token_attaches_principal() {
        let stage = stage();
        let (token, claims) = access_token(&stage, Utc::now().timestamp());

        let ctx = stage.process(request(Some(&token))).await.unwrap();
        let auth = ctx.auth.unwrap();

        assert_eq!(auth.principal.identity, "a@x.com");
        assert_eq!(auth.principal.roles, vec!["USER"]);
        assert_eq!(auth.token_id, claims.jti);
    }

    #[tokio::test]
    async fn test_missing_token() {
        let err = stage().process(request(None)).await.unwrap_err();
        assert_eq!(err, AuthError::MissingToken);
    }

    #[tokio::test]
    async fn test_expired_token() {
        let stage = stage();
        let (token, _) = access_token(&stage, Utc::now().timestamp() - 3 * 3600);

        let err = stage.process(request(Some(&token))).await.unwrap_err();
        assert_eq!(err, AuthError::ExpiredToken);
    }

    #[tokio::test]
    async fn test_blacklisted_token() {
        let stage = stage();
        let (token, claims) = access_token(&stage, Utc::now().timestamp());
        let (other, _) = access_token(&stage, Utc::now().timestamp());

        stage
            .revocations
            .blacklist(&claims.jti, Duration::from_secs(60))
            .await
            .unwrap();

        let err = stage.process(request(Some(&token))).await.unwrap_err();
        assert_eq!(err, AuthError::RevokedToken);
        assert!(stage.process(request(Some(&other))).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoked_token_allowed_only_on_listed_routes() {
        let stage = stage().allow_revoked_on([RouteRule::post("/members/logout")]);
        let (token, claims) = access_token(&stage, Utc::now().timestamp());

        stage
            .revocations
            .blacklist(&claims.jti, Duration::from_secs(60))
            .await
            .unwrap();

        let ctx = stage
            .process(request_to(Method::POST, "/members/logout", Some(&token)))
            .await
            .unwrap();
        assert_eq!(ctx.auth.unwrap().token_id, claims.jti);

        let err = stage.process(request(Some(&token))).await.unwrap_err();
        assert_eq!(err, AuthError::RevokedToken);
    }

    #[tokio::test]
    async fn test_expired_token_rejected_on_revoked_allowed_route() {
        let stage = stage().allow_revoked_on([RouteRule::post("/members/logout")]);
        let (token, _) = access_token(&stage, Utc::now().timestamp() - 3 * 3600);

        let err = stage
            .process(request_to(Method::POST, "/members/logout", Some(&token)))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::ExpiredToken);
    }

    #[tokio::test]
    async fn test_refresh_token_rejected_as_bearer() {
        let stage = stage();
        let claims = stage
            .codec
            .refresh_claims("a@x.com", "sid-1", Utc::now().timestamp());
        let token = stage.codec.issue(&claims).unwrap();

        assert!(matches!(
            stage.process(request(Some(&token))).await,
            Err(AuthError::MalformedToken { .. })
        ));
    }
}
