// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Route role checks.

use async_trait::async_trait;
use tripmate_core::{AuthError, AuthResult};

use super::{RequestContext, Stage};
use crate::auth::AuthorizationGate;

/// Applies an [`AuthorizationGate`] to the verified principal.
///
/// Must run after token verification.
#[derive(Debug, Clone)]
pub struct AuthorizationStage {
    gate: AuthorizationGate,
}

impl AuthorizationStage {
    /// Creates a new stage.
    pub fn new(gate: AuthorizationGate) -> Self {
        Self { gate }
    }
}

#[async_trait]
impl Stage for AuthorizationStage {
    fn name(&self) -> &'static str {
        "authorization"
    }

    async fn process(&self, ctx: RequestContext) -> AuthResult<RequestContext> {
        let Some(auth) = ctx.auth.as_ref() else {
            tracing::warn!("No auth context found, denying access");
            return Err(AuthError::MissingToken);
        };

        if let Err(e) = self.gate.check(&ctx.method, ctx.uri.path(), &auth.principal) {
            tracing::warn!(
                request_id = %ctx.request_id,
                subject = %auth.identity(),
                roles = ?auth.principal.roles,
                path = %ctx.uri.path(),
                "Permission denied"
            );
            return Err(e);
        }

        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use uuid::Uuid;

    use super::*;
    use crate::auth::{AuthContext, Claims};

    fn ctx(path: &str, roles: &[&str]) -> RequestContext {
        let mut ctx = RequestContext::new(Method::GET, path.parse().unwrap());
        let claims = Claims::access(
            "a@x.com",
            roles.iter().map(|r| r.to_string()).collect(),
            "sid",
            0,
            60,
        );
        ctx.auth = Some(AuthContext::from_claims(&claims, Uuid::now_v7()));
        ctx
    }

    #[tokio::test]
    async fn test_allows_matching_role() {
        let stage = AuthorizationStage::new(AuthorizationGate::member_routes());
        assert!(stage.process(ctx("/members/me", &["USER"])).await.is_ok());
    }

    #[tokio::test]
    async fn test_denies_missing_role() {
        let stage = AuthorizationStage::new(AuthorizationGate::member_routes());

        let err = stage.process(ctx("/members", &["USER"])).await.unwrap_err();
        assert!(matches!(err, AuthError::InsufficientRole { .. }));
    }

    #[tokio::test]
    async fn test_requires_verified_principal() {
        let stage = AuthorizationStage::new(AuthorizationGate::member_routes());
        let bare = RequestContext::new(Method::GET, "/members/me".parse().unwrap());

        assert_eq!(stage.process(bare).await.unwrap_err(), AuthError::MissingToken);
    }
}
