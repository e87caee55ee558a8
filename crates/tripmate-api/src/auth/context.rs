// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication context.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripmate_core::Principal;
use uuid::Uuid;

use super::Claims;

/// Authenticated state for one request.
///
/// Built by the verification stage from verified claims and handed to
/// handlers through request extensions. Never shared between requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Verified identity and roles.
    pub principal: Principal,
    /// Key of the presented access token.
    pub token_id: String,
    /// Login session the token belongs to.
    pub session_id: String,
    /// Access token expiry (Unix timestamp).
    pub expires_at: i64,
    /// Request ID for tracing.
    pub request_id: Uuid,
    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<IpAddr>,
}

impl AuthContext {
    /// Creates a context from verified access token claims.
    pub fn from_claims(claims: &Claims, request_id: Uuid) -> Self {
        Self {
            principal: claims.principal(),
            token_id: claims.jti.clone(),
            session_id: claims.sid.clone(),
            expires_at: claims.exp,
            request_id,
            client_ip: None,
        }
    }

    /// Sets the client IP address.
    pub fn with_client_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.client_ip = ip;
        self
    }

    /// Returns the authenticated identity.
    pub fn identity(&self) -> &str {
        &self.principal.identity
    }

    /// Returns `true` if the context has the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.principal.has_role(role)
    }

    /// Returns `true` if the context has any of the given roles.
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        self.principal.has_any_role(roles)
    }

    /// Returns the access token expiry as a DateTime.
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_context_from_claims() {
        let claims = Claims::access("a@x.com", vec!["USER".to_string()], "sid-1", 0, 60);
        let request_id = Uuid::now_v7();

        let ctx = AuthContext::from_claims(&claims, request_id)
            .with_client_ip(Some("127.0.0.1".parse().unwrap()));

        assert_eq!(ctx.identity(), "a@x.com");
        assert_eq!(ctx.token_id, claims.jti);
        assert_eq!(ctx.session_id, "sid-1");
        assert_eq!(ctx.request_id, request_id);
        assert!(ctx.has_role("USER"));
        assert!(ctx.has_any_role(&["ADMIN", "USER"]));
        assert!(!ctx.has_any_role(&["ADMIN"]));
        assert_eq!(ctx.expiry().map(|t| t.timestamp()), Some(60));
    }
}
