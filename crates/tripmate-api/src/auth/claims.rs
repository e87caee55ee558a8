// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token claims.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripmate_core::Principal;
use uuid::Uuid;

/// Which half of a token pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived bearer credential carrying roles.
    Access,
    /// Long-lived credential used only for rotation.
    Refresh,
}

/// Claims signed into every token.
///
/// Access and refresh tokens minted at the same login share `sid`. Only access
/// tokens carry roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    // =========================================================================
    // Standard JWT Claims (RFC 7519)
    // =========================================================================
    /// Subject: the account identity (email).
    pub sub: String,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Token key used by the blacklist.
    pub jti: String,

    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    // =========================================================================
    // Custom Claims
    // =========================================================================
    /// Login session shared by an access/refresh pair.
    pub sid: String,

    /// Token kind.
    pub typ: TokenKind,

    /// Roles (access tokens only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl Claims {
    /// Creates access token claims.
    pub fn access(
        subject: impl Into<String>,
        roles: Vec<String>,
        session_id: impl Into<String>,
        issued_at: i64,
        lifetime_secs: i64,
    ) -> Self {
        Self {
            sub: subject.into(),
            iat: issued_at,
            exp: issued_at + lifetime_secs,
            jti: Uuid::now_v7().to_string(),
            iss: None,
            sid: session_id.into(),
            typ: TokenKind::Access,
            roles,
        }
    }

    /// Creates refresh token claims. Refresh tokens never carry roles.
    pub fn refresh(
        subject: impl Into<String>,
        session_id: impl Into<String>,
        issued_at: i64,
        lifetime_secs: i64,
    ) -> Self {
        Self {
            sub: subject.into(),
            iat: issued_at,
            exp: issued_at + lifetime_secs,
            jti: Uuid::now_v7().to_string(),
            iss: None,
            sid: session_id.into(),
            typ: TokenKind::Refresh,
            roles: Vec::new(),
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    /// Returns `true` if the claims have the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Returns `true` if the token is no longer valid at `now`.
    ///
    /// A token is valid strictly before its expiry.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }

    /// Returns the lifetime left at `now`, or `None` once expired.
    pub fn remaining_at(&self, now: i64) -> Option<Duration> {
        let secs = self.exp - now;
        (secs > 0).then(|| Duration::from_secs(secs as u64))
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Returns the principal these claims describe.
    pub fn principal(&self) -> Principal {
        Principal::new(self.sub.clone(), self.roles.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================
