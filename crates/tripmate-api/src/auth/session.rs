// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Login sessions: minting, rotation and logout.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use chrono::Utc;
use tripmate_core::{Account, AccountStore, AuthError, AuthResult};
use uuid::Uuid;

use super::{AuthContext, Claims, TokenCodec, TokenKind};
use crate::revocation::RevocationRegistry;

/// Response header carrying the refresh token.
pub const REFRESH_HEADER: HeaderName = HeaderName::from_static("refresh");

// =============================================================================
// IssuedTokens
// =============================================================================

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    /// Signed access token.
    pub access_token: String,
    /// Signed refresh token.
    pub refresh_token: String,
    /// Claims inside the access token.
    pub access_claims: Claims,
    /// Claims inside the refresh token.
    pub refresh_claims: Claims,
}

impl IssuedTokens {
    /// Returns the login session id shared by the pair.
    pub fn session_id(&self) -> &str {
        &self.access_claims.sid
    }

    /// Returns seconds until the access token expires, counted from issuance.
    pub fn expires_in(&self) -> i64 {
        self.access_claims.exp - self.access_claims.iat
    }

    /// Builds the `Authorization` and `Refresh` response headers.
    pub fn headers(&self) -> AuthResult<HeaderMap> {
        let bearer = HeaderValue::try_from(format!("Bearer {}", self.access_token))
            .map_err(|e| AuthError::internal(format!("invalid access token header: {}", e)))?;
        let refresh = HeaderValue::try_from(self.refresh_token.as_str())
            .map_err(|e| AuthError::internal(format!("invalid refresh token header: {}", e)))?;

        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert(REFRESH_HEADER, refresh);
        Ok(headers)
    }
}

// =============================================================================
// SessionManager
// =============================================================================

/// Opens, rotates and closes login sessions.
///
/// One login session owns exactly one active refresh entry. Rotation consumes
/// it and opens a new session, so a refresh token can be used at most once.
#[derive(Clone)]
pub struct SessionManager {
    codec: TokenCodec,
    revocations: RevocationRegistry,
    accounts: Arc<dyn AccountStore>,
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(
        codec: TokenCodec,
        revocations: RevocationRegistry,
        accounts: Arc<dyn AccountStore>,
    ) -> Self {
        Self {
            codec,
            revocations,
            accounts,
        }
    }

    /// Returns the token codec.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Returns the revocation registry.
    pub fn revocations(&self) -> &RevocationRegistry {
        &self.revocations
    }

    /// Mints a token pair for an authenticated account and records the
    /// refresh token as active.
    pub async fn open(&self, account: &Account) -> AuthResult<IssuedTokens> {
        let session_id = Uuid::now_v7().to_string();
        let now = Utc::now().timestamp();

        let access_claims =
            self.codec
                .access_claims(&account.email, account.roles.clone(), &session_id, now);
        let refresh_claims = self.codec.refresh_claims(&account.email, &session_id, now);

        let access_token = self.codec.issue(&access_claims)?;
        let refresh_token = self.codec.issue(&refresh_claims)?;

        let ttl = Duration::from_secs(self.codec.refresh_lifetime_secs().max(0) as u64);
        self.revocations.register_refresh(&session_id, ttl).await?;

        tracing::debug!(
            subject = %account.email,
            session_id = %session_id,
            "Session opened"
        );

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            access_claims,
            refresh_claims,
        })
    }

    /// Logs out the session behind an authenticated request.
    ///
    /// Blacklists the presented access token for its remaining lifetime and
    /// drops the session's refresh entry. Repeating it is a no-op.
    pub async fn close(&self, auth: &AuthContext) -> AuthResult<()> {
        let now = Utc::now().timestamp();
        let remaining = Duration::from_secs((auth.expires_at - now).max(0) as u64);

        self.revocations.blacklist(&auth.token_id, remaining).await?;
        self.revocations.revoke_refresh(&auth.session_id).await?;

        tracing::info!(
            subject = %auth.identity(),
            session_id = %auth.session_id,
            "Session closed"
        );
        Ok(())
    }

    /// Exchanges a refresh token for a new pair under a new session.
    ///
    /// Returns the re-read account with the new pair.
    ///
    /// Fails with [`AuthError::RefreshDenied`] for anything other than a
    /// valid, unused refresh token of an active account. Store failures stay
    /// [`AuthError::StoreUnavailable`].
    pub async fn rotate(&self, refresh_token: &str) -> AuthResult<(Account, IssuedTokens)> {
        let claims = self.codec.verify(refresh_token).map_err(|e| {
            tracing::warn!(kind = e.kind(), error = %e, "Refresh token rejected");
            AuthError::refresh_denied(e.kind())
        })?;

        if claims.typ != TokenKind::Refresh {
            return Err(AuthError::refresh_denied("not a refresh token"));
        }

        if !self.revocations.consume_refresh(&claims.sid).await? {
            tracing::warn!(
                subject = %claims.sub,
                session_id = %claims.sid,
                "Refresh token is no longer active"
            );
            return Err(AuthError::refresh_denied("refresh token is not active"));
        }

        let account = self
            .accounts
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| AuthError::refresh_denied("account no longer exists"))?;

        if !account.status.is_active() {
            tracing::info!(
                subject = %account.email,
                status = %account.status,
                "Refresh denied for inactive account"
            );
            return Err(AuthError::refresh_denied("account is not active"));
        }

        let issued = self.open(&account).await?;

        tracing::info!(
            subject = %account.email,
            old_session_id = %claims.sid,
            session_id = %issued.session_id(),
            "Session rotated"
        );
        Ok((account, issued))
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("codec", &self.codec)
            .field("revocations", &self.revocations)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
