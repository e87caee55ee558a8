// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error hierarchy for the authentication subsystem.
//!
//! Every rejection produced while authenticating or verifying a request is an
//! [`AuthError`]. The variants keep the precise reason so it can be logged;
//! the HTTP layer collapses them into uniform external messages.
//!
//! # Error Hierarchy
//!
//! ```text
//! AuthError
//! ├── MalformedRequest      400
//! ├── InvalidCredentials    401
//! ├── MissingToken          401
//! ├── ExpiredToken          401
//! ├── MalformedToken        401
//! ├── SignatureMismatch     401
//! ├── RevokedToken          401
//! ├── RefreshDenied         401
//! ├── AccountNotActive      403
//! ├── InsufficientRole      403
//! ├── StoreUnavailable      503
//! └── Internal              500
//!
//! AccountError              account store failures
//! ```

use thiserror::Error;

use crate::types::AccountStatus;

/// Result type alias for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Result type alias for account store operations.
pub type AccountResult<T> = Result<T, AccountError>;

// =============================================================================
// AuthError
// =============================================================================

/// Terminal rejection of the current request.
///
/// None of these are retried internally. The caller retries at the protocol
/// level by logging in again, refreshing, or backing off.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The request body could not be read as credentials.
    #[error("Malformed request: {reason}")]
    MalformedRequest {
        /// What was wrong with the payload.
        reason: String,
    },

    /// Unknown identity or wrong secret. The two are indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The account exists and the secret matched, but it may not sign in.
    #[error("Account is not active (status: {status})")]
    AccountNotActive {
        /// Current account status.
        status: AccountStatus,
    },

    /// No bearer token on a protected route.
    #[error("No bearer token provided")]
    MissingToken,

    /// The token's expiry has passed.
    #[error("Token has expired")]
    ExpiredToken,

    /// The token could not be decoded or has the wrong shape.
    #[error("Malformed token: {reason}")]
    MalformedToken {
        /// Decoder detail.
        reason: String,
    },

    /// The signature does not match the header and payload.
    #[error("Token signature mismatch")]
    SignatureMismatch,

    /// The token was blacklisted by a logout.
    #[error("Token has been revoked")]
    RevokedToken,

    /// A refresh token could not be rotated.
    #[error("Refresh denied: {reason}")]
    RefreshDenied {
        /// Why rotation was refused.
        reason: String,
    },

    /// The revocation store could not be reached in time.
    #[error("Revocation store unavailable: {reason}")]
    StoreUnavailable {
        /// Store or timeout detail.
        reason: String,
    },

    /// The principal lacks every role the route accepts.
    #[error("Insufficient role: one of {required:?} required")]
    InsufficientRole {
        /// Roles accepted by the route.
        required: Vec<String>,
    },

    /// Encoding, hashing or task failure.
    #[error("Internal error: {message}")]
    Internal {
        /// Detail for the logs.
        message: String,
    },
}

impl AuthError {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a malformed request error.
    pub fn malformed_request(reason: impl Into<String>) -> Self {
        Self::MalformedRequest {
            reason: reason.into(),
        }
    }

    /// Creates a malformed token error.
    pub fn malformed_token(reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            reason: reason.into(),
        }
    }

    /// Creates a refresh denied error.
    pub fn refresh_denied(reason: impl Into<String>) -> Self {
        Self::RefreshDenied {
            reason: reason.into(),
        }
    }

    /// Creates a store unavailable error.
    pub fn store_unavailable(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            reason: reason.into(),
        }
    }

    /// Creates an insufficient role error.
    pub fn insufficient_role<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::InsufficientRole {
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns a stable code for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MalformedRequest { .. } => "MALFORMED_REQUEST",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::AccountNotActive { .. } => "ACCOUNT_NOT_ACTIVE",
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::ExpiredToken => "EXPIRED_TOKEN",
            AuthError::MalformedToken { .. } => "MALFORMED_TOKEN",
            AuthError::SignatureMismatch => "SIGNATURE_MISMATCH",
            AuthError::RevokedToken => "REVOKED_TOKEN",
            AuthError::RefreshDenied { .. } => "REFRESH_DENIED",
            AuthError::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
            AuthError::InsufficientRole { .. } => "INSUFFICIENT_ROLE",
            AuthError::Internal { .. } => "INTERNAL",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::MalformedRequest { .. } => 400,
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::ExpiredToken
            | AuthError::MalformedToken { .. }
            | AuthError::SignatureMismatch
            | AuthError::RevokedToken
            | AuthError::RefreshDenied { .. } => 401,
            AuthError::AccountNotActive { .. } | AuthError::InsufficientRole { .. } => 403,
            AuthError::StoreUnavailable { .. } => 503,
            AuthError::Internal { .. } => 500,
        }
    }

    /// Returns `true` for failures of a presented bearer or refresh token.
    ///
    /// These share one external message so the verifier cannot be used as
    /// an oracle.
    pub fn is_token_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken
                | AuthError::ExpiredToken
                | AuthError::MalformedToken { .. }
                | AuthError::SignatureMismatch
                | AuthError::RevokedToken
                | AuthError::RefreshDenied { .. }
        )
    }

    /// Returns `true` if the failure is on the server side.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            AuthError::StoreUnavailable { .. } | AuthError::Internal { .. }
        )
    }
}

impl From<AccountError> for AuthError {
    fn from(err: AccountError) -> Self {
        AuthError::internal(format!("account store: {}", err))
    }
}

// =============================================================================
// AccountError
// =============================================================================

/// Account store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// No account with the given key.
    #[error("Account not found: {key}")]
    NotFound {
        /// Email or id that was looked up.
        key: String,
    },

    /// An account with this email already exists.
    #[error("Account already exists: {email}")]
    AlreadyExists {
        /// The duplicate email.
        email: String,
    },

    /// The backing store failed.
    #[error("Account storage error: {message}")]
    Storage {
        /// Backend detail.
        message: String,
    },
}

impl AccountError {
    /// Creates a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates an already exists error.
    pub fn already_exists(email: impl Into<String>) -> Self {
        Self::AlreadyExists {
            email: email.into(),
        }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
