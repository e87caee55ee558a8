// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom extractors for API handlers.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts, Path, Query},
    http::{request::Parts, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;
use tripmate_core::{AccountId, AuthError};

use crate::auth::{AuthContext, REFRESH_HEADER};
use crate::error::ApiError;
use crate::pipeline::LoginOutcome;

// =============================================================================
// Auth Extractor
// =============================================================================

/// Extractor for authenticated requests.
///
/// Extracts the `AuthContext` the verification stage attached. Returns 401 if
/// the route was not behind it.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Auth(ctx): Auth) -> impl IntoResponse {
///     format!("Hello, {}", ctx.identity())
/// }
/// ```
pub struct Auth(pub AuthContext);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Auth)
            .ok_or(ApiError::Auth(AuthError::MissingToken))
    }
}

// =============================================================================
// Login Result Extractor
// =============================================================================

/// Extractor for the outcome of the credential authentication stage.
pub struct LoginResult(pub LoginOutcome);

impl<S> FromRequestParts<S> for LoginResult
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<LoginOutcome>()
            .cloned()
            .map(LoginResult)
            .ok_or_else(|| ApiError::internal("login route is not behind the login stage"))
    }
}

// =============================================================================
// Refresh Token Extractor
// =============================================================================

/// Extractor for the `Refresh` request header.
pub struct RefreshToken(pub String);

impl<S> FromRequestParts<S> for RefreshToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(REFRESH_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .map(|v| v.strip_prefix("Bearer ").unwrap_or(v))
            .filter(|v| !v.is_empty())
            .map(|v| RefreshToken(v.to_string()))
            .ok_or(ApiError::Auth(AuthError::refresh_denied(
                "missing refresh header",
            )))
    }
}

// =============================================================================
// Validated JSON Extractor
// =============================================================================

/// Extractor for validated JSON payloads.
///
/// Extracts and deserializes JSON, returning appropriate errors for malformed input.
pub struct ValidatedJson<T>(pub T);

impl<S, T> axum::extract::FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(
        req: axum::http::Request<axum::body::Body>,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

        Ok(ValidatedJson(value))
    }
}

// =============================================================================
// Pagination Extractor
// =============================================================================

/// Query parameters for pagination.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PaginationParams {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page.
    #[serde(default = "default_size", alias = "per_page")]
    pub size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_size() -> u32 {
    20
}

impl PaginationParams {
    /// Returns the offset for store queries.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit()
    }

    /// Returns the limit for store queries.
    pub fn limit(&self) -> usize {
        self.size.min(100) as usize // Cap at 100
    }

    /// Validates the pagination parameters.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.page == 0 {
            return Err(ApiError::validation("Page must be greater than 0"));
        }
        if self.size == 0 || self.size > 100 {
            return Err(ApiError::validation("size must be between 1 and 100"));
        }
        Ok(())
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            size: default_size(),
        }
    }
}

/// Extractor for pagination parameters.
pub struct Pagination(pub PaginationParams);

impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<PaginationParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid pagination parameters: {}", e)))?;

        params.validate()?;
        Ok(Pagination(params))
    }
}

// =============================================================================
// Member ID Extractor
// =============================================================================

/// Extractor for a member ID from the path.
pub struct MemberIdPath(pub AccountId);

impl<S> FromRequestParts<S> for MemberIdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(member_id) = Path::<u64>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid member ID: {}", e)))?;

        Ok(MemberIdPath(AccountId::new(member_id)))
    }
}

// =============================================================================
// Client IP
// =============================================================================

/// Resolves the client IP from proxy headers, falling back to the peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<&ConnectInfo<SocketAddr>>) -> Option<IpAddr> {
    // Try to get from X-Forwarded-For header
    let forwarded = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse().ok());

    if forwarded.is_some() {
        return forwarded;
    }

    // Try to get from X-Real-IP header
    let real_ip = headers
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok());

    real_ip.or_else(|| peer.map(|ci| ci.0.ip()))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_pagination_params() {
        let params = PaginationParams { page: 2, size: 10 };

        assert_eq!(params.offset(), 10);
        assert_eq!(params.limit(), 10);
    }

    #[test]
    fn test_pagination_validation() {
        assert!(PaginationParams::default().validate().is_ok());
        assert!(PaginationParams { page: 0, size: 20 }.validate().is_err());
        assert!(PaginationParams { page: 1, size: 200 }.validate().is_err());
    }

    #[test]
    fn test_client_ip_precedence() {
        let peer = ConnectInfo(SocketAddr::from(([10, 0, 0, 1], 4000)));
        let mut headers = HeaderMap::new();

        assert_eq!(
            client_ip(&headers, Some(&peer)),
            Some("10.0.0.1".parse().unwrap())
        );

        headers.insert("X-Real-IP", HeaderValue::from_static("192.168.0.2"));
        assert_eq!(
            client_ip(&headers, Some(&peer)),
            Some("192.168.0.2".parse().unwrap())
        );

        headers.insert(
            "X-Forwarded-For",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(
            client_ip(&headers, Some(&peer)),
            Some("203.0.113.7".parse().unwrap())
        );
    }
}
