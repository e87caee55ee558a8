// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tripmate_core::{Account, AccountId, AccountStatus};

use crate::auth::IssuedTokens;

// =============================================================================
// ApiResponse
// =============================================================================

/// Generic API response wrapper.
///
/// Provides consistent response structure across all endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation was successful.
    pub success: bool,
    /// Response data (if successful).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Additional metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response with data.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            meta: None,
        }
    }

    /// Adds metadata to the response.
    pub fn with_meta(mut self, meta: ResponseMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl ApiResponse<()> {
    /// Creates a successful response without data.
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            meta: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

// =============================================================================
// Response Meta
// =============================================================================

/// Response metadata for pagination.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Total number of items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Page number (1-indexed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Items per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// Total pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

impl ResponseMeta {
    /// Creates pagination metadata.
    pub fn pagination(total: u64, page: u32, size: u32) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total.div_ceil(size as u64) as u32
        };
        Self {
            total: Some(total),
            page: Some(page),
            size: Some(size),
            total_pages: Some(total_pages),
        }
    }
}

// =============================================================================
// Typed Responses
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Version string.
    pub version: String,
}

impl HealthResponse {
    /// Creates a healthy response.
    pub fn healthy() -> Self {
        Self {
            status: "ok".to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

/// Readiness check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Whether the service is ready.
    pub ready: bool,
    /// Component statuses.
    pub components: Vec<ComponentStatus>,
}

/// Status of a system component.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// Component name.
    pub name: String,
    /// Whether the component is healthy.
    pub healthy: bool,
    /// Optional message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Token pair returned by login and refresh.
///
/// The same values are also sent in the `Authorization` and `Refresh`
/// response headers.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Token type (always "Bearer").
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    /// The member the tokens were issued to.
    pub member: MemberResponse,
}

impl TokenResponse {
    /// Creates a token response.
    pub fn new(tokens: &IssuedTokens, account: &Account) -> Self {
        Self {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            token_type: "Bearer".to_string(),
            expires_in: tokens.expires_in(),
            member: MemberResponse::from(account),
        }
    }
}

/// Public view of a member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberResponse {
    /// Member ID.
    pub id: AccountId,
    /// Email.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Roles.
    pub roles: Vec<String>,
    /// Status.
    pub status: AccountStatus,
    /// Sign-up time.
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for MemberResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            display_name: account.display_name.clone(),
            roles: account.roles.clone(),
            status: account.status,
            created_at: account.created_at,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success(42);
        assert!(response.success);
        assert_eq!(response.data, Some(42));
    }

    #[test]
    fn test_response_meta_pagination() {
        let meta = ResponseMeta::pagination(101, 2, 10);
        assert_eq!(meta.total, Some(101));
        assert_eq!(meta.page, Some(2));
        assert_eq!(meta.total_pages, Some(11));
    }

    #[test]
    fn test_member_response_hides_hash() {
        let account = Account {
            id: AccountId::new(1),
            email: "a@x.com".to_string(),
            display_name: "A".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            roles: vec!["USER".to_string()],
            status: AccountStatus::Active,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&MemberResponse::from(&account)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"status\":\"ACTIVE\""));
    }
}
