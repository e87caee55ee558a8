// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Member account handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tripmate_core::{normalize_email, AccountStatus, NewAccount};

use crate::error::{ApiError, ApiResult, ValidationErrors};
use crate::extractors::{Auth, MemberIdPath, Pagination, ValidatedJson};
use crate::response::{ApiResponse, MemberResponse, ResponseMeta};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// Signup
// =============================================================================

/// Signup request body.
#[derive(Deserialize)]
pub struct SignupRequest {
    /// Sign-in identity.
    pub email: String,
    /// Raw secret, encoded before it is stored.
    pub password: String,
    /// Display name.
    #[serde(alias = "nickname")]
    pub display_name: String,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .finish()
    }
}

impl SignupRequest {
    fn validate(&self) -> ApiResult<()> {
        let mut errors = ValidationErrors::new();

        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') || email.starts_with('@') || email.ends_with('@')
        {
            errors.add("email", "must be a valid email address");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!("must be at least {} characters", MIN_PASSWORD_LEN),
            );
        }
        if self.display_name.trim().is_empty() {
            errors.add("display_name", "must not be empty");
        }

        errors.into_result(())
    }
}

/// POST /members/signup
///
/// Creates an account with the roles the authority resolver assigns.
///
/// The email is stored in its normalized form, so letter-case variants of an
/// existing identity conflict instead of creating a second account.
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    request.validate()?;

    let encoder = state.encoder.clone();
    let raw = request.password;
    let password_hash = tokio::task::spawn_blocking(move || encoder.encode(&raw))
        .await
        .map_err(|e| ApiError::internal(format!("password encoding task failed: {}", e)))??;

    let email = normalize_email(&request.email);
    let roles = state.authority.roles_for(&email);

    let account = state
        .accounts
        .insert(NewAccount {
            email,
            display_name: request.display_name.trim().to_string(),
            password_hash,
            roles,
        })
        .await?;

    tracing::info!(
        member_id = %account.id,
        subject = %account.email,
        roles = ?account.roles,
        "Member signed up"
    );

    Ok((
        StatusCode::CREATED,
        ApiResponse::success(MemberResponse::from(&account)),
    ))
}

// =============================================================================
// Current Member
// =============================================================================

/// GET /members/me
pub async fn current_member(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
) -> ApiResult<impl IntoResponse> {
    let account = state
        .accounts
        .find_by_email(auth_ctx.identity())
        .await?
        .ok_or_else(|| ApiError::not_found("회원"))?;

    Ok(ApiResponse::success(MemberResponse::from(&account)))
}

// =============================================================================
// Member Listing
// =============================================================================

/// GET /members?page=&size=
pub async fn list_members(
    State(state): State<AppState>,
    Pagination(params): Pagination,
) -> ApiResult<impl IntoResponse> {
    let (accounts, total) = state
        .accounts
        .list(params.offset(), params.limit())
        .await?;

    let members: Vec<MemberResponse> = accounts.iter().map(MemberResponse::from).collect();

    Ok(ApiResponse::success(members).with_meta(ResponseMeta::pagination(
        total as u64,
        params.page,
        params.size,
    )))
}

// =============================================================================
// Status Change
// =============================================================================

/// Status change request body.
#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    /// New status. Accepts the legacy `SLEEP` and `QUIT` names.
    pub status: String,
}

/// PATCH /members/{member_id}/status
///
/// Existing tokens stay valid until they expire. The new status is enforced
/// at the next login or refresh.
pub async fn update_member_status(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
    MemberIdPath(member_id): MemberIdPath,
    ValidatedJson(request): ValidatedJson<StatusChangeRequest>,
) -> ApiResult<impl IntoResponse> {
    let status: AccountStatus = request.status.parse().map_err(|e: String| {
        let mut errors = ValidationErrors::new();
        errors.add("status", e);
        ApiError::validation_with_errors("Validation failed", errors)
    })?;

    let account = state.accounts.update_status(member_id, status).await?;

    tracing::info!(
        member_id = %account.id,
        status = %account.status,
        changed_by = %auth_ctx.identity(),
        "Member status changed"
    );

    Ok(ApiResponse::success(MemberResponse::from(&account)))
}
