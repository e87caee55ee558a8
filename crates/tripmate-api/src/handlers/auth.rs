// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers.

use axum::{extract::State, response::IntoResponse, Json};

use crate::error::ApiResult;
use crate::extractors::{Auth, LoginResult, RefreshToken};
use crate::response::{ApiResponse, TokenResponse};
use crate::state::AppState;

// =============================================================================
// Login
// =============================================================================

/// POST /members/login
///
/// Credentials were already checked by the login stage and the token headers
/// are merged into this response. The body repeats them for clients that
/// cannot read response headers.
pub async fn login(LoginResult(outcome): LoginResult) -> ApiResult<impl IntoResponse> {
    Ok(Json(TokenResponse::new(&outcome.tokens, &outcome.account)))
}

// =============================================================================
// Logout
// =============================================================================

/// POST /members/logout
///
/// Blacklists the presented access token and drops its session's refresh
/// token.
pub async fn logout(
    State(state): State<AppState>,
    Auth(auth_ctx): Auth,
) -> ApiResult<impl IntoResponse> {
    state.sessions.close(&auth_ctx).await?;

    Ok(ApiResponse::ok())
}

// =============================================================================
// Refresh Token
// =============================================================================

/// POST /members/refresh
///
/// Exchanges the `Refresh` header for a new token pair. The presented refresh
/// token is consumed and cannot be replayed.
pub async fn refresh_token(
    State(state): State<AppState>,
    RefreshToken(token): RefreshToken,
) -> ApiResult<impl IntoResponse> {
    let (account, tokens) = state.sessions.rotate(&token).await?;
    let headers = tokens.headers()?;

    Ok((headers, Json(TokenResponse::new(&tokens, &account))))
}
