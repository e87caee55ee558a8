// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health check handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::response::{ComponentStatus, HealthResponse, ReadinessResponse};
use crate::state::AppState;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Simple liveness check. Returns 200 OK if the service is running.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse::healthy())
}

// =============================================================================
// Readiness Check
// =============================================================================

/// GET /ready
///
/// Round-trips the revocation store. Without it no protected request can be
/// verified, so the service is not ready.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let revocations = state.revocations();

    let store = match revocations.ping().await {
        Ok(()) => ComponentStatus {
            name: format!("revocation_store:{}", revocations.backend()),
            healthy: true,
            message: None,
        },
        Err(e) => ComponentStatus {
            name: format!("revocation_store:{}", revocations.backend()),
            healthy: false,
            message: Some(e.to_string()),
        },
    };

    let ready = store.healthy;
    let response = ReadinessResponse {
        ready,
        components: vec![store],
    };

    if ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}
