// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tripmate_core::{AccountStore, AuthorityResolver, PasswordEncoder};

use crate::auth::{AuthorizationGate, REFRESH_HEADER};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::PipelineLayer;
use crate::pipeline::{
    AuthorizationStage, CredentialAuthenticationStage, Pipeline, RouteRule,
    TokenVerificationStage,
};
use crate::revocation::RevocationStore;
use crate::state::{AppState, AppStateBuilder};

// =============================================================================
// Route Paths
// =============================================================================

/// Route paths served by the API.
pub mod paths {
    /// Liveness check.
    pub const HEALTH: &str = "/health";
    /// Readiness check.
    pub const READY: &str = "/ready";
    /// Credential login.
    pub const LOGIN: &str = "/members/login";
    /// Logout of the current session.
    pub const LOGOUT: &str = "/members/logout";
    /// Refresh token rotation.
    pub const REFRESH: &str = "/members/refresh";
    /// Account creation.
    pub const SIGNUP: &str = "/members/signup";
    /// The authenticated member.
    pub const ME: &str = "/members/me";
    /// Member listing.
    pub const MEMBERS: &str = "/members";
    /// Member status change.
    pub const MEMBER_STATUS: &str = "/members/{member_id}/status";
}

/// Routes reachable without a bearer token.
pub fn public_routes() -> Vec<RouteRule> {
    vec![
        RouteRule::get(paths::HEALTH),
        RouteRule::get(paths::READY),
        RouteRule::post(paths::LOGIN),
        RouteRule::post(paths::SIGNUP),
        RouteRule::post(paths::REFRESH),
    ]
}

/// Wires the authentication pipeline for the application routes.
///
/// The login stage runs on the login route only. Every other non-public route
/// passes token verification and then the authorization gate.
pub fn build_pipeline(state: &AppState) -> ApiResult<Pipeline> {
    let login = CredentialAuthenticationStage::new(
        state.accounts.clone(),
        state.encoder.clone(),
        state.sessions.clone(),
    )?;

    Ok(Pipeline::builder()
        .public_routes(public_routes())
        .stage_on(vec![RouteRule::post(paths::LOGIN)], login)
        .protected(
            TokenVerificationStage::new(state.codec().clone(), state.revocations().clone())
                .allow_revoked_on([RouteRule::post(paths::LOGOUT)]),
        )
        .protected(AuthorizationStage::new(state.gate.clone()))
        .build())
}

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
///
/// This is the main entry point for creating and running the HTTP server.
pub struct ApiServer {
    state: AppState,
    config: Arc<ApiConfig>,
    pipeline: PipelineLayer,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> ApiResult<Self> {
        let config = state.config.clone();
        let pipeline = PipelineLayer::new(build_pipeline(&state)?, config.max_body_size);
        Ok(Self {
            state,
            config,
            pipeline,
        })
    }

    /// Creates a new server builder.
    pub fn builder() -> ApiServerBuilder {
        ApiServerBuilder::new()
    }

    /// Returns the shared state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Creates the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let router = Router::new()
            // Health endpoints (public)
            .route(paths::HEALTH, get(handlers::health))
            .route(paths::READY, get(handlers::ready))
            // Session endpoints
            .route(paths::LOGIN, post(handlers::login))
            .route(paths::LOGOUT, post(handlers::logout))
            .route(paths::REFRESH, post(handlers::refresh_token))
            // Member endpoints
            .route(paths::SIGNUP, post(handlers::signup))
            .route(paths::ME, get(handlers::current_member))
            .route(paths::MEMBERS, get(handlers::list_members))
            .route(
                paths::MEMBER_STATUS,
                patch(handlers::update_member_status),
            )
            .layer(self.pipeline.clone())
            .layer(DefaultBodyLimit::max(self.config.max_body_size));

        // CORS sits outside the pipeline so preflight requests never need a token.
        let router = if self.config.cors.enabled {
            router.layer(create_cors_layer(&self.config))
        } else {
            router
        };

        router
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::REQUEST_TIMEOUT,
                        self.config.request_timeout,
                    )),
            )
            .with_state(self.state.clone())
    }

    /// Runs the server until the process is killed.
    pub async fn run(self) -> ApiResult<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Binds the configured address and runs with graceful shutdown.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        self.serve(listener, shutdown_signal).await
    }

    /// Serves on an already bound listener with graceful shutdown.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let router = self.router();

        match listener.local_addr() {
            Ok(addr) => info!(
                addr = %addr,
                revocation_backend = self.state.revocations().backend(),
                "Starting API server"
            ),
            Err(_) => info!("Starting API server"),
        }

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");

        Ok(())
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.socket_addr()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Creates the CORS layer from configuration.
fn create_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = &config.cors;

    let mut layer = CorsLayer::new().max_age(Duration::from_secs(cors.max_age_secs));

    // Origins
    if cors.allowed_origins.iter().any(|o| o == "*") {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();
        layer = layer.allow_origin(AllowOrigin::list(origins));
    }

    // Methods
    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    layer = layer.allow_methods(methods);

    layer = layer.allow_headers([
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        REFRESH_HEADER,
    ]);

    // Browsers hide response headers unless exposed; the token pair travels in them.
    let exposed: Vec<HeaderName> = cors
        .exposed_headers
        .iter()
        .filter_map(|h| h.parse().ok())
        .collect();
    layer.expose_headers(exposed)
}

// =============================================================================
// Server Builder
// =============================================================================

/// Builder for creating the API server.
pub struct ApiServerBuilder {
    state_builder: AppStateBuilder,
}

impl ApiServerBuilder {
    /// Creates a new server builder.
    pub fn new() -> Self {
        Self {
            state_builder: AppState::builder(),
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.state_builder = self.state_builder.config(config);
        self
    }

    /// Sets the account store.
    pub fn accounts(mut self, accounts: Arc<dyn AccountStore>) -> Self {
        self.state_builder = self.state_builder.accounts(accounts);
        self
    }

    /// Sets the password encoder.
    pub fn encoder(mut self, encoder: Arc<dyn PasswordEncoder>) -> Self {
        self.state_builder = self.state_builder.encoder(encoder);
        self
    }

    /// Sets the authority resolver.
    pub fn authority(mut self, authority: Arc<dyn AuthorityResolver>) -> Self {
        self.state_builder = self.state_builder.authority(authority);
        self
    }

    /// Sets the revocation store.
    pub fn revocation_store(mut self, store: Arc<dyn RevocationStore>) -> Self {
        self.state_builder = self.state_builder.revocation_store(store);
        self
    }

    /// Sets the authorization gate.
    pub fn gate(mut self, gate: AuthorizationGate) -> Self {
        self.state_builder = self.state_builder.gate(gate);
        self
    }

    /// Builds the server.
    pub fn build(self) -> ApiResult<ApiServer> {
        let state = self.state_builder.build()?;
        ApiServer::new(state)
    }
}

impl Default for ApiServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
