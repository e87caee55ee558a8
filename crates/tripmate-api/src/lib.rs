// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tripmate-api
//!
//! Token authentication pipeline and HTTP API for the tripmate backend.
//!
//! - **Auth**: token codec, claims, session manager and the authorization gate
//! - **Revocation**: expiring key store for refresh tokens and the blacklist,
//!   with in-memory and Redis backends
//! - **Pipeline**: ordered request stages for login, token verification and
//!   authorization, run in front of the router by [`middleware::PipelineLayer`]
//! - **Server**: axum routes, handlers and shared state
//!
//! ## Example
//!
//! ```rust,ignore
//! use tripmate_api::{ApiConfig, ApiServer};
//!
//! let config = ApiConfig::default().with_token_secret(secret);
//! let server = ApiServer::builder().config(config).build()?;
//! server.run_with_shutdown(shutdown_signal()).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod response;
pub mod revocation;
pub mod server;
pub mod state;

// =============================================================================
// Re-exports
// =============================================================================

pub use auth::{AuthContext, AuthorizationGate, Claims, SessionManager, TokenCodec, TokenKind};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use pipeline::{Pipeline, RequestContext, Stage};
pub use revocation::{
    MemoryRevocationStore, RedisRevocationStore, RevocationRegistry, RevocationStore,
};
pub use server::{build_pipeline, ApiServer, ApiServerBuilder};
pub use state::AppState;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
