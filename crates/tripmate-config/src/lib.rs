// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tripmate-config
//!
//! Configuration management for the tripmate backend.
//!
//! - Schema with defaults and validation ([`schema`])
//! - Loading from YAML, TOML or JSON files ([`loader`])
//! - `${VAR}` / `${VAR:default}` placeholders and `TRIPMATE_*` overrides
//!
//! ## Example
//!
//! ```yaml
//! server:
//!   port: 8080
//! security:
//!   jwt:
//!     secret: "${TRIPMATE_JWT_SECRET}"
//!     access_token_minutes: 30
//!     refresh_token_minutes: 420
//!   admin_emails: [admin@tripmate.io]
//! revocation:
//!   backend: redis
//!   url: "redis://127.0.0.1:6379"
//!   timeout_ms: 250
//! logging:
//!   level: info
//!   format: json
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, ConfigFormat, ConfigLoader, ConfigLoaderBuilder};
pub use schema::{
    CorsConfig, JwtConfig, LogFormat, LogLevel, LoggingConfig, PasswordConfig, RevocationBackend,
    RevocationConfig, SecretValue, SecurityConfig, ServerConfig, TripmateConfig,
};
