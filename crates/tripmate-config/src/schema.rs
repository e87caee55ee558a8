// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema definitions for tripmate.
//!
//! All values are loaded once at process start. Every section has defaults
//! except the signing secret, which must be supplied.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Constants
// =============================================================================

/// Default API port.
pub const DEFAULT_API_PORT: u16 = 8080;

/// Default access token lifetime in minutes.
pub const DEFAULT_ACCESS_TOKEN_MINUTES: u64 = 30;

/// Default refresh token lifetime in minutes.
pub const DEFAULT_REFRESH_TOKEN_MINUTES: u64 = 420;

/// Default revocation store timeout in milliseconds.
pub const DEFAULT_REVOCATION_TIMEOUT_MS: u64 = 250;

/// Upper bound for the revocation store timeout.
pub const MAX_REVOCATION_TIMEOUT_MS: u64 = 10_000;

/// Recommended minimum signing secret length in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

// =============================================================================
// Top-Level Configuration
// =============================================================================

/// The root configuration structure for tripmate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TripmateConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Token and account security configuration.
    #[serde(default)]
    pub security: SecurityConfig,

    /// Revocation store configuration.
    #[serde(default)]
    pub revocation: RevocationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TripmateConfig {
    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.security.validate()?;
        self.revocation.validate()?;
        Ok(())
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// Listen port.
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum buffered request body size in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
}

fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    64 * 1024
}

impl ServerConfig {
    /// Validates the server configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::validation("server.port", "cannot be zero"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout_secs",
                "cannot be zero",
            ));
        }
        if self.max_body_size == 0 {
            return Err(ConfigError::validation(
                "server.max_body_size",
                "cannot be zero",
            ));
        }
        Ok(())
    }

    /// Returns the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the socket address.
    pub fn socket_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::new(self.bind_address, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: DEFAULT_API_PORT,
            request_timeout_secs: default_request_timeout(),
            max_body_size: default_max_body_size(),
            cors: CorsConfig::default(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Whether the CORS layer is installed.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Allowed origins (use "*" for all).
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,

    /// Allowed methods.
    #[serde(default = "default_methods")]
    pub allowed_methods: Vec<String>,

    /// Response headers readable by browser clients.
    #[serde(default = "default_exposed_headers")]
    pub exposed_headers: Vec<String>,

    /// Max age in seconds.
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_methods() -> Vec<String> {
    ["GET", "POST", "PATCH", "DELETE"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_exposed_headers() -> Vec<String> {
    vec!["Authorization".to_string(), "Refresh".to_string()]
}

fn default_max_age() -> u64 {
    3600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: default_origins(),
            allowed_methods: default_methods(),
            exposed_headers: default_exposed_headers(),
            max_age_secs: default_max_age(),
        }
    }
}

// =============================================================================
// Security Configuration
// =============================================================================

/// Token and account security configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityConfig {
    /// Token signing configuration.
    #[serde(default)]
    pub jwt: JwtConfig,

    /// Emails that receive the ADMIN role at signup.
    #[serde(default)]
    pub admin_emails: Vec<String>,

    /// Password hashing cost.
    #[serde(default)]
    pub password: PasswordConfig,
}

impl SecurityConfig {
    /// Validates the security configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.jwt.validate()?;
        self.password.validate()?;
        Ok(())
    }
}

/// Token signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JwtConfig {
    /// Signing secret.
    #[serde(default)]
    pub secret: SecretValue,

    /// Token issuer.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// HMAC algorithm (HS256, HS384, HS512).
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Access token lifetime in minutes.
    #[serde(default = "default_access_minutes")]
    pub access_token_minutes: u64,

    /// Refresh token lifetime in minutes.
    #[serde(default = "default_refresh_minutes")]
    pub refresh_token_minutes: u64,
}

fn default_issuer() -> String {
    "tripmate".to_string()
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_access_minutes() -> u64 {
    DEFAULT_ACCESS_TOKEN_MINUTES
}

fn default_refresh_minutes() -> u64 {
    DEFAULT_REFRESH_TOKEN_MINUTES
}

impl JwtConfig {
    /// Validates the token signing configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let secret = self.secret.expose();
        if secret.is_empty() {
            return Err(ConfigError::validation(
                "security.jwt.secret",
                "cannot be empty",
            ));
        }
        if secret.starts_with("${") {
            return Err(ConfigError::validation(
                "security.jwt.secret",
                "environment placeholder was not resolved",
            ));
        }
        if secret.len() < MIN_SECRET_LENGTH {
            tracing::warn!(
                "JWT secret is shorter than recommended ({} bytes)",
                MIN_SECRET_LENGTH
            );
        }
        if !matches!(self.algorithm.as_str(), "HS256" | "HS384" | "HS512") {
            return Err(ConfigError::validation(
                "security.jwt.algorithm",
                format!("unsupported algorithm '{}'", self.algorithm),
            ));
        }
        if self.access_token_minutes == 0 {
            return Err(ConfigError::validation(
                "security.jwt.access_token_minutes",
                "cannot be zero",
            ));
        }
        if self.refresh_token_minutes < self.access_token_minutes {
            return Err(ConfigError::validation(
                "security.jwt.refresh_token_minutes",
                "must not be shorter than the access token lifetime",
            ));
        }
        Ok(())
    }

    /// Returns the access token lifetime.
    pub fn access_token_lifetime(&self) -> Duration {
        Duration::from_secs(self.access_token_minutes * 60)
    }

    /// Returns the refresh token lifetime.
    pub fn refresh_token_lifetime(&self) -> Duration {
        Duration::from_secs(self.refresh_token_minutes * 60)
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: SecretValue::default(),
            issuer: default_issuer(),
            algorithm: default_algorithm(),
            access_token_minutes: DEFAULT_ACCESS_TOKEN_MINUTES,
            refresh_token_minutes: DEFAULT_REFRESH_TOKEN_MINUTES,
        }
    }
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordConfig {
    /// Memory cost in KiB.
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    /// Number of iterations.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

fn default_memory_kib() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

impl PasswordConfig {
    /// Validates the password cost parameters.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.memory_kib < 8 {
            return Err(ConfigError::validation(
                "security.password.memory_kib",
                "must be at least 8",
            ));
        }
        if self.iterations == 0 {
            return Err(ConfigError::validation(
                "security.password.iterations",
                "cannot be zero",
            ));
        }
        Ok(())
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
        }
    }
}

// =============================================================================
// Revocation Configuration
// =============================================================================

/// Revocation store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevocationBackend {
    /// Process-local store. Single instance only.
    #[default]
    Memory,
    /// Redis shared by every instance.
    Redis,
}

impl std::str::FromStr for RevocationBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(RevocationBackend::Memory),
            "redis" => Ok(RevocationBackend::Redis),
            other => Err(format!("unknown revocation backend: {}", other)),
        }
    }
}

/// Revocation store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevocationConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: RevocationBackend,

    /// Connection URL for the redis backend.
    #[serde(default)]
    pub url: Option<String>,

    /// Prefix applied to every key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Per-operation timeout in milliseconds.
    #[serde(default = "default_revocation_timeout")]
    pub timeout_ms: u64,
}

fn default_key_prefix() -> String {
    "tripmate:".to_string()
}

fn default_revocation_timeout() -> u64 {
    DEFAULT_REVOCATION_TIMEOUT_MS
}

impl RevocationConfig {
    /// Validates the revocation store configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.backend == RevocationBackend::Redis
            && self.url.as_deref().map_or(true, |u| u.trim().is_empty())
        {
            return Err(ConfigError::validation(
                "revocation.url",
                "required when backend is redis",
            ));
        }
        if self.timeout_ms == 0 || self.timeout_ms > MAX_REVOCATION_TIMEOUT_MS {
            return Err(ConfigError::validation(
                "revocation.timeout_ms",
                format!("must be between 1 and {}", MAX_REVOCATION_TIMEOUT_MS),
            ));
        }
        Ok(())
    }

    /// Returns the per-operation timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            backend: RevocationBackend::Memory,
            url: None,
            key_prefix: default_key_prefix(),
            timeout_ms: DEFAULT_REVOCATION_TIMEOUT_MS,
        }
    }
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the filter directive for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON lines for log aggregation.
    Json,
    /// Minimal single-line output.
    Compact,
}

// =============================================================================
// Secret Value
// =============================================================================

/// A secret string that never appears in logs.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);

impl SecretValue {
    /// Creates a new secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if no secret is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "***")
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecretValue").field(&"***").finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
