// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tripmate_config::{CorsConfig, TripmateConfig};
use tripmate_core::AuthResult;

use crate::auth::{parse_algorithm, TokenCodecConfig};

// =============================================================================
// ApiConfig
// =============================================================================

/// Runtime configuration for the API server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host address.
    pub host: IpAddr,
    /// Server port.
    pub port: u16,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// Token signing configuration.
    pub token: TokenCodecConfig,
    /// Bound on every revocation store call.
    pub revocation_timeout: Duration,
    /// Emails that receive the admin role at signup.
    pub admin_emails: Vec<String>,
    /// Argon2 memory cost in KiB.
    pub password_memory_kib: u32,
    /// Argon2 iterations.
    pub password_iterations: u32,
    /// Request timeout.
    pub request_timeout: Duration,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
            cors: CorsConfig::default(),
            token: TokenCodecConfig::default(),
            revocation_timeout: Duration::from_millis(250),
            admin_emails: Vec::new(),
            password_memory_kib: 19_456,
            password_iterations: 2,
            request_timeout: Duration::from_secs(30),
            max_body_size: 64 * 1024,
        }
    }
}

impl ApiConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the runtime configuration from the loaded file.
    pub fn from_config(config: &TripmateConfig) -> AuthResult<Self> {
        let jwt = &config.security.jwt;
        let token = TokenCodecConfig {
            secret: jwt.secret.expose().to_string(),
            issuer: jwt.issuer.clone(),
            algorithm: parse_algorithm(&jwt.algorithm)?,
            access_lifetime: jwt.access_token_lifetime(),
            refresh_lifetime: jwt.refresh_token_lifetime(),
        };

        Ok(Self {
            host: config.server.bind_address,
            port: config.server.port,
            cors: config.server.cors.clone(),
            token,
            revocation_timeout: config.revocation.timeout(),
            admin_emails: config.security.admin_emails.clone(),
            password_memory_kib: config.security.password.memory_kib,
            password_iterations: config.security.password.iterations,
            request_timeout: config.server.request_timeout(),
            max_body_size: config.server.max_body_size,
        })
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Sets the host address.
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the token signing secret.
    pub fn with_token_secret(mut self, secret: impl Into<String>) -> Self {
        self.token.secret = secret.into();
        self
    }

    /// Sets the token configuration.
    pub fn with_token(mut self, token: TokenCodecConfig) -> Self {
        self.token = token;
        self
    }

    /// Sets the admin emails.
    pub fn with_admin_emails<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.admin_emails = emails.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the argon2 cost.
    pub fn with_password_cost(mut self, memory_kib: u32, iterations: u32) -> Self {
        self.password_memory_kib = memory_kib;
        self.password_iterations = iterations;
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use jsonwebtoken::Algorithm;
    use tripmate_config::{ConfigFormat, ConfigLoader};

    use super::*;

    #[test]
    fn test_from_config() {
        let yaml = r#"
server:
  port: 9000
security:
  jwt:
    secret: "a-very-long-secret-that-is-at-least-32-bytes"
    algorithm: HS512
    access_token_minutes: 15
    refresh_token_minutes: 60
  admin_emails: [admin@tripmate.io]
revocation:
  timeout_ms: 100
"#;
        let loaded = ConfigLoader::new().load_from_str(yaml, ConfigFormat::Yaml).unwrap();
        let config = ApiConfig::from_config(&loaded).unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.token.algorithm, Algorithm::HS512);
        assert_eq!(config.token.access_lifetime, Duration::from_secs(15 * 60));
        assert_eq!(config.token.refresh_lifetime, Duration::from_secs(60 * 60));
        assert_eq!(config.revocation_timeout, Duration::from_millis(100));
        assert_eq!(config.admin_emails, vec!["admin@tripmate.io"]);
    }

    #[test]
    fn test_builder_methods() {
        let config = ApiConfig::new()
            .with_port(3000)
            .with_token_secret("secret")
            .with_password_cost(256, 1);

        assert_eq!(config.socket_addr().port(), 3000);
        assert_eq!(config.token.secret, "secret");
        assert_eq!(config.password_memory_kib, 256);
    }
}
