// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading tests against real files.

use std::fs;
use std::time::Duration;

use tripmate_api::ApiConfig;
use tripmate_config::{
    ConfigError, ConfigFormat, ConfigLoader, RevocationBackend, TripmateConfig,
};
use tripmate_tests::common::temp_test_dir;

const SECRET: &str = "a-very-long-secret-that-is-at-least-32-bytes";

/// Loader with a prefix no test environment sets, so overrides stay inert.
fn loader() -> ConfigLoader {
    ConfigLoader::new().with_env_prefix("TRIPMATE_IT_UNSET")
}

fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// =============================================================================
// File formats
// =============================================================================

#[test]
fn test_load_yaml_file() {
    let dir = temp_test_dir("config-yaml");
    let path = write(
        &dir,
        "tripmate.yaml",
        &format!(
            r#"
server:
  port: 9100
security:
  jwt:
    secret: "{SECRET}"
    access_token_minutes: 10
    refresh_token_minutes: 120
  admin_emails:
    - admin@tripmate.io
revocation:
  backend: redis
  url: redis://127.0.0.1:6379
  timeout_ms: 500
"#
        ),
    );

    let config = loader().load(&path).unwrap();

    assert_eq!(config.server.port, 9100);
    assert_eq!(config.security.jwt.access_token_minutes, 10);
    assert_eq!(config.revocation.backend, RevocationBackend::Redis);
    assert_eq!(config.revocation.timeout(), Duration::from_millis(500));
    assert_eq!(config.security.admin_emails, vec!["admin@tripmate.io"]);
}

#[test]
fn test_load_toml_file() {
    let dir = temp_test_dir("config-toml");
    let path = write(
        &dir,
        "tripmate.toml",
        &format!(
            r#"
[server]
port = 9200

[security.jwt]
secret = "{SECRET}"
algorithm = "HS384"
"#
        ),
    );

    let config = loader().load(&path).unwrap();

    assert_eq!(config.server.port, 9200);
    assert_eq!(config.security.jwt.algorithm, "HS384");
    assert_eq!(config.revocation.backend, RevocationBackend::Memory);
}

#[test]
fn test_load_json_file() {
    let dir = temp_test_dir("config-json");
    let path = write(
        &dir,
        "tripmate.json",
        &format!(r#"{{ "security": {{ "jwt": {{ "secret": "{SECRET}" }} }} }}"#),
    );

    let config = loader().load(&path).unwrap();

    assert_eq!(config.security.jwt.access_token_minutes, 30);
    assert_eq!(config.security.jwt.refresh_token_minutes, 420);
}

#[test]
fn test_unknown_extension_rejected() {
    let dir = temp_test_dir("config-ini");
    let path = write(&dir, "tripmate.ini", "port=1");

    let err = loader().load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
}

#[test]
fn test_missing_file() {
    let dir = temp_test_dir("config-missing");

    let err = loader().load(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}

#[test]
fn test_unknown_field_rejected() {
    let yaml = format!(
        r#"
security:
  jwt:
    secret: "{SECRET}"
    lifetime: 5
"#
    );

    let err = loader().load_from_str(&yaml, ConfigFormat::Yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Serialization { .. }));
}

// =============================================================================
// Environment
// =============================================================================

#[test]
fn test_placeholder_resolution() {
    std::env::set_var("TRIPMATE_IT_SECRET", SECRET);
    let yaml = r#"
server:
  port: ${TRIPMATE_IT_PORT_UNSET:9300}
security:
  jwt:
    secret: "${TRIPMATE_IT_SECRET}"
"#;

    let config = loader().load_from_str(yaml, ConfigFormat::Yaml).unwrap();

    assert_eq!(config.server.port, 9300);
    assert_eq!(config.security.jwt.secret.expose(), SECRET);
}

#[test]
fn test_unresolved_placeholder_secret_rejected() {
    let yaml = r#"
security:
  jwt:
    secret: "${TRIPMATE_IT_NEVER_SET}"
"#;

    let err = loader().load_from_str(yaml, ConfigFormat::Yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "security.jwt.secret"));
}

#[test]
fn test_env_overrides() {
    std::env::set_var("TRIPMATE_IT_OVR_JWT_SECRET", SECRET);
    std::env::set_var("TRIPMATE_IT_OVR_ADMIN_EMAILS", "a@tripmate.io, b@tripmate.io");

    let config = ConfigLoader::new()
        .with_env_prefix("TRIPMATE_IT_OVR")
        .load_from_env()
        .unwrap();

    assert_eq!(config.security.jwt.secret.expose(), SECRET);
    assert_eq!(
        config.security.admin_emails,
        vec!["a@tripmate.io", "b@tripmate.io"]
    );
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_missing_secret_rejected() {
    let err = loader()
        .load_from_str("server:\n  port: 8080\n", ConfigFormat::Yaml)
        .unwrap_err();

    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "security.jwt.secret"));
}

#[test]
fn test_redis_without_url_rejected() {
    let yaml = format!(
        r#"
security:
  jwt:
    secret: "{SECRET}"
revocation:
  backend: redis
"#
    );

    let err = loader().load_from_str(&yaml, ConfigFormat::Yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "revocation.url"));
}

#[test]
fn test_revocation_timeout_bounds() {
    for timeout in [0, 10_001] {
        let yaml = format!(
            r#"
security:
  jwt:
    secret: "{SECRET}"
revocation:
  timeout_ms: {timeout}
"#
        );

        let err = loader().load_from_str(&yaml, ConfigFormat::Yaml).unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation { ref field, .. } if field == "revocation.timeout_ms")
        );
    }
}

#[test]
fn test_refresh_shorter_than_access_rejected() {
    let yaml = format!(
        r#"
security:
  jwt:
    secret: "{SECRET}"
    access_token_minutes: 60
    refresh_token_minutes: 30
"#
    );

    assert!(loader().load_from_str(&yaml, ConfigFormat::Yaml).is_err());
}

// =============================================================================
// Runtime configuration
// =============================================================================

#[test]
fn test_api_config_from_loaded_file() {
    let yaml = format!(
        r#"
server:
  port: 9400
security:
  jwt:
    secret: "{SECRET}"
    issuer: trips
"#
    );
    let loaded = loader().load_from_str(&yaml, ConfigFormat::Yaml).unwrap();

    let config = ApiConfig::from_config(&loaded).unwrap();

    assert_eq!(config.port, 9400);
    assert_eq!(config.token.issuer, "trips");
    assert_eq!(config.token.access_lifetime, Duration::from_secs(30 * 60));
    assert_eq!(config.token.refresh_lifetime, Duration::from_secs(420 * 60));
}

#[test]
fn test_debug_output_redacts_secret() {
    let mut config = TripmateConfig::default();
    config.security.jwt.secret = tripmate_config::SecretValue::new(SECRET);

    let debug = format!("{:?}", config);

    assert!(!debug.contains(SECRET));
    assert!(debug.contains("***"));
}
