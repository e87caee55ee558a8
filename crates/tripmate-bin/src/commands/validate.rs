// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use tripmate_config::{RevocationBackend, SecretValue, TripmateConfig};

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};

/// Signing secrets shorter than this are accepted but flagged.
const RECOMMENDED_SECRET_LEN: usize = 32;

/// Executes the `validate` command to validate configuration.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    if !config_path.exists() {
        return Err(BinError::Configuration(format!(
            "Configuration file not found: {}",
            config_path.display()
        )));
    }

    let config = tripmate_config::load_config(config_path).map_err(|e| {
        BinError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    let warnings = collect_warnings(&config);
    let shown = args.show_config.then(|| redacted(&config));

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!(
                "  Server: {}:{}",
                config.server.bind_address, config.server.port
            );
            println!("  Token issuer: {}", config.security.jwt.issuer);
            println!(
                "  Token lifetimes: access {}m, refresh {}m",
                config.security.jwt.access_token_minutes, config.security.jwt.refresh_token_minutes
            );
            println!("  Revocation store: {:?}", config.revocation.backend);
            println!("  Admin emails: {}", config.security.admin_emails.len());

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            if let Some(shown) = &shown {
                println!();
                println!("Parsed configuration:");
                println!(
                    "{}",
                    serde_json::to_string_pretty(shown)
                        .unwrap_or_else(|_| "(serialization error)".to_string())
                );
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "summary": {
                    "bind_address": config.server.bind_address.to_string(),
                    "port": config.server.port,
                    "issuer": config.security.jwt.issuer,
                    "revocation_backend": config.revocation.backend,
                },
                "warnings": warnings,
                "config": shown,
            });
            let rendered = serde_json::to_string_pretty(&output)
                .map_err(|e| BinError::runtime(format!("Failed to render output: {}", e)))?;
            println!("{}", rendered);
        }
    }

    // In strict mode, treat warnings as errors
    if args.strict && !warnings.is_empty() {
        return Err(BinError::Configuration(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}

/// Returns non-fatal findings for a valid configuration.
fn collect_warnings(config: &TripmateConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.security.jwt.secret.expose().len() < RECOMMENDED_SECRET_LEN {
        warnings.push(format!(
            "JWT secret is shorter than {} bytes",
            RECOMMENDED_SECRET_LEN
        ));
    }
    if config.revocation.backend == RevocationBackend::Memory {
        warnings.push(
            "In-memory revocation store: logouts are not shared between instances".to_string(),
        );
    }
    if config.security.admin_emails.is_empty() {
        warnings.push("No admin emails configured".to_string());
    }

    warnings
}

/// Returns a copy safe to print.
fn redacted(config: &TripmateConfig) -> TripmateConfig {
    let mut config = config.clone();
    config.security.jwt.secret = SecretValue::new("***");
    config
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TripmateConfig {
        let mut config = TripmateConfig::default();
        config.security.jwt.secret = SecretValue::new("short");
        config
    }

    #[test]
    fn test_warnings() {
        let warnings = collect_warnings(&config());
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("shorter than 32"));
    }

    #[test]
    fn test_redacted_hides_secret() {
        let json = serde_json::to_string(&redacted(&config())).unwrap();
        assert!(!json.contains("short"));
        assert!(json.contains("***"));
    }
}
