// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `run`: Start the API server (default)
//! - `validate`: Validate configuration file
//! - `version`: Show version information

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tripmate_config::LoggingConfig;

// =============================================================================
// Main CLI Structure
// =============================================================================

/// tripmate - token authentication backend for trip planning
#[derive(Parser, Debug)]
#[command(
    name = "tripmate",
    author = "Sylvex <contact@sylvex.io>",
    version = tripmate_core::VERSION,
    about = "Trip-planning backend with token authentication and session revocation",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "tripmate.yaml",
        env = "TRIPMATE_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long, env = "TRIPMATE_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log format (text, json, compact). Overrides the config file.
    #[arg(long, env = "TRIPMATE_LOG_FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Enable quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands for the tripmate CLI.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the API server
    ///
    /// This is the default command when no subcommand is specified.
    Run(RunArgs),

    /// Validate the configuration file
    ///
    /// Parses and validates the configuration file without starting the server.
    Validate(ValidateArgs),

    /// Show detailed version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `run` command.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Override the bind address
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Show parsed configuration after validation (secrets redacted)
    #[arg(short, long)]
    pub show_config: bool,

    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Strict mode: treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

impl From<tripmate_config::LogFormat> for LogFormat {
    fn from(format: tripmate_config::LogFormat) -> Self {
        match format {
            tripmate_config::LogFormat::Text => LogFormat::Text,
            tripmate_config::LogFormat::Json => LogFormat::Json,
            tripmate_config::LogFormat::Compact => LogFormat::Compact,
        }
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Resolves the log level and format.
    ///
    /// Flags win over the config file's `logging` section; `--quiet` and
    /// `--verbose` win over both.
    pub fn logging_settings(&self, file: Option<&LoggingConfig>) -> (String, LogFormat) {
        let level = if self.quiet {
            "warn".to_string()
        } else if self.verbose {
            "debug".to_string()
        } else if let Some(level) = &self.log_level {
            level.clone()
        } else {
            file.map_or("info", |l| l.level.as_str()).to_string()
        };

        let format = self
            .log_format
            .or_else(|| file.map(|l| l.format.into()))
            .unwrap_or_default();

        (level, format)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cli = Cli::parse_from(["tripmate"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.effective_command(), Commands::Run(_)));
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::parse_from(["tripmate", "run", "--port", "9090", "--host", "127.0.0.1"]);
        if let Some(Commands::Run(args)) = cli.command {
            assert_eq!(args.port, Some(9090));
            assert_eq!(args.host, Some("127.0.0.1".parse().unwrap()));
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["tripmate", "validate", "--show-config", "-f", "json"]);
        if let Some(Commands::Validate(args)) = cli.command {
            assert!(args.show_config);
            assert_eq!(args.format, OutputFormat::Json);
        } else {
            panic!("Expected Validate command");
        }
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["tripmate", "-c", "/etc/tripmate/config.yaml"]);
        assert_eq!(cli.config, PathBuf::from("/etc/tripmate/config.yaml"));
    }

    #[test]
    fn test_logging_settings_precedence() {
        let file = LoggingConfig {
            level: tripmate_config::LogLevel::Debug,
            format: tripmate_config::LogFormat::Json,
        };

        let cli = Cli::parse_from(["tripmate"]);
        assert_eq!(
            cli.logging_settings(Some(&file)),
            ("debug".to_string(), LogFormat::Json)
        );
        assert_eq!(cli.logging_settings(None), ("info".to_string(), LogFormat::Text));

        let cli = Cli::parse_from(["tripmate", "-l", "trace", "--log-format", "compact"]);
        assert_eq!(
            cli.logging_settings(Some(&file)),
            ("trace".to_string(), LogFormat::Compact)
        );

        let cli = Cli::parse_from(["tripmate", "-q", "-l", "trace"]);
        assert_eq!(cli.logging_settings(None).0, "warn");
    }
}
