// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tripmate-bin
//!
//! CLI binary for the tripmate authentication backend.
//!
//! - CLI argument parsing with clap
//! - Server runtime: configuration, revocation store and API server
//! - Graceful shutdown on SIGTERM / SIGINT
//! - Logging initialization
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (default command)
//! tripmate
//!
//! # Start with a custom config
//! tripmate -c /etc/tripmate/config.yaml
//!
//! # Validate configuration
//! tripmate validate --show-config
//!
//! # Show version
//! tripmate version
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{RuntimeBuilder, ServerRuntime};
pub use shutdown::ShutdownCoordinator;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
