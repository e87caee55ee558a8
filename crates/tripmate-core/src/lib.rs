// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tripmate-core
//!
//! Shared types and capabilities for the tripmate authentication subsystem.
//!
//! - **Error**: the authentication error taxonomy and account store errors
//! - **Types**: `Principal`, `Account`, `AccountStatus`
//! - **Account**: the `AccountStore` capability and an in-memory implementation
//! - **Password**: the one-way `PasswordEncoder` capability (argon2)
//! - **Authority**: role assignment at account creation
//!
//! ## Example
//!
//! ```rust,ignore
//! use tripmate_core::{AdminEmailAuthorityResolver, AuthorityResolver};
//!
//! let resolver = AdminEmailAuthorityResolver::new(["admin@tripmate.io"]);
//! assert_eq!(resolver.roles_for("admin@tripmate.io"), vec!["ADMIN", "USER"]);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod account;
pub mod authority;
pub mod error;
pub mod password;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

pub use account::{AccountStore, InMemoryAccountStore};
pub use authority::{AdminEmailAuthorityResolver, AuthorityResolver, ROLE_ADMIN, ROLE_USER};
pub use error::{AccountError, AccountResult, AuthError, AuthResult};
pub use password::{Argon2PasswordEncoder, PasswordEncoder};
pub use types::{normalize_email, Account, AccountId, AccountStatus, NewAccount, Principal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
