// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication and authorization module.
//!
//! This module provides:
//! - Token claims, signing and verification
//! - Login sessions (minting, rotation, logout)
//! - Route-level role checks
//! - Authentication context

mod claims;
mod codec;
mod context;
mod rbac;
mod session;

pub use claims::{Claims, TokenKind};
pub use codec::{parse_algorithm, TokenCodec, TokenCodecConfig};
pub use context::AuthContext;
pub use rbac::{AuthorizationGate, AuthorizationGateBuilder, RoleRule};
pub use session::{IssuedTokens, SessionManager, REFRESH_HEADER};
