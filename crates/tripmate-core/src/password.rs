// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! One-way password encoding.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::error::{AuthError, AuthResult};

// =============================================================================
// PasswordEncoder
// =============================================================================

/// One-way comparison service for account secrets.
///
/// Both operations are CPU-bound and intentionally slow. Async callers should
/// run them on the blocking pool.
pub trait PasswordEncoder: Send + Sync + 'static {
    /// Encodes a raw secret into a self-describing hash string.
    fn encode(&self, raw: &str) -> AuthResult<String>;

    /// Returns `true` if `raw` matches the encoded hash.
    fn matches(&self, raw: &str, encoded: &str) -> bool;
}

// =============================================================================
// Argon2PasswordEncoder
// =============================================================================

/// Argon2id encoder producing PHC strings.
#[derive(Clone)]
pub struct Argon2PasswordEncoder {
    argon2: Argon2<'static>,
}

impl Argon2PasswordEncoder {
    /// Creates an encoder with the argon2 crate's recommended parameters.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Creates an encoder with explicit memory (KiB) and iteration costs.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> AuthResult<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| AuthError::internal(format!("invalid argon2 parameters: {}", e)))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl Default for Argon2PasswordEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordEncoder for Argon2PasswordEncoder {
    fn encode(&self, raw: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(raw.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::internal(format!("failed to hash password: {}", e)))
    }

    fn matches(&self, raw: &str, encoded: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(encoded) else {
            tracing::warn!("Stored password hash is not a valid PHC string");
            return false;
        };
        self.argon2
            .verify_password(raw.as_bytes(), &parsed)
            .is_ok()
    }
}

impl std::fmt::Debug for Argon2PasswordEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2PasswordEncoder").finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
