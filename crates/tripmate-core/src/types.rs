// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core data types: principals and accounts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Principal
// =============================================================================

/// A verified identity and its roles.
///
/// Built from verified claims for the duration of one request. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Unique account key (email).
    pub identity: String,
    /// Role strings as carried by the token.
    pub roles: Vec<String>,
}

impl Principal {
    /// Creates a new principal.
    pub fn new(identity: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            identity: identity.into(),
            roles,
        }
    }

    /// Returns `true` if the principal has the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Returns `true` if the principal has any of the given roles.
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().any(|r| self.has_role(r.as_ref()))
    }
}

// =============================================================================
// AccountId
// =============================================================================

/// Numeric account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(u64);

impl AccountId {
    /// Creates a new account ID.
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// AccountStatus
// =============================================================================

/// Lifecycle status of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// May sign in.
    #[default]
    Active,
    /// Dormant after a long period of inactivity.
    Dormant,
    /// Suspended by an administrator.
    Suspended,
    /// Left the service.
    Withdrawn,
}

impl AccountStatus {
    /// Returns `true` if the account may authenticate.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, AccountStatus::Active)
    }

    /// Returns the wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Dormant => "DORMANT",
            AccountStatus::Suspended => "SUSPENDED",
            AccountStatus::Withdrawn => "WITHDRAWN",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(AccountStatus::Active),
            "DORMANT" | "SLEEP" => Ok(AccountStatus::Dormant),
            "SUSPENDED" => Ok(AccountStatus::Suspended),
            "WITHDRAWN" | "QUIT" => Ok(AccountStatus::Withdrawn),
            other => Err(format!("unknown account status: {}", other)),
        }
    }
}

// =============================================================================
// Account
// =============================================================================

/// Canonical form of a sign-in identity: trimmed and ASCII-lowercased.
///
/// Every lookup, uniqueness check and role decision uses this form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// A stored member account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Store-assigned id.
    pub id: AccountId,
    /// Unique identity used to sign in.
    pub email: String,
    /// Name shown to other members.
    pub display_name: String,
    /// One-way encoded secret.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Roles assigned at creation.
    pub roles: Vec<String>,
    /// Lifecycle status.
    pub status: AccountStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Returns the principal this account authenticates as.
    pub fn principal(&self) -> Principal {
        Principal::new(self.email.clone(), self.roles.clone())
    }
}

/// Data for creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Unique identity.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Already encoded secret.
    pub password_hash: String,
    /// Roles from the authority resolver.
    pub roles: Vec<String>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_roles() {
        let principal = Principal::new("a@x.com", vec!["USER".to_string()]);
        assert!(principal.has_role("USER"));
        assert!(!principal.has_role("ADMIN"));
        assert!(principal.has_any_role(&["ADMIN", "USER"]));
        assert!(!principal.has_any_role(&["ADMIN"]));
    }

    #[test]
    fn test_account_status_parse() {
        assert_eq!("active".parse::<AccountStatus>(), Ok(AccountStatus::Active));
        assert_eq!("SLEEP".parse::<AccountStatus>(), Ok(AccountStatus::Dormant));
        assert_eq!("quit".parse::<AccountStatus>(), Ok(AccountStatus::Withdrawn));
        assert!("frozen".parse::<AccountStatus>().is_err());
        assert!(AccountStatus::Active.is_active());
        assert!(!AccountStatus::Suspended.is_active());
    }

    #[test]
    fn test_account_status_serde() {
        let json = serde_json::to_string(&AccountStatus::Suspended).unwrap();
        assert_eq!(json, "\"SUSPENDED\"");
    }
}
