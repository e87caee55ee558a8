// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role-Based Access Control (RBAC).

use std::sync::Arc;

use axum::http::Method;
use tripmate_core::{AuthError, AuthResult, Principal, ROLE_ADMIN, ROLE_USER};

use crate::pipeline::RouteRule;

// =============================================================================
// RoleRule
// =============================================================================

/// Roles accepted on a set of routes.
#[derive(Debug, Clone)]
pub struct RoleRule {
    /// Routes this rule covers.
    pub route: RouteRule,
    /// The principal needs any one of these.
    pub any_of: Vec<String>,
}

impl RoleRule {
    /// Creates a new rule.
    pub fn new<I, S>(route: RouteRule, any_of: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            route,
            any_of: any_of.into_iter().map(Into::into).collect(),
        }
    }
}

// =============================================================================
// AuthorizationGate
// =============================================================================

/// Declarative per-route role check.
///
/// Rules are evaluated in order and the first matching rule decides. A route
/// that no rule covers only needs an authenticated principal.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationGate {
    rules: Arc<Vec<RoleRule>>,
}

impl AuthorizationGate {
    /// Creates a gate from a rule table.
    pub fn new(rules: Vec<RoleRule>) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    /// Creates a gate builder.
    pub fn builder() -> AuthorizationGateBuilder {
        AuthorizationGateBuilder::default()
    }

    /// Rule table for the member routes.
    pub fn member_routes() -> Self {
        Self::builder()
            .require(RouteRule::get("/members/me"), [ROLE_USER])
            .require(RouteRule::post("/members/logout"), [ROLE_USER, ROLE_ADMIN])
            .require(RouteRule::patch("/members/{member_id}/status"), [ROLE_ADMIN])
            .require(RouteRule::get("/members"), [ROLE_ADMIN])
            .build()
    }

    /// Checks whether the principal may call the route.
    pub fn check(&self, method: &Method, path: &str, principal: &Principal) -> AuthResult<()> {
        let Some(rule) = self.rules.iter().find(|r| r.route.matches(method, path)) else {
            return Ok(());
        };

        if principal.has_any_role(&rule.any_of) {
            Ok(())
        } else {
            Err(AuthError::insufficient_role(rule.any_of.iter().cloned()))
        }
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// =============================================================================
// AuthorizationGateBuilder
// =============================================================================

/// Builder for constructing authorization gates.
#[derive(Debug, Default)]
pub struct AuthorizationGateBuilder {
    rules: Vec<RoleRule>,
}

impl AuthorizationGateBuilder {
    /// Requires any of `roles` on `route`.
    pub fn require<I, S>(mut self, route: RouteRule, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.push(RoleRule::new(route, roles));
        self
    }

    /// Builds the gate.
    pub fn build(self) -> AuthorizationGate {
        AuthorizationGate::new(self.rules)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Principal {
        Principal::new("a@x.com", vec![ROLE_USER.to_string()])
    }

    fn admin() -> Principal {
        Principal::new(
            "admin@x.com",
            vec![ROLE_ADMIN.to_string(), ROLE_USER.to_string()],
        )
    }

    #[test]
    fn test_user_route() {
        let gate = AuthorizationGate::member_routes();

        assert!(gate.check(&Method::GET, "/members/me", &user()).is_ok());
        assert!(gate
            .check(&Method::GET, "/members/me", &Principal::new("x", vec![]))
            .is_err());
    }

    #[test]
    fn test_admin_route_denies_user() {
        let gate = AuthorizationGate::member_routes();

        let err = gate.check(&Method::GET, "/members", &user()).unwrap_err();
        assert_eq!(
            err,
            AuthError::InsufficientRole {
                required: vec![ROLE_ADMIN.to_string()]
            }
        );
        assert_eq!(err.status_code(), 403);

        assert!(gate.check(&Method::GET, "/members", &admin()).is_ok());
        assert!(gate
            .check(&Method::PATCH, "/members/7/status", &admin())
            .is_ok());
    }

    #[test]
    fn test_first_match_wins() {
        let gate = AuthorizationGate::builder()
            .require(RouteRule::any("/reports/public"), [ROLE_USER])
            .require(RouteRule::any("/reports/*"), [ROLE_ADMIN])
            .build();

        assert!(gate.check(&Method::GET, "/reports/public", &user()).is_ok());
        assert!(gate.check(&Method::GET, "/reports/daily", &user()).is_err());
    }

    #[test]
    fn test_uncovered_route_allows_any_principal() {
        let gate = AuthorizationGate::member_routes();
        assert!(gate
            .check(&Method::GET, "/plans/1", &Principal::new("x", vec![]))
            .is_ok());
    }
}
