// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Route matching for stage bindings and role rules.

use std::fmt;

use axum::http::Method;

// =============================================================================
// RoutePattern
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

/// A path pattern.
///
/// - `/members/login` matches exactly.
/// - `/members/{member_id}/status` matches one arbitrary segment per `{..}`.
/// - `/admin/*` matches `/admin` and everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
    prefix: bool,
}

impl RoutePattern {
    /// Parses a pattern.
    pub fn new(pattern: impl Into<String>) -> Self {
        let raw = pattern.into();
        let mut parts: Vec<&str> = split_path(&raw).collect();

        let prefix = parts.last() == Some(&"*");
        if prefix {
            parts.pop();
        }

        let segments = parts
            .into_iter()
            .map(|part| {
                if part.starts_with('{') && part.ends_with('}') {
                    Segment::Param
                } else {
                    Segment::Literal(part.to_string())
                }
            })
            .collect();

        Self {
            raw,
            segments,
            prefix,
        }
    }

    /// Returns `true` if the path matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split_path(path).collect();

        if self.prefix {
            if parts.len() < self.segments.len() {
                return false;
            }
        } else if parts.len() != self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(parts.iter())
            .all(|(segment, part)| match segment {
                Segment::Literal(lit) => lit == part,
                Segment::Param => !part.is_empty(),
            })
    }

    /// Returns the pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Splits after the leading slash. Empty segments are kept, so
/// `/members/login/` and `/members/login` stay distinct paths.
fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

// =============================================================================
// RouteRule
// =============================================================================

/// A pattern plus an optional method.
///
/// A rule without a method matches every method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    method: Option<Method>,
    pattern: RoutePattern,
}

impl RouteRule {
    /// Creates a rule matching any method.
    pub fn any(pattern: impl Into<String>) -> Self {
        Self {
            method: None,
            pattern: RoutePattern::new(pattern),
        }
    }

    /// Creates a rule for one method.
    pub fn new(method: Method, pattern: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            pattern: RoutePattern::new(pattern),
        }
    }

    /// Shorthand for a `GET` rule.
    pub fn get(pattern: impl Into<String>) -> Self {
        Self::new(Method::GET, pattern)
    }

    /// Shorthand for a `POST` rule.
    pub fn post(pattern: impl Into<String>) -> Self {
        Self::new(Method::POST, pattern)
    }

    /// Shorthand for a `PATCH` rule.
    pub fn patch(pattern: impl Into<String>) -> Self {
        Self::new(Method::PATCH, pattern)
    }

    /// Returns `true` if the request matches.
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().map_or(true, |m| m == method) && self.pattern.matches(path)
    }
}

impl fmt::Display for RouteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "{} {}", method, self.pattern.as_str()),
            None => write!(f, "* {}", self.pattern.as_str()),
        }
    }
}
