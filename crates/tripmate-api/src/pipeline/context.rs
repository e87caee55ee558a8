// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request-scoped pipeline state.

use std::net::IpAddr;

use axum::body::Bytes;
use axum::http::{request::Parts, Extensions, HeaderMap, Method, Uri, Version};
use uuid::Uuid;

use crate::auth::AuthContext;

/// Everything a stage can see or change about one request.
///
/// Passed by value through the stages. Nothing in it outlives the request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request ID for tracing.
    pub request_id: Uuid,
    /// Request method.
    pub method: Method,
    /// Request URI.
    pub uri: Uri,
    /// HTTP version.
    pub version: Version,
    /// Request headers.
    pub headers: HeaderMap,
    /// Buffered body, present only when a bound stage asked for it.
    pub body: Option<Bytes>,
    /// Client IP address.
    pub client_ip: Option<IpAddr>,
    /// Set once a bearer token has been verified.
    pub auth: Option<AuthContext>,
    /// Headers merged into the handler's response.
    pub response_headers: HeaderMap,
    /// Values handed to the handler through request extensions.
    pub extensions: Extensions,
}

impl RequestContext {
    /// Creates a context for a bodiless request.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            method,
            uri,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: None,
            client_ip: None,
            auth: None,
            response_headers: HeaderMap::new(),
            extensions: Extensions::new(),
        }
    }

    /// Creates a context from request parts.
    ///
    /// The parts keep their own extensions; the context starts with none.
    pub fn from_parts(parts: &Parts) -> Self {
        let mut ctx = Self::new(parts.method.clone(), parts.uri.clone());
        ctx.version = parts.version;
        ctx.headers = parts.headers.clone();
        ctx
    }

    /// Sets the buffered body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the client IP address.
    pub fn with_client_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.client_ip = ip;
        self
    }

    /// Returns the request path.
    pub fn path(&self) -> &str {
        self.uri.path()
    }
}
