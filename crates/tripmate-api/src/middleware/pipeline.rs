// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Adapter running the request pipeline in front of the router.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderName, HeaderValue, Request},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};
use tripmate_core::AuthError;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extractors::client_ip;
use crate::pipeline::{Pipeline, RequestContext};

/// Response header echoing the request ID.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

// =============================================================================
// PipelineLayer
// =============================================================================

/// Layer running a [`Pipeline`] before the wrapped service.
///
/// On success the verified `AuthContext` and any stage extensions are put in
/// the request extensions and the stages' response headers are merged into
/// the response. On failure the error is rendered and the inner service is
/// never called.
#[derive(Clone)]
pub struct PipelineLayer {
    pipeline: Arc<Pipeline>,
    max_body_size: usize,
}

impl PipelineLayer {
    /// Creates a new pipeline layer.
    pub fn new(pipeline: Pipeline, max_body_size: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            max_body_size,
        }
    }
}

impl<S> Layer<S> for PipelineLayer {
    type Service = PipelineMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PipelineMiddleware {
            inner,
            pipeline: self.pipeline.clone(),
            max_body_size: self.max_body_size,
        }
    }
}

// =============================================================================
// PipelineMiddleware
// =============================================================================

/// Middleware running the request pipeline.
#[derive(Clone)]
pub struct PipelineMiddleware<S> {
    inner: S,
    pipeline: Arc<Pipeline>,
    max_body_size: usize,
}

impl<S> Service<Request<Body>> for PipelineMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let pipeline = self.pipeline.clone();
        let max_body_size = self.max_body_size;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();

            let ip = client_ip(
                &parts.headers,
                parts.extensions.get::<ConnectInfo<SocketAddr>>(),
            );
            let mut ctx = RequestContext::from_parts(&parts).with_client_ip(ip);
            let request_id = ctx.request_id;

            let body = if pipeline.needs_body(&parts.method, parts.uri.path()) {
                match axum::body::to_bytes(body, max_body_size).await {
                    Ok(bytes) => {
                        ctx.body = Some(bytes.clone());
                        Body::from(bytes)
                    }
                    Err(e) => {
                        let err = AuthError::malformed_request(format!(
                            "request body unreadable: {}",
                            e
                        ));
                        return Ok(with_request_id(ApiError::from(err).into_response(), request_id));
                    }
                }
            } else {
                body
            };

            let ctx = match pipeline.run(ctx).await {
                Ok(ctx) => ctx,
                Err(e) => {
                    return Ok(with_request_id(ApiError::from(e).into_response(), request_id));
                }
            };

            let RequestContext {
                auth,
                response_headers,
                extensions,
                ..
            } = ctx;

            let mut req = Request::from_parts(parts, body);
            req.extensions_mut().extend(extensions);
            if let Some(auth) = auth {
                req.extensions_mut().insert(auth);
            }

            let mut response = inner.call(req).await?;
            response.headers_mut().extend(response_headers);

            Ok(with_request_id(response, request_id))
        })
    }
}

fn with_request_id(mut response: Response, request_id: Uuid) -> Response {
    if let Ok(value) = HeaderValue::try_from(request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Bytes;
    use axum::http::{header, Method, StatusCode};
    use axum::routing::{get, post};
    use axum::Router;
    use tower::ServiceExt;
    use tripmate_core::AuthResult;

    use super::*;
    use crate::pipeline::{RouteRule, Stage};

    /// Echoes the buffered body into a response header.
    struct Echo;

    #[async_trait]
    impl Stage for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn needs_body(&self) -> bool {
            true
        }

        async fn process(&self, mut ctx: RequestContext) -> AuthResult<RequestContext> {
            let body = ctx.body.clone().unwrap_or_default();
            let value = HeaderValue::from_bytes(&body)
                .map_err(|_| AuthError::malformed_request("not a header value"))?;
            ctx.response_headers.insert("x-echo", value);
            Ok(ctx)
        }
    }

    struct Deny;

    #[async_trait]
    impl Stage for Deny {
        fn name(&self) -> &'static str {
            "deny"
        }

        async fn process(&self, _ctx: RequestContext) -> AuthResult<RequestContext> {
            Err(AuthError::ExpiredToken)
        }
    }

    fn app(pipeline: Pipeline) -> Router {
        Router::new()
            // The handler still sees the body after it was buffered.
            .route("/echo", post(|body: Bytes| async move { body }))
            .route("/private", get(|| async { "ok" }))
            .layer(PipelineLayer::new(pipeline, 16))
    }

    #[tokio::test]
    async fn test_body_is_buffered_and_restored() {
        let pipeline = Pipeline::builder()
            .stage_on(vec![RouteRule::post("/echo")], Echo)
            .build();

        let req = Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .body(Body::from("hello"))
            .unwrap();
        let response = app(pipeline).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-echo"], "hello");
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let pipeline = Pipeline::builder()
            .stage_on(vec![RouteRule::post("/echo")], Echo)
            .build();

        let req = Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .body(Body::from("x".repeat(64)))
            .unwrap();
        let response = app(pipeline).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stage_error_short_circuits() {
        let pipeline = Pipeline::builder().protected(Deny).build();

        let req = Request::builder().uri("/private").body(Body::empty()).unwrap();
        let response = app(pipeline).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}
