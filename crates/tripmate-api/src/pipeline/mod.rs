// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Ordered request pipeline.
//!
//! A [`Pipeline`] is a list of [`Stage`]s, each bound either to explicit
//! routes or to every protected (non-public) route. For one request the
//! runner calls the applicable stages in order, threading a
//! [`RequestContext`] through them, and stops at the first error.
//!
//! ```text
//! POST /members/login  ─► CredentialAuthenticationStage ─► handler
//! protected request    ─► TokenVerificationStage ─► AuthorizationStage ─► handler
//! public request       ─────────────────────────────────────────────────► handler
//! ```

mod authorize;
mod context;
mod login;
mod route;
mod verify;

pub use authorize::AuthorizationStage;
pub use context::RequestContext;
pub use login::{
    AuthenticationFailureHandler, AuthenticationSuccessHandler, CredentialAuthenticationStage,
    LoginOutcome, LoginRequest, LoginResponseHandler, UniformFailureHandler,
};
pub use route::{RoutePattern, RouteRule};
pub use verify::{bearer_token, TokenVerificationStage};

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::Method;
use tripmate_core::AuthResult;

// =============================================================================
// Stage
// =============================================================================

/// One step of request processing.
#[async_trait]
pub trait Stage: Send + Sync + 'static {
    /// Stage name for logs.
    fn name(&self) -> &'static str;

    /// Returns `true` if the stage reads the request body.
    fn needs_body(&self) -> bool {
        false
    }

    /// Processes the request, returning the (possibly updated) context.
    async fn process(&self, ctx: RequestContext) -> AuthResult<RequestContext>;
}

// =============================================================================
// Pipeline
// =============================================================================

/// Which requests a stage runs for.
#[derive(Debug, Clone)]
pub enum StageBinding {
    /// Only the listed routes.
    Routes(Vec<RouteRule>),
    /// Every route not marked public.
    Protected,
}

#[derive(Clone)]
struct BoundStage {
    stage: Arc<dyn Stage>,
    binding: StageBinding,
}

/// Ordered stages plus the public route table.
#[derive(Clone, Default)]
pub struct Pipeline {
    public: Vec<RouteRule>,
    stages: Vec<BoundStage>,
}

impl Pipeline {
    /// Creates a pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Returns `true` if the route skips protected stages.
    pub fn is_public(&self, method: &Method, path: &str) -> bool {
        self.public.iter().any(|rule| rule.matches(method, path))
    }

    fn applicable<'a>(
        &'a self,
        method: &'a Method,
        path: &'a str,
    ) -> impl Iterator<Item = &'a Arc<dyn Stage>> + 'a {
        let public = self.is_public(method, path);
        self.stages
            .iter()
            .filter(move |bound| match &bound.binding {
                StageBinding::Routes(rules) => rules.iter().any(|r| r.matches(method, path)),
                StageBinding::Protected => !public,
            })
            .map(|bound| &bound.stage)
    }

    /// Returns `true` if any stage that runs for this route reads the body.
    pub fn needs_body(&self, method: &Method, path: &str) -> bool {
        self.applicable(method, path).any(|stage| stage.needs_body())
    }

    /// Returns the names of the stages that run for this route, in order.
    pub fn stages_for(&self, method: &Method, path: &str) -> Vec<&'static str> {
        self.applicable(method, path).map(|s| s.name()).collect()
    }

    /// Runs every applicable stage in order.
    pub async fn run(&self, mut ctx: RequestContext) -> AuthResult<RequestContext> {
        let method = ctx.method.clone();
        let path = ctx.uri.path().to_string();

        for stage in self.applicable(&method, &path) {
            let name = stage.name();
            let request_id = ctx.request_id;

            ctx = stage.process(ctx).await.map_err(|e| {
                tracing::debug!(
                    request_id = %request_id,
                    stage = name,
                    kind = e.kind(),
                    "Stage rejected request"
                );
                e
            })?;
        }

        Ok(ctx)
    }

    /// Returns the number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stages: Vec<_> = self.stages.iter().map(|b| b.stage.name()).collect();
        f.debug_struct("Pipeline")
            .field("public", &self.public)
            .field("stages", &stages)
            .finish()
    }
}

// =============================================================================
// PipelineBuilder
// =============================================================================

/// Builder for constructing pipelines.
#[derive(Default)]
pub struct PipelineBuilder {
    public: Vec<RouteRule>,
    stages: Vec<BoundStage>,
}

impl PipelineBuilder {
    /// Marks a route public.
    pub fn public(mut self, rule: RouteRule) -> Self {
        self.public.push(rule);
        self
    }

    /// Marks several routes public.
    pub fn public_routes(mut self, rules: impl IntoIterator<Item = RouteRule>) -> Self {
        self.public.extend(rules);
        self
    }

    /// Appends a stage bound to the given routes.
    pub fn stage_on(mut self, rules: Vec<RouteRule>, stage: impl Stage) -> Self {
        self.stages.push(BoundStage {
            stage: Arc::new(stage),
            binding: StageBinding::Routes(rules),
        });
        self
    }

    /// Appends a stage bound to every protected route.
    pub fn protected(mut self, stage: impl Stage) -> Self {
        self.stages.push(BoundStage {
            stage: Arc::new(stage),
            binding: StageBinding::Protected,
        });
        self
    }

    /// Builds the pipeline.
    pub fn build(self) -> Pipeline {
        Pipeline {
            public: self.public,
            stages: self.stages,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use tripmate_core::AuthError;

    use super::*;

    struct Tag(&'static str);

    #[async_trait]
    impl Stage for Tag {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn process(&self, mut ctx: RequestContext) -> AuthResult<RequestContext> {
            ctx.response_headers
                .append("x-stage", HeaderValue::from_static(self.0));
            Ok(ctx)
        }
    }

    struct Reject;

    #[async_trait]
    impl Stage for Reject {
        fn name(&self) -> &'static str {
            "reject"
        }

        fn needs_body(&self) -> bool {
            true
        }

        async fn process(&self, _ctx: RequestContext) -> AuthResult<RequestContext> {
            Err(AuthError::MissingToken)
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::builder()
            .public(RouteRule::post("/members/login"))
            .public(RouteRule::get("/health"))
            .stage_on(vec![RouteRule::post("/members/login")], Tag("login"))
            .protected(Tag("verify"))
            .protected(Tag("authorize"))
            .build()
    }

    #[test]
    fn test_stage_selection() {
        let pipeline = pipeline();

        assert_eq!(
            pipeline.stages_for(&Method::POST, "/members/login"),
            vec!["login"]
        );
        assert_eq!(
            pipeline.stages_for(&Method::GET, "/members/me"),
            vec!["verify", "authorize"]
        );
        assert!(pipeline.stages_for(&Method::GET, "/health").is_empty());
        assert!(!pipeline.needs_body(&Method::GET, "/members/me"));
    }

    #[tokio::test]
    async fn test_runs_stages_in_order() {
        let ctx = RequestContext::new(Method::GET, "/members/me".parse().unwrap());
        let ctx = pipeline().run(ctx).await.unwrap();

        let order: Vec<_> = ctx
            .response_headers
            .get_all("x-stage")
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(order, vec!["verify", "authorize"]);
    }

    #[tokio::test]
    async fn test_stops_at_first_error() {
        let pipeline = Pipeline::builder()
            .protected(Reject)
            .protected(Tag("never"))
            .build();

        assert!(pipeline.needs_body(&Method::GET, "/x"));
        let err = pipeline
            .run(RequestContext::new(Method::GET, "/x".parse().unwrap()))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::MissingToken);
    }
}
