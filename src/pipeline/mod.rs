/*
 * Responsibility
 * - The Stage trait and the fixed, statically ordered stage chain
 * - The driver running a request through the chain, handing off to the
 *   routing collaborator on success, normalizing failures on abort
 */
pub mod authentication;
pub mod authorization;
pub mod context;
pub mod correlation;
pub mod header_injection;
pub mod logging;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{OriginalUri, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::error::{self, GatewayError};
use crate::routing::{PolicyTable, PublicPathMatcher};
use crate::services::auth::JwtVerifier;
use crate::state::AppState;

pub use context::{Identity, RequestContext};

/// What a stage tells the driver to do next.
#[derive(Debug)]
pub enum StageFlow {
    Continue,
    /// Skip every remaining stage and forward as-is (CORS preflight).
    SkipRemaining,
}

/// One unit of the request-processing chain.
///
/// `on_request` runs in chain order and may abort by returning a
/// [`GatewayError`]; `on_response` runs over the outgoing response on both
/// the success and the failure path and must not fail.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_request(
        &self,
        ctx: &mut RequestContext,
        req: &mut Request<Body>,
    ) -> Result<StageFlow, GatewayError>;

    fn on_response(&self, _ctx: &RequestContext, _res: &mut Response) {}
}

/// The ordered stage chain. Ordering is data, not registration order in some
/// ambient registry: later stages depend on context written by earlier ones,
/// and the correlation stage must precede anything that can fail so error
/// documents always carry an id.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(
        verifier: Arc<JwtVerifier>,
        public_paths: Arc<PublicPathMatcher>,
        policy: Arc<PolicyTable>,
    ) -> Self {
        Self {
            stages: vec![
                Box::new(correlation::CorrelationStage),
                Box::new(logging::LoggingStage),
                Box::new(authentication::AuthenticationStage::new(
                    verifier,
                    public_paths,
                )),
                Box::new(header_injection::HeaderInjectionStage),
                Box::new(authorization::AuthorizationStage::new(policy)),
            ],
        }
    }

    /// Run the chain. The first failing stage aborts; stages after it never
    /// run.
    pub async fn run(
        &self,
        ctx: &mut RequestContext,
        req: &mut Request<Body>,
    ) -> Result<(), GatewayError> {
        for stage in &self.stages {
            match stage.on_request(ctx, req).await? {
                StageFlow::Continue => {}
                StageFlow::SkipRemaining => break,
            }
        }
        Ok(())
    }

    /// Response pass, run for every response regardless of how it was
    /// produced.
    pub fn finish(&self, ctx: &RequestContext, res: &mut Response) {
        for stage in &self.stages {
            stage.on_response(ctx, res);
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }
}

/// Middleware entry: the boundary every request traverses.
///
/// `next.run(req)` is the hand-off to the routing collaborator; a request
/// that fails the chain never reaches it. `OriginalUri` supplies the path as
/// the client addressed it even when the upstream router nests or rewrites.
pub async fn handle(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let mut ctx = RequestContext::new(req.method().clone(), original_uri.path().to_string());

    let mut res = match state.pipeline.run(&mut ctx, &mut req).await {
        Ok(()) => next.run(req).await,
        Err(err) => error::normalize(&err, &ctx),
    };

    state.pipeline.finish(&ctx, &mut res);
    res
}
