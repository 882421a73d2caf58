use std::sync::Arc;

use async_trait::async_trait;
use axum::{body::Body, http::Request};

use crate::error::GatewayError;
use crate::pipeline::{RequestContext, Stage, StageFlow};
use crate::routing::PolicyTable;

/// Enforce the path-level role policy.
///
/// A request without an identity reached this stage via a public path and
/// passes through. The check uses the context path — the one the client
/// addressed — never a rewritten routing path.
pub struct AuthorizationStage {
    policy: Arc<PolicyTable>,
}

impl AuthorizationStage {
    pub fn new(policy: Arc<PolicyTable>) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl Stage for AuthorizationStage {
    fn name(&self) -> &'static str {
        "authorization"
    }

    async fn on_request(
        &self,
        ctx: &mut RequestContext,
        _req: &mut Request<Body>,
    ) -> Result<StageFlow, GatewayError> {
        let Some(identity) = &ctx.identity else {
            return Ok(StageFlow::Continue);
        };

        if !self.policy.is_allowed(&ctx.path, identity.role) {
            tracing::warn!(
                role = identity.role_name(),
                path = %ctx.path,
                "access denied by role policy"
            );
            return Err(GatewayError::InsufficientRole(format!(
                "Role {} is not authorized to access this resource",
                identity.role_name()
            )));
        }

        tracing::debug!(role = identity.role_name(), path = %ctx.path, "role authorized");
        Ok(StageFlow::Continue)
    }
}
