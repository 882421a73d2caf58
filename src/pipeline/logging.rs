use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response};

use crate::error::GatewayError;
use crate::pipeline::{RequestContext, Stage, StageFlow};

/// Start/end-of-request log lines keyed by the correlation id.
///
/// Never fails the chain; the completion line is emitted in the response
/// pass, which runs for error responses too.
pub struct LoggingStage;

#[async_trait]
impl Stage for LoggingStage {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn on_request(
        &self,
        ctx: &mut RequestContext,
        _req: &mut Request<Body>,
    ) -> Result<StageFlow, GatewayError> {
        tracing::info!(
            correlation_id = ctx.correlation_id.as_deref().unwrap_or("-"),
            method = %ctx.method,
            path = %ctx.path,
            "request started"
        );
        Ok(StageFlow::Continue)
    }

    fn on_response(&self, ctx: &RequestContext, res: &mut Response) {
        tracing::info!(
            correlation_id = ctx.correlation_id.as_deref().unwrap_or("-"),
            method = %ctx.method,
            path = %ctx.path,
            status = res.status().as_u16(),
            elapsed_ms = ctx.started_at.elapsed().as_millis() as u64,
            "request completed"
        );
    }
}
