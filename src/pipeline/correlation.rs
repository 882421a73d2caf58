use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderValue, Request},
    response::Response,
};
use uuid::Uuid;

use crate::error::GatewayError;
use crate::pipeline::{RequestContext, Stage, StageFlow};

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Propagate an inbound `X-Correlation-Id` or generate a fresh UUID.
///
/// Must be the first stage: everything after it, including the error
/// normalizer, keys its output on the correlation id. The id is stamped on
/// the downstream request here and on the outgoing response in the response
/// pass, so clients get it back on success and on every failure.
pub struct CorrelationStage;

#[async_trait]
impl Stage for CorrelationStage {
    fn name(&self) -> &'static str {
        "correlation"
    }

    async fn on_request(
        &self,
        ctx: &mut RequestContext,
        req: &mut Request<Body>,
    ) -> Result<StageFlow, GatewayError> {
        let inbound = req
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let correlation_id = match inbound {
            Some(id) => {
                tracing::debug!(correlation_id = %id, "using inbound correlation id");
                id
            }
            None => {
                let id = Uuid::new_v4().to_string();
                tracing::debug!(correlation_id = %id, "generated new correlation id");
                id
            }
        };

        if let Ok(value) = HeaderValue::from_str(&correlation_id) {
            req.headers_mut().insert(CORRELATION_ID_HEADER, value);
        }
        ctx.correlation_id = Some(correlation_id);

        Ok(StageFlow::Continue)
    }

    fn on_response(&self, ctx: &RequestContext, res: &mut Response) {
        if let Some(id) = &ctx.correlation_id
            && let Ok(value) = HeaderValue::from_str(id)
        {
            res.headers_mut().insert(CORRELATION_ID_HEADER, value);
        }
    }
}
