use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderValue, Request},
};

use crate::error::GatewayError;
use crate::pipeline::correlation::CORRELATION_ID_HEADER;
use crate::pipeline::{RequestContext, Stage, StageFlow};
use crate::services::table_context::TABLE_ID_HEADER;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-role";
pub const SERVICE_NAME_HEADER: &str = "x-service-name";

/// Marker identifying this boundary to backends.
pub const SERVICE_NAME: &str = "gateway";

/// Stamp the resolved identity onto the downstream request.
///
/// Backends trust these headers instead of re-authenticating, so they are
/// inserted (replacing any client-supplied value of the same name), and the
/// stage only runs once an identity was actually resolved — public-path
/// requests pass through untouched. The original Authorization header is
/// left as-is. Never fails.
pub struct HeaderInjectionStage;

#[async_trait]
impl Stage for HeaderInjectionStage {
    fn name(&self) -> &'static str {
        "header-injection"
    }

    async fn on_request(
        &self,
        ctx: &mut RequestContext,
        req: &mut Request<Body>,
    ) -> Result<StageFlow, GatewayError> {
        let Some(identity) = &ctx.identity else {
            tracing::debug!("skipping header injection for unauthenticated request");
            return Ok(StageFlow::Continue);
        };

        let headers = req.headers_mut();
        headers.insert(USER_ID_HEADER, HeaderValue::from(identity.user_id));
        headers.insert(ROLE_HEADER, HeaderValue::from_static(identity.role_name()));
        headers.insert(SERVICE_NAME_HEADER, HeaderValue::from_static(SERVICE_NAME));

        if let Some(id) = &ctx.correlation_id
            && let Ok(value) = HeaderValue::from_str(id)
        {
            headers.insert(CORRELATION_ID_HEADER, value);
        }

        if let Some(table_id) = identity.table_id {
            headers.insert(TABLE_ID_HEADER, HeaderValue::from(table_id));
        }

        tracing::debug!(
            user_id = identity.user_id,
            role = identity.role_name(),
            table_id = identity.table_id,
            "injected identity headers"
        );

        Ok(StageFlow::Continue)
    }
}
