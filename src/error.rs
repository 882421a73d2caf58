/*
 * Responsibility
 * - GatewayError taxonomy for pipeline failures
 * - Normalization into the uniform JSON error document (status/error/message/
 *   path/timestamp/correlationId)
 * - CORS response-header deduplication applied to every outbound response
 */
use axum::{
    Json,
    body::Body,
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::pipeline::context::RequestContext;

/// Failure taxonomy of the request pipeline. A stage never recovers locally;
/// every failure surfaces here and becomes exactly one wire response.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Bad signature, malformed or expired token, missing/wrong auth scheme.
    #[error("{0}")]
    CredentialInvalid(String),

    /// Required claim absent, or mandatory tableId absent for a customer.
    #[error("{0}")]
    ClaimMissing(String),

    /// Authenticated but denied by the path policy.
    #[error("{0}")]
    InsufficientRole(String),

    /// Any other runtime fault inside the pipeline.
    #[error(transparent)]
    Unclassified(#[from] anyhow::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::CredentialInvalid(_) => StatusCode::UNAUTHORIZED,
            Self::ClaimMissing(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientRole(_) => StatusCode::FORBIDDEN,
            Self::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CredentialInvalid(_) => "Unauthorized",
            Self::ClaimMissing(_) => "Bad Request",
            Self::InsufficientRole(_) => "Forbidden",
            Self::Unclassified(_) => "Internal Server Error",
        }
    }

    // 5xx details stay in the logs, never on the wire.
    fn client_message(&self) -> String {
        match self {
            Self::Unclassified(_) => "An unexpected error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

/// The error document returned to clients. Constructed fresh per failure.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status: u16,
    pub error: &'static str,
    pub message: String,
    pub path: String,
    pub timestamp: String,
    pub correlation_id: Option<String>,
}

/// Convert a pipeline failure into the uniform wire response.
///
/// The `X-Correlation-Id` response header is not set here: the correlation
/// stage stamps it on every response, success or failure, when the driver
/// runs its response pass.
pub fn normalize(err: &GatewayError, ctx: &RequestContext) -> Response {
    let correlation_id = ctx.correlation_id.as_deref().unwrap_or("-");
    match err {
        GatewayError::CredentialInvalid(msg) => {
            tracing::warn!(correlation_id, path = %ctx.path, message = %msg, "authentication failed");
        }
        GatewayError::ClaimMissing(msg) => {
            tracing::warn!(correlation_id, path = %ctx.path, message = %msg, "missing required claim");
        }
        GatewayError::InsufficientRole(msg) => {
            tracing::warn!(correlation_id, path = %ctx.path, message = %msg, "authorization failed");
        }
        GatewayError::Unclassified(source) => {
            tracing::error!(correlation_id, path = %ctx.path, error = ?source, "unexpected pipeline error");
        }
    }

    let status = err.status();
    let body = ErrorResponse {
        status: status.as_u16(),
        error: err.label(),
        message: err.client_message(),
        path: ctx.path.clone(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        correlation_id: ctx.correlation_id.clone(),
    };

    (status, Json(body)).into_response()
}

/// CORS headers both the gateway and a backend may emit. Browsers reject a
/// response whose `Access-Control-Allow-Origin` carries multiple values, so
/// accidental repetition must be collapsed before the response leaves.
const CORS_RESPONSE_HEADERS: [&str; 6] = [
    "access-control-allow-origin",
    "access-control-allow-credentials",
    "access-control-allow-methods",
    "access-control-allow-headers",
    "access-control-expose-headers",
    "access-control-max-age",
];

/// Collapse repeated identical values in CORS response headers.
///
/// Repetition can appear as multiple header entries or as a comma-joined
/// single value (`"*, *"`). Genuinely distinct comma-separated values are
/// left untouched. Idempotent.
pub fn dedupe_cors_headers(headers: &mut HeaderMap) {
    for name in CORS_RESPONSE_HEADERS {
        let values: Vec<String> = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect();
        if values.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = values
            .iter()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        let mut distinct: Vec<&str> = Vec::new();
        for token in &tokens {
            if !distinct.contains(token) {
                distinct.push(token);
            }
        }

        if distinct.len() < tokens.len() {
            tracing::debug!(header = name, "deduplicating repeated CORS header value");
            if let Ok(value) = HeaderValue::from_str(&distinct.join(", ")) {
                headers.insert(name, value);
            }
        }
    }
}

/// Outermost response pass: runs after the CORS layer and the backend have
/// both had their chance to emit headers.
pub async fn dedupe_response_headers(req: Request<Body>, next: Next) -> Response {
    let mut res = next.run(req).await;
    dedupe_cors_headers(res.headers_mut());
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    const ALLOW_ORIGIN: &str = "access-control-allow-origin";

    fn ctx() -> RequestContext {
        let mut ctx = RequestContext::new(Method::GET, "/api/orders".to_string());
        ctx.correlation_id = Some("abc-123".to_string());
        ctx
    }

    #[test]
    fn credential_invalid_maps_to_401_unauthorized() {
        let err = GatewayError::CredentialInvalid("Invalid token".into());
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.label(), "Unauthorized");
        let res = normalize(&err, &ctx());
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn claim_missing_maps_to_400_bad_request() {
        let err = GatewayError::ClaimMissing("token role claim is missing".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.label(), "Bad Request");
    }

    #[test]
    fn insufficient_role_maps_to_403_forbidden() {
        let err = GatewayError::InsufficientRole("Role CUSTOMER is not authorized".into());
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.label(), "Forbidden");
    }

    #[test]
    fn unclassified_maps_to_500_with_generic_message() {
        let err = GatewayError::Unclassified(anyhow::anyhow!("db on fire"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.label(), "Internal Server Error");
        assert_eq!(err.client_message(), "An unexpected error occurred");
    }

    #[test]
    fn dedupes_two_identical_header_entries() {
        let mut headers = HeaderMap::new();
        headers.append(ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.append(ALLOW_ORIGIN, HeaderValue::from_static("*"));

        dedupe_cors_headers(&mut headers);

        let values: Vec<_> = headers.get_all(ALLOW_ORIGIN).iter().collect();
        assert_eq!(values, vec!["*"]);
    }

    #[test]
    fn collapses_comma_joined_duplicate_single_value() {
        let mut headers = HeaderMap::new();
        headers.insert(ALLOW_ORIGIN, HeaderValue::from_static("*, *"));

        dedupe_cors_headers(&mut headers);

        assert_eq!(headers.get(ALLOW_ORIGIN).unwrap(), "*");
    }

    #[test]
    fn preserves_genuinely_distinct_values() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "access-control-expose-headers",
            HeaderValue::from_static("x-correlation-id, x-table-id"),
        );

        dedupe_cors_headers(&mut headers);

        assert_eq!(
            headers.get("access-control-expose-headers").unwrap(),
            "x-correlation-id, x-table-id"
        );
    }

    #[test]
    fn preserves_distinct_values_across_entries() {
        let mut headers = HeaderMap::new();
        headers.append(ALLOW_ORIGIN, HeaderValue::from_static("https://a.example"));
        headers.append(ALLOW_ORIGIN, HeaderValue::from_static("https://b.example"));

        dedupe_cors_headers(&mut headers);

        let values: Vec<_> = headers.get_all(ALLOW_ORIGIN).iter().collect();
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let mut headers = HeaderMap::new();
        headers.insert(ALLOW_ORIGIN, HeaderValue::from_static("*, *"));

        dedupe_cors_headers(&mut headers);
        dedupe_cors_headers(&mut headers);

        let values: Vec<_> = headers.get_all(ALLOW_ORIGIN).iter().collect();
        assert_eq!(values, vec!["*"]);
    }

    #[test]
    fn mixed_entries_with_overlap_collapse_to_distinct_set() {
        let mut headers = HeaderMap::new();
        headers.append(ALLOW_ORIGIN, HeaderValue::from_static("https://a.example"));
        headers.append(
            ALLOW_ORIGIN,
            HeaderValue::from_static("https://a.example, https://b.example"),
        );

        dedupe_cors_headers(&mut headers);

        assert_eq!(
            headers.get(ALLOW_ORIGIN).unwrap(),
            "https://a.example, https://b.example"
        );
        assert_eq!(headers.get_all(ALLOW_ORIGIN).iter().count(), 1);
    }
}
