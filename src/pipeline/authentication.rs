use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, header},
};

use crate::error::GatewayError;
use crate::pipeline::{Identity, RequestContext, Stage, StageFlow};
use crate::routing::PublicPathMatcher;
use crate::services::auth::{JwtVerifier, Role};
use crate::services::table_context;

/// Verify the bearer credential and populate the request identity.
///
/// CORS preflights skip the rest of the chain unconditionally. Public paths
/// pass through with no identity attached — no claims, no role, no tableId —
/// regardless of whatever Authorization header the client may have sent.
pub struct AuthenticationStage {
    verifier: Arc<JwtVerifier>,
    public_paths: Arc<PublicPathMatcher>,
}

impl AuthenticationStage {
    pub fn new(verifier: Arc<JwtVerifier>, public_paths: Arc<PublicPathMatcher>) -> Self {
        Self {
            verifier,
            public_paths,
        }
    }
}

#[async_trait]
impl Stage for AuthenticationStage {
    fn name(&self) -> &'static str {
        "authentication"
    }

    async fn on_request(
        &self,
        ctx: &mut RequestContext,
        req: &mut Request<Body>,
    ) -> Result<StageFlow, GatewayError> {
        if ctx.method == Method::OPTIONS {
            return Ok(StageFlow::SkipRemaining);
        }

        if self.public_paths.is_public(&ctx.path) {
            tracing::debug!(path = %ctx.path, "skipping credential verification for public path");
            return Ok(StageFlow::Continue);
        }

        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                tracing::warn!(path = %ctx.path, "missing or invalid Authorization header");
                GatewayError::CredentialInvalid("Missing or invalid Authorization header".into())
            })?;

        let claims = self.verifier.verify(token)?;
        let user_id = claims.user_id()?;
        let role = Role::from_claim(claims.role_value()?);
        let table_id =
            table_context::resolve(&claims, role, req.headers(), req.uri().query())?;

        tracing::debug!(user_id, role = %role, table_id, "request authenticated");
        ctx.identity = Some(Identity {
            user_id,
            role,
            table_id,
        });

        Ok(StageFlow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PUBLIC_PATHS;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "authentication-stage-secret-32-b!!";

    fn stage() -> AuthenticationStage {
        AuthenticationStage::new(
            Arc::new(JwtVerifier::new(SECRET)),
            Arc::new(PublicPathMatcher::from_config(DEFAULT_PUBLIC_PATHS)),
        )
    }

    fn token(claims: serde_json::Value) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn request(uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn ctx_for(path: &str) -> RequestContext {
        RequestContext::new(Method::GET, path.to_string())
    }

    #[tokio::test]
    async fn options_requests_skip_the_remaining_chain() {
        let mut ctx = RequestContext::new(Method::OPTIONS, "/api/orders".into());
        let mut req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/orders")
            .body(Body::empty())
            .unwrap();

        let flow = stage().on_request(&mut ctx, &mut req).await.unwrap();
        assert!(matches!(flow, StageFlow::SkipRemaining));
        assert!(ctx.identity.is_none());
    }

    #[tokio::test]
    async fn public_paths_attach_no_identity_even_with_garbage_credentials() {
        let mut ctx = ctx_for("/api/auth/login");
        let mut req = request("/api/auth/login", Some("Bearer not-a-jwt"));

        let flow = stage().on_request(&mut ctx, &mut req).await.unwrap();
        assert!(matches!(flow, StageFlow::Continue));
        assert!(ctx.identity.is_none());
    }

    #[tokio::test]
    async fn missing_authorization_header_is_a_credential_failure() {
        let mut ctx = ctx_for("/api/orders");
        let mut req = request("/api/orders", None);

        let err = stage().on_request(&mut ctx, &mut req).await.unwrap_err();
        assert!(matches!(err, GatewayError::CredentialInvalid(_)));
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_a_credential_failure() {
        let mut ctx = ctx_for("/api/orders");
        let mut req = request("/api/orders", Some("Basic dXNlcjpwYXNz"));

        let err = stage().on_request(&mut ctx, &mut req).await.unwrap_err();
        assert!(matches!(err, GatewayError::CredentialInvalid(_)));
    }

    #[tokio::test]
    async fn valid_token_populates_the_identity() {
        let exp = chrono::Utc::now().timestamp() + 3600;
        let jwt = token(json!({ "sub": "42", "role": 2, "exp": exp }));
        let mut ctx = ctx_for("/api/orders");
        let mut req = request("/api/orders", Some(&format!("Bearer {jwt}")));

        stage().on_request(&mut ctx, &mut req).await.unwrap();

        let identity = ctx.identity.unwrap();
        assert_eq!(identity.user_id, 42);
        assert_eq!(identity.role, Role::Admin);
        assert_eq!(identity.table_id, None);
    }

    #[tokio::test]
    async fn customer_table_id_resolves_from_query_parameter() {
        let exp = chrono::Utc::now().timestamp() + 3600;
        let jwt = token(json!({ "sub": "7", "role": 1, "exp": exp }));
        let mut ctx = ctx_for("/api/orders");
        let mut req = request(
            "/api/orders?tableId=5",
            Some(&format!("Bearer {jwt}")),
        );

        stage().on_request(&mut ctx, &mut req).await.unwrap();

        assert_eq!(ctx.identity.unwrap().table_id, Some(5));
    }
}
