use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::Deserialize;
use serde_json::Value;

use crate::error::GatewayError;

/// Access-token claims.
///
/// `role` and `tableId` are kept as raw JSON values because their *type*
/// matters: `role` must be an integer exactly, while `tableId` tolerates an
/// integer or a numeric string. `sub`/`role` presence is checked after
/// signature verification — a validly signed token can still be rejected.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,

    #[serde(default)]
    pub role: Value,

    #[serde(default, rename = "tableId")]
    pub table_id: Value,

    pub exp: u64,

    #[serde(default)]
    pub iat: Option<u64>,
}

impl Claims {
    /// Identity of the caller: `sub` parsed as a numeric id.
    pub fn user_id(&self) -> Result<i64, GatewayError> {
        self.sub
            .as_deref()
            .unwrap_or_default()
            .parse::<i64>()
            .map_err(|_| GatewayError::CredentialInvalid("Invalid userId format in token".into()))
    }

    /// The raw role integer. Any other JSON representation (string, float,
    /// array) is a malformed claim, not a parse opportunity.
    pub fn role_value(&self) -> Result<i64, GatewayError> {
        match &self.role {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| GatewayError::ClaimMissing("Role claim has invalid format".into())),
            _ => Err(GatewayError::ClaimMissing(
                "Role claim has invalid format".into(),
            )),
        }
    }

    /// Optional tenant identifier. Lenient on purpose: the id can also be
    /// supplied via header or query parameter, so a malformed claim value is
    /// logged and treated as absent rather than failing the request.
    pub fn table_id(&self) -> Option<i64> {
        match &self.table_id {
            Value::Null => None,
            Value::Number(n) => n.as_i64().or_else(|| {
                tracing::warn!(value = %n, "invalid tableId number in token");
                None
            }),
            Value::String(s) => s.parse::<i64>().ok().or_else(|| {
                tracing::warn!(value = %s, "invalid tableId format in token");
                None
            }),
            other => {
                tracing::warn!(value = ?other, "unexpected tableId type in token");
                None
            }
        }
    }
}

/// HS256 access-token verifier.
///
/// Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        // Tokens carry no audience; exp is validated by default.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;

        Self {
            decoding_key,
            validation,
        }
    }

    /// Verify signature and expiry, then check the mandatory claims.
    ///
    /// Expired tokens are distinguished in the logs but surface the same
    /// error kind as any other invalid credential.
    pub fn verify(&self, token: &str) -> Result<Claims, GatewayError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::warn!(error = %e, "token has expired");
                    GatewayError::CredentialInvalid("Token has expired".into())
                }
                _ => {
                    tracing::warn!(error = %e, "token verification failed");
                    GatewayError::CredentialInvalid("Invalid token".into())
                }
            })?;

        let claims = data.claims;

        if claims.sub.as_deref().unwrap_or("").is_empty() {
            return Err(GatewayError::ClaimMissing(
                "Token subject (userId) is missing".into(),
            ));
        }
        if claims.role.is_null() {
            return Err(GatewayError::ClaimMissing("Token role claim is missing".into()));
        }

        tracing::debug!(user_id = claims.sub.as_deref().unwrap_or("-"), "token verified");
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "unit-test-secret-at-least-32-bytes!!";

    fn sign(claims: &Value) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn future_exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    fn verifier() -> JwtVerifier {
        JwtVerifier::new(SECRET)
    }

    #[test]
    fn verifies_a_valid_token_and_extracts_claims() {
        let token = sign(&json!({ "sub": "42", "role": 2, "exp": future_exp() }));
        let claims = verifier().verify(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.role_value().unwrap(), 2);
        assert_eq!(claims.table_id(), None);
    }

    #[test]
    fn rejects_a_token_signed_with_another_key() {
        let token = jsonwebtoken::encode(
            &Header::default(),
            &json!({ "sub": "42", "role": 2, "exp": future_exp() }),
            &EncodingKey::from_secret(b"a-different-secret-still-32-bytes!!!"),
        )
        .unwrap();
        let err = verifier().verify(&token).unwrap_err();
        assert!(matches!(err, GatewayError::CredentialInvalid(_)));
    }

    #[test]
    fn rejects_a_malformed_token() {
        let err = verifier().verify("not-a-jwt").unwrap_err();
        assert!(matches!(err, GatewayError::CredentialInvalid(_)));
    }

    #[test]
    fn rejects_an_expired_token() {
        let token = sign(&json!({
            "sub": "42",
            "role": 2,
            "exp": chrono::Utc::now().timestamp() - 3600,
        }));
        let err = verifier().verify(&token).unwrap_err();
        match err {
            GatewayError::CredentialInvalid(msg) => assert_eq!(msg, "Token has expired"),
            other => panic!("expected CredentialInvalid, got {other:?}"),
        }
    }

    #[test]
    fn a_validly_signed_token_without_subject_is_still_rejected() {
        let token = sign(&json!({ "role": 2, "exp": future_exp() }));
        let err = verifier().verify(&token).unwrap_err();
        assert!(matches!(err, GatewayError::ClaimMissing(_)));
    }

    #[test]
    fn a_validly_signed_token_without_role_is_still_rejected() {
        let token = sign(&json!({ "sub": "42", "exp": future_exp() }));
        let err = verifier().verify(&token).unwrap_err();
        assert!(matches!(err, GatewayError::ClaimMissing(_)));
    }

    #[test]
    fn non_numeric_subject_fails_user_id_extraction() {
        let token = sign(&json!({ "sub": "alice", "role": 2, "exp": future_exp() }));
        let claims = verifier().verify(&token).unwrap();
        assert!(matches!(
            claims.user_id(),
            Err(GatewayError::CredentialInvalid(_))
        ));
    }

    #[test]
    fn role_must_be_an_integer_exactly() {
        let token = sign(&json!({ "sub": "42", "role": "2", "exp": future_exp() }));
        let claims = verifier().verify(&token).unwrap();
        assert!(matches!(
            claims.role_value(),
            Err(GatewayError::ClaimMissing(_))
        ));
    }

    #[test]
    fn table_id_accepts_integer_and_numeric_string() {
        let token = sign(&json!({ "sub": "7", "role": 1, "tableId": 5, "exp": future_exp() }));
        let claims = verifier().verify(&token).unwrap();
        assert_eq!(claims.table_id(), Some(5));

        let token = sign(&json!({ "sub": "7", "role": 1, "tableId": "5", "exp": future_exp() }));
        let claims = verifier().verify(&token).unwrap();
        assert_eq!(claims.table_id(), Some(5));
    }

    #[test]
    fn invalid_table_id_representations_are_treated_as_absent() {
        let token = sign(&json!({
            "sub": "7",
            "role": 2,
            "tableId": "front-window",
            "exp": future_exp(),
        }));
        let claims = verifier().verify(&token).unwrap();
        assert_eq!(claims.table_id(), None);

        let token = sign(&json!({
            "sub": "7",
            "role": 2,
            "tableId": [5],
            "exp": future_exp(),
        }));
        let claims = verifier().verify(&token).unwrap();
        assert_eq!(claims.table_id(), None);
    }
}
