use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::ApiState;

/// Claims carried by the bearer tokens the UI issues.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Validates HS256 bearer tokens against the deployment's shared secret.
/// Token cryptography itself is jsonwebtoken's concern.
pub struct BearerGuard {
    key: DecodingKey,
    validation: Validation,
}

impl BearerGuard {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.key, &self.validation).map(|data| data.claims)
    }
}

/// Middleware gating protected routes on a valid bearer token.
pub async fn require_bearer(State(state): State<ApiState>, req: Request, next: Next) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) if state.guard.validate(token).is_ok() => next.run(req).await,
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "Response": "Error - Not authorized." })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn mint(secret: &str, exp: usize) -> String {
        let claims = Claims {
            sub: "tester".to_string(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn far_future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn valid_token_passes() {
        let guard = BearerGuard::new("sekrit");
        let token = mint("sekrit", far_future());

        let claims = guard.validate(&token).unwrap();
        assert_eq!(claims.sub, "tester");
    }

    #[test]
    fn wrong_secret_fails() {
        let guard = BearerGuard::new("sekrit");
        let token = mint("other-secret", far_future());

        assert!(guard.validate(&token).is_err());
    }

    #[test]
    fn expired_token_fails() {
        let guard = BearerGuard::new("sekrit");
        let token = mint("sekrit", 1_000);

        assert!(guard.validate(&token).is_err());
    }
}
