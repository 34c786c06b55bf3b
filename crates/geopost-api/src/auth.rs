//! Bearer-token authentication for the protected routes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

/// Caller identity, inserted into request extensions by [`require_auth`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
}

/// HS256 token issuer and verifier
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Sign a token for `username` valid for `ttl`
    pub fn issue(
        &self,
        username: &str,
        ttl: Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            username: username.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    /// Verify signature and expiry
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    let value = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

/// Reject requests without a valid bearer token
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token =
        bearer_token(&request).ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

    let claims = state.jwt.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ApiError::unauthorized("Invalid token").with_details(e.to_string())
    })?;

    request.extensions_mut().insert(AuthUser { username: claims.username });
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_issue_and_verify() {
        let jwt = JwtService::new("secret");
        let token = jwt.issue("alice", Duration::hours(1)).unwrap();

        let claims = jwt.verify(&token).unwrap();
        assert_eq!(claims.username, "alice");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtService::new("one").issue("alice", Duration::hours(1)).unwrap();
        assert!(JwtService::new("two").verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = JwtService::new("secret");
        let token = jwt.issue("alice", Duration::hours(-2)).unwrap();
        assert!(jwt.verify(&token).is_err());
    }

    #[test]
    fn test_bearer_token_extraction() {
        let request = Request::builder()
            .header(AUTHORIZATION, "Bearer abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_token(&request), Some("abc.def.ghi"));

        let raw = Request::builder().header(AUTHORIZATION, "abc").body(Body::empty()).unwrap();
        assert_eq!(bearer_token(&raw), None);

        let missing = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(bearer_token(&missing), None);
    }
}
