use crate::{config::AuthConfig, errors::ApiError};
use axum::http::{HeaderMap, header};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// JWT - What we encode in the authentication token
// ============================================================================
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (username)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>, // User ID
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// Signing material built once from [`AuthConfig`].
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
}

impl TokenKeys {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm: config.algorithm,
        }
    }

    /// Signs `{sub, id, exp, iat, jti}` with `exp = now + ttl`.
    pub fn create_token(
        &self,
        username: &str,
        user_id: &Uuid,
        ttl: Duration,
    ) -> Result<String, ApiError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(ttl)
            .ok_or_else(|| ApiError::InternalError("Failed to calculate expiration".into()))?
            .timestamp();

        let claims = Claims {
            sub: username.to_string(),
            id: Some(user_id.to_string()),
            exp: expiration,
            iat: now.timestamp(),
            jti: Some(Uuid::new_v4().to_string()),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| ApiError::InternalError(format!("Token Creation failed: {}", e)))
    }

    /// Checks signature and expiry. Every decoding failure is `Unauthorized`.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| ApiError::Unauthorized)
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            secret: secret.to_string(),
            algorithm: Algorithm::HS256,
            token_ttl: Duration::minutes(20),
            bcrypt_cost: 4,
            login_attempts_per_minute: 10,
        }
    }

    #[test]
    fn round_trips_claims() {
        let keys = TokenKeys::new(&config("secret"));
        let user_id = Uuid::new_v4();

        let token = keys
            .create_token("alice", &user_id, Duration::minutes(20))
            .unwrap();
        let claims = keys.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.id, Some(user_id.to_string()));
        assert!(claims.exp > Utc::now().timestamp());
        assert!(claims.jti.is_some());
    }

    #[test]
    fn rejects_foreign_signature() {
        let ours = TokenKeys::new(&config("secret"));
        let theirs = TokenKeys::new(&config("another-secret"));

        let token = theirs
            .create_token("alice", &Uuid::new_v4(), Duration::minutes(20))
            .unwrap();

        assert!(matches!(
            ours.validate_token(&token),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let keys = TokenKeys::new(&config("secret"));
        let token = keys
            .create_token("alice", &Uuid::new_v4(), Duration::seconds(-5))
            .unwrap();

        assert!(matches!(
            keys.validate_token(&token),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn rejects_garbage() {
        let keys = TokenKeys::new(&config("secret"));
        assert!(matches!(
            keys.validate_token("not.a.token"),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def");
    }
}
