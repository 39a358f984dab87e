//! HS256 bearer tokens.
//!
//! Access tokens authenticate `/api/auth/*` requests; refresh tokens are
//! exchanged at `/api/refresh` for a new access token. The two are signed
//! with different secrets, so one can never stand in for the other.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::models::AuthUser;

pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid token: {0}")]
    InvalidClaims(String),

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

/// Token payload: the authenticated user plus registered claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    #[serde(flatten)]
    pub user: AuthUser,
    pub iat: i64,
    pub exp: i64,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDelta,
}

impl KeyPair {
    fn new(secret: &str, ttl: TimeDelta) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn issue(&self, user: &AuthUser) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            user: user.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    fn verify(&self, token: &str, validation: &Validation) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, validation).map_err(|e| {
            tracing::debug!("JWT validation failed: {:?}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::InvalidClaims(e.to_string()),
            }
        })?;
        Ok(data.claims)
    }
}

/// Signing and verification keys for both token kinds.
pub struct TokenKeys {
    access: KeyPair,
    refresh: KeyPair,
    validation: Validation,
}

impl TokenKeys {
    pub fn new(access_secret: &str, refresh_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            access: KeyPair::new(access_secret, TimeDelta::minutes(ACCESS_TOKEN_TTL_MINUTES)),
            refresh: KeyPair::new(refresh_secret, TimeDelta::days(REFRESH_TOKEN_TTL_DAYS)),
            validation,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.access_token_secret, &config.refresh_token_secret)
    }

    pub fn issue_access(&self, user: &AuthUser) -> Result<String, AuthError> {
        self.access.issue(user)
    }

    pub fn issue_refresh(&self, user: &AuthUser) -> Result<String, AuthError> {
        self.refresh.issue(user)
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        self.access.verify(token, &self.validation)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        self.refresh.verify(token, &self.validation)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS: &str = "access-secret-access-secret-0123456789";
    const REFRESH: &str = "refresh-secret-refresh-secret-0123456789";

    fn user() -> AuthUser {
        AuthUser {
            id: 7,
            age: 52,
            email: "p@example.com".into(),
            role: "general".into(),
        }
    }

    #[test]
    fn access_token_roundtrip() {
        let keys = TokenKeys::new(ACCESS, REFRESH);
        let token = keys.issue_access(&user()).unwrap();
        let claims = keys.verify_access(&token).unwrap();
        assert_eq!(claims.user, user());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let keys = TokenKeys::new(ACCESS, REFRESH);
        let refresh = keys.issue_refresh(&user()).unwrap();
        assert_eq!(keys.verify_access(&refresh), Err(AuthError::InvalidSignature));

        let access = keys.issue_access(&user()).unwrap();
        assert_eq!(keys.verify_refresh(&access), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn expired_token_rejected() {
        let keys = TokenKeys::new(ACCESS, REFRESH);
        let claims = Claims {
            user: user(),
            iat: Utc::now().timestamp() - 3600,
            exp: Utc::now().timestamp() - 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(ACCESS.as_bytes()),
        )
        .unwrap();
        assert_eq!(keys.verify_access(&token), Err(AuthError::TokenExpired));
    }

    #[test]
    fn garbage_token_rejected() {
        let keys = TokenKeys::new(ACCESS, REFRESH);
        assert!(matches!(
            keys.verify_access("not.a.jwt"),
            Err(AuthError::InvalidClaims(_))
        ));
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(Some("Basic abc")), Err(AuthError::MissingToken));
        assert_eq!(bearer_token(Some("Bearer ")), Err(AuthError::MissingToken));
        assert_eq!(bearer_token(None), Err(AuthError::MissingToken));
    }
}
