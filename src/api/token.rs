//! Bearer tokens
//!
//! HS256 JWTs carrying the account id, issued on successful authentication.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims embedded in every issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Login the token was issued to
    pub sub: String,
    pub account_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies bearer tokens with one shared secret
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl_secs: ttl_hours.saturating_mul(3600),
        }
    }

    /// Sign a token for `account_id`.
    pub fn issue(&self, account_id: Uuid, login: &str) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: login.to_string(),
            account_id,
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Encode)
    }

    /// Check signature and expiry and return the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

/// Token errors
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token encoding failed: {0}")]
    Encode(jsonwebtoken::errors::Error),

    #[error("Invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let tokens = TokenService::new("secret", 72);
        let account_id = Uuid::new_v4();

        let token = tokens.issue(account_id, "alice").unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.account_id, account_id);
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp - claims.iat, 72 * 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenService::new("secret", 1).issue(Uuid::new_v4(), "bob").unwrap();
        let other = TokenService::new("another-secret", 1);

        assert!(matches!(other.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenService::new("secret", -1);
        let token = tokens.issue(Uuid::new_v4(), "carol").unwrap();

        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = TokenService::new("secret", 1);
        assert!(tokens.verify("not.a.jwt").is_err());
    }
}
