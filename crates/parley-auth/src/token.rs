use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use parley_core::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};

/// Reference policy: access tokens live for 30 minutes.
pub const DEFAULT_TTL_SECS: i64 = 30 * 60;

/// Claims embedded in a Parley bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's email.
    pub sub: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl TokenService {
    /// Service signing with `secret`, issuing tokens that expire after the
    /// default 30-minute window.
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, DEFAULT_TTL_SECS)
    }

    /// Service with a custom expiry window.
    pub fn with_ttl(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    /// Issue a token whose subject is `subject`.
    pub fn issue(&self, subject: &str) -> RelayResult<String> {
        let now = now_secs();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| RelayError::TokenMalformed(e.to_string()))
    }

    /// Verify a token and return its claims.
    ///
    /// Fails with [`RelayError::TokenExpired`] for tokens past their
    /// window and [`RelayError::TokenMalformed`] for everything else
    /// (garbage input, wrong signature, missing claims), so callers can
    /// tell "re-authenticate" apart from "reject".
    pub fn verify(&self, token: &str) -> RelayResult<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        match jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(RelayError::TokenExpired),
                _ => Err(RelayError::TokenMalformed(e.to_string())),
            },
        }
    }
}

fn now_secs() -> i64 {
    #[allow(clippy::cast_possible_wrap)]
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    secs
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(b"test-secret-key")
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let tokens = service();
        let token = tokens.issue("alice@example.com").unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.exp - claims.iat, DEFAULT_TTL_SECS);
    }

    #[test]
    fn expired_token_is_distinguished() {
        let tokens = TokenService::with_ttl(b"test-secret-key", -120);
        let token = tokens.issue("alice@example.com").unwrap();
        let err = tokens.verify(&token).unwrap_err();
        assert!(matches!(err, RelayError::TokenExpired));
    }

    #[test]
    fn garbage_token_is_malformed() {
        let err = service().verify("not-a-token").unwrap_err();
        assert!(matches!(err, RelayError::TokenMalformed(_)));
    }

    #[test]
    fn wrong_secret_is_malformed_not_expired() {
        let token = service().issue("alice@example.com").unwrap();
        let other = TokenService::new(b"different-secret");
        let err = other.verify(&token).unwrap_err();
        assert!(matches!(err, RelayError::TokenMalformed(_)));
    }
}
