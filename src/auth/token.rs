//! Session tokens handed out on successful login.

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;
/// Ten years.
pub const MAX_TOKEN_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

/// Mints an opaque session credential for an authenticated identity.
pub trait TokenIssuer: Send + Sync {
    /// # Errors
    /// Returns an error if the token cannot be produced.
    fn issue(&self, email: &str, user_id: &str) -> Result<String>;
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// HS256 JSON Web Tokens.
#[derive(Clone)]
pub struct JwtIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtIssuer {
    /// # Errors
    /// Returns an error if `ttl_seconds` exceeds [`MAX_TOKEN_TTL_SECONDS`].
    pub fn new(secret: &SecretString, ttl_seconds: i64) -> Result<Self> {
        if ttl_seconds > MAX_TOKEN_TTL_SECONDS {
            bail!("token TTL of {ttl_seconds}s exceeds {MAX_TOKEN_TTL_SECONDS}s");
        }
        let ttl = Duration::try_seconds(ttl_seconds).context("token TTL out of range")?;

        let secret = secret.expose_secret().as_bytes();
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        })
    }

    /// Decode a token, checking signature and expiry.
    /// # Errors
    /// Returns an error if the token is malformed, forged or expired.
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .context("invalid token")?;
        Ok(data.claims)
    }
}

impl std::fmt::Debug for JwtIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, email: &str, user_id: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.ttl)
                .context("token expiry out of range")?
                .timestamp(),
            jti: Ulid::new().to_string(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .context("failed to encode token")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn issuer(secret: &str) -> JwtIssuer {
        let secret = SecretString::from(secret.to_string());
        JwtIssuer::new(&secret, DEFAULT_TOKEN_TTL_SECONDS).unwrap()
    }

    #[test]
    fn issue_then_validate() {
        let jwt = issuer("test-secret-32-bytes-long-key-01");
        let token = jwt.issue("a@x.com", "42").unwrap();
        let claims = jwt.validate(&token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "a@x.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tokens_are_unique() {
        let jwt = issuer("test-secret-32-bytes-long-key-01");
        let a = jwt.issue("a@x.com", "42").unwrap();
        let b = jwt.issue("a@x.com", "42").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issuer("test-secret-32-bytes-long-key-01")
            .issue("a@x.com", "42")
            .unwrap();
        assert!(issuer("test-secret-32-bytes-long-key-02")
            .validate(&token)
            .is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let secret = SecretString::from("test-secret-32-bytes-long-key-03".to_string());
        let jwt = JwtIssuer::new(&secret, -3600).unwrap();
        let token = jwt.issue("a@x.com", "42").unwrap();
        assert!(jwt.validate(&token).is_err());
    }

    #[test]
    fn oversized_ttl_is_rejected() {
        let secret = SecretString::from("test-secret-32-bytes-long-key-05".to_string());

        assert!(JwtIssuer::new(&secret, MAX_TOKEN_TTL_SECONDS).is_ok());
        assert!(JwtIssuer::new(&secret, MAX_TOKEN_TTL_SECONDS + 1).is_err());
        assert!(JwtIssuer::new(&secret, i64::MAX).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(issuer("test-secret-32-bytes-long-key-04")
            .validate("not-a-token")
            .is_err());
    }
}
