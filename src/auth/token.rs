//! Stateless bearer tokens (HS256 JWTs).

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{error::Error, models::User};

/// Claims asserted by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the authenticated account.
    pub sub: String,
    /// Numeric account id.
    pub uid: i32,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// Mints and verifies access tokens with a symmetric server key.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenSigner {
    /// Build a signer from the raw server secret.
    #[must_use]
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    /// Mint a token asserting `user`'s identity.
    ///
    /// # Errors
    /// Returns [`Error::Unauthenticated`] if signing fails, which only
    /// happens with malformed key material.
    pub fn issue(&self, user: &User) -> Result<String, Error> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.username.clone(),
            uid: user.id,
            iat: now,
            exp: now + self.ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| Error::Unauthenticated)
    }

    /// Verify a presented token and return its claims.
    ///
    /// # Errors
    /// Returns [`Error::Unauthenticated`] for any signature, structure, or
    /// expiry failure; callers never learn which.
    pub fn verify(&self, token: &str) -> Result<Claims, Error> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| Error::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::TokenSigner;
    use crate::models::{Role, User};

    fn alice() -> User {
        User {
            id: 7,
            username: "alice".to_owned(),
            email: "alice@example.com".to_owned(),
            role: Role::User,
            bio: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            is_superuser: false,
            confirmation_secret: "s".to_owned(),
        }
    }

    #[rstest]
    fn issued_token_verifies() {
        let signer = TokenSigner::new(b"test-key", 3600);
        let token = signer.issue(&alice()).expect("issue");
        let claims = signer.verify(&token).expect("verify");
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.uid, 7);
        assert!(claims.exp > claims.iat);
    }

    #[rstest]
    fn wrong_key_is_rejected() {
        let signer = TokenSigner::new(b"test-key", 3600);
        let other = TokenSigner::new(b"other-key", 3600);
        let token = signer.issue(&alice()).expect("issue");
        assert!(other.verify(&token).is_err());
    }

    #[rstest]
    fn garbage_is_rejected() {
        let signer = TokenSigner::new(b"test-key", 3600);
        assert!(signer.verify("not-a-token").is_err());
    }

    #[rstest]
    fn expired_token_is_rejected() {
        // Negative TTL plus jsonwebtoken's default 60s leeway.
        let signer = TokenSigner::new(b"test-key", -120);
        let token = signer.issue(&alice()).expect("issue");
        assert!(signer.verify(&token).is_err());
    }
}
