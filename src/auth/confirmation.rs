//! Single-use confirmation codes for the signup flow.
//!
//! A code is `<unix-ts>-<hex tag>` where the tag is an HMAC-SHA256 over the
//! username, the account's `confirmation_secret`, and the timestamp. Codes
//! are never stored; verification recomputes the tag and compares in
//! constant time. Rotating the account secret invalidates every previously
//! issued code, which is how consumption works.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::models::User;

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies confirmation codes bound to per-user secret state.
pub struct CodeGenerator {
    key: Vec<u8>,
    ttl_secs: i64,
}

impl CodeGenerator {
    /// Build a generator from the server secret and a validity window.
    #[must_use]
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            key: secret.to_vec(),
            ttl_secs,
        }
    }

    fn tag(&self, user: &User, timestamp: i64) -> Vec<u8> {
        // Keyed with the server secret; bound to mutable per-user state so
        // rotation invalidates outstanding codes.
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .unwrap_or_else(|_| unreachable!("hmac accepts keys of any length"));
        mac.update(user.username.as_bytes());
        mac.update(b"|");
        mac.update(user.confirmation_secret.as_bytes());
        mac.update(b"|");
        mac.update(timestamp.to_string().as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    fn issue_at(&self, user: &User, timestamp: i64) -> String {
        format!("{timestamp}-{}", hex::encode(self.tag(user, timestamp)))
    }

    /// Issue a fresh code for `user`.
    #[must_use]
    pub fn issue(&self, user: &User) -> String {
        self.issue_at(user, Utc::now().timestamp())
    }

    fn verify_at(&self, user: &User, code: &str, now: i64) -> bool {
        let Some((ts_part, tag_part)) = code.split_once('-') else {
            return false;
        };
        let Ok(timestamp) = ts_part.parse::<i64>() else {
            return false;
        };
        let age = now - timestamp;
        if age < 0 || age > self.ttl_secs {
            return false;
        }
        let Ok(provided) = hex::decode(tag_part) else {
            return false;
        };
        let mut mac = match HmacSha256::new_from_slice(&self.key) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(user.username.as_bytes());
        mac.update(b"|");
        mac.update(user.confirmation_secret.as_bytes());
        mac.update(b"|");
        mac.update(ts_part.as_bytes());
        mac.verify_slice(&provided).is_ok()
    }

    /// Check a presented code against the account's current secret state.
    #[must_use]
    pub fn verify(&self, user: &User, code: &str) -> bool {
        self.verify_at(user, code, Utc::now().timestamp())
    }
}
