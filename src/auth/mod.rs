//! Identity collaborators: bearer-token signing, confirmation codes, and
//! mail delivery.
//!
//! All three are injected through the application state so the signup and
//! token-exchange flows are testable without real network, mail, or crypto
//! endpoints.

mod confirmation;
mod mailer;
mod token;

pub use self::{
    confirmation::CodeGenerator,
    mailer::{LogMailer, MailError, Mailer},
    token::{Claims, TokenSigner},
};

/// Generate a fresh random per-user confirmation secret.
#[must_use]
pub fn fresh_secret() -> String {
    use rand::{Rng, distributions::Alphanumeric};
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Signing material shared by every request handler.
pub struct AuthKeys {
    /// Bearer-token mint/verify.
    pub tokens: TokenSigner,
    /// Confirmation-code issue/verify.
    pub codes: CodeGenerator,
}

impl AuthKeys {
    /// Derive both collaborators from a single server secret.
    #[must_use]
    pub fn new(secret: &str, token_ttl_secs: i64, code_ttl_secs: i64) -> Self {
        Self {
            tokens: TokenSigner::new(secret.as_bytes(), token_ttl_secs),
            codes: CodeGenerator::new(secret.as_bytes(), code_ttl_secs),
        }
    }
}
