//! Outbound mail as an injected collaborator.

use thiserror::Error;

/// Delivery failure reported by a [`Mailer`].
#[derive(Debug, Error)]
#[error("mail delivery failed: {0}")]
pub struct MailError(pub String);

/// Sends a single plain-text message.
///
/// Signup treats delivery as fire-and-forget: a failure is logged, never
/// surfaced to the client.
pub trait Mailer: Send + Sync {
    /// Deliver `body` to `to`.
    ///
    /// # Errors
    /// Returns [`MailError`] when the transport rejects the message.
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Default transport: logs the message instead of delivering it.
///
/// Useful for development and as the stand-in until a real transport is
/// configured.
pub struct LogMailer {
    /// Sender address stamped on each message.
    pub from: String,
}

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        tracing::info!(from = %self.from, to, subject, body, "outbound mail");
        Ok(())
    }
}
