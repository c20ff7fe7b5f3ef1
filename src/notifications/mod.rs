//! Outgoing email port.
//!
//! Every send is best-effort from the caller's point of view; failures are
//! logged by the caller and never undo a state change.

pub mod resend;
pub mod templates;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

pub use resend::ResendClient;

/// Sender identity and staff inbox
#[derive(Debug, Clone, PartialEq)]
pub struct MailConfig {
    pub from: String,
    pub staff: String,
}

/// Plain-text email
#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub text: String,
}

/// Notification error types
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error("email provider rejected the message ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("email provider unreachable: {0}")]
    Http(#[from] reqwest::Error),
}

/// Email delivery
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), NotifyError>;
}

/// Send an email, logging instead of failing.
pub async fn send_best_effort<N: Notifier + ?Sized>(notifier: &N, email: Result<Email, NotifyError>, what: &str) {
    let result = match email {
        Ok(email) => notifier.send(&email).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::warn!("Failed to send {} email: {}", what, e);
    }
}
