//! Resend HTTP API client

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{Email, Notifier, NotifyError};

const API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone)]
pub struct ResendClient {
    api_key: String,
    http: Client,
}

impl ResendClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http: Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

impl<'a> From<&'a Email> for SendEmailBody<'a> {
    fn from(email: &'a Email) -> Self {
        Self {
            from: &email.from,
            to: [&email.to],
            subject: &email.subject,
            text: &email.text,
            reply_to: email.reply_to.as_deref(),
        }
    }
}

#[async_trait]
impl Notifier for ResendClient {
    async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&SendEmailBody::from(email))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Provider { status, message });
        }

        tracing::debug!("Sent email '{}' to {}", email.subject, email.to);
        Ok(())
    }
}
