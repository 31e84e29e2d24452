//! Transactional email. Delivery is a side channel: callers of
//! [`Notifier::dispatch_best_effort`] never see a failure.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use derive_more::Display;
use log::{error, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::templates::{self, Notification};

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[display(fmt = "email rejected: {}", _0)]
    Rejected(String),

    #[display(fmt = "email service unreachable: {}", _0)]
    Unreachable(String),
}

impl std::error::Error for NotifyError {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Returns the provider's delivery id.
    async fn send(&self, email: &OutgoingEmail) -> Result<String, NotifyError>;

    fn is_configured(&self) -> bool {
        true
    }
}

/// Resend HTTP API.
pub struct ResendMailer {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

#[derive(Deserialize)]
struct ResendResponse {
    id: String,
}

impl ResendMailer {
    pub fn new(api_base: &str, api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, NotifyError> {
        let response = self
            .client
            .post(format!("{}/emails", self.api_base))
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await
            .map_err(|e| NotifyError::Unreachable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected(format!("{status}: {body}")));
        }
        let sent: ResendResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::Unreachable(e.to_string()))?;
        Ok(sent.id)
    }
}

/// Used when no API key is configured: writes the message to the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, NotifyError> {
        info!("email (not sent, no RESEND_API_KEY) to {}: {}", email.to, email.subject);
        Ok(format!("log-{}", Uuid::new_v4()))
    }

    fn is_configured(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    from: String,
    frontend_url: String,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, from: &str, frontend_url: &str) -> Self {
        Self {
            mailer,
            from: from.to_string(),
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_address(&self) -> &str {
        &self.from
    }

    pub fn is_configured(&self) -> bool {
        self.mailer.is_configured()
    }

    pub async fn dispatch(&self, to: &str, notification: &Notification) -> Result<String, NotifyError> {
        let rendered = templates::render(notification, &self.frontend_url);
        let email = OutgoingEmail {
            from: self.from.clone(),
            to: to.to_string(),
            subject: rendered.subject,
            html: rendered.html,
        };
        let id = self.mailer.send(&email).await?;
        info!("{} email sent to {} ({})", notification.kind(), to, id);
        Ok(id)
    }

    /// Sends and swallows the error after logging it.
    pub async fn dispatch_best_effort(&self, to: &str, notification: &Notification) -> Option<String> {
        match self.dispatch(to, notification).await {
            Ok(id) => Some(id),
            Err(err) => {
                error!("failed to send {} email to {}: {}", notification.kind(), to, err);
                None
            }
        }
    }
}
