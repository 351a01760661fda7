use async_trait::async_trait;
use serde::Serialize;

use super::domain::ReportId;

/// Rendered message for one recipient office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub report_id: ReportId,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub maps_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("recipient rejected: {0}")]
    Rejected(String),
    #[error("mail transport unavailable: {0}")]
    Unavailable(String),
    #[error("mail transport timed out")]
    TimedOut,
}

/// Outbound mail adapter.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), TransportError>;
}

/// Posts notifications as JSON to an HTTP mail relay.
#[derive(Debug, Clone)]
pub struct HttpMailRelay {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpMailRelay {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MailTransport for HttpMailRelay {
    async fn send(&self, notification: &Notification) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(notification)
            .send()
            .await
            .map_err(|err| TransportError::Unavailable(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            Err(TransportError::Rejected(format!("HTTP {status}: {body}")))
        } else {
            Err(TransportError::Unavailable(format!("HTTP {status}: {body}")))
        }
    }
}
