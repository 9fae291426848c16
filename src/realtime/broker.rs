//! Ephemeral credential broker.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{KafiError, Result};
use crate::http::{bearer_headers, shared_client};

/// Mints the short-lived credential that authorizes one realtime handshake.
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    /// Returns the ephemeral secret value, or a descriptive error.
    async fn mint(&self) -> Result<String>;
}

/// Broker backed by a trusted HTTPS endpoint returning
/// `{client_secret: {value}}`.
#[derive(Debug, Clone)]
pub struct HttpCredentialBroker {
    url: String,
    publishable_key: String,
}

impl HttpCredentialBroker {
    pub fn new(url: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            publishable_key: publishable_key.into(),
        }
    }
}

#[async_trait]
impl CredentialBroker for HttpCredentialBroker {
    async fn mint(&self) -> Result<String> {
        debug!(url = %self.url, "requesting ephemeral credential");

        let resp = shared_client()
            .post(&self.url)
            .headers(bearer_headers(&self.publishable_key))
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(KafiError::Credential(format!(
                "broker rejected the session request (status {status})"
            )));
        }

        let ticket: SessionTicket = resp.json().await?;
        ticket
            .client_secret
            .and_then(|s| s.value)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                KafiError::Credential("broker response is missing client_secret.value".into())
            })
    }
}

#[derive(Debug, Deserialize)]
struct SessionTicket {
    #[serde(default)]
    client_secret: Option<TicketSecret>,
}

#[derive(Debug, Deserialize)]
struct TicketSecret {
    #[serde(default)]
    value: Option<String>,
}
