//! Configuration (layered: code > env).

use std::sync::OnceLock;

use crate::error::{KafiError, Result};

/// Global default config (lazy-initialized from env).
static DEFAULT_CONFIG: OnceLock<KafiConfig> = OnceLock::new();

/// Endpoints and keys for the chat relay and the realtime broker.
///
/// The relay and broker are typically edge functions deployed next to the
/// app; the publishable key is the anonymous bearer token they expect.
#[derive(Debug, Clone, Default)]
pub struct KafiConfig {
    chat_url: Option<String>,
    session_url: Option<String>,
    publishable_key: Option<String>,
}

impl KafiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from environment variables (`KAFI_CHAT_URL`,
    /// `KAFI_SESSION_URL`, `KAFI_PUBLISHABLE_KEY`).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self {
            chat_url: std::env::var("KAFI_CHAT_URL").ok(),
            session_url: std::env::var("KAFI_SESSION_URL").ok(),
            publishable_key: std::env::var("KAFI_PUBLISHABLE_KEY").ok(),
        }
    }

    /// Get (or create) the global default config.
    pub fn global() -> &'static KafiConfig {
        DEFAULT_CONFIG.get_or_init(Self::from_env)
    }

    pub fn with_chat_url(mut self, url: impl Into<String>) -> Self {
        self.chat_url = Some(url.into());
        self
    }

    pub fn with_session_url(mut self, url: impl Into<String>) -> Self {
        self.session_url = Some(url.into());
        self
    }

    pub fn with_publishable_key(mut self, key: impl Into<String>) -> Self {
        self.publishable_key = Some(key.into());
        self
    }

    /// The streaming chat relay endpoint.
    pub fn chat_url(&self) -> Result<&str> {
        self.chat_url
            .as_deref()
            .ok_or_else(|| KafiError::Configuration("chat URL is not set".into()))
    }

    /// The ephemeral-credential broker endpoint.
    pub fn session_url(&self) -> Result<&str> {
        self.session_url
            .as_deref()
            .ok_or_else(|| KafiError::Configuration("session URL is not set".into()))
    }

    /// The anonymous bearer key the relay and broker expect.
    pub fn publishable_key(&self) -> Result<&str> {
        self.publishable_key
            .as_deref()
            .ok_or_else(|| KafiError::Configuration("publishable key is not set".into()))
    }
}
