//! Error types for Kafi.

use thiserror::Error;

/// Primary error type for all Kafi operations.
#[derive(Error, Debug)]
pub enum KafiError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limits exceeded. Please try again later.")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Payment required. Please add funds to your workspace.")]
    PaymentRequired,

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Peer connection error: {0}")]
    Peer(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl KafiError {
    /// Create an API error from a status code and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether this error is potentially retryable by the caller.
    ///
    /// The core never retries; this is a hint for the application layer.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network(_) => true,
            Self::Api { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, KafiError>;
