//! Realtime session configuration.

use super::peer::AudioConstraints;

/// Configuration for a realtime voice session.
#[derive(Debug, Clone)]
pub struct RealtimeConfiguration {
    /// Model identifier appended to the handshake URL.
    pub model: String,
    /// Realtime handshake endpoint (receives the SDP offer).
    pub base_url: String,
    /// Label of the control data channel.
    pub channel_label: String,
    /// Microphone capture constraints.
    pub constraints: AudioConstraints,
}

impl Default for RealtimeConfiguration {
    fn default() -> Self {
        Self {
            model: "gpt-4o-realtime-preview-2024-12-17".to_string(),
            base_url: "https://api.openai.com/v1/realtime".to_string(),
            channel_label: "oai-events".to_string(),
            constraints: AudioConstraints::default(),
        }
    }
}
