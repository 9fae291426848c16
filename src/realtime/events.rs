//! Control-channel event schema.
//!
//! Inbound events arrive as JSON objects with a `type` discriminator.
//! Only the types the session reacts to get their own variants; everything
//! else lands in [`ServerEvent::Generic`] so the application still sees it.

use serde_json::{json, Value};

use crate::error::{KafiError, Result};

/// An event received over the control side channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// `conversation.item.input_audio_transcription.completed`
    InputTranscriptionCompleted { transcript: String },
    /// `response.audio_transcript.delta`
    AudioTranscriptDelta { delta: String },
    /// `response.audio_transcript.done`
    AudioTranscriptDone { transcript: String },
    /// `response.created`
    ResponseCreated,
    /// `response.audio.delta`
    AudioDelta,
    /// `response.audio.done`
    AudioDone,
    /// `response.done`
    ResponseDone,
    /// Any other event type, carried verbatim.
    Generic { event_type: String, payload: Value },
}

impl ServerEvent {
    /// Parse a raw channel message.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        let event_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| KafiError::Stream("control event is missing a type".into()))?;

        Ok(match event_type {
            "conversation.item.input_audio_transcription.completed" => {
                Self::InputTranscriptionCompleted {
                    transcript: str_field(&value, "transcript"),
                }
            }
            "response.audio_transcript.delta" => Self::AudioTranscriptDelta {
                delta: str_field(&value, "delta"),
            },
            "response.audio_transcript.done" => Self::AudioTranscriptDone {
                transcript: str_field(&value, "transcript"),
            },
            "response.created" => Self::ResponseCreated,
            "response.audio.delta" => Self::AudioDelta,
            "response.audio.done" => Self::AudioDone,
            "response.done" => Self::ResponseDone,
            other => Self::Generic {
                event_type: other.to_string(),
                payload: value.clone(),
            },
        })
    }

    /// The wire name of this event type.
    pub fn event_type(&self) -> &str {
        match self {
            Self::InputTranscriptionCompleted { .. } => {
                "conversation.item.input_audio_transcription.completed"
            }
            Self::AudioTranscriptDelta { .. } => "response.audio_transcript.delta",
            Self::AudioTranscriptDone { .. } => "response.audio_transcript.done",
            Self::ResponseCreated => "response.created",
            Self::AudioDelta => "response.audio.delta",
            Self::AudioDone => "response.audio.done",
            Self::ResponseDone => "response.done",
            Self::Generic { event_type, .. } => event_type,
        }
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// An event sent over the control side channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// `conversation.item.create` with a user `input_text` item.
    CreateUserMessage { text: String },
    /// `response.create`
    CreateResponse,
}

impl ClientEvent {
    pub fn user_message(text: impl Into<String>) -> Self {
        Self::CreateUserMessage { text: text.into() }
    }

    pub fn to_wire(&self) -> Value {
        match self {
            Self::CreateUserMessage { text } => json!({
                "type": "conversation.item.create",
                "item": {
                    "type": "message",
                    "role": "user",
                    "content": [{ "type": "input_text", "text": text }],
                },
            }),
            Self::CreateResponse => json!({ "type": "response.create" }),
        }
    }

    pub fn to_json(&self) -> String {
        self.to_wire().to_string()
    }
}
