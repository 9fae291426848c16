//! Streaming chat client for the relay endpoint.

use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::json;
use tracing::debug;

use crate::config::KafiConfig;
use crate::error::{KafiError, Result};
use crate::http::{bearer_headers, shared_client, status_to_error};
use crate::stream::{FeedOutcome, StreamBuffer};
use crate::types::ChatMessage;

/// Client for the streaming chat relay.
///
/// One call to [`stream_chat`](Self::stream_chat) corresponds to one
/// conversation turn: the relay answers with `data: {...}` frames and the
/// returned stream yields the cumulative assistant text once per content
/// delta, in stream order.
#[derive(Debug, Clone)]
pub struct ChatClient {
    url: String,
    publishable_key: String,
}

impl ChatClient {
    pub fn new(url: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            publishable_key: publishable_key.into(),
        }
    }

    /// Build from a config (endpoint + publishable key must be set).
    pub fn from_config(config: &KafiConfig) -> Result<Self> {
        Ok(Self::new(
            config.chat_url()?,
            config.publishable_key()?,
        ))
    }

    /// Build from the global env-loaded config.
    pub fn from_env() -> Result<Self> {
        Self::from_config(KafiConfig::global())
    }

    /// Send a conversation turn and stream back the assistant reply.
    ///
    /// Each yielded item is the full assistant text so far; the last item
    /// is the complete message. The stream ends at the `[DONE]` sentinel
    /// or at natural end of body, whichever comes first.
    pub async fn stream_chat(
        &self,
        messages: &[ChatMessage],
    ) -> Result<BoxStream<'static, Result<String>>> {
        debug!(url = %self.url, count = messages.len(), "chat stream request");

        let resp = shared_client()
            .post(&self.url)
            .headers(bearer_headers(&self.publishable_key))
            .json(&json!({ "messages": messages }))
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer = StreamBuffer::new();
            futures::pin_mut!(byte_stream);

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(KafiError::Network(e));
                        break;
                    }
                };

                let mut deltas = Vec::new();
                let outcome = buffer.feed(&chunk, &mut |text: &str| {
                    deltas.push(text.to_string());
                });
                for delta in deltas {
                    yield Ok(delta);
                }
                if outcome == FeedOutcome::Done {
                    break;
                }
            }
            // End of body without a sentinel is graceful completion.
        };

        Ok(Box::pin(stream))
    }

    /// Drive a turn to completion and return the final assistant text.
    pub async fn collect_chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let mut stream = self.stream_chat(messages).await?;
        let mut text = String::new();
        while let Some(cumulative) = stream.next().await {
            text = cumulative?;
        }
        Ok(text)
    }
}
