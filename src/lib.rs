//! Kafi — client core for streaming chat and realtime voice.
//!
//! Provides the non-UI half of a chat application: a streaming
//! chat-completions client that reassembles incremental `data: {...}`
//! frames into a growing assistant message, and a realtime voice session
//! negotiator that performs the SDP offer/answer handshake and dispatches
//! control events from the side channel. Conversation history persists in
//! a small file-backed store.
//!
//! # Quick Start
//!
//! ```no_run
//! use futures::StreamExt;
//! use kafi::chat::ChatClient;
//! use kafi::types::ChatMessage;
//!
//! # async fn example() -> kafi::error::Result<()> {
//! let client = ChatClient::from_env()?;
//! let mut stream = client
//!     .stream_chat(&[ChatMessage::user("Salam!")])
//!     .await?;
//! while let Some(text) = stream.next().await {
//!     println!("{}", text?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod config;
pub mod error;
pub mod history;
pub mod http;
pub mod prelude;
pub mod realtime;
pub mod stream;
pub mod types;
