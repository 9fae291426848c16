//! Convenience re-exports.

pub use crate::chat::ChatClient;
pub use crate::config::KafiConfig;
pub use crate::error::{KafiError, Result};
pub use crate::history::{Conversation, FileHistoryStore, HistoryStore};
pub use crate::realtime::{
    HttpCredentialBroker, RealtimeConfiguration, RealtimeSession, ServerEvent, SessionHandlers,
    SessionState,
};
pub use crate::stream::StreamBuffer;
pub use crate::types::{Attachment, ChatMessage, Role};
