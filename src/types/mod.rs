//! Core data types.

pub mod message;

pub use message::{Attachment, ChatMessage, Role};
