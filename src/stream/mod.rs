//! Streaming event decoding for the chat relay.

pub mod decoder;

pub use decoder::{FeedOutcome, StreamBuffer};
