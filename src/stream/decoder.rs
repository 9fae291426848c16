//! Incremental decoder for the relay's `data: {...}` event stream.
//!
//! The relay frames its response as newline-delimited SSE-style events.
//! Chunk boundaries carry no meaning: a chunk may end mid-line, mid-JSON,
//! or mid-UTF-8-character. [`StreamBuffer`] owns all reassembly state for
//! one request and reports the cumulative assistant text to a sink once
//! per extracted content delta.

use serde::Deserialize;

/// Event prefix on meaningful frames.
const DATA_PREFIX: &str = "data: ";

/// Literal end-of-stream marker.
const DONE_SENTINEL: &str = "[DONE]";

/// Outcome of feeding one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    /// More bytes may follow.
    Continue,
    /// The sentinel was seen; decoding is finished.
    Done,
}

/// Reassembly state for one streamed response.
///
/// `pending` is kept as raw bytes so a multi-byte character split across
/// chunks simply waits in the buffer; a `\n` byte never occurs inside a
/// multi-byte UTF-8 sequence, so line extraction is safe on bytes.
#[derive(Debug, Default)]
pub struct StreamBuffer {
    pending: Vec<u8>,
    accumulated: String,
    finished: bool,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The assistant message built so far.
    pub fn text(&self) -> &str {
        &self.accumulated
    }

    /// Whether the sentinel has been seen.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed one chunk of raw bytes, invoking `sink` with the cumulative
    /// text once per extracted content delta.
    ///
    /// A JSON parse failure on an extracted line is not an error: the line
    /// arrived truncated relative to a logical frame, so the whole line
    /// plus its terminator goes back to the front of the buffer and
    /// processing stops until more bytes arrive.
    pub fn feed<F>(&mut self, chunk: &[u8], sink: &mut F) -> FeedOutcome
    where
        F: FnMut(&str),
    {
        if self.finished {
            return FeedOutcome::Done;
        }
        self.pending.extend_from_slice(chunk);

        while let Some(newline) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=newline).collect();
            line.pop(); // the '\n'
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line).into_owned();

            if line.trim().is_empty() || line.starts_with(':') {
                continue;
            }
            let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
                continue;
            };
            let payload = payload.trim();
            if payload == DONE_SENTINEL {
                // Stop here: bytes already buffered after the sentinel are
                // never interpreted as further events.
                self.finished = true;
                return FeedOutcome::Done;
            }

            match serde_json::from_str::<CompletionChunk>(payload) {
                Ok(frame) => {
                    let content = frame
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content);
                    // Frames without content are control frames, not errors.
                    if let Some(content) = content {
                        if !content.is_empty() {
                            self.accumulated.push_str(&content);
                            sink(&self.accumulated);
                        }
                    }
                }
                Err(_) => {
                    // Truncated frame: restore the entire line and wait for
                    // the rest of it.
                    let mut restored =
                        Vec::with_capacity(line.len() + 1 + self.pending.len());
                    restored.extend_from_slice(line.as_bytes());
                    restored.push(b'\n');
                    restored.extend_from_slice(&self.pending);
                    self.pending = restored;
                    return FeedOutcome::Continue;
                }
            }
        }

        FeedOutcome::Continue
    }
}

/// Wire shape of one streamed frame: `{choices: [{delta: {content?}}]}`.
#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}
