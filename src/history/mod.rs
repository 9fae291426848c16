//! Local conversation history.
//!
//! A small key-value style store: the full conversation list persists as
//! one JSON document, most recently updated first, capped at
//! [`MAX_CONVERSATIONS`].

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{KafiError, Result};
use crate::types::ChatMessage;

/// Most recent conversations kept on save.
pub const MAX_CONVERSATIONS: usize = 50;

const TITLE_MAX_CHARS: usize = 40;

/// A stored conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: "New Chat".to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the messages, refreshing the title and timestamp.
    pub fn update_messages(&mut self, messages: Vec<ChatMessage>) {
        if !messages.is_empty() {
            self.title = derive_title(&messages);
        }
        self.messages = messages;
        self.updated_at = Utc::now();
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Title from the first user message, truncated with an ellipsis.
fn derive_title(messages: &[ChatMessage]) -> String {
    let first_user = messages
        .iter()
        .find(|m| m.role == crate::types::Role::User);
    match first_user {
        Some(msg) => {
            let content: Vec<char> = msg.content.chars().collect();
            if content.len() > TITLE_MAX_CHARS {
                let truncated: String = content[..TITLE_MAX_CHARS].iter().collect();
                format!("{truncated}...")
            } else {
                msg.content.clone()
            }
        }
        None => "New Chat".to_string(),
    }
}

/// Storage abstraction for persisted conversations.
pub trait HistoryStore: Send + Sync {
    fn load(&self) -> Result<Vec<Conversation>>;
    fn save(&self, conversations: &[Conversation]) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// File-backed history store using one JSON document.
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store under the platform data directory.
    pub fn new_default() -> Self {
        Self {
            path: default_history_path(),
        }
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl HistoryStore for FileHistoryStore {
    fn load(&self) -> Result<Vec<Conversation>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(KafiError::Io(err)),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, conversations: &[Conversation]) -> Result<()> {
        Self::ensure_parent(&self.path)?;
        let mut ordered: Vec<&Conversation> = conversations.iter().collect();
        ordered.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        ordered.truncate(MAX_CONVERSATIONS);
        let serialized = serde_json::to_string(&ordered)?;
        fs::write(&self.path, serialized)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(KafiError::Io(err)),
        }
    }
}

fn default_history_path() -> PathBuf {
    if let Some(dirs) = directories::ProjectDirs::from("", "", "kafi") {
        return dirs.data_dir().join("history.json");
    }
    // Home-relative fallback mirrors the data dir layout.
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kafi")
        .join("history.json")
}
