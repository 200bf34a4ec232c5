// src/storage/json.rs

//! Single-document JSON persistence. The whole conversation set and the
//! active id live in one file; every save rewrites it through a temp file
//! and rename so a crash mid-write never leaves a torn document.

use super::ConversationStore;
use crate::chat::Conversation;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

const STATE_FILE_NAME: &str = "conversations.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredState {
    conversations: Vec<Conversation>,
    active_conversation_id: Option<String>,
}

pub struct JsonFileStore {
    path: PathBuf,
    // Saves are read-modify-write over the same file; serialize them.
    io_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: Mutex::new(()),
        }
    }

    /// Store rooted in the platform data directory.
    pub fn at_default_location() -> Result<Self> {
        let dir = dirs::data_dir().context("no platform data directory available")?;
        Ok(Self::new(dir.join("attune").join(STATE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_state(&self) -> Result<StoredState> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("malformed state file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no state file at {}, starting empty", self.path.display());
                Ok(StoredState::default())
            }
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    async fn write_state(&self, state: &StoredState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let raw = serde_json::to_string_pretty(state)?;
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, raw.as_bytes())
            .await
            .with_context(|| format!("writing {}", temp_path.display()))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for JsonFileStore {
    async fn load_conversations(&self) -> Result<Vec<Conversation>> {
        Ok(self.read_state().await?.conversations)
    }

    async fn save_conversations(&self, conversations: &[Conversation]) -> Result<()> {
        let _guard = self.io_lock.lock().await;
        let mut state = self.read_state().await.unwrap_or_default();
        state.conversations = conversations.to_vec();
        self.write_state(&state).await
    }

    async fn load_active_conversation_id(&self) -> Result<Option<String>> {
        Ok(self.read_state().await?.active_conversation_id)
    }

    async fn save_active_conversation_id(&self, id: Option<&str>) -> Result<()> {
        let _guard = self.io_lock.lock().await;
        let mut state = self.read_state().await.unwrap_or_default();
        state.active_conversation_id = id.map(str::to_string);
        self.write_state(&state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Message;
    use crate::sentiment::Sentiment;

    fn sample_conversation() -> Conversation {
        let mut conversation = Conversation::new("Hi there! How are you feeling today?");
        let mut message = Message::user("pretty good actually");
        message.sentiment = Some(Sentiment::Positive);
        conversation.push(message);
        conversation.push(Message::bot("That's lovely to hear."));
        conversation
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));

        assert!(store.load_conversations().await.unwrap().is_empty());
        assert_eq!(store.load_active_conversation_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_conversations_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        let conversation = sample_conversation();

        store
            .save_conversations(std::slice::from_ref(&conversation))
            .await
            .unwrap();
        let loaded = store.load_conversations().await.unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], conversation);
        assert_eq!(loaded[0].messages[1].sentiment, Some(Sentiment::Positive));
        assert_eq!(loaded[0].messages[1].timestamp, conversation.messages[1].timestamp);
    }

    #[tokio::test]
    async fn test_active_id_survives_conversation_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        let conversation = sample_conversation();

        store
            .save_active_conversation_id(Some(&conversation.id))
            .await
            .unwrap();
        store
            .save_conversations(std::slice::from_ref(&conversation))
            .await
            .unwrap();

        assert_eq!(
            store.load_active_conversation_id().await.unwrap(),
            Some(conversation.id.clone())
        );

        store.save_active_conversation_id(None).await.unwrap();
        assert_eq!(store.load_active_conversation_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_parent_directories_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/deeper/state.json"));

        store.save_conversations(&[]).await.unwrap();
        assert!(store.path().exists());
    }
}
