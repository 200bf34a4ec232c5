// src/storage/mod.rs

//! Conversation persistence backends (JSON file, SQLite).
//! The engine only talks to the `ConversationStore` trait; which backend
//! sits behind it is a startup decision.

use crate::chat::Conversation;
use async_trait::async_trait;

pub mod json;
pub mod sqlite;

pub use json::JsonFileStore;
pub use sqlite::SqliteStore;

/// Trait for any conversation backend. Timestamps must round-trip
/// losslessly through save and load.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Load every stored conversation, most recent first.
    async fn load_conversations(&self) -> anyhow::Result<Vec<Conversation>>;

    /// Replace the stored conversation set with the given snapshot.
    async fn save_conversations(&self, conversations: &[Conversation]) -> anyhow::Result<()>;

    /// Load the id of the conversation that was active when last saved.
    async fn load_active_conversation_id(&self) -> anyhow::Result<Option<String>>;

    /// Persist (or clear) the active conversation id.
    async fn save_active_conversation_id(&self, id: Option<&str>) -> anyhow::Result<()>;
}
