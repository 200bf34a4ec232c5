// src/storage/sqlite.rs

//! SQLite persistence via sqlx. Conversations and messages live in two
//! tables keyed by the same string ids the in-memory model uses; the save
//! path replaces the whole snapshot inside one transaction.

use super::ConversationStore;
use crate::chat::{Conversation, Message, Sender};
use crate::config::CONFIG;
use crate::sentiment::Sentiment;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::warn;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (or creates) the database and ensures the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        // An in-memory database exists per connection; a larger pool would
        // hand out fresh empty databases.
        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            CONFIG.sqlite_max_connections
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .with_context(|| format!("connecting to {}", database_url))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                main_sentiment TEXT,
                language TEXT,
                position INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL REFERENCES conversations(id),
                content TEXT NOT NULL,
                sender TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                sentiment TEXT,
                language TEXT,
                original_text TEXT,
                translated_from TEXT,
                position INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(SqliteStore { pool })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("bad timestamp '{}'", raw))?
        .with_timezone(&Utc))
}

/// Sentiment labels are advisory; an unknown one is dropped with a warning
/// rather than failing the whole load.
fn parse_sentiment(raw: Option<String>) -> Option<Sentiment> {
    let raw = raw?;
    match raw.parse() {
        Ok(sentiment) => Some(sentiment),
        Err(_) => {
            warn!("ignoring unknown stored sentiment '{}'", raw);
            None
        }
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn load_conversations(&self) -> Result<Vec<Conversation>> {
        let conversation_rows = sqlx::query(
            "SELECT id, title, created_at, updated_at, main_sentiment, language
             FROM conversations ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut conversations = Vec::with_capacity(conversation_rows.len());
        for row in conversation_rows {
            let id: String = row.get("id");
            let message_rows = sqlx::query(
                "SELECT id, content, sender, timestamp, sentiment, language,
                        original_text, translated_from
                 FROM messages WHERE conversation_id = ? ORDER BY position",
            )
            .bind(&id)
            .fetch_all(&self.pool)
            .await?;

            let mut messages = Vec::with_capacity(message_rows.len());
            for message_row in message_rows {
                let sender: String = message_row.get("sender");
                let timestamp: String = message_row.get("timestamp");
                messages.push(Message {
                    id: message_row.get("id"),
                    content: message_row.get("content"),
                    sender: sender.parse::<Sender>()?,
                    timestamp: parse_timestamp(&timestamp)?,
                    sentiment: parse_sentiment(message_row.get("sentiment")),
                    language: message_row.get("language"),
                    original_text: message_row.get("original_text"),
                    translated_from: message_row.get("translated_from"),
                });
            }

            let created_at: String = row.get("created_at");
            let updated_at: String = row.get("updated_at");
            conversations.push(Conversation {
                id,
                title: row.get("title"),
                messages,
                created_at: parse_timestamp(&created_at)?,
                updated_at: parse_timestamp(&updated_at)?,
                main_sentiment: parse_sentiment(row.get("main_sentiment")),
                language: row.get("language"),
            });
        }

        Ok(conversations)
    }

    async fn save_conversations(&self, conversations: &[Conversation]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM messages").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM conversations")
            .execute(&mut *tx)
            .await?;

        for (position, conversation) in conversations.iter().enumerate() {
            sqlx::query(
                "INSERT INTO conversations
                     (id, title, created_at, updated_at, main_sentiment, language, position)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&conversation.id)
            .bind(&conversation.title)
            .bind(conversation.created_at.to_rfc3339())
            .bind(conversation.updated_at.to_rfc3339())
            .bind(conversation.main_sentiment.map(|s| s.as_str()))
            .bind(&conversation.language)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;

            for (message_position, message) in conversation.messages.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO messages
                         (id, conversation_id, content, sender, timestamp, sentiment,
                          language, original_text, translated_from, position)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&message.id)
                .bind(&conversation.id)
                .bind(&message.content)
                .bind(message.sender.as_str())
                .bind(message.timestamp.to_rfc3339())
                .bind(message.sentiment.map(|s| s.as_str()))
                .bind(&message.language)
                .bind(&message.original_text)
                .bind(&message.translated_from)
                .bind(message_position as i64)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load_active_conversation_id(&self) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM app_state WHERE key = 'active_conversation'")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.and_then(|r| r.get::<Option<String>, _>("value")))
    }

    async fn save_active_conversation_id(&self, id: Option<&str>) -> Result<()> {
        sqlx::query(
            "INSERT INTO app_state (key, value) VALUES ('active_conversation', ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
