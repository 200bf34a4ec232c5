// src/memory/index.rs

use super::embedding::{utils, CharFrequencyEmbedder, Embedder};
use crate::sentiment::Sentiment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Everything recorded alongside an indexed message.
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    pub conversation_id: String,
    pub message_id: String,
    pub timestamp: DateTime<Utc>,
    pub sentiment: Option<Sentiment>,
}

/// One indexed message with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub conversation_id: String,
    pub message_id: String,
    pub timestamp: DateTime<Utc>,
    pub sentiment: Option<Sentiment>,
}

/// A ranked match returned from a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityHit {
    pub message_id: String,
    pub conversation_id: String,
    pub content: String,
    pub similarity: f32,
}

/// Append-only in-process vector store over past user messages.
///
/// Entries are never updated or removed; a fresh index is rebuilt from
/// persisted conversations at startup. Queries are brute-force cosine
/// scans, which is fine at chat-history scale.
pub struct SimilarityIndex {
    embedder: Box<dyn Embedder>,
    entries: RwLock<Vec<VectorEntry>>,
}

impl SimilarityIndex {
    pub fn new() -> Self {
        Self::with_embedder(Box::new(CharFrequencyEmbedder))
    }

    pub fn with_embedder(embedder: Box<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Embeds and appends one message. Infallible: a degenerate (all-zero)
    /// embedding is stored as-is and simply never ranks above zero.
    pub async fn add(&self, content: &str, metadata: EntryMetadata) {
        let entry = VectorEntry {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            embedding: self.embedder.embed(content),
            conversation_id: metadata.conversation_id,
            message_id: metadata.message_id,
            timestamp: metadata.timestamp,
            sentiment: metadata.sentiment,
        };
        let mut entries = self.entries.write().await;
        entries.push(entry);
        debug!("similarity index now holds {} entries", entries.len());
    }

    /// Returns up to `limit` entries ranked by cosine similarity to `text`,
    /// best first. An empty index yields an empty list.
    pub async fn query(&self, text: &str, limit: usize) -> Vec<SimilarityHit> {
        let probe = self.embedder.embed(text);
        let entries = self.entries.read().await;

        let mut hits: Vec<SimilarityHit> = entries
            .iter()
            .map(|entry| SimilarityHit {
                message_id: entry.message_id.clone(),
                conversation_id: entry.conversation_id.clone(),
                content: entry.content.clone(),
                similarity: utils::cosine_similarity(&probe, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(limit);
        hits
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for SimilarityIndex {
    fn default() -> Self {
        Self::new()
    }
}
