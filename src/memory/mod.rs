//! Semantic recall
//!
//! Local deterministic embeddings plus an in-process, append-only
//! similarity index over past user messages. No external vector store;
//! everything lives in memory and rebuilds from persisted conversations
//! at startup.

pub mod embedding;
pub mod index;

// Re-export commonly used items
pub use self::embedding::{CharFrequencyEmbedder, Embedder, EMBEDDING_DIM};
pub use self::index::{EntryMetadata, SimilarityHit, SimilarityIndex, VectorEntry};
