// src/memory/embedding.rs

/// Width of every embedding vector produced in this crate.
pub const EMBEDDING_DIM: usize = 256;

/// Turns text into a fixed-width vector. Implementations must be
/// deterministic: the same text always yields the same vector.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Character-frequency histogram embedder.
///
/// Buckets every char by code point modulo [`EMBEDDING_DIM`] and normalizes
/// by total character count. Crude next to a learned model, but fully local,
/// deterministic, and good enough to surface "have we talked about this
/// before" matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct CharFrequencyEmbedder;

impl Embedder for CharFrequencyEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut histogram = vec![0.0f32; EMBEDDING_DIM];
        let mut total = 0usize;
        for c in text.chars() {
            histogram[c as usize % EMBEDDING_DIM] += 1.0;
            total += 1;
        }
        if total > 0 {
            for bucket in histogram.iter_mut() {
                *bucket /= total as f32;
            }
        }
        histogram
    }
}

/// Helper functions for working with embeddings
pub mod utils {
    /// Calculate cosine similarity between two embeddings
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}
