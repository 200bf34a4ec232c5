// src/llm/provider.rs

use crate::sentiment::Sentiment;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One role-tagged turn in a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Everything the engine asks of a remote language model.
///
/// Every call is fallible; callers own the fallback story (keyword
/// classification, templated replies, untranslated text). Tests swap in
/// scripted implementations.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Classifies text into the closed sentiment set. An off-list label
    /// from the model is an error, not a guess.
    async fn classify_sentiment(&self, text: &str) -> Result<Sentiment>;

    /// Free-form completion over role-tagged turns.
    async fn complete_chat(&self, turns: &[ChatTurn], temperature: f32) -> Result<String>;

    /// Returns the ISO 639-1 code of the text's language.
    async fn detect_language(&self, text: &str) -> Result<String>;

    async fn translate(&self, text: &str, target_language: &str) -> Result<String>;

    /// Renders text to audio bytes with the given voice.
    async fn synthesize_speech(&self, text: &str, voice: &str) -> Result<Vec<u8>>;
}
