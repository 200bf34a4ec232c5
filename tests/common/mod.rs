// tests/common/mod.rs

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use attune::llm::{ChatTurn, LanguageModel};
use attune::sentiment::Sentiment;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted stand-in for the remote model. Anything left unscripted fails,
/// which is exactly what the fallback paths are exercised against.
/// Completions are consumed front-to-back, so one script covers both the
/// reply and the subsequent title derivation.
#[derive(Default)]
pub struct MockProvider {
    classification: Mutex<Option<Sentiment>>,
    replies: Mutex<VecDeque<String>>,
    detected_language: Mutex<Option<String>>,
    translation: Mutex<Option<String>>,
    speech: Mutex<Option<Vec<u8>>>,
    delay: Mutex<Option<Duration>>,
    pub classify_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
    pub detect_calls: AtomicUsize,
    pub translate_calls: AtomicUsize,
    pub speech_calls: AtomicUsize,
}

#[allow(dead_code)]
impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose every call fails.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn with_classification(self, sentiment: Sentiment) -> Self {
        *self.classification.lock().unwrap() = Some(sentiment);
        self
    }

    pub fn with_replies<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.replies.lock().unwrap() = replies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_detected_language(self, code: &str) -> Self {
        *self.detected_language.lock().unwrap() = Some(code.to_string());
        self
    }

    pub fn with_translation(self, text: &str) -> Self {
        *self.translation.lock().unwrap() = Some(text.to_string());
        self
    }

    pub fn with_speech(self, audio: Vec<u8>) -> Self {
        *self.speech.lock().unwrap() = Some(audio);
        self
    }

    /// Delays every call, for tests that race intents against a slow turn.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl LanguageModel for MockProvider {
    async fn classify_sentiment(&self, _text: &str) -> Result<Sentiment> {
        self.pause().await;
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = *self.classification.lock().unwrap();
        scripted.ok_or_else(|| anyhow!("classification not scripted"))
    }

    async fn complete_chat(&self, _turns: &[ChatTurn], _temperature: f32) -> Result<String> {
        self.pause().await;
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted completion left"))
    }

    async fn detect_language(&self, _text: &str) -> Result<String> {
        self.pause().await;
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.detected_language.lock().unwrap().clone();
        scripted.ok_or_else(|| anyhow!("language detection not scripted"))
    }

    async fn translate(&self, _text: &str, _target_language: &str) -> Result<String> {
        self.pause().await;
        self.translate_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.translation.lock().unwrap().clone();
        scripted.ok_or_else(|| anyhow!("translation not scripted"))
    }

    async fn synthesize_speech(&self, _text: &str, _voice: &str) -> Result<Vec<u8>> {
        self.pause().await;
        self.speech_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.speech.lock().unwrap().clone();
        scripted.ok_or_else(|| anyhow!("speech not scripted"))
    }
}
