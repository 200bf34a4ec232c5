// src/llm/client.rs
use crate::config::CONFIG;
use crate::llm::provider::{ChatTurn, LanguageModel};
use crate::sentiment::Sentiment;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{json, Value};
use std::env;
use std::time::Duration;
use tracing::debug;

const CLASSIFY_SYSTEM_PROMPT: &str = r#"Analyze the sentiment in the following text and respond with ONLY ONE of these categories:
positive, negative, neutral, anxious, depressed, hopeful, overwhelmed, calm, urgent, frustrated, suppressed, confused, fearful.

Pay special attention to signs of suppressed emotions like saying "I'm fine" while expressing negative feelings.
If there are signs of crisis or self-harm, classify as "urgent".
Respond with only the sentiment label and nothing else."#;

const DETECT_LANGUAGE_SYSTEM_PROMPT: &str = "You are a language detection tool. Respond with only the ISO 639-1 language code (2 letters, e.g., 'en', 'es', 'fr') for the given text. Nothing else.";

const CLASSIFY_MAX_TOKENS: usize = 20;
const DETECT_MAX_TOKENS: usize = 10;
const TRANSLATE_MAX_TOKENS: usize = 500;

/// Thin client over any OpenAI-compatible completion API.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: CONFIG.openai_base_url.clone(),
            model: CONFIG.model.clone(),
        }
    }

    /// Builds a client from `OPENAI_API_KEY`, or `None` when the key is
    /// absent and the engine should run on local strategies alone.
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("OPENAI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        Some(Self::new(api_key))
    }

    /// Universal request builder for all JSON endpoints
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(
                method,
                format!(
                    "{}/{}",
                    self.api_base.trim_end_matches('/'),
                    path.trim_start_matches('/')
                ),
            )
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(CONFIG.request_timeout))
    }

    async fn chat_completion(
        &self,
        messages: Vec<Value>,
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let response = self
            .request(Method::POST, "chat/completions")
            .json(&payload)
            .send()
            .await
            .context("Failed to send chat completion request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("OpenAI API error {}: {}", status, error_text));
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse completion response")?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("completion response missing message content"))?;
        Ok(content.to_string())
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn classify_sentiment(&self, text: &str) -> Result<Sentiment> {
        let messages = vec![
            json!({"role": "system", "content": CLASSIFY_SYSTEM_PROMPT}),
            json!({"role": "user", "content": text}),
        ];
        let label = self
            .chat_completion(messages, CONFIG.classify_temperature, CLASSIFY_MAX_TOKENS)
            .await?;
        label.trim().to_lowercase().parse()
    }

    async fn complete_chat(&self, turns: &[ChatTurn], temperature: f32) -> Result<String> {
        let messages = turns
            .iter()
            .map(|turn| json!({"role": turn.role.as_str(), "content": turn.content}))
            .collect();
        let reply = self
            .chat_completion(messages, temperature, CONFIG.max_reply_tokens)
            .await?;
        debug!("completion returned {} chars", reply.len());
        Ok(reply)
    }

    async fn detect_language(&self, text: &str) -> Result<String> {
        let messages = vec![
            json!({"role": "system", "content": DETECT_LANGUAGE_SYSTEM_PROMPT}),
            json!({"role": "user", "content": text}),
        ];
        let reply = self
            .chat_completion(messages, CONFIG.classify_temperature, DETECT_MAX_TOKENS)
            .await?;
        let code: String = reply.trim().to_lowercase().chars().take(2).collect();
        if code.len() != 2 {
            return Err(anyhow!("language detection returned '{}'", reply.trim()));
        }
        Ok(code)
    }

    async fn translate(&self, text: &str, target_language: &str) -> Result<String> {
        let system = format!(
            "You are a translation tool. Translate the following text into {}. Provide only the translated text, nothing else.",
            target_language
        );
        let messages = vec![
            json!({"role": "system", "content": system}),
            json!({"role": "user", "content": text}),
        ];
        let translated = self
            .chat_completion(messages, CONFIG.translate_temperature, TRANSLATE_MAX_TOKENS)
            .await?;
        Ok(translated.trim().to_string())
    }

    async fn synthesize_speech(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        let payload = json!({
            "model": CONFIG.tts_model,
            "input": text,
            "voice": voice,
        });

        let response = self
            .request(Method::POST, "audio/speech")
            .json(&payload)
            .send()
            .await
            .context("Failed to send speech request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("OpenAI TTS API error {}: {}", status, error_text));
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read speech audio bytes")?;
        Ok(bytes.to_vec())
    }
}
