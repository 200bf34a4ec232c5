//! Response generation
//!
//! Remote-first reply generation with a fully local fallback. The local
//! strategy is a per-category template table with deterministic overrides
//! for crisis, suppression, and recurring topics; the remote strategy
//! assembles a persona prompt with retrieved context and handles the
//! translation flow. Neither path ever surfaces an error to the caller.

pub mod templates;

use crate::chat::{Message, UserPreferences, UserProfile};
use crate::config::CONFIG;
use crate::llm::LanguageModel;
use crate::memory::SimilarityHit;
use crate::persona::Persona;
use crate::prompt::{build_chat_turns, build_system_prompt, PromptContext};
use crate::sentiment::{Sentiment, SentimentResult};
use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub use templates::{
    templates_for, CRISIS_RESOURCES_NOTICE, CRISIS_RESPONSE, FALLBACK_REPLY, GREETINGS,
    SUPPRESSED_PROBE,
};

/// Reply text plus the language bookkeeping recorded on the message.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedReply {
    pub content: String,
    pub language: Option<String>,
    /// Untranslated reply, kept when translation rewrote `content`.
    pub original_text: Option<String>,
    pub translated_from: Option<String>,
}

impl GeneratedReply {
    fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            language: None,
            original_text: None,
            translated_from: None,
        }
    }
}

/// Conversation-level inputs to one generation call.
pub struct GenerationContext<'a> {
    pub history: &'a [Message],
    pub similar: &'a [SimilarityHit],
    pub profile: Option<&'a UserProfile>,
    pub preferences: &'a UserPreferences,
}

pub struct ResponseGenerator {
    provider: Option<Arc<dyn LanguageModel>>,
    persona: Persona,
    rng: Mutex<StdRng>,
}

impl ResponseGenerator {
    /// `seed` pins template and greeting selection for reproducible runs;
    /// `None` draws from OS entropy.
    pub fn new(provider: Option<Arc<dyn LanguageModel>>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            provider,
            persona: Persona::Supportive,
            rng: Mutex::new(rng),
        }
    }

    /// Picks a greeting for a freshly created conversation.
    pub async fn greeting(&self) -> &'static str {
        let mut rng = self.rng.lock().await;
        GREETINGS.choose(&mut *rng).copied().unwrap_or(GREETINGS[0])
    }

    /// Produces a reply for one user turn. Crisis sentiment short-circuits
    /// everything; otherwise the remote model is tried first and any failure
    /// lands on the local template strategy.
    pub async fn generate(
        &self,
        message: &str,
        sentiment: SentimentResult,
        context: &GenerationContext<'_>,
    ) -> GeneratedReply {
        if sentiment.sentiment == Sentiment::Urgent {
            return GeneratedReply::plain(CRISIS_RESPONSE);
        }

        if let Some(provider) = &self.provider {
            match self
                .generate_remote(provider, message, sentiment.sentiment, context)
                .await
            {
                Ok(reply) => return reply,
                Err(e) => {
                    warn!("remote generation failed, using local templates: {}", e);
                }
            }
        }

        let history_text = context
            .history
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let content = self
            .generate_local(message, sentiment.sentiment, &history_text)
            .await;
        GeneratedReply::plain(content)
    }

    /// Local template strategy. Deterministic overrides run first: crisis,
    /// recurring topics seen in both history and the current message, then
    /// the dedicated suppression probe. Everything else draws uniformly
    /// from the category's pool.
    pub async fn generate_local(
        &self,
        message: &str,
        sentiment: Sentiment,
        history_text: &str,
    ) -> String {
        if sentiment == Sentiment::Urgent {
            return CRISIS_RESPONSE.to_string();
        }

        if !history_text.is_empty() {
            let history_lower = history_text.to_lowercase();
            let message_lower = message.to_lowercase();
            for (topic, follow_up) in templates::RECURRING_TOPICS {
                if history_lower.contains(topic) && message_lower.contains(topic) {
                    debug!("recurring topic override: {}", topic);
                    return follow_up.to_string();
                }
            }
        }

        if sentiment == Sentiment::Suppressed {
            return SUPPRESSED_PROBE.to_string();
        }

        let pool = templates_for(sentiment);
        let mut rng = self.rng.lock().await;
        pool.choose(&mut *rng)
            .copied()
            .unwrap_or(FALLBACK_REPLY)
            .to_string()
    }

    async fn generate_remote(
        &self,
        provider: &Arc<dyn LanguageModel>,
        message: &str,
        sentiment: Sentiment,
        context: &GenerationContext<'_>,
    ) -> Result<GeneratedReply> {
        let prompt_context = PromptContext {
            sentiment,
            similar: context.similar,
            profile: context.profile,
            preferred_language: &context.preferences.preferred_language,
            default_language: &CONFIG.default_language,
        };
        let system_prompt = build_system_prompt(&self.persona, &prompt_context);
        let turns = build_chat_turns(
            system_prompt,
            context.history,
            message,
            CONFIG.history_turn_cap,
        );

        let reply = provider
            .complete_chat(&turns, CONFIG.reply_temperature)
            .await?;
        let reply = reply.trim().to_string();
        if reply.is_empty() {
            return Err(anyhow!("model returned an empty completion"));
        }

        let preferred = context.preferences.preferred_language.as_str();
        if preferred == CONFIG.default_language {
            return Ok(GeneratedReply::plain(reply));
        }

        // The reply should already be in the preferred language thanks to the
        // prompt directive; verify, and translate when the model drifted.
        let detected = match provider.detect_language(&reply).await {
            Ok(code) => code,
            Err(e) => {
                warn!("language detection failed, returning reply as-is: {}", e);
                return Ok(GeneratedReply::plain(reply));
            }
        };

        if detected == preferred {
            return Ok(GeneratedReply {
                content: reply,
                language: Some(detected),
                original_text: None,
                translated_from: None,
            });
        }

        match provider.translate(&reply, preferred).await {
            Ok(translated) => Ok(GeneratedReply {
                content: translated,
                language: Some(preferred.to_string()),
                original_text: Some(reply),
                translated_from: Some(detected),
            }),
            Err(e) => {
                warn!("translation failed, returning untranslated reply: {}", e);
                Ok(GeneratedReply {
                    content: reply,
                    language: Some(detected),
                    original_text: None,
                    translated_from: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> ResponseGenerator {
        ResponseGenerator::new(None, Some(7))
    }

    #[tokio::test]
    async fn test_urgent_always_returns_the_crisis_reply() {
        let reply = generator()
            .generate_local("I can't go on", Sentiment::Urgent, "")
            .await;
        assert_eq!(reply, CRISIS_RESPONSE);
    }

    #[tokio::test]
    async fn test_urgent_overrides_recurring_topics() {
        // Crisis wins even when a topic rule would match.
        let reply = generator()
            .generate_local("work is why I want to die", Sentiment::Urgent, "work work work")
            .await;
        assert_eq!(reply, CRISIS_RESPONSE);
    }

    #[tokio::test]
    async fn test_suppressed_gets_the_dedicated_probe() {
        let reply = generator()
            .generate_local("I'm fine", Sentiment::Suppressed, "earlier messages")
            .await;
        assert_eq!(reply, SUPPRESSED_PROBE);
    }

    #[tokio::test]
    async fn test_recurring_topic_overrides_random_selection() {
        let generator = generator();
        let history = "we talked about my family a lot";
        let reply = generator
            .generate_local("my family is at it again", Sentiment::Negative, history)
            .await;
        assert!(reply.contains("family relationships"));
    }

    #[tokio::test]
    async fn test_topic_override_requires_topic_in_both_sides() {
        let generator = generator();
        let reply = generator
            .generate_local("feeling sad today", Sentiment::Negative, "we talked about work")
            .await;
        assert!(templates_for(Sentiment::Negative).contains(&reply.as_str()));
    }

    #[tokio::test]
    async fn test_random_selection_stays_inside_the_category_pool() {
        let generator = generator();
        for _ in 0..20 {
            let reply = generator
                .generate_local("feeling on edge", Sentiment::Anxious, "")
                .await;
            assert!(templates_for(Sentiment::Anxious).contains(&reply.as_str()));
        }
    }

    #[tokio::test]
    async fn test_same_seed_produces_same_sequence() {
        let a = ResponseGenerator::new(None, Some(99));
        let b = ResponseGenerator::new(None, Some(99));
        for _ in 0..10 {
            let from_a = a.generate_local("hello there friend", Sentiment::Neutral, "").await;
            let from_b = b.generate_local("hello there friend", Sentiment::Neutral, "").await;
            assert_eq!(from_a, from_b);
        }
    }

    #[tokio::test]
    async fn test_generate_without_provider_uses_local_pool() {
        let generator = generator();
        let preferences = UserPreferences::default();
        let context = GenerationContext {
            history: &[],
            similar: &[],
            profile: None,
            preferences: &preferences,
        };
        let sentiment = SentimentResult::new(Sentiment::Hopeful, 0.8);
        let reply = generator.generate("things are looking up", sentiment, &context).await;
        assert!(templates_for(Sentiment::Hopeful).contains(&reply.content.as_str()));
        assert!(reply.language.is_none());
    }

    #[tokio::test]
    async fn test_greeting_comes_from_the_pool() {
        let generator = generator();
        let greeting = generator.greeting().await;
        assert!(GREETINGS.contains(&greeting));
    }
}
