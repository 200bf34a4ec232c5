// src/engine/mod.rs

//! Per-turn conversation control loop.
//!
//! `ChatEngine` owns the classifier, generator, similarity index and store,
//! and runs the same sequence for every user turn: classify, retrieve
//! context, generate, commit, index, persist. Every remote call site falls
//! back locally; nothing in the pipeline propagates an error to the caller.

use crate::chat::{
    Conversation, Message, PreferencesPatch, Sender, UserPreferences, UserProfile, DEFAULT_TITLE,
};
use crate::config::CONFIG;
use crate::llm::{ChatTurn, LanguageModel};
use crate::memory::{EntryMetadata, SimilarityIndex};
use crate::mood::{self, MoodRecord};
use crate::response::{ResponseGenerator, GenerationContext, CRISIS_RESOURCES_NOTICE};
use crate::sentiment::{Sentiment, SentimentClassifier, SentimentResult};
use crate::storage::ConversationStore;
use crate::suggestions::{Suggestion, SuggestionEngine};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const TITLE_SYSTEM_PROMPT: &str = "Create a short, descriptive title (maximum 50 characters) for a conversation that starts with the following message. Return only the title text.";

/// A first message shorter than this becomes the title verbatim.
const TITLE_VERBATIM_CHARS: usize = 30;
const TITLE_FALLBACK_WORDS: usize = 5;

/// Side-effect collaborator shown crisis resources when a turn classifies
/// as urgent. Not part of conversation history.
pub trait CrisisNotifier: Send + Sync {
    fn notify(&self, resources: &str);
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// How many similar past messages feed the generation prompt.
    pub similar_context_k: usize,
    /// How many index hits the suggestion engine mines for questions.
    pub question_mining_k: usize,
    /// Pins template, greeting and suggestion randomness when set.
    pub rng_seed: Option<u64>,
    pub preferences: UserPreferences,
    pub profile: Option<UserProfile>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            similar_context_k: CONFIG.similar_context_k,
            question_mining_k: CONFIG.question_mining_k,
            rng_seed: None,
            preferences: UserPreferences::default(),
            profile: None,
        }
    }
}

/// What one `send_message` call did.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Empty input, or the reply's conversation vanished mid-flight.
    Ignored,
    /// No conversation was active; one was created and the turn deferred.
    ConversationStarted { conversation_id: String },
    Reply {
        conversation_id: String,
        content: String,
        sentiment: SentimentResult,
    },
}

/// Read-only snapshot handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub conversations: Vec<Conversation>,
    pub active_conversation: Option<Conversation>,
    pub is_composing: bool,
    pub suggestions: Vec<Suggestion>,
    pub mood_records: Vec<MoodRecord>,
}

struct EngineState {
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    is_composing: bool,
    preferences: UserPreferences,
    profile: Option<UserProfile>,
}

pub struct ChatEngine {
    classifier: SentimentClassifier,
    generator: ResponseGenerator,
    suggestions: SuggestionEngine,
    index: SimilarityIndex,
    store: Arc<dyn ConversationStore>,
    provider: Option<Arc<dyn LanguageModel>>,
    notifier: Option<Arc<dyn CrisisNotifier>>,
    similar_context_k: usize,
    state: Arc<RwLock<EngineState>>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl ChatEngine {
    /// Loads persisted conversations (a read failure logs and starts empty),
    /// restores the active conversation when it still exists, and seeds the
    /// similarity index from stored user messages.
    pub async fn new(
        store: Arc<dyn ConversationStore>,
        provider: Option<Arc<dyn LanguageModel>>,
        options: EngineOptions,
    ) -> Self {
        let conversations = match store.load_conversations().await {
            Ok(conversations) => conversations,
            Err(e) => {
                warn!("failed to load conversations, starting empty: {:#}", e);
                Vec::new()
            }
        };
        let stored_active = match store.load_active_conversation_id().await {
            Ok(id) => id,
            Err(e) => {
                warn!("failed to load active conversation id: {:#}", e);
                None
            }
        };
        let active_id = stored_active
            .filter(|id| conversations.iter().any(|c| &c.id == id))
            .or_else(|| conversations.first().map(|c| c.id.clone()));

        let index = SimilarityIndex::new();
        for conversation in &conversations {
            for message in conversation.messages.iter().filter(|m| m.sender == Sender::User) {
                index
                    .add(
                        &message.content,
                        EntryMetadata {
                            conversation_id: conversation.id.clone(),
                            message_id: message.id.clone(),
                            timestamp: message.timestamp,
                            sentiment: message.sentiment,
                        },
                    )
                    .await;
            }
        }

        Self {
            classifier: SentimentClassifier::new(provider.clone()),
            generator: ResponseGenerator::new(provider.clone(), options.rng_seed),
            suggestions: SuggestionEngine::new(options.rng_seed, options.question_mining_k),
            index,
            store,
            provider,
            notifier: None,
            similar_context_k: options.similar_context_k,
            state: Arc::new(RwLock::new(EngineState {
                conversations,
                active_id,
                is_composing: false,
                preferences: options.preferences,
                profile: options.profile,
            })),
            background: Mutex::new(Vec::new()),
        }
    }

    pub fn with_crisis_notifier(mut self, notifier: Arc<dyn CrisisNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Runs one user turn. With no active conversation a new one is created
    /// (seeded with a greeting) and the turn is deferred to the next send.
    /// An optional language hint overrides the preferred reply language for
    /// this turn only.
    pub async fn send_message(&self, text: &str, language: Option<&str>) -> TurnOutcome {
        let text = text.trim();
        if text.is_empty() {
            return TurnOutcome::Ignored;
        }

        // Snapshot the turn inputs under one lock so a concurrent intent
        // cannot slip between the active-conversation check and the capture.
        let (conversation, preferences, profile, first_user_message) = {
            let mut state = self.state.write().await;
            let active = state
                .active_id
                .clone()
                .and_then(|id| state.conversations.iter().find(|c| c.id == id).cloned());

            let Some(conversation) = active else {
                let greeting = self.generator.greeting().await;
                let fresh = Conversation::new(greeting);
                let conversation_id = fresh.id.clone();
                state.conversations.insert(0, fresh);
                state.active_id = Some(conversation_id.clone());
                drop(state);
                debug!("created conversation {} lazily", conversation_id);
                self.persist().await;
                return TurnOutcome::ConversationStarted { conversation_id };
            };

            state.is_composing = true;
            let mut preferences = state.preferences.clone();
            if let Some(code) = language {
                preferences.preferred_language = code.to_string();
            }
            let first = conversation.user_message_count() == 0;
            (conversation, preferences, state.profile.clone(), first)
        };

        let sentiment = self.classifier.classify(text).await;

        if sentiment.sentiment == Sentiment::Urgent {
            if let Some(notifier) = &self.notifier {
                notifier.notify(CRISIS_RESOURCES_NOTICE);
            }
        }

        // Retrieval runs before the current message is indexed, so a message
        // never matches itself.
        let similar = self.index.query(text, self.similar_context_k).await;

        let mut user_message = Message::user(text);
        user_message.sentiment = Some(sentiment.sentiment);
        user_message.language = language.map(str::to_string);

        let context = GenerationContext {
            history: &conversation.messages,
            similar: &similar,
            profile: profile.as_ref(),
            preferences: &preferences,
        };
        let reply = self.generator.generate(text, sentiment, &context).await;

        let mut bot_message = Message::bot(reply.content.clone());
        bot_message.language = reply.language.clone();
        bot_message.original_text = reply.original_text.clone();
        bot_message.translated_from = reply.translated_from.clone();

        // Commit to the conversation captured at request time. Switching
        // away mid-flight must not reroute the reply; deleting the target
        // drops it.
        let committed = {
            let mut state = self.state.write().await;
            state.is_composing = false;
            match state
                .conversations
                .iter_mut()
                .find(|c| c.id == conversation.id)
            {
                Some(target) => {
                    target.push(user_message.clone());
                    target.push(bot_message);
                    true
                }
                None => {
                    debug!(
                        "conversation {} deleted mid-flight, dropping reply",
                        conversation.id
                    );
                    false
                }
            }
        };
        if !committed {
            return TurnOutcome::Ignored;
        }

        self.index
            .add(
                &user_message.content,
                EntryMetadata {
                    conversation_id: conversation.id.clone(),
                    message_id: user_message.id.clone(),
                    timestamp: user_message.timestamp,
                    sentiment: user_message.sentiment,
                },
            )
            .await;

        self.persist().await;

        if first_user_message {
            self.spawn_title_task(conversation.id.clone(), text.to_string())
                .await;
        }

        TurnOutcome::Reply {
            conversation_id: conversation.id,
            content: reply.content,
            sentiment,
        }
    }

    /// Creates and activates a new conversation, seeded with a greeting.
    pub async fn new_conversation(&self) -> String {
        let greeting = self.generator.greeting().await;
        let conversation = Conversation::new(greeting);
        let id = conversation.id.clone();
        {
            let mut state = self.state.write().await;
            state.conversations.insert(0, conversation);
            state.active_id = Some(id.clone());
        }
        self.persist().await;
        id
    }

    pub async fn select_conversation(&self, id: &str) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if !state.conversations.iter().any(|c| c.id == id) {
                return Err(anyhow!("no conversation with id {}", id));
            }
            state.active_id = Some(id.to_string());
        }
        self.persist().await;
        Ok(())
    }

    /// Deletes a conversation. When the active one goes, the most recent
    /// remaining conversation takes over; with none left the next send
    /// creates one lazily.
    pub async fn delete_conversation(&self, id: &str) -> Result<()> {
        {
            let mut state = self.state.write().await;
            let before = state.conversations.len();
            state.conversations.retain(|c| c.id != id);
            if state.conversations.len() == before {
                return Err(anyhow!("no conversation with id {}", id));
            }
            if state.active_id.as_deref() == Some(id) {
                state.active_id = state.conversations.first().map(|c| c.id.clone());
            }
        }
        self.persist().await;
        Ok(())
    }

    pub async fn update_preferences(&self, patch: PreferencesPatch) {
        let mut state = self.state.write().await;
        patch.apply(&mut state.preferences);
    }

    pub async fn preferences(&self) -> UserPreferences {
        self.state.read().await.preferences.clone()
    }

    pub async fn set_profile(&self, profile: Option<UserProfile>) {
        self.state.write().await.profile = profile;
    }

    /// Number of messages held by the similarity index. Only user-authored
    /// messages are retrieval targets.
    pub async fn indexed_messages(&self) -> usize {
        self.index.len().await
    }

    /// Text-to-speech for a stored message. Requires the remote provider.
    pub async fn synthesize_message(&self, message_id: &str) -> Result<Vec<u8>> {
        let provider = self
            .provider
            .as_ref()
            .context("speech synthesis requires the remote provider")?;
        let content = {
            let state = self.state.read().await;
            state
                .conversations
                .iter()
                .flat_map(|c| c.messages.iter())
                .find(|m| m.id == message_id)
                .map(|m| m.content.clone())
        }
        .with_context(|| format!("no message with id {}", message_id))?;
        provider.synthesize_speech(&content, &CONFIG.tts_voice).await
    }

    /// Snapshot for the presentation layer: conversation list, the active
    /// conversation, the composing flag, fresh suggestions and mood records.
    pub async fn view_state(&self) -> ViewState {
        let (conversations, active_id, is_composing, profile) = {
            let state = self.state.read().await;
            (
                state.conversations.clone(),
                state.active_id.clone(),
                state.is_composing,
                state.profile.clone(),
            )
        };
        let active_conversation =
            active_id.and_then(|id| conversations.iter().find(|c| c.id == id).cloned());
        let suggestions = self
            .suggestions
            .suggest(
                active_conversation.as_ref(),
                &conversations,
                profile.as_ref(),
                &self.index,
            )
            .await;
        let mood_records = mood::aggregate(&conversations);
        ViewState {
            conversations,
            active_conversation,
            is_composing,
            suggestions,
            mood_records,
        }
    }

    /// Waits for spawned title tasks. The REPL calls this on shutdown; tests
    /// call it to observe title patches deterministically.
    pub async fn await_background_tasks(&self) {
        let handles: Vec<JoinHandle<()>> = self.background.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("background task failed: {}", e);
            }
        }
    }

    async fn persist(&self) {
        let (snapshot, active_id) = {
            let state = self.state.read().await;
            (state.conversations.clone(), state.active_id.clone())
        };
        if let Err(e) = self.store.save_conversations(&snapshot).await {
            warn!("failed to persist conversations: {:#}", e);
        }
        if let Err(e) = self
            .store
            .save_active_conversation_id(active_id.as_deref())
            .await
        {
            warn!("failed to persist active conversation id: {:#}", e);
        }
    }

    /// Derives a title from the first user message in the background and
    /// patches the conversation by id. The placeholder check makes the patch
    /// conditional, so a late completion can never clobber newer state.
    async fn spawn_title_task(&self, conversation_id: String, first_message: String) {
        let provider = self.provider.clone();
        let state = Arc::clone(&self.state);
        let store = Arc::clone(&self.store);

        let handle = tokio::spawn(async move {
            let title = match &provider {
                Some(provider) => match remote_title(provider.as_ref(), &first_message).await {
                    Ok(title) => title,
                    Err(e) => {
                        debug!("title generation failed, using fallback: {:#}", e);
                        fallback_title(&first_message)
                    }
                },
                None => fallback_title(&first_message),
            };
            let title = clamp_title(&title);
            if title.is_empty() {
                return;
            }

            let snapshot = {
                let mut guard = state.write().await;
                let patched = guard
                    .conversations
                    .iter_mut()
                    .find(|c| c.id == conversation_id && c.title == DEFAULT_TITLE);
                match patched {
                    Some(conversation) => {
                        conversation.title = title;
                        conversation.updated_at = Utc::now();
                        Some(guard.conversations.clone())
                    }
                    None => None,
                }
            };
            if let Some(snapshot) = snapshot {
                if let Err(e) = store.save_conversations(&snapshot).await {
                    warn!("failed to persist derived title: {:#}", e);
                }
            }
        });

        self.background.lock().await.push(handle);
    }
}

async fn remote_title(provider: &dyn LanguageModel, first_message: &str) -> Result<String> {
    let turns = [
        ChatTurn::system(TITLE_SYSTEM_PROMPT),
        ChatTurn::user(first_message),
    ];
    let title = provider
        .complete_chat(&turns, CONFIG.reply_temperature)
        .await?;
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(anyhow!("empty title"));
    }
    Ok(title)
}

/// Local title derivation: short messages verbatim, longer ones cut to the
/// first few words.
fn fallback_title(first_message: &str) -> String {
    if first_message.chars().count() < TITLE_VERBATIM_CHARS {
        return first_message.to_string();
    }
    let words: Vec<&str> = first_message
        .split_whitespace()
        .take(TITLE_FALLBACK_WORDS)
        .collect();
    format!("{}...", words.join(" "))
}

fn clamp_title(title: &str) -> String {
    title.trim().chars().take(CONFIG.title_max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_becomes_title_verbatim() {
        assert_eq!(fallback_title("Feeling anxious today"), "Feeling anxious today");
    }

    #[test]
    fn test_long_message_truncates_to_five_words() {
        let title = fallback_title(
            "I have been feeling really overwhelmed by everything at work lately",
        );
        assert_eq!(title, "I have been feeling really...");
    }

    #[test]
    fn test_clamp_title_trims_and_caps() {
        assert_eq!(clamp_title("  My day  "), "My day");
        let long = "x".repeat(200);
        assert_eq!(clamp_title(&long).chars().count(), CONFIG.title_max_chars);
    }

    #[test]
    fn test_default_options_follow_config() {
        let options = EngineOptions::default();
        assert_eq!(options.similar_context_k, CONFIG.similar_context_k);
        assert_eq!(options.question_mining_k, CONFIG.question_mining_k);
        assert!(options.rng_seed.is_none());
    }
}
