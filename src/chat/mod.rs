//! Chat data model
//!
//! Conversations, messages, and the user-facing settings the engine reads:
//! - `Message` / `Conversation` with sentiment bookkeeping
//! - `UserPreferences` plus the partial-update patch applied over them
//! - `UserProfile` personalization handed to prompt construction

use crate::sentiment::Sentiment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Title given to a conversation until its first user message earns a real one.
pub const DEFAULT_TITLE: &str = "New conversation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Sender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Sender::User),
            "bot" => Ok(Sender::Bot),
            other => Err(anyhow::anyhow!("unknown sender: '{}'", other)),
        }
    }
}

/// One chat message. Immutable once appended, with a single exception:
/// the seeded greeting's conversation gains its derived title later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Untranslated reply text, kept when auto-translation rewrote `content`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_from: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, Sender::User)
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(content, Sender::Bot)
    }

    fn new(content: impl Into<String>, sender: Sender) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            sender,
            timestamp: Utc::now(),
            sentiment: None,
            language: None,
            original_text: None,
            translated_from: None,
        }
    }
}

/// A conversation thread. Never empty after creation: every new thread is
/// seeded with one assistant greeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_sentiment: Option<Sentiment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Conversation {
    pub fn new(greeting: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: vec![Message::bot(greeting)],
            created_at: now,
            updated_at: now,
            main_sentiment: None,
            language: None,
        }
    }

    /// Appends a message, bumps `updated_at`, and refreshes `main_sentiment`.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
        self.recompute_main_sentiment();
    }

    /// Most frequent sentiment among user messages; ties keep the sentiment
    /// that reached the top count first.
    pub fn recompute_main_sentiment(&mut self) {
        let mut counts: Vec<(Sentiment, usize)> = Vec::new();
        for message in self.messages.iter().filter(|m| m.sender == Sender::User) {
            if let Some(sentiment) = message.sentiment {
                match counts.iter_mut().find(|(s, _)| *s == sentiment) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((sentiment, 1)),
                }
            }
        }

        let mut best: Option<(Sentiment, usize)> = None;
        for (sentiment, count) in counts {
            match best {
                Some((_, top)) if top >= count => {}
                _ => best = Some((sentiment, count)),
            }
        }
        self.main_sentiment = best.map(|(s, _)| s);
    }

    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.sender == Sender::User)
    }

    pub fn user_message_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.sender == Sender::User)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub preferred_language: String,
    pub text_to_speech_enabled: bool,
    pub auto_translate_enabled: bool,
    pub theme: Theme,
    pub adaptive_colors_enabled: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            preferred_language: "en".to_string(),
            text_to_speech_enabled: false,
            auto_translate_enabled: false,
            theme: Theme::System,
            adaptive_colors_enabled: false,
        }
    }
}

/// Partial update over [`UserPreferences`]; unset fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesPatch {
    pub preferred_language: Option<String>,
    pub text_to_speech_enabled: Option<bool>,
    pub auto_translate_enabled: Option<bool>,
    pub theme: Option<Theme>,
    pub adaptive_colors_enabled: Option<bool>,
}

impl PreferencesPatch {
    pub fn apply(self, preferences: &mut UserPreferences) {
        if let Some(language) = self.preferred_language {
            preferences.preferred_language = language;
        }
        if let Some(tts) = self.text_to_speech_enabled {
            preferences.text_to_speech_enabled = tts;
        }
        if let Some(translate) = self.auto_translate_enabled {
            preferences.auto_translate_enabled = translate;
        }
        if let Some(theme) = self.theme {
            preferences.theme = theme;
        }
        if let Some(adaptive) = self.adaptive_colors_enabled {
            preferences.adaptive_colors_enabled = adaptive;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    PreferNotToSay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "under-18")]
    Under18,
    #[serde(rename = "18-24")]
    From18To24,
    #[serde(rename = "25-34")]
    From25To34,
    #[serde(rename = "35-44")]
    From35To44,
    #[serde(rename = "45-54")]
    From45To54,
    #[serde(rename = "55+")]
    Over55,
    #[serde(rename = "prefer-not-to-say")]
    PreferNotToSay,
}

impl AgeGroup {
    /// Whether this band sits below the school-vs-career cutoff used by
    /// suggestion personalization.
    pub fn is_under_25(&self) -> bool {
        matches!(self, AgeGroup::Under18 | AgeGroup::From18To24)
    }
}

/// Optional personalization handed to prompt construction and suggestions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub age_group: Option<AgeGroup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_is_seeded_with_greeting() {
        let conversation = Conversation::new("Hi there. How are you feeling today?");
        assert_eq!(conversation.title, DEFAULT_TITLE);
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].sender, Sender::Bot);
        assert!(conversation.main_sentiment.is_none());
    }

    #[test]
    fn test_push_bumps_updated_at() {
        let mut conversation = Conversation::new("hello");
        let before = conversation.updated_at;
        conversation.push(Message::user("first"));
        assert!(conversation.updated_at >= before);
        assert_eq!(conversation.messages.len(), 2);
    }

    #[test]
    fn test_main_sentiment_is_most_frequent_user_sentiment() {
        let mut conversation = Conversation::new("hello");

        let mut sad = Message::user("feeling down");
        sad.sentiment = Some(Sentiment::Negative);
        conversation.push(sad);

        let mut sad_again = Message::user("still down");
        sad_again.sentiment = Some(Sentiment::Negative);
        conversation.push(sad_again);

        let mut anxious = Message::user("and a bit on edge");
        anxious.sentiment = Some(Sentiment::Anxious);
        conversation.push(anxious);

        // Bot sentiment must not count.
        let mut bot = Message::bot("I hear you");
        bot.sentiment = Some(Sentiment::Calm);
        conversation.push(bot);

        assert_eq!(conversation.main_sentiment, Some(Sentiment::Negative));
    }

    #[test]
    fn test_main_sentiment_tie_keeps_first_to_reach_top() {
        let mut conversation = Conversation::new("hello");

        let mut first = Message::user("worried about money");
        first.sentiment = Some(Sentiment::Anxious);
        conversation.push(first);

        let mut second = Message::user("also just sad");
        second.sentiment = Some(Sentiment::Negative);
        conversation.push(second);

        assert_eq!(conversation.main_sentiment, Some(Sentiment::Anxious));
    }

    #[test]
    fn test_preferences_patch_applies_only_set_fields() {
        let mut preferences = UserPreferences::default();
        let patch = PreferencesPatch {
            preferred_language: Some("es".to_string()),
            text_to_speech_enabled: Some(true),
            ..Default::default()
        };
        patch.apply(&mut preferences);

        assert_eq!(preferences.preferred_language, "es");
        assert!(preferences.text_to_speech_enabled);
        assert!(!preferences.auto_translate_enabled);
        assert_eq!(preferences.theme, Theme::System);
    }

    #[test]
    fn test_last_user_message_skips_bot_replies() {
        let mut conversation = Conversation::new("hello");
        conversation.push(Message::user("the real one"));
        conversation.push(Message::bot("a reply"));
        assert_eq!(
            conversation.last_user_message().map(|m| m.content.as_str()),
            Some("the real one")
        );
    }
}
