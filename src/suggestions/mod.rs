//! Conversation-starter suggestions
//!
//! Short prompt chips offered to the user: openers for fresh conversations,
//! sentiment-matched prompts mid-conversation, and questions mined from
//! assistant follow-ups in semantically similar past exchanges. Ordering
//! carries no meaning; every batch is shuffled before the cap.

use crate::chat::{Conversation, Sender, UserProfile};
use crate::memory::SimilarityIndex;
use crate::sentiment::Sentiment;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Hard cap on a suggestion batch.
pub const MAX_SUGGESTIONS: usize = 5;

/// How many trailing messages are scanned for the latest user message.
const RECENT_WINDOW: usize = 5;

/// Batches with fewer targeted entries than this get generic padding.
const PADDING_THRESHOLD: usize = 3;

static QUESTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^.!?]+\?").unwrap_or_else(|e| panic!("invalid question pattern: {}", e))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Question,
    Tip,
    Exercise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    pub kind: SuggestionKind,
}

impl Suggestion {
    fn question(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: SuggestionKind::Question,
        }
    }

    fn tip(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: SuggestionKind::Tip,
        }
    }

    fn exercise(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: SuggestionKind::Exercise,
        }
    }
}

pub struct SuggestionEngine {
    rng: Mutex<StdRng>,
    question_mining_k: usize,
}

impl SuggestionEngine {
    pub fn new(seed: Option<u64>, question_mining_k: usize) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
            question_mining_k,
        }
    }

    /// Builds one suggestion batch. Never fails; a conversation with no
    /// usable signal still yields generic prompts.
    pub async fn suggest(
        &self,
        conversation: Option<&Conversation>,
        all_conversations: &[Conversation],
        profile: Option<&UserProfile>,
        index: &SimilarityIndex,
    ) -> Vec<Suggestion> {
        let mut suggestions = Vec::new();

        // A fresh conversation only holds the seeded greeting.
        let is_fresh = conversation.map_or(true, |c| c.messages.len() <= 1);
        if is_fresh {
            suggestions.extend(opener_pool(profile));
            return self.finish(suggestions).await;
        }

        let conversation = match conversation {
            Some(c) => c,
            None => return self.finish(suggestions).await,
        };

        let recent_start = conversation.messages.len().saturating_sub(RECENT_WINDOW);
        let last_user_message = conversation.messages[recent_start..]
            .iter()
            .rev()
            .find(|m| m.sender == Sender::User);

        if let Some(message) = last_user_message {
            let sentiment = message.sentiment.unwrap_or(Sentiment::Neutral);
            suggestions.extend(sentiment_pool(sentiment));

            let hits = index.query(&message.content, self.question_mining_k).await;
            if !hits.is_empty() {
                let related = all_conversations
                    .iter()
                    .filter(|c| hits.iter().any(|h| h.conversation_id == c.id));
                for other in related {
                    if let Some(question) = mine_follow_up_question(other, &hits) {
                        suggestions.push(Suggestion::question(question));
                    }
                }
            }
        }

        if suggestions.len() < PADDING_THRESHOLD {
            suggestions.extend(generic_pool());
        }

        self.finish(suggestions).await
    }

    async fn finish(&self, mut suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
        let mut rng = self.rng.lock().await;
        suggestions.shuffle(&mut *rng);
        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }
}

/// Finds the first assistant follow-up after any matched message in this
/// conversation and lifts its embedded question, if one exists.
fn mine_follow_up_question(
    conversation: &Conversation,
    hits: &[crate::memory::SimilarityHit],
) -> Option<String> {
    let matched = conversation
        .messages
        .iter()
        .position(|m| hits.iter().any(|h| h.message_id == m.id))?;
    let follow_up = conversation.messages.get(matched + 1)?;
    if follow_up.sender != Sender::Bot || !follow_up.content.contains('?') {
        return None;
    }
    QUESTION_PATTERN
        .find(&follow_up.content)
        .map(|m| m.as_str().trim().to_string())
}

fn opener_pool(profile: Option<&UserProfile>) -> Vec<Suggestion> {
    let mut pool = vec![
        Suggestion::question("How are you feeling today?"),
        Suggestion::question("What's been on your mind lately?"),
        Suggestion::tip("Try taking a few deep breaths before chatting"),
        Suggestion::exercise("Share something positive that happened today"),
    ];

    if let Some(profile) = profile {
        if let Some(name) = &profile.name {
            pool.push(Suggestion::question(format!(
                "How has your day been, {}?",
                name
            )));
        }
        if let Some(age_group) = profile.age_group {
            if age_group.is_under_25() {
                pool.push(Suggestion::question(
                    "How are things going with school or studies?",
                ));
            } else {
                pool.push(Suggestion::question(
                    "How's your work-life balance these days?",
                ));
            }
        }
    }

    pool
}

fn sentiment_pool(sentiment: Sentiment) -> Vec<Suggestion> {
    match sentiment {
        Sentiment::Anxious | Sentiment::Overwhelmed => vec![
            Suggestion::tip(
                "Try the 5-5-5 breathing technique: breathe in for 5 seconds, hold for 5, out for 5",
            ),
            Suggestion::question("Would listing out your concerns help organize your thoughts?"),
            Suggestion::exercise("Rate your anxiety level from 1-10"),
        ],
        Sentiment::Depressed | Sentiment::Negative => vec![
            Suggestion::question("What's one small positive thing you noticed today?"),
            Suggestion::tip("Consider naming 3 things you're grateful for"),
            Suggestion::question("Would you like to talk about something that brings you joy?"),
        ],
        Sentiment::Positive | Sentiment::Hopeful => vec![
            Suggestion::question("That's wonderful! What contributed to these positive feelings?"),
            Suggestion::tip("Consider journaling about this positive experience"),
            Suggestion::question("How might you extend this positive feeling?"),
        ],
        _ => Vec::new(),
    }
}

fn generic_pool() -> Vec<Suggestion> {
    vec![
        Suggestion::question("Could you tell me more about that?"),
        Suggestion::question("How did that make you feel?"),
        Suggestion::question("Is there something specific you'd like support with today?"),
    ]
}
