// src/sentiment/classifier.rs

use super::keywords::{KEYWORD_PATTERNS, SUPPRESSION_CONTEXT, SUPPRESSION_PATTERNS};
use super::{Sentiment, SentimentResult};
use crate::llm::LanguageModel;
use std::sync::Arc;
use tracing::{debug, warn};

/// Confidence attached to a validated remote classification.
const REMOTE_CONFIDENCE: f32 = 0.85;

/// Inputs shorter than this with no keyword hit read as curt deflection.
const SHORT_TEXT_CHARS: usize = 10;

/// Classifies message text into one of the thirteen sentiment categories.
///
/// With a provider attached the remote model is asked first and the keyword
/// heuristic serves as the fallback; without one the heuristic is the whole
/// classifier. `classify` never fails, callers always get a usable result.
pub struct SentimentClassifier {
    provider: Option<Arc<dyn LanguageModel>>,
}

impl SentimentClassifier {
    pub fn new(provider: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { provider }
    }

    pub fn local_only() -> Self {
        Self { provider: None }
    }

    pub async fn classify(&self, text: &str) -> SentimentResult {
        if let Some(provider) = &self.provider {
            match provider.classify_sentiment(text).await {
                Ok(sentiment) => {
                    debug!("remote classification: {}", sentiment);
                    return SentimentResult::new(sentiment, REMOTE_CONFIDENCE);
                }
                Err(e) => {
                    warn!("remote classification failed, using keyword heuristic: {}", e);
                }
            }
        }
        Self::classify_local(text)
    }

    /// Pure keyword heuristic. Rule order: crisis override, suppression
    /// co-occurrence, highest match count, short-text fallback, neutral.
    pub fn classify_local(text: &str) -> SentimentResult {
        let lowered = text.to_lowercase();
        let trimmed_chars = text.trim().chars().count();

        let counts: Vec<(Sentiment, usize)> = KEYWORD_PATTERNS
            .iter()
            .map(|(sentiment, patterns)| {
                let matches = patterns
                    .iter()
                    .map(|p| p.find_iter(&lowered).count())
                    .sum::<usize>();
                (*sentiment, matches)
            })
            .collect();

        // Crisis language bypasses all other scoring.
        let urgent_matches = counts
            .iter()
            .find(|(s, _)| *s == Sentiment::Urgent)
            .map(|(_, n)| *n)
            .unwrap_or(0);
        if urgent_matches > 0 {
            let confidence = (0.3 * urgent_matches as f32).min(0.9);
            return SentimentResult::new(Sentiment::Urgent, confidence);
        }

        // "I'm fine" next to words that say otherwise reads as deflection.
        if SUPPRESSION_PATTERNS.iter().any(|p| p.is_match(&lowered)) {
            let masked = counts
                .iter()
                .any(|(s, n)| *n > 0 && SUPPRESSION_CONTEXT.contains(s));
            if masked {
                return SentimentResult::new(Sentiment::Suppressed, 0.7);
            }
        }

        // Highest count wins; ties keep the earlier category in table order.
        let (winner, top) = counts
            .iter()
            .fold((Sentiment::Neutral, 0usize), |(best, max), (s, n)| {
                if *n > max { (*s, *n) } else { (best, max) }
            });

        if top == 0 {
            if trimmed_chars < SHORT_TEXT_CHARS {
                return SentimentResult::new(Sentiment::Suppressed, 0.6);
            }
            return SentimentResult::new(Sentiment::Neutral, 0.7);
        }

        SentimentResult::new(winner, (0.5 + 0.1 * top as f32).min(0.9))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(text: &str) -> SentimentResult {
        SentimentClassifier::classify_local(text)
    }

    #[test]
    fn test_crisis_keywords_override_everything() {
        let result = local("I am happy and calm but I want to end it all");
        assert_eq!(result.sentiment, Sentiment::Urgent);
    }

    #[test]
    fn test_urgent_confidence_scales_with_matches() {
        let one = local("I think I need some help here");
        assert_eq!(one.sentiment, Sentiment::Urgent);
        assert!((one.confidence - 0.3).abs() < 1e-6);

        let many = local("crisis emergency help suicide");
        assert_eq!(many.sentiment, Sentiment::Urgent);
        assert!((many.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_suppression_marker_with_negative_context() {
        let result = local("I'm fine, today was just awful and sad");
        assert_eq!(result.sentiment, Sentiment::Suppressed);
        assert!((result.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_suppression_marker_alone_scores_normally() {
        // "okay" with no negative context falls through to neutral.
        let result = local("okay, let's talk about something else");
        assert_eq!(result.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_highest_count_wins_with_confidence_ramp() {
        let result = local("happy happy joy");
        assert_eq!(result.sentiment, Sentiment::Positive);
        assert!((result.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_ties_keep_first_category_in_table_order() {
        // One positive and one negative keyword: positive is listed first.
        let result = local("a good day and a bad day");
        assert_eq!(result.sentiment, Sentiment::Positive);
    }

    #[test]
    fn test_no_matches_defaults_to_neutral() {
        let result = local("the meeting moved to thursday afternoon");
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert!((result.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_short_curt_reply_reads_as_suppressed() {
        let result = local("meh.");
        assert_eq!(result.sentiment, Sentiment::Suppressed);
        assert!((result.confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_substrings_do_not_match() {
        // "die" inside "diet" or "kill" inside "skills" must not trigger.
        let result = local("my diet and my skills are both improving lately");
        assert_ne!(result.sentiment, Sentiment::Urgent);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let a = local("I feel worried and nervous about tomorrow");
        let b = local("I feel worried and nervous about tomorrow");
        assert_eq!(a, b);
        assert_eq!(a.sentiment, Sentiment::Anxious);
    }
}
