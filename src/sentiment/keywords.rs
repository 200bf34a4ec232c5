// src/sentiment/keywords.rs
// Keyword tables behind the local classifier. Matching is whole-word and
// case-insensitive; multi-word phrases match across spaces.

use super::Sentiment;
use once_cell::sync::Lazy;
use regex::Regex;

/// Scored categories in tie-break order: the first category to reach the
/// highest match count wins.
pub const SENTIMENT_KEYWORDS: &[(Sentiment, &[&str])] = &[
    (
        Sentiment::Positive,
        &[
            "happy",
            "good",
            "great",
            "excellent",
            "joy",
            "thankful",
            "excited",
            "pleased",
            "content",
        ],
    ),
    (
        Sentiment::Negative,
        &[
            "sad",
            "bad",
            "terrible",
            "awful",
            "miserable",
            "unhappy",
            "disappointed",
            "upset",
        ],
    ),
    (
        Sentiment::Anxious,
        &[
            "anxious",
            "worried",
            "nervous",
            "fear",
            "scared",
            "panic",
            "stress",
            "afraid",
            "tense",
        ],
    ),
    (
        Sentiment::Depressed,
        &[
            "depressed",
            "hopeless",
            "worthless",
            "empty",
            "numb",
            "alone",
            "lonely",
            "despair",
        ],
    ),
    (
        Sentiment::Hopeful,
        &[
            "hope",
            "optimistic",
            "better",
            "improve",
            "forward",
            "future",
            "possibility",
        ],
    ),
    (
        Sentiment::Overwhelmed,
        &[
            "overwhelmed",
            "too much",
            "can't handle",
            "exhausted",
            "burnout",
            "pressure",
        ],
    ),
    (
        Sentiment::Calm,
        &[
            "calm",
            "peaceful",
            "relaxed",
            "steady",
            "balanced",
            "centered",
            "mindful",
        ],
    ),
    (
        Sentiment::Frustrated,
        &[
            "frustrated",
            "frustrating",
            "annoyed",
            "irritated",
            "stuck",
            "fed up",
        ],
    ),
    (
        Sentiment::Confused,
        &[
            "confused",
            "confusing",
            "unsure",
            "uncertain",
            "lost",
            "don't understand",
        ],
    ),
    (
        Sentiment::Fearful,
        &["terrified", "dread", "frightened", "horrified", "paranoid"],
    ),
    (
        Sentiment::Urgent,
        &[
            "help",
            "emergency",
            "crisis",
            "suicide",
            "kill",
            "die",
            "hurt myself",
            "end it all",
            "can't go on",
        ],
    ),
];

/// Phrases that signal deflection rather than an emotion of their own.
/// Not a scored category; see the suppression rule in the classifier.
pub const SUPPRESSION_MARKERS: &[&str] = &[
    "fine",
    "okay",
    "ok",
    "whatever",
    "nothing",
    "it's nothing",
    "doesn't matter",
    "forget it",
];

/// Categories whose keywords, alongside a suppression marker, indicate the
/// user is brushing off something that is bothering them.
pub const SUPPRESSION_CONTEXT: &[Sentiment] = &[
    Sentiment::Negative,
    Sentiment::Anxious,
    Sentiment::Depressed,
];

fn whole_word(pattern: &str) -> Regex {
    // Patterns are static and known-valid; escape keeps apostrophes literal.
    Regex::new(&format!(r"\b{}\b", regex::escape(pattern)))
        .unwrap_or_else(|e| panic!("invalid keyword pattern '{}': {}", pattern, e))
}

pub(crate) static KEYWORD_PATTERNS: Lazy<Vec<(Sentiment, Vec<Regex>)>> = Lazy::new(|| {
    SENTIMENT_KEYWORDS
        .iter()
        .map(|(sentiment, words)| (*sentiment, words.iter().map(|w| whole_word(w)).collect()))
        .collect()
});

pub(crate) static SUPPRESSION_PATTERNS: Lazy<Vec<Regex>> =
    Lazy::new(|| SUPPRESSION_MARKERS.iter().map(|w| whole_word(w)).collect());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_with_keywords_is_listed_once() {
        let mut seen = Vec::new();
        for (sentiment, words) in SENTIMENT_KEYWORDS {
            assert!(!seen.contains(sentiment));
            assert!(!words.is_empty());
            seen.push(*sentiment);
        }
        // Neutral and suppressed are outcomes, never keyword categories.
        assert!(!seen.contains(&Sentiment::Neutral));
        assert!(!seen.contains(&Sentiment::Suppressed));
    }

    #[test]
    fn test_whole_word_matching_ignores_substrings() {
        let patterns = &KEYWORD_PATTERNS;
        let (_, positive) = &patterns[0];
        // "good" must not match inside "goodbye".
        let good = positive.iter().find(|r| r.as_str().contains("good")).unwrap();
        assert_eq!(good.find_iter("goodbye goods good").count(), 1);
    }

    #[test]
    fn test_phrases_match_across_spaces() {
        let overwhelmed = KEYWORD_PATTERNS
            .iter()
            .find(|(s, _)| *s == Sentiment::Overwhelmed)
            .map(|(_, p)| p)
            .unwrap();
        let phrase = overwhelmed
            .iter()
            .find(|r| r.as_str().contains("too"))
            .unwrap();
        assert!(phrase.is_match("this is all too much for me"));
    }
}
