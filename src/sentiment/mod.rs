// src/sentiment/mod.rs
// Sentiment categories and the keyword/remote classifier.

pub mod classifier;
pub mod keywords;

pub use classifier::SentimentClassifier;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of emotional categories a message can land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Anxious,
    Depressed,
    Hopeful,
    Overwhelmed,
    Calm,
    Urgent,
    Frustrated,
    Suppressed,
    Confused,
    Fearful,
}

impl Sentiment {
    pub const ALL: [Sentiment; 13] = [
        Sentiment::Positive,
        Sentiment::Negative,
        Sentiment::Neutral,
        Sentiment::Anxious,
        Sentiment::Depressed,
        Sentiment::Hopeful,
        Sentiment::Overwhelmed,
        Sentiment::Calm,
        Sentiment::Urgent,
        Sentiment::Frustrated,
        Sentiment::Suppressed,
        Sentiment::Confused,
        Sentiment::Fearful,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Anxious => "anxious",
            Sentiment::Depressed => "depressed",
            Sentiment::Hopeful => "hopeful",
            Sentiment::Overwhelmed => "overwhelmed",
            Sentiment::Calm => "calm",
            Sentiment::Urgent => "urgent",
            Sentiment::Frustrated => "frustrated",
            Sentiment::Suppressed => "suppressed",
            Sentiment::Confused => "confused",
            Sentiment::Fearful => "fearful",
        }
    }

    /// Position on the mood scale, -1.0 (crisis) to 1.0 (positive).
    /// Neutral sits at 0; categories that mask feelings land mildly negative.
    pub fn score(&self) -> f32 {
        match self {
            Sentiment::Positive => 1.0,
            Sentiment::Hopeful => 0.7,
            Sentiment::Calm => 0.5,
            Sentiment::Neutral => 0.0,
            Sentiment::Confused => -0.2,
            Sentiment::Anxious => -0.3,
            Sentiment::Suppressed => -0.4,
            Sentiment::Overwhelmed => -0.5,
            Sentiment::Frustrated => -0.6,
            Sentiment::Fearful => -0.7,
            Sentiment::Negative => -0.8,
            Sentiment::Depressed => -0.9,
            Sentiment::Urgent => -1.0,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            "anxious" => Ok(Sentiment::Anxious),
            "depressed" => Ok(Sentiment::Depressed),
            "hopeful" => Ok(Sentiment::Hopeful),
            "overwhelmed" => Ok(Sentiment::Overwhelmed),
            "calm" => Ok(Sentiment::Calm),
            "urgent" => Ok(Sentiment::Urgent),
            "frustrated" => Ok(Sentiment::Frustrated),
            "suppressed" => Ok(Sentiment::Suppressed),
            "confused" => Ok(Sentiment::Confused),
            "fearful" => Ok(Sentiment::Fearful),
            other => Err(anyhow!("unknown sentiment label: '{}'", other)),
        }
    }
}

/// Classification outcome: the winning category plus a 0.0-1.0 confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub sentiment: Sentiment,
    pub confidence: f32,
}

impl SentimentResult {
    pub fn new(sentiment: Sentiment, confidence: f32) -> Self {
        Self {
            sentiment,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for sentiment in Sentiment::ALL {
            let parsed: Sentiment = sentiment.as_str().parse().unwrap();
            assert_eq!(parsed, sentiment);
        }
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        assert!("ecstatic".parse::<Sentiment>().is_err());
        assert!("".parse::<Sentiment>().is_err());
    }

    #[test]
    fn test_score_covers_full_scale() {
        assert_eq!(Sentiment::Positive.score(), 1.0);
        assert_eq!(Sentiment::Neutral.score(), 0.0);
        assert_eq!(Sentiment::Urgent.score(), -1.0);
        // Masked feelings read mildly negative, crisis is the floor.
        assert!(Sentiment::Suppressed.score() < 0.0);
        for sentiment in Sentiment::ALL {
            assert!(sentiment.score() >= Sentiment::Urgent.score());
            assert!(sentiment.score() <= Sentiment::Positive.score());
        }
    }
}
