//! Mood aggregation
//!
//! Reduces user-message sentiments into per-day records for the mood
//! timeline. Records are derived on demand; persisted conversations stay
//! the single source of truth.

use crate::chat::{Conversation, Sender};
use crate::sentiment::Sentiment;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Trailing number of daily records the trend looks at.
pub const TREND_WINDOW_DAYS: usize = 7;

/// Minimum gap between half-window means before a trend is called.
pub const TREND_MARGIN: f32 = 0.1;

/// One calendar day of mood data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodRecord {
    pub date: NaiveDate,
    /// Mean sentiment score for the day, -1.0 to 1.0.
    pub average_score: f32,
    pub sentiment_counts: BTreeMap<Sentiment, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodTrend {
    Improving,
    Declining,
    Stable,
}

/// Groups every sentiment-carrying user message by its local calendar date
/// and averages the scores. Returned records are ordered by date ascending.
pub fn aggregate(conversations: &[Conversation]) -> Vec<MoodRecord> {
    let mut days: BTreeMap<NaiveDate, (f32, u32, BTreeMap<Sentiment, u32>)> = BTreeMap::new();

    for conversation in conversations {
        for message in &conversation.messages {
            if message.sender != Sender::User {
                continue;
            }
            let Some(sentiment) = message.sentiment else {
                continue;
            };
            let date = message.timestamp.with_timezone(&Local).date_naive();
            let (score_sum, count, counts) =
                days.entry(date).or_insert_with(|| (0.0, 0, BTreeMap::new()));
            *score_sum += sentiment.score();
            *count += 1;
            *counts.entry(sentiment).or_insert(0) += 1;
        }
    }

    days.into_iter()
        .map(|(date, (score_sum, count, sentiment_counts))| MoodRecord {
            date,
            average_score: score_sum / count as f32,
            sentiment_counts,
        })
        .collect()
}

/// Direction of the most recent window of daily records: the window's two
/// halves are compared and a call is only made past [`TREND_MARGIN`].
pub fn trend(records: &[MoodRecord]) -> MoodTrend {
    let start = records.len().saturating_sub(TREND_WINDOW_DAYS);
    let window = &records[start..];
    if window.len() < 2 {
        return MoodTrend::Stable;
    }

    let mid = window.len() / 2;
    let first = mean(&window[..mid]);
    let second = mean(&window[mid..]);

    if second - first > TREND_MARGIN {
        MoodTrend::Improving
    } else if first - second > TREND_MARGIN {
        MoodTrend::Declining
    } else {
        MoodTrend::Stable
    }
}

/// Mean of the last week of records mapped onto a 0-100 scale, where 0 is
/// sustained crisis, 50 neutral, 100 sustained positive. No records reads
/// as a flat 50.
pub fn weekly_average(records: &[MoodRecord]) -> f32 {
    let start = records.len().saturating_sub(TREND_WINDOW_DAYS);
    let window = &records[start..];
    if window.is_empty() {
        return 50.0;
    }
    ((mean(window) + 1.0) * 50.0).clamp(0.0, 100.0)
}

fn mean(records: &[MoodRecord]) -> f32 {
    records.iter().map(|r| r.average_score).sum::<f32>() / records.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Message;
    use chrono::{DateTime, TimeZone, Utc};

    fn record(day: u32, score: f32) -> MoodRecord {
        MoodRecord {
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            average_score: score,
            sentiment_counts: BTreeMap::new(),
        }
    }

    fn user_message(content: &str, sentiment: Option<Sentiment>, stamp: DateTime<Utc>) -> Message {
        let mut message = Message::user(content);
        message.sentiment = sentiment;
        message.timestamp = stamp;
        message
    }

    #[test]
    fn test_aggregate_of_nothing_is_empty() {
        assert!(aggregate(&[]).is_empty());

        // A thread holding only its greeting has no user sentiment to report.
        let conversation = Conversation::new("hello");
        assert!(aggregate(&[conversation]).is_empty());
    }

    #[test]
    fn test_same_day_messages_collapse_to_one_record() {
        let stamp = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let mut conversation = Conversation::new("hello");
        conversation.push(user_message(
            "rough morning",
            Some(Sentiment::Negative),
            stamp,
        ));

        // Bot sentiment and unclassified user messages stay out of the counts.
        let mut reply = Message::bot("I hear you");
        reply.sentiment = Some(Sentiment::Calm);
        reply.timestamp = stamp;
        conversation.push(reply);

        conversation.push(user_message(
            "and now I'm on edge",
            Some(Sentiment::Anxious),
            stamp,
        ));
        conversation.push(user_message("anyway", None, stamp));
        conversation.push(user_message("still rough", Some(Sentiment::Negative), stamp));

        let records = aggregate(&[conversation]);
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.date, stamp.with_timezone(&Local).date_naive());
        assert_eq!(record.sentiment_counts.values().sum::<u32>(), 3);
        assert_eq!(record.sentiment_counts[&Sentiment::Negative], 2);
        assert_eq!(record.sentiment_counts[&Sentiment::Anxious], 1);
        assert!((record.average_score - (-1.9 / 3.0)).abs() < 1e-6);
    }

    #[test]
    fn test_aggregate_merges_conversations_and_orders_days() {
        let earlier = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();

        let mut first = Conversation::new("hello");
        first.push(user_message(
            "yesterday was heavy",
            Some(Sentiment::Depressed),
            earlier,
        ));
        first.push(user_message(
            "today feels lighter",
            Some(Sentiment::Hopeful),
            later,
        ));

        let mut second = Conversation::new("hello again");
        second.push(user_message(
            "same day, other thread",
            Some(Sentiment::Hopeful),
            later,
        ));

        let records = aggregate(&[first, second]);
        assert_eq!(records.len(), 2);
        assert!(records[0].date < records[1].date);
        assert_eq!(records[0].sentiment_counts[&Sentiment::Depressed], 1);
        assert_eq!(records[1].sentiment_counts[&Sentiment::Hopeful], 2);
    }

    #[test]
    fn test_trend_improving_when_second_half_clears_margin() {
        let records = vec![
            record(1, -0.5),
            record(2, -0.4),
            record(3, -0.3),
            record(4, 0.2),
            record(5, 0.3),
            record(6, 0.4),
            record(7, 0.5),
        ];
        assert_eq!(trend(&records), MoodTrend::Improving);
    }

    #[test]
    fn test_trend_declining_when_second_half_drops() {
        let records = vec![record(1, 0.8), record(2, 0.7), record(3, -0.4), record(4, -0.5)];
        assert_eq!(trend(&records), MoodTrend::Declining);
    }

    #[test]
    fn test_trend_stable_inside_margin() {
        let records = vec![record(1, 0.1), record(2, 0.15), record(3, 0.1), record(4, 0.12)];
        assert_eq!(trend(&records), MoodTrend::Stable);
    }

    #[test]
    fn test_trend_margin_is_exclusive() {
        // A gap of exactly the margin is still stable.
        let records = vec![record(1, 0.0), record(2, 0.1)];
        assert_eq!(trend(&records), MoodTrend::Stable);
    }

    #[test]
    fn test_trend_needs_at_least_two_records() {
        assert_eq!(trend(&[]), MoodTrend::Stable);
        assert_eq!(trend(&[record(1, -0.9)]), MoodTrend::Stable);
    }

    #[test]
    fn test_trend_ignores_records_before_the_window() {
        // Seven flat recent days; the ancient lows must not drag the call.
        let mut records = vec![record(1, -1.0), record(2, -1.0)];
        for day in 3..10 {
            records.push(record(day, 0.2));
        }
        assert_eq!(trend(&records), MoodTrend::Stable);
    }

    #[test]
    fn test_weekly_average_scale() {
        assert_eq!(weekly_average(&[]), 50.0);
        assert_eq!(weekly_average(&[record(1, 1.0)]), 100.0);
        assert_eq!(weekly_average(&[record(1, -1.0)]), 0.0);
        assert_eq!(weekly_average(&[record(1, 0.0)]), 50.0);
    }
}
