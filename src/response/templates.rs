// src/response/templates.rs
// Every canned line the local strategy can produce, one place only.

use crate::sentiment::Sentiment;

/// Fixed crisis reply. Returned verbatim for every urgent classification;
/// never templated, never randomized.
pub const CRISIS_RESPONSE: &str = "I notice you may be in distress. Please remember that you're not alone. If you're in crisis, please reach out to a crisis helpline like the 988 Suicide & Crisis Lifeline (call or text 988) or text HOME to 741741 to reach the Crisis Text Line. Would it help to talk about what you're experiencing right now?";

/// Out-of-band notice surfaced alongside (not instead of) the crisis reply.
pub const CRISIS_RESOURCES_NOTICE: &str = "If you're in crisis, please contact 988 Suicide & Crisis Lifeline (call or text 988) or text HOME to 741741 for the Crisis Text Line.";

/// Deterministic probe for suppressed sentiment.
pub const SUPPRESSED_PROBE: &str = "I notice you said you're fine, but sometimes that word can cover many different feelings. It's okay if you're not actually feeling fine right now. Would you like to share more about what's really going on?";

/// Terminal fallback if every generation path has failed.
pub const FALLBACK_REPLY: &str = "I'm sorry, I encountered an error while processing your request. Please try again later.";

/// Recurring-topic overrides: when the topic keyword appears in both the
/// conversation history and the current message, the paired follow-up
/// replaces random template selection.
pub const RECURRING_TOPICS: &[(&str, &str)] = &[
    (
        "family",
        "I notice family relationships seem to be an important theme in our conversation. Would you like to explore how these relationships are affecting you?",
    ),
    (
        "work",
        "Work seems to be coming up frequently in our discussion. How is your work situation impacting your overall wellbeing?",
    ),
];

/// Greeting pool for newly created conversations.
pub const GREETINGS: &[&str] = &[
    "Hi there! I'm here to chat and provide a supportive space. How are you feeling today?",
    "Hello! I'm your empathetic chat companion. I'm here to listen and support you. How can I help today?",
    "Welcome! I'm here to provide a judgment-free space to talk. How are you doing right now?",
];

const POSITIVE: &[&str] = &[
    "I'm glad to hear you're feeling good! What's contributing to those positive feelings?",
    "It's wonderful that you're in good spirits. Would you like to share more about what's going well?",
    "I'm happy you're feeling positive. How can we maintain this energy going forward?",
];

const NEGATIVE: &[&str] = &[
    "I'm sorry to hear you're not feeling well. Would you like to talk more about what's troubling you?",
    "That sounds difficult. Remember that it's okay to feel this way, and these feelings won't last forever.",
    "I'm here to listen. Sometimes expressing our feelings can help us process them better.",
];

const NEUTRAL: &[&str] = &[
    "How has your day been going so far?",
    "I'm here to chat whenever you need support or just want to talk.",
    "Is there anything specific on your mind that you'd like to discuss?",
];

const ANXIOUS: &[&str] = &[
    "It sounds like you might be feeling anxious. Taking slow, deep breaths can sometimes help in the moment.",
    "Anxiety can be challenging. Would it help to talk about what's causing these feelings?",
    "When I feel anxious, grounding exercises can help. Would you like to try one together?",
];

const DEPRESSED: &[&str] = &[
    "I'm sorry you're feeling this way. Depression can make things seem hopeless, but please know you're not alone.",
    "These feelings are valid, and reaching out is a positive step. Have you been able to talk to anyone else about how you're feeling?",
    "Small steps can help. Perhaps we could think about one tiny positive action you might take today?",
];

const HOPEFUL: &[&str] = &[
    "It's great to hear a sense of hope in your words. What positive possibilities are you seeing?",
    "Hope is powerful. What's giving you this optimistic outlook?",
    "I'm glad you're feeling hopeful. How can we build on this positive momentum?",
];

const OVERWHELMED: &[&str] = &[
    "It sounds like you have a lot on your plate right now. Would it help to break things down into smaller steps?",
    "Feeling overwhelmed is natural when facing many challenges. Which one feels most pressing right now?",
    "Let's take a step back and breathe. We can approach one thing at a time.",
];

const CALM: &[&str] = &[
    "It's wonderful that you're feeling calm. What practices help you maintain this sense of peace?",
    "Calmness is a valuable state. How did you arrive at this peaceful mindset?",
    "This sense of calm can be a great foundation. Is there anything you'd like to explore from this grounded place?",
];

const FRUSTRATED: &[&str] = &[
    "I can sense your frustration. It's completely valid to feel this way when things aren't going as expected.",
    "It seems like you're dealing with some frustration. Would it help to talk about what's causing this?",
    "Frustration can be challenging to navigate. Is there a specific situation that's contributing to this feeling?",
];

const SUPPRESSED: &[&str] = &[
    "I notice you're saying you're okay, but I'm wondering if there might be more you'd like to share?",
    "Sometimes when we say we're 'fine,' there are other feelings beneath the surface. It's safe to express those here if you'd like.",
    "I'm hearing that you're okay, but I'm also sensing there might be more to it. Would you like to talk more about what's going on?",
];

const CONFUSED: &[&str] = &[
    "It sounds like you might be feeling uncertain about some things. Would it help to explore that confusion together?",
    "Being confused can feel uncomfortable. Is there a specific situation that's causing this uncertainty?",
    "I notice you might be feeling a bit lost. Sometimes talking through our thoughts can help bring clarity.",
];

const FEARFUL: &[&str] = &[
    "I can hear that you're feeling afraid, which is completely understandable. Would you like to talk about what's causing this fear?",
    "Fear is a powerful emotion and often has important things to tell us. What do you think your fear might be trying to protect you from?",
    "Being scared is a natural response to perceived threats. Is there something specific that's triggered this feeling for you?",
];

/// Candidate replies for a category. Urgent maps to the single crisis reply
/// so even a direct table lookup can never soften a crisis turn.
pub fn templates_for(sentiment: Sentiment) -> &'static [&'static str] {
    match sentiment {
        Sentiment::Positive => POSITIVE,
        Sentiment::Negative => NEGATIVE,
        Sentiment::Neutral => NEUTRAL,
        Sentiment::Anxious => ANXIOUS,
        Sentiment::Depressed => DEPRESSED,
        Sentiment::Hopeful => HOPEFUL,
        Sentiment::Overwhelmed => OVERWHELMED,
        Sentiment::Calm => CALM,
        Sentiment::Urgent => &[CRISIS_RESPONSE],
        Sentiment::Frustrated => FRUSTRATED,
        Sentiment::Suppressed => SUPPRESSED,
        Sentiment::Confused => CONFUSED,
        Sentiment::Fearful => FEARFUL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_candidates() {
        for sentiment in Sentiment::ALL {
            assert!(!templates_for(sentiment).is_empty());
        }
    }

    #[test]
    fn test_urgent_maps_only_to_the_crisis_reply() {
        assert_eq!(templates_for(Sentiment::Urgent), &[CRISIS_RESPONSE]);
    }

    #[test]
    fn test_crisis_reply_names_both_hotlines() {
        assert!(CRISIS_RESPONSE.contains("988"));
        assert!(CRISIS_RESPONSE.contains("741741"));
        assert!(CRISIS_RESOURCES_NOTICE.contains("988"));
    }
}
