use crate::chat::{AgeGroup, Message, Sender, UserProfile};
use crate::llm::ChatTurn;
use crate::memory::SimilarityHit;
use crate::persona::Persona;
use crate::sentiment::Sentiment;

/// Everything the system prompt is assembled from for one turn.
pub struct PromptContext<'a> {
    pub sentiment: Sentiment,
    pub similar: &'a [SimilarityHit],
    pub profile: Option<&'a UserProfile>,
    /// ISO 639-1 code; a non-default value adds a reply-language directive.
    pub preferred_language: &'a str,
    pub default_language: &'a str,
}

/// Builds the complete system prompt: persona, personalization, detected
/// sentiment, retrieved context, and language directive.
pub fn build_system_prompt(persona: &Persona, context: &PromptContext<'_>) -> String {
    let mut prompt = String::new();

    // 1. Core persona prompt
    prompt.push_str(persona.prompt());
    prompt.push_str("\n\n");

    // 2. Optional personalization from the user's profile
    if let Some(profile) = context.profile {
        if let Some(name) = &profile.name {
            prompt.push_str(&format!(
                "The user's name is {}. Address them by name occasionally, not in every reply.\n",
                name
            ));
        }
        if let Some(age_group) = profile.age_group {
            if age_group == AgeGroup::Under18 {
                prompt.push_str(
                    "The user is a teenager. Keep language simple, steady, and age-appropriate.\n",
                );
            } else if age_group.is_under_25() {
                prompt.push_str(
                    "The user is a young adult; studies, identity, and early career are likely on their mind.\n",
                );
            }
        }
        if let Some(gender) = profile.gender {
            prompt.push_str(&format!(
                "The user identifies as {}. Be mindful and affirming of this.\n",
                gender_label(gender)
            ));
        }
        prompt.push('\n');
    }

    // 3. Detected sentiment for this turn
    prompt.push_str(&format!(
        "The user's current detected sentiment is: {}.\n",
        context.sentiment
    ));

    // 4. Semantically similar past messages as contextual memory
    if !context.similar.is_empty() {
        prompt.push_str("\nThings the user has shared before that may be relevant:\n");
        for hit in context.similar {
            prompt.push_str(&format!("- Previous relevant context: {}\n", hit.content));
        }
        prompt.push_str(
            "Draw on these naturally when they help; never recite them back like a log.\n",
        );
    }

    // 5. Target-language directive when the user prefers a non-default language
    if context.preferred_language != context.default_language {
        prompt.push_str(&format!(
            "\nRespond in the language with ISO 639-1 code '{}'.\n",
            context.preferred_language
        ));
    }

    prompt
}

fn gender_label(gender: crate::chat::Gender) -> &'static str {
    match gender {
        crate::chat::Gender::Male => "male",
        crate::chat::Gender::Female => "female",
        crate::chat::Gender::NonBinary => "non-binary",
        crate::chat::Gender::PreferNotToSay => "unspecified",
    }
}

/// Assembles the full turn list for a completion call: system prompt, the
/// last `history_cap` conversation messages role-tagged, then the current
/// user message.
pub fn build_chat_turns(
    system_prompt: String,
    history: &[Message],
    current_message: &str,
    history_cap: usize,
) -> Vec<ChatTurn> {
    let mut turns = Vec::with_capacity(history.len().min(history_cap) + 2);
    turns.push(ChatTurn::system(system_prompt));

    let start_idx = history.len().saturating_sub(history_cap);
    for message in &history[start_idx..] {
        let turn = match message.sender {
            Sender::User => ChatTurn::user(&message.content),
            Sender::Bot => ChatTurn::assistant(&message.content),
        };
        turns.push(turn);
    }

    turns.push(ChatTurn::user(current_message));
    turns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Gender;
    use crate::llm::ChatRole;

    fn context<'a>(similar: &'a [SimilarityHit], profile: Option<&'a UserProfile>) -> PromptContext<'a> {
        PromptContext {
            sentiment: Sentiment::Anxious,
            similar,
            profile,
            preferred_language: "en",
            default_language: "en",
        }
    }

    #[test]
    fn test_prompt_contains_persona_and_sentiment() {
        let prompt = build_system_prompt(&Persona::Supportive, &context(&[], None));
        assert!(prompt.contains("emotionally supportive companion"));
        assert!(prompt.contains("current detected sentiment is: anxious"));
    }

    #[test]
    fn test_prompt_includes_retrieved_context() {
        let similar = vec![SimilarityHit {
            message_id: "m1".to_string(),
            conversation_id: "c1".to_string(),
            content: "my sister and I argued again".to_string(),
            similarity: 0.92,
        }];
        let prompt = build_system_prompt(&Persona::Supportive, &context(&similar, None));
        assert!(prompt.contains("Previous relevant context: my sister and I argued again"));
    }

    #[test]
    fn test_prompt_personalization_lines() {
        let profile = UserProfile {
            name: Some("Sam".to_string()),
            gender: Some(Gender::NonBinary),
            age_group: Some(AgeGroup::From18To24),
        };
        let prompt = build_system_prompt(&Persona::Supportive, &context(&[], Some(&profile)));
        assert!(prompt.contains("The user's name is Sam"));
        assert!(prompt.contains("non-binary"));
        assert!(prompt.contains("young adult"));
    }

    #[test]
    fn test_language_directive_only_when_non_default() {
        let mut ctx = context(&[], None);
        let english = build_system_prompt(&Persona::Supportive, &ctx);
        assert!(!english.contains("ISO 639-1 code"));

        ctx.preferred_language = "es";
        let spanish = build_system_prompt(&Persona::Supportive, &ctx);
        assert!(spanish.contains("Respond in the language with ISO 639-1 code 'es'"));
    }

    #[test]
    fn test_chat_turns_cap_history_and_end_with_current() {
        let mut history = Vec::new();
        for i in 0..12 {
            history.push(Message::user(format!("user {}", i)));
            history.push(Message::bot(format!("bot {}", i)));
        }

        let turns = build_chat_turns("system".to_string(), &history, "latest", 8);

        // System + 8 history turns + current message.
        assert_eq!(turns.len(), 10);
        assert_eq!(turns[0].role, ChatRole::System);
        assert_eq!(turns[9].role, ChatRole::User);
        assert_eq!(turns[9].content, "latest");
        // The capped window keeps the most recent history.
        assert_eq!(turns[1].content, "user 8");
    }
}
