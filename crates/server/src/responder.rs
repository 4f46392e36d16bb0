//! Companion reply generation.

use rand::seq::SliceRandom;

use soulbridge_api::companions::Companion;
use soulbridge_api::oracle::seeded_rng;

/// Produces a companion's reply to a user message.
pub trait Responder: Send + Sync {
    fn reply(&self, companion: &Companion, nickname: &str, message: &str) -> String;
}

/// Offline responder: an in-character reply assembled from phrase tables,
/// seeded by the companion and the message so the same input gets the same
/// answer.
pub struct PersonaResponder;

const GREETINGS: &[&str] = &["Hey", "Hi", "I'm here", "Welcome back", "Good to hear from you"];

const ACKNOWLEDGEMENTS: &[&str] = &[
    "I hear you.",
    "Thank you for telling me that.",
    "That matters.",
    "Let's sit with that for a moment.",
    "I'm glad you shared it.",
];

const QUESTION_LEADS: &[&str] = &[
    "Good question.",
    "Let me think about that with you.",
    "There's no single answer, but here's a thought.",
];

const PROMPTS: &[&str] = &[
    "What feels most important about it right now?",
    "How is your body feeling as you think about it?",
    "What would you tell a friend in the same spot?",
    "What's one small step that would help today?",
    "Want to tell me more?",
];

impl Responder for PersonaResponder {
    fn reply(&self, companion: &Companion, nickname: &str, message: &str) -> String {
        let mut rng = seeded_rng(&["chat", companion.id, message]);
        let mut pick = |table: &[&'static str]| table.choose(&mut rng).copied().unwrap_or_default();

        let greeting = pick(GREETINGS);
        let middle = if message.trim_end().ends_with('?') {
            pick(QUESTION_LEADS)
        } else {
            pick(ACKNOWLEDGEMENTS)
        };
        let prompt = pick(PROMPTS);

        format!(
            "{greeting}, {nickname}. {middle} As {}, {}, I'd say this: {prompt}",
            companion.name, companion.persona
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulbridge_api::companions;

    #[test]
    fn test_reply_is_stable_and_in_character() {
        let sky = companions::find("sky").unwrap();
        let a = PersonaResponder.reply(sky, "Ana", "I had a rough day");
        let b = PersonaResponder.reply(sky, "Ana", "I had a rough day");
        assert_eq!(a, b);
        assert!(a.contains("Sky"));
        assert!(a.contains("Ana"));
    }
}
