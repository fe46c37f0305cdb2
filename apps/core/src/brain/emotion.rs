//! Emotion detection and empathetic preambles.
//!
//! Keyword-group matching in fixed priority order: fear beats gratitude
//! beats anger. Independent of the arbiter; its output is composed before,
//! never instead of, the answer.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::Emotion;

static FEAR_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(scared|worried|anxious|afraid|nervous|terrified)")
        .expect("Invalid regex: fear words")
});

static GRATITUDE_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(thank|appreciate|grateful)").expect("Invalid regex: gratitude words")
});

static ANGER_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(angry|frustrated|mad|upset)").expect("Invalid regex: anger words")
});

/// Pure keyword-based emotion classifier.
#[derive(Default)]
pub struct EmotionClassifier;

impl EmotionClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify the emotion of a message. Priority: fear > gratitude > anger.
    pub fn classify(&self, message: &str) -> Emotion {
        if FEAR_WORDS.is_match(message) {
            Emotion::Fear
        } else if GRATITUDE_WORDS.is_match(message) {
            Emotion::Gratitude
        } else if ANGER_WORDS.is_match(message) {
            Emotion::Anger
        } else {
            Emotion::Neutral
        }
    }

    /// One fixed supportive sentence per non-neutral emotion. Neutral means
    /// no preamble at all, not an empty string.
    pub fn preamble(&self, emotion: Emotion) -> Option<&'static str> {
        match emotion {
            Emotion::Fear => Some(
                "It's okay to feel scared. You're not alone, so let's focus on what keeps you safe.",
            ),
            Emotion::Gratitude => {
                Some("I'm glad I could help! Remember to stay safe and informed.")
            }
            Emotion::Anger => {
                Some("I can tell this is frustrating. Let's take it step by step calmly.")
            }
            Emotion::Neutral => None,
        }
    }
}
