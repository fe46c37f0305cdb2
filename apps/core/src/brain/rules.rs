//! Intent rule engine.
//!
//! An ordered cascade of pattern rules mapping message text to canned
//! answers or lifecycle topic buckets. Rules are declared once, in a fixed
//! total order, and evaluated first-match-wins; the order is part of the
//! behavioral contract, since several rules can match the same message.
//!
//! Every pattern lives here, in one place. The arbiter's short-circuit
//! checks reuse these predicates instead of carrying their own copies.

use regex::Regex;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::debug;

use super::index::KnowledgeIndex;
use crate::models::Topic;

/// Canned guidance for the `before` phase.
pub const PHASE_BEFORE: &str = "Before a flood:\n\
• Make your emergency plan.\n\
• Prepare an emergency kit (food, water, medicine, documents).\n\
• Sign up for Brisbane's Severe Weather Alert Service.\n\
• Clear drains and plan evacuation routes.\n\
• If your area is prone to flooding, lay sandbags around doors and low entry points to protect your property.\n\
\nSource: Brisbane City Council; Get Ready Queensland.";

/// Canned guidance for the `during` phase.
pub const PHASE_DURING: &str = "During a flood:\n\
• Never drive or walk through floodwater.\n\
• Move to higher ground.\n\
• Follow BoM and Council updates via Emergency Dashboard.\n\
\nSource: BoM; Brisbane City Council.";

/// Canned guidance for the `after` phase.
pub const PHASE_AFTER: &str = "After a flood:\n\
• Only return home when authorities say it's safe.\n\
• Wear gloves and boots when cleaning.\n\
• Call Lifeline (13 11 14) for support.\n\
\nSource: Brisbane City Council; Queensland Government.";

/// Fixed answer for high-risk stay-or-leave decisions. This is policy: the
/// assistant never makes the call, and retrieval never sees these messages.
pub const SAFETY_DECISION: &str = "I can't decide that for you. Whether to stay or leave depends on \
your situation and on official instructions, so please follow the directions of emergency services. \
If you are in immediate danger, call 000.\n\
Official guidance:\n\
• Queensland Government evacuation centres: https://www.qld.gov.au/community/disasters-emergencies/prepare/evacuation-centres\n\
• BoM Queensland warnings: https://www.bom.gov.au/qld/warnings/";

/// Fixed answer for financial and recovery-assistance questions.
pub const FINANCIAL_ANSWER: &str = "For recovery and financial help after a flood, visit Queensland \
Government Disaster Assistance: https://www.qld.gov.au/community/disasters-emergencies";

/// The default three-option menu.
pub const MENU_TEXT: &str = "I can help with:\n\
1. Before a flood\n\
2. During a flood\n\
3. After a flood";

const DURING_LEAD_IN: &str = "Take a breath, you're not alone. Prioritise safety:\n";
const AFTER_LEAD_IN: &str = "I'm sorry you're dealing with damage. Here's what helps next:\n";
const AFTER_SUFFIX: &str = "\n\nFor recovery and assistance, see Queensland Government Disaster \
Assistance: https://www.qld.gov.au/community/disasters-emergencies";

static HIGH_RISK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(should (i|we) (stay|leave|go|evacuate)|is it safe to (stay|leave)|stay or (go|leave)|do (i|we) (need|have) to (leave|evacuate))\b",
    )
    .expect("Invalid regex: high-risk decision pattern")
});

static FINANCIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(insurance|claim|financial (help|assistance)|disaster assistance|recovery (grant|assistance|payment)|compensation)\b",
    )
    .expect("Invalid regex: financial keyword group")
});

static PREPARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(prepare|get ready|how to prepare|what to do before|before flood|flood preparation|plan ahead)")
        .expect("Invalid regex: prepare phrasing")
});

static DURING_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(during|right now|currently)").expect("Invalid regex: during temporal marker")
});

static DURING_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(what\s+should|what\s+to\s+do|what\s+now|how\s+to|help|scared)")
        .expect("Invalid regex: during action marker")
});

static DURING_DIRECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(flood(ing)?\s+happening|in\s+the\s+middle\s+of\s+a\s+flood|during\s+a\s+flood)")
        .expect("Invalid regex: direct flood-happening phrase")
});

static AFTER_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(after|post[-\s]?flood)").expect("Invalid regex: after temporal marker")
});

static AFTER_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(what\s+should|what\s+to\s+do|what\s+now|how\s+to|clean\s*up)")
        .expect("Invalid regex: after action marker")
});

static AFTER_DAMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(house|home).*(damaged|destroyed|unsafe|flooded)")
        .expect("Invalid regex: home damage pattern")
});

static EVACUATION_RESIDUAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(leave|evacuate|escape|go outside|stay home|safe to stay|should i leave)")
        .expect("Invalid regex: residual evacuation vocabulary")
});

/// Outcome of the rule cascade.
///
/// A rule that does not fire returns `None` inside the cascade; the
/// terminal menu rule makes `classify` total.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Fixed reply text selected by a rule.
    Canned(String),
    /// A lifecycle phase whose canned guidance answers the message.
    Bucket(Topic),
    /// Deliberate non-answer: stop matching without producing the menu.
    Silence,
    /// The default three-option menu.
    Menu,
}

/// Lowercase + trim, the normalization every pattern matches against.
pub(crate) fn normalize(message: &str) -> String {
    message.to_lowercase().trim().to_string()
}

/// High-risk stay-or-leave decision phrasing (cascade rule 1).
pub(crate) fn matches_high_risk(text: &str) -> bool {
    HIGH_RISK.is_match(text)
}

/// Bare numeric shortcut (cascade rule 2).
pub(crate) fn shortcut_topic(text: &str) -> Option<Topic> {
    match text {
        "1" => Some(Topic::Before),
        "2" => Some(Topic::During),
        "3" => Some(Topic::After),
        _ => None,
    }
}

/// Financial/recovery-assistance keyword group (cascade rule 3).
pub(crate) fn matches_financial(text: &str) -> bool {
    FINANCIAL.is_match(text)
}

/// Prepare/before phrasing (cascade rule 4).
pub(crate) fn matches_prepare(text: &str) -> bool {
    PREPARE.is_match(text)
}

fn matches_during(text: &str) -> bool {
    (DURING_TIME.is_match(text) && DURING_ACTION.is_match(text)) || DURING_DIRECT.is_match(text)
}

fn matches_after(text: &str) -> bool {
    (AFTER_TIME.is_match(text) && AFTER_ACTION.is_match(text)) || AFTER_DAMAGE.is_match(text)
}

/// The canned multi-line guidance for a lifecycle phase.
pub fn phase_reply(topic: Topic) -> &'static str {
    match topic {
        Topic::Before => PHASE_BEFORE,
        Topic::During => PHASE_DURING,
        Topic::After => PHASE_AFTER,
    }
}

/// One step of the cascade: a named predicate/handler pair.
struct Rule {
    name: &'static str,
    apply: Box<dyn Fn(&str) -> Option<Outcome> + Send + Sync>,
}

/// Ordered rule cascade over normalized message text.
pub struct IntentRuleEngine {
    rules: Vec<Rule>,
}

impl IntentRuleEngine {
    /// Builds the canonical cascade. The catalog scan (rule 7) reads the
    /// shared index, so reloading the catalog updates the cascade too.
    pub fn new(index: Arc<RwLock<KnowledgeIndex>>) -> Self {
        let rules = vec![
            Rule {
                name: "high_risk_decision",
                apply: Box::new(|text| {
                    matches_high_risk(text).then(|| Outcome::Canned(SAFETY_DECISION.to_string()))
                }),
            },
            Rule {
                name: "numeric_shortcut",
                apply: Box::new(|text| shortcut_topic(text).map(Outcome::Bucket)),
            },
            Rule {
                name: "financial_assistance",
                apply: Box::new(|text| {
                    matches_financial(text).then(|| Outcome::Canned(FINANCIAL_ANSWER.to_string()))
                }),
            },
            Rule {
                name: "prepare_before",
                apply: Box::new(|text| matches_prepare(text).then_some(Outcome::Bucket(Topic::Before))),
            },
            Rule {
                name: "during_situation",
                apply: Box::new(|text| {
                    matches_during(text)
                        .then(|| Outcome::Canned(format!("{}{}", DURING_LEAD_IN, PHASE_DURING)))
                }),
            },
            Rule {
                name: "after_damage",
                apply: Box::new(|text| {
                    matches_after(text).then(|| {
                        Outcome::Canned(format!("{}{}{}", AFTER_LEAD_IN, PHASE_AFTER, AFTER_SUFFIX))
                    })
                }),
            },
            Rule {
                name: "catalog_keywords",
                apply: Box::new(move |text| {
                    let index = index.read().unwrap_or_else(PoisonError::into_inner);
                    index
                        .first_keyword_match(text)
                        .map(|entry| Outcome::Canned(entry.answer.clone()))
                }),
            },
            Rule {
                name: "evacuation_residual",
                apply: Box::new(|text| {
                    EVACUATION_RESIDUAL.is_match(text).then_some(Outcome::Silence)
                }),
            },
            Rule {
                name: "menu_default",
                apply: Box::new(|_| Some(Outcome::Menu)),
            },
        ];

        Self { rules }
    }

    /// Runs the cascade; the first matching rule decides the outcome.
    pub fn classify(&self, message: &str) -> Outcome {
        let text = normalize(message);

        for rule in &self.rules {
            if let Some(outcome) = (rule.apply)(&text) {
                debug!(rule = rule.name, "intent rule matched");
                return outcome;
            }
        }
        Outcome::Menu
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRecord;

    fn engine_with(records: Vec<RawRecord>) -> IntentRuleEngine {
        let mut index = KnowledgeIndex::new();
        index.load(records);
        IntentRuleEngine::new(Arc::new(RwLock::new(index)))
    }

    fn engine() -> IntentRuleEngine {
        engine_with(vec![])
    }

    fn keyword_record(keywords: &[&str], answer: &str) -> RawRecord {
        RawRecord {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            answer: Some(answer.to_string()),
            ..RawRecord::default()
        }
    }

    #[test]
    fn test_high_risk_decision_returns_safety_text() {
        let engine = engine();

        for message in [
            "should I leave my house",
            "Should we evacuate now?",
            "is it safe to stay",
            "stay or go?",
        ] {
            let outcome = engine.classify(message);
            assert_eq!(
                outcome,
                Outcome::Canned(SAFETY_DECISION.to_string()),
                "expected safety answer for '{}'",
                message
            );
        }
    }

    #[test]
    fn test_numeric_shortcuts() {
        let engine = engine();

        assert_eq!(engine.classify("1"), Outcome::Bucket(Topic::Before));
        assert_eq!(engine.classify(" 2 "), Outcome::Bucket(Topic::During));
        assert_eq!(engine.classify("3"), Outcome::Bucket(Topic::After));
    }

    #[test]
    fn test_shortcut_requires_bare_numeral() {
        let engine = engine();

        assert_ne!(engine.classify("option 2"), Outcome::Bucket(Topic::During));
        assert_ne!(engine.classify("22"), Outcome::Bucket(Topic::During));
    }

    #[test]
    fn test_financial_keywords() {
        let engine = engine();

        for message in [
            "how do I file an insurance claim",
            "where can I get financial help",
            "disaster assistance please",
        ] {
            assert_eq!(
                engine.classify(message),
                Outcome::Canned(FINANCIAL_ANSWER.to_string()),
                "expected financial answer for '{}'",
                message
            );
        }
    }

    #[test]
    fn test_financial_beats_catalog_keywords() {
        // "insurance claim" also carries a retrievable keyword; rule 3 wins.
        let engine = engine_with(vec![keyword_record(
            &["insurance claim"],
            "catalog answer that must not win",
        )]);

        assert_eq!(
            engine.classify("help with my insurance claim"),
            Outcome::Canned(FINANCIAL_ANSWER.to_string())
        );
    }

    #[test]
    fn test_prepare_phrasing_buckets_before() {
        let engine = engine();

        for message in ["how to prepare", "I want to get ready", "plan ahead for floods"] {
            assert_eq!(
                engine.classify(message),
                Outcome::Bucket(Topic::Before),
                "expected before bucket for '{}'",
                message
            );
        }
    }

    #[test]
    fn test_during_situation_combination() {
        let engine = engine();

        let outcome = engine.classify("what should I do during a flood");
        match outcome {
            Outcome::Canned(text) => {
                assert!(text.starts_with("Take a breath"));
                assert!(text.contains(PHASE_DURING));
            }
            other => panic!("expected canned during answer, got {:?}", other),
        }
    }

    #[test]
    fn test_after_damage_combination() {
        let engine = engine();

        let outcome = engine.classify("my home is damaged");
        match outcome {
            Outcome::Canned(text) => {
                assert!(text.starts_with("I'm sorry"));
                assert!(text.contains(PHASE_AFTER));
                assert!(text.contains("qld.gov.au"));
            }
            other => panic!("expected canned after answer, got {:?}", other),
        }
    }

    #[test]
    fn test_catalog_keyword_scan_returns_answer_verbatim() {
        let engine = engine_with(vec![keyword_record(
            &["sandbag"],
            "Lay sandbags at doorways.",
        )]);

        assert_eq!(
            engine.classify("where do I put a sandbag"),
            Outcome::Canned("Lay sandbags at doorways.".to_string())
        );
    }

    #[test]
    fn test_evacuation_residual_is_silence_not_menu() {
        let engine = engine();

        assert_eq!(engine.classify("go outside"), Outcome::Silence);
        assert_eq!(engine.classify("escape"), Outcome::Silence);
    }

    #[test]
    fn test_unmatched_message_falls_to_menu() {
        let engine = engine();

        assert_eq!(engine.classify("tell me about quantum physics"), Outcome::Menu);
    }

    #[test]
    fn test_cascade_is_total() {
        let engine = engine();

        // No input escapes without an outcome.
        for message in ["", "   ", "????", "¯\\_(ツ)_/¯"] {
            let _ = engine.classify(message);
        }
    }

    #[test]
    fn test_phase_replies_embed_sources() {
        for topic in [Topic::Before, Topic::During, Topic::After] {
            assert!(phase_reply(topic).contains("Source:"));
        }
    }
}
