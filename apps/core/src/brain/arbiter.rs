//! Response arbitration.
//!
//! Applies the priority policy across safety-critical intents, shortcut
//! intents, financial intents, retrieval, and the rule-cascade fallback to
//! pick exactly one answer path per message. Pure: text in, structured
//! reply out; display concerns live with the caller.

use regex::Regex;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::debug;

use super::index::KnowledgeIndex;
use super::rules::{self, IntentRuleEngine, Outcome};
use crate::models::{ArbiterReply, RetrievalConfig, SourceLabel, Topic};

static INLINE_SOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Source:\s*").expect("Invalid regex: inline source marker"));

/// Arbitrates between rule-based answers and retrieval per message.
pub struct ResponseArbiter {
    rules: IntentRuleEngine,
    index: Arc<RwLock<KnowledgeIndex>>,
    config: RetrievalConfig,
}

impl ResponseArbiter {
    pub fn new(index: Arc<RwLock<KnowledgeIndex>>, config: RetrievalConfig) -> Self {
        Self {
            rules: IntentRuleEngine::new(Arc::clone(&index)),
            index,
            config,
        }
    }

    /// Picks exactly one answer path for `message`.
    ///
    /// Safety, shortcut, and financial intents short-circuit before
    /// retrieval is attempted: those must never be answered by fuzzy
    /// matching. Everything else tries the knowledge base first and falls
    /// back to the full rule cascade.
    pub fn respond(&self, message: &str) -> ArbiterReply {
        let text = rules::normalize(message);

        // Policy answer, not a sourced one: no label.
        if rules::matches_high_risk(&text) {
            debug!("arbiter: high-risk decision short-circuit");
            return ArbiterReply {
                answer: rules::SAFETY_DECISION.to_string(),
                label: None,
                source: None,
                topic: None,
            };
        }

        if let Some(topic) = rules::shortcut_topic(&text) {
            debug!(topic = topic.label(), "arbiter: numeric shortcut");
            return self.phase_answer(topic);
        }

        if rules::matches_financial(&text) {
            debug!("arbiter: financial short-circuit");
            return ArbiterReply {
                answer: rules::FINANCIAL_ANSWER.to_string(),
                label: Some(SourceLabel::RuleBased),
                source: None,
                topic: None,
            };
        }

        // Prepared-ness intent outranks any fuzzy match.
        if rules::matches_prepare(&text) {
            debug!("arbiter: prepare phrasing overrides retrieval");
            return self.phase_answer(Topic::Before);
        }

        let hits = {
            let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
            index.top_k(message, &self.config)
        };
        if let Some(top) = hits.into_iter().next() {
            debug!(id = %top.entry.id, score = top.score, "arbiter: knowledge-base hit");
            return ArbiterReply {
                answer: top.entry.answer,
                label: Some(SourceLabel::KnowledgeBase),
                source: Some(top.entry.source),
                topic: None,
            };
        }

        // A low-confidence miss and an empty catalog land here alike.
        match self.rules.classify(message) {
            Outcome::Menu => ArbiterReply {
                answer: rules::MENU_TEXT.to_string(),
                label: None,
                source: None,
                topic: None,
            },
            Outcome::Silence => ArbiterReply {
                answer: String::new(),
                label: None,
                source: None,
                topic: None,
            },
            Outcome::Bucket(topic) => self.phase_answer(topic),
            Outcome::Canned(answer) => {
                let label = if INLINE_SOURCE.is_match(&answer) {
                    None
                } else {
                    Some(SourceLabel::AiReasoning)
                };
                ArbiterReply {
                    answer,
                    label,
                    source: None,
                    topic: None,
                }
            }
        }
    }

    fn phase_answer(&self, topic: Topic) -> ArbiterReply {
        ArbiterReply {
            answer: rules::phase_reply(topic).to_string(),
            label: Some(SourceLabel::RuleBased),
            source: None,
            topic: Some(topic),
        }
    }
}
