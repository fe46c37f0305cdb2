use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A record identifier as it appears in catalog files, which mix numeric and
/// string ids.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(u64),
    Text(String),
}

impl RecordId {
    /// Renders the id in its canonical string form.
    pub fn as_string(&self) -> String {
        match self {
            RecordId::Number(n) => n.to_string(),
            RecordId::Text(s) => s.clone(),
        }
    }
}

/// A raw knowledge catalog record, before normalization.
///
/// Every field is optional; catalogs in the wild use `q`/`a`/`text` as
/// alternate names and sometimes carry only a `keywords` list instead of a
/// question. Missing fields never fail a load.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    /// The question text, or `q` in older catalogs.
    #[serde(default, alias = "q")]
    pub question: Option<String>,
    /// Trigger phrases for the rule engine's catalog scan.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// The answer text, or `a`/`text` in older catalogs.
    #[serde(default, alias = "a", alias = "text")]
    pub answer: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// A normalized knowledge-base entry. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeEntry {
    /// Unique entry id; defaults to the record's catalog position.
    pub id: String,
    /// Question text; falls back to the joined keyword list.
    pub question: String,
    /// Answer text, possibly embedding an inline `Source:` citation.
    pub answer: String,
    /// Provenance label; defaults to `"knowledge_base"`.
    pub source: String,
    /// Trigger phrases carried over from the raw record.
    pub keywords: Vec<String>,
}

/// A knowledge entry paired with its retrieval score. Constructed
/// transiently per query and discarded after selection.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredEntry {
    pub entry: KnowledgeEntry,
    /// Lexical similarity in `[0, 1]`.
    pub score: f32,
}

/// Flood lifecycle phase. The label is the contract exposed to the UI
/// layer for follow-up suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Before,
    During,
    After,
}

impl Topic {
    pub fn label(&self) -> &'static str {
        match self {
            Topic::Before => "before",
            Topic::During => "during",
            Topic::After => "after",
        }
    }
}

/// Emotion detected in a user message. Derived per message, never
/// persisted across messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Fear,
    Anger,
    Gratitude,
    Neutral,
}

impl Emotion {
    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Fear => "fear",
            Emotion::Anger => "anger",
            Emotion::Gratitude => "gratitude",
            Emotion::Neutral => "neutral",
        }
    }
}

/// Provenance tag attached to a final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceLabel {
    /// The answer came from a retrieved catalog entry.
    KnowledgeBase,
    /// The answer came from the rule cascade's general reasoning path.
    AiReasoning,
    /// The answer came from a fixed rule short-circuit.
    RuleBased,
}

impl SourceLabel {
    pub fn label(&self) -> &'static str {
        match self {
            SourceLabel::KnowledgeBase => "knowledge-base",
            SourceLabel::AiReasoning => "ai-reasoning",
            SourceLabel::RuleBased => "rule-based",
        }
    }
}

impl std::fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The arbiter's decision for a single message: exactly one answer path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbiterReply {
    /// The chosen answer text. Empty for a suppressed (silent) outcome.
    pub answer: String,
    /// Provenance tag; `None` for policy answers and the fallback menu.
    pub label: Option<SourceLabel>,
    /// The catalog entry's source, for knowledge-base hits.
    pub source: Option<String>,
    /// The lifecycle bucket a rule resolved, when one applies.
    pub topic: Option<Topic>,
}

/// The complete composed output for one user message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    /// Unique identifier for this turn.
    pub id: Uuid,
    /// Empathetic lead-in sentence, when an emotion was detected.
    pub preamble: Option<String>,
    /// The primary answer.
    pub answer: String,
    /// Provenance tag for the primary answer.
    pub label: Option<SourceLabel>,
    /// The catalog entry's source, for knowledge-base answers.
    pub source: Option<String>,
    /// The lifecycle bucket, when a rule resolved one.
    pub topic: Option<Topic>,
    /// Emotion detected in the user message.
    pub emotion: Emotion,
    /// Reasoning narrative from the narrator, or the fixed placeholder.
    pub reasoning: String,
    /// Timestamp of composition.
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    /// Get a one-line summary for logging.
    pub fn summary(&self) -> String {
        format!(
            "label: {}, topic: {}, emotion: {}, answer: {} chars",
            self.label.map(|l| l.label()).unwrap_or("none"),
            self.topic.map(|t| t.label()).unwrap_or("-"),
            self.emotion.label(),
            self.answer.len()
        )
    }
}

/// Retrieval tuning for the arbiter's knowledge-base query.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RetrievalConfig {
    /// Maximum number of entries to return. At least 1.
    #[validate(range(min = 1))]
    pub top_k: usize,
    /// Minimum score for an entry to count as a confident hit.
    #[validate(range(min = 0.0, max = 1.0))]
    pub threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 1,
            threshold: 0.35,
        }
    }
}

/// Configuration for the network-backed narrator. The endpoint is parsed
/// as a URL at construction time.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NarratorConfig {
    /// Generation endpoint to POST reasoning prompts to.
    pub endpoint: String,
    /// Optional API key appended as a query parameter.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/api/generate".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}
