//! Retrieval index over the knowledge catalog.
//!
//! Holds the normalized entries for the process lifetime and answers top-K
//! queries with the lexical scorer. Loading replaces the previous catalog
//! wholesale; shared access goes through an `RwLock` so a load in progress
//! is never observed as a partial catalog.

use regex::Regex;
use std::collections::HashSet;
use tracing::{info, warn};

use super::scorer::LexicalScorer;
use crate::models::{KnowledgeEntry, RawRecord, RetrievalConfig, ScoredEntry};

/// Source label substituted when a record carries none.
const DEFAULT_SOURCE: &str = "knowledge_base";

/// An entry plus its compiled trigger patterns for the rule engine's
/// catalog scan.
struct IndexedEntry {
    entry: KnowledgeEntry,
    triggers: Vec<Regex>,
}

/// In-memory catalog index. Constructed empty; `load` replaces contents;
/// read by `top_k`/`first_keyword_match`/`len` for the object's lifetime.
pub struct KnowledgeIndex {
    entries: Vec<IndexedEntry>,
    scorer: LexicalScorer,
}

impl Default for KnowledgeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeIndex {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            scorer: LexicalScorer::new(),
        }
    }

    /// Normalizes `records` and replaces the current catalog with them.
    ///
    /// Not additive: the previous contents are discarded. Records with a
    /// duplicate id are dropped with a warning (first wins); malformed
    /// records are repaired by default substitution, never rejected.
    pub fn load(&mut self, records: Vec<RawRecord>) {
        let mut entries = Vec::with_capacity(records.len());
        let mut seen_ids = HashSet::new();

        for (position, record) in records.into_iter().enumerate() {
            let entry = normalize(position, record);
            if !seen_ids.insert(entry.id.clone()) {
                warn!(id = %entry.id, "dropping catalog record with duplicate id");
                continue;
            }
            let triggers = compile_triggers(&entry.keywords);
            entries.push(IndexedEntry { entry, triggers });
        }

        info!("Knowledge base loaded: {} entries", entries.len());
        self.entries = entries;
    }

    /// Scores every entry against `query` and returns the best matches.
    ///
    /// Per entry the score is the better of question and answer coverage.
    /// Entries below the threshold are dropped, the rest are sorted by
    /// descending score (catalog order breaks ties) and truncated to
    /// `top_k`. An empty or unloaded index yields an empty result; that is
    /// not an error condition.
    pub fn top_k(&self, query: &str, config: &RetrievalConfig) -> Vec<ScoredEntry> {
        let mut results: Vec<ScoredEntry> = self
            .entries
            .iter()
            .map(|indexed| {
                let score = self
                    .scorer
                    .score(query, &indexed.entry.question)
                    .max(self.scorer.score(query, &indexed.entry.answer));
                ScoredEntry {
                    entry: indexed.entry.clone(),
                    score,
                }
            })
            .filter(|scored| scored.score >= config.threshold)
            .collect();

        // Vec::sort_by is stable, so equal scores keep catalog order.
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(config.top_k);
        results
    }

    /// First entry (in catalog order) with any trigger keyword matching
    /// `text`. Keywords containing an alphanumeric character match as
    /// whole words; punctuation-only keywords match as raw substrings.
    pub fn first_keyword_match(&self, text: &str) -> Option<&KnowledgeEntry> {
        self.entries
            .iter()
            .find(|indexed| indexed.triggers.iter().any(|pattern| pattern.is_match(text)))
            .map(|indexed| &indexed.entry)
    }

    /// Current entry count, for diagnostics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(position: usize, record: RawRecord) -> KnowledgeEntry {
    let RawRecord {
        id,
        question,
        keywords,
        answer,
        source,
    } = record;

    let question = question
        .filter(|q| !q.is_empty())
        .unwrap_or_else(|| keywords.join(" "));

    KnowledgeEntry {
        id: id
            .map(|id| id.as_string())
            .unwrap_or_else(|| position.to_string()),
        question,
        answer: answer.unwrap_or_default(),
        source: source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
        keywords,
    }
}

fn compile_triggers(keywords: &[String]) -> Vec<Regex> {
    keywords
        .iter()
        .filter_map(|keyword| {
            let escaped = regex::escape(keyword);
            let pattern = if keyword.chars().any(|c| c.is_alphanumeric()) {
                format!(r"(?i)\b{}\b", escaped)
            } else {
                format!("(?i){}", escaped)
            };
            match Regex::new(&pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(keyword = %keyword, "skipping unparseable trigger keyword: {}", e);
                    None
                }
            }
        })
        .collect()
}
