//! Lexical similarity scoring.
//!
//! Scores how much of a query's vocabulary a candidate text covers. The
//! measure is asymmetric by design: it is the fraction of query tokens found
//! in the candidate, not a symmetric overlap, so swapping the arguments
//! changes the score.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Common words ignored on both sides before matching.
const STOPWORDS: &[&str] = &[
    "where", "can", "get", "do", "i", "my", "what", "how", "the", "a", "in", "of", "for", "to",
    "is", "are", "was", "it", "on", "at", "by",
];

static WORD_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("Invalid regex: word token pattern"));

/// Pure token-overlap scorer used by the retrieval index.
pub struct LexicalScorer {
    stopwords: HashSet<&'static str>,
}

impl Default for LexicalScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexicalScorer {
    pub fn new() -> Self {
        Self {
            stopwords: STOPWORDS.iter().copied().collect(),
        }
    }

    /// Lowercase word tokens (alphanumeric/underscore runs) minus stopwords.
    fn tokens(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        WORD_TOKEN
            .find_iter(&lower)
            .map(|m| m.as_str().to_string())
            .filter(|token| !self.stopwords.contains(token.as_str()))
            .collect()
    }

    /// Scores `candidate` against `query`, in `[0, 1]`.
    ///
    /// Returns the fraction of (non-stopword) query tokens that occur
    /// anywhere in the candidate. Duplicate query tokens each count;
    /// candidate tokens are deduplicated so repetition earns no extra
    /// credit. Either side reducing to no tokens scores `0`.
    pub fn score(&self, query: &str, candidate: &str) -> f32 {
        let query_tokens = self.tokens(query);
        let candidate_tokens = self.tokens(candidate);

        if query_tokens.is_empty() || candidate_tokens.is_empty() {
            return 0.0;
        }

        let candidate_set: HashSet<&str> = candidate_tokens.iter().map(String::as_str).collect();
        let matches = query_tokens
            .iter()
            .filter(|token| candidate_set.contains(token.as_str()))
            .count();

        matches as f32 / query_tokens.len() as f32
    }
}
