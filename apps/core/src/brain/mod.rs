//! # Brain Module
//!
//! The pure decision pipeline for FloodChat. Analyzes user input and picks
//! exactly one answer path, with no I/O of its own; the actor layer wraps
//! it at the async boundary.
//!
//! ## Components
//! - `scorer`: lexical similarity scoring (fast path, no embeddings)
//! - `index`: in-memory retrieval index over the knowledge catalog
//! - `rules`: ordered intent rule cascade, first match wins
//! - `arbiter`: arbitration policy across rules and retrieval
//! - `emotion`: emotion detection for the empathetic preamble

pub mod arbiter;
pub mod emotion;
pub mod index;
pub mod rules;
pub mod scorer;

// Re-export main types for convenience
pub use arbiter::ResponseArbiter;
pub use emotion::EmotionClassifier;
pub use index::KnowledgeIndex;
#[allow(unused_imports)]
pub use rules::{phase_reply, IntentRuleEngine, Outcome};
#[allow(unused_imports)]
pub use scorer::LexicalScorer;
