//! Built-in knowledge catalog.
//!
//! The Brisbane flood-safety catalog ships embedded in the binary and is
//! parsed once at startup. External catalogs can be loaded through the
//! supervisor instead; both paths go through the same record normalization.

use crate::error::AppError;
use crate::models::RawRecord;

/// The embedded catalog file.
const KNOWLEDGE_JSON: &str = include_str!("../data/knowledge.json");

/// Intro lines shown when a chat starts. The safety disclaimer comes first.
pub const INTRO_LINES: &[&str] = &[
    "I am not an emergency service. If you are in danger, call 000.",
    "I provide general flood safety guidance for Brisbane based on official sources.",
    "Type 1 for before a flood, 2 for during, 3 for after.\nOr ask questions like 'What should I put in my emergency kit?'",
];

/// Parses the embedded catalog.
///
/// The file is compiled into the binary, so a parse failure means the build
/// shipped a broken catalog; it surfaces as a configuration error at startup
/// rather than a panic.
pub fn builtin_catalog() -> Result<Vec<RawRecord>, AppError> {
    serde_json::from_str(KNOWLEDGE_JSON)
        .map_err(|e| AppError::Config(format!("embedded catalog is invalid: {}", e)))
}
