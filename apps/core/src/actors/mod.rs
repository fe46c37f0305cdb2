//! Actor layer: the async boundary around the pure brain.
//!
//! The supervisor actor is the public entry point; the narrator is the one
//! external collaborator, behind a capability trait with a pure fallback.

pub mod messages;
pub mod narrator;
pub mod supervisor;
pub mod traits;
