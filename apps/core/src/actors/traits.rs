use crate::actors::messages::AppError;
use async_trait::async_trait;

/// Defines the capability interface for producing a reasoning narrative.
///
/// This trait abstracts the narrative backend, allowing a pure rule-based
/// fallback and a network-backed generator to be used interchangeably. The
/// supervisor depends only on this interface and works correctly with the
/// fallback alone; the narrative supplements the answer, it never gates it.
#[async_trait]
pub trait Narrator: Send + Sync + 'static {
    /// Explains, in user-facing prose, why `chosen_answer` was given for
    /// `user_message`.
    async fn explain(&self, user_message: &str, chosen_answer: &str) -> Result<String, AppError>;
}
