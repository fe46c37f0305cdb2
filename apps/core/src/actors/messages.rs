use tokio::sync::oneshot;

use crate::models::{ChatTurn, RawRecord};

/// Defines errors that can occur within the actor system.
#[derive(Debug, thiserror::Error, Clone)]
pub enum ActorError {
    /// An error originating from the narrator collaborator.
    #[error("Narrator request failed: {0}")]
    NarratorError(String),
    /// A generic internal error within an actor.
    #[error("Internal system error: {0}")]
    Internal(String),
    /// An error indicating that an actor operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl From<tokio::time::error::Elapsed> for ActorError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        ActorError::Timeout(format!("Actor operation timed out: {}", err))
    }
}

// Re-export AppError for convenience
pub use crate::error::AppError;

/// Messages that can be sent to the `SupervisorActor`.
#[derive(Debug)]
pub enum SupervisorMessage {
    /// A request to answer a user message.
    Respond {
        content: String,
        /// A channel to send the composed turn back.
        responder: oneshot::Sender<Result<ChatTurn, AppError>>,
    },
    /// A request to replace the knowledge catalog with `records`.
    LoadCatalog {
        records: Vec<RawRecord>,
        /// A channel to send the new catalog size back.
        responder: oneshot::Sender<Result<usize, AppError>>,
    },
    /// A request for the current catalog size.
    CatalogSize {
        responder: oneshot::Sender<Result<usize, AppError>>,
    },
}
