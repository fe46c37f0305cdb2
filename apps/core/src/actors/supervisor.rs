use crate::actors::messages::{ActorError, AppError, SupervisorMessage};
use crate::actors::narrator::FALLBACK_REASONING;
use crate::actors::traits::Narrator;
use crate::brain::{EmotionClassifier, KnowledgeIndex, ResponseArbiter};
use crate::models::{ChatTurn, RawRecord, RetrievalConfig};
use chrono::Utc;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// A handle to the `SupervisorActor`.
///
/// This is the primary entry point for the chatbot core. It composes the
/// emotion classifier, the response arbiter, and the narrator into one
/// `ChatTurn` per user message, and owns the catalog load/size boundary.
#[derive(Clone)]
pub struct SupervisorHandle {
    sender: mpsc::Sender<SupervisorMessage>,
}

impl SupervisorHandle {
    /// Creates a new `SupervisorActor` and returns a handle to it.
    ///
    /// # Arguments
    ///
    /// * `index` - The shared knowledge index. Loads take its write lock;
    ///   arbitration reads it.
    /// * `config` - Retrieval tuning for the arbiter.
    /// * `narrator` - The reasoning backend; the supervisor functions
    ///   correctly even when it always fails.
    pub fn new(
        index: Arc<RwLock<KnowledgeIndex>>,
        config: RetrievalConfig,
        narrator: Arc<dyn Narrator>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        let actor = SupervisorRunner::new(receiver, index, config, narrator);
        tokio::spawn(async move { actor.run().await });
        Self { sender }
    }

    /// Answers a user message with a fully composed turn.
    #[instrument(skip(self))]
    pub async fn respond(&self, content: String) -> Result<ChatTurn, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::Respond {
            content,
            responder: send,
        };
        self.sender
            .send(msg)
            .await
            .map_err(|_| AppError::Actor(ActorError::Internal("Supervisor closed".to_string())))?;
        timeout(Duration::from_secs(30), recv)
            .await?
            .map_err(|_| {
                AppError::Actor(ActorError::Internal(
                    "Supervisor failed to respond".to_string(),
                ))
            })?
    }

    /// Replaces the knowledge catalog and returns the new entry count.
    #[instrument(skip(self, records))]
    pub async fn load_catalog(&self, records: Vec<RawRecord>) -> Result<usize, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::LoadCatalog {
            records,
            responder: send,
        };
        self.sender
            .send(msg)
            .await
            .map_err(|_| AppError::Actor(ActorError::Internal("Supervisor closed".to_string())))?;
        timeout(Duration::from_secs(10), recv)
            .await?
            .map_err(|_| {
                AppError::Actor(ActorError::Internal(
                    "Supervisor failed to respond".to_string(),
                ))
            })?
    }

    /// Current catalog entry count, for diagnostics.
    pub async fn catalog_size(&self) -> Result<usize, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::CatalogSize { responder: send };
        self.sender
            .send(msg)
            .await
            .map_err(|_| AppError::Actor(ActorError::Internal("Supervisor closed".to_string())))?;
        timeout(Duration::from_secs(10), recv)
            .await?
            .map_err(|_| {
                AppError::Actor(ActorError::Internal(
                    "Supervisor failed to respond".to_string(),
                ))
            })?
    }
}

// --- Actor Runner ---
struct SupervisorRunner {
    receiver: mpsc::Receiver<SupervisorMessage>,
    index: Arc<RwLock<KnowledgeIndex>>,
    arbiter: ResponseArbiter,
    emotions: EmotionClassifier,
    narrator: Arc<dyn Narrator>,
}

impl SupervisorRunner {
    fn new(
        receiver: mpsc::Receiver<SupervisorMessage>,
        index: Arc<RwLock<KnowledgeIndex>>,
        config: RetrievalConfig,
        narrator: Arc<dyn Narrator>,
    ) -> Self {
        Self {
            receiver,
            arbiter: ResponseArbiter::new(Arc::clone(&index), config),
            index,
            emotions: EmotionClassifier::new(),
            narrator,
        }
    }

    async fn run(mut self) {
        info!("Supervisor started");
        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg).await;
        }
        info!("Supervisor stopped");
    }

    async fn handle_message(&mut self, msg: SupervisorMessage) {
        match msg {
            SupervisorMessage::Respond { content, responder } => {
                let result = self.compose_turn(&content).await;
                if responder.send(result).is_err() {
                    warn!("Failed to send respond result (channel closed)");
                }
            }
            SupervisorMessage::LoadCatalog { records, responder } => {
                let size = {
                    let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
                    index.load(records);
                    index.len()
                };
                if responder.send(Ok(size)).is_err() {
                    warn!("Failed to send load result (channel closed)");
                }
            }
            SupervisorMessage::CatalogSize { responder } => {
                let size = self
                    .index
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len();
                if responder.send(Ok(size)).is_err() {
                    warn!("Failed to send size result (channel closed)");
                }
            }
        }
    }

    /// Composes one turn: empathy preamble, arbitrated answer, narrative.
    ///
    /// The narrator is strictly supplementary. Any failure there degrades
    /// to the fixed placeholder and is logged, never surfaced.
    async fn compose_turn(&self, content: &str) -> Result<ChatTurn, AppError> {
        info!("Supervisor received: {}", content);

        let emotion = self.emotions.classify(content);
        let preamble = self.emotions.preamble(emotion).map(str::to_string);

        let reply = self.arbiter.respond(content);

        let reasoning = match self.narrator.explain(content, &reply.answer).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => FALLBACK_REASONING.to_string(),
            Err(e) => {
                warn!("Narrator failed, using placeholder: {}", e);
                FALLBACK_REASONING.to_string()
            }
        };

        let turn = ChatTurn {
            id: Uuid::new_v4(),
            preamble,
            answer: reply.answer,
            label: reply.label,
            source: reply.source,
            topic: reply.topic,
            emotion,
            reasoning,
            timestamp: Utc::now(),
        };
        info!("Composed turn: {}", turn.summary());
        Ok(turn)
    }
}
