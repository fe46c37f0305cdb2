// FloodChat V1 Backend Entry Point
// "The Brain" in front of the Brisbane flood-safety knowledge base

mod actors;
mod brain;
mod catalog;
mod error;
mod models;
#[cfg(test)]
mod tests;

use std::io::{self, BufRead, Write};
use std::sync::{Arc, RwLock};

use actors::narrator::{HttpNarrator, StaticNarrator};
use actors::supervisor::SupervisorHandle;
use actors::traits::Narrator;
use brain::KnowledgeIndex;
use models::{NarratorConfig, RetrievalConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Endpoint of the optional generation service for reasoning narratives.
const GENERATOR_URL_ENV: &str = "FLOODCHAT_GENERATOR_URL";
/// Optional API key for that service.
const GENERATOR_KEY_ENV: &str = "FLOODCHAT_GENERATOR_KEY";

fn build_narrator() -> Arc<dyn Narrator> {
    let Ok(endpoint) = std::env::var(GENERATOR_URL_ENV) else {
        info!("No generation endpoint configured, using the rule-based narrator");
        return Arc::new(StaticNarrator::new());
    };

    let config = NarratorConfig {
        endpoint,
        api_key: std::env::var(GENERATOR_KEY_ENV).ok(),
        ..NarratorConfig::default()
    };

    match HttpNarrator::new(config) {
        Ok(narrator) => Arc::new(narrator),
        Err(e) => {
            warn!("Generator config rejected, using the rule-based narrator: {}", e);
            Arc::new(StaticNarrator::new())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let index = Arc::new(RwLock::new(KnowledgeIndex::new()));
    let supervisor = SupervisorHandle::new(
        Arc::clone(&index),
        RetrievalConfig::default(),
        build_narrator(),
    );

    let loaded = supervisor.load_catalog(catalog::builtin_catalog()?).await?;
    info!("Knowledge base ready: {} entries", loaded);

    for line in catalog::INTRO_LINES {
        println!("{}\n", line);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message.eq_ignore_ascii_case("quit") || message.eq_ignore_ascii_case("exit") {
            break;
        }

        let turn = supervisor.respond(message.to_string()).await?;

        if let Some(preamble) = &turn.preamble {
            println!("\n{}", preamble);
        }
        if !turn.answer.is_empty() {
            println!("\n{}", turn.answer);
        }
        if let Some(label) = turn.label {
            match &turn.source {
                Some(source) => println!("[{} - {}]", label, source),
                None => println!("[{}]", label),
            }
        }
        println!("Reasoning: {}\n", turn.reasoning);
    }

    Ok(())
}
