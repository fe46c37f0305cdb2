use crate::actors::messages::{ActorError, AppError};
use crate::actors::traits::Narrator;
use crate::models::NarratorConfig;
use async_trait::async_trait;
use lru::LruCache;
use reqwest::Client;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};
use validator::Validate;

/// Fixed narrative substituted whenever the narrator cannot produce one.
pub const FALLBACK_REASONING: &str = "No reasoning available.";

/// Pure rule-based narrator. Always available, no I/O.
#[derive(Default)]
pub struct StaticNarrator;

impl StaticNarrator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Narrator for StaticNarrator {
    async fn explain(&self, _user_message: &str, chosen_answer: &str) -> Result<String, AppError> {
        if chosen_answer.is_empty() {
            return Ok(
                "I stayed quiet because that question needs a decision from official sources, \
                 not from me."
                    .to_string(),
            );
        }
        if chosen_answer.contains("Source:") {
            Ok(
                "This answer comes from the verified flood-safety knowledge base; the source is \
                 cited above."
                    .to_string(),
            )
        } else {
            Ok(
                "This answer follows the built-in flood-safety guidance and stays within official \
                 preparedness topics."
                    .to_string(),
            )
        }
    }
}

/// Network-backed narrator posting reasoning prompts to a generation
/// endpoint.
///
/// Uses the upstream wire shape: the request carries
/// `contents[].parts[].text` and the reply text is read from
/// `candidates[0].content.parts[0].text`. Every request is guarded by a
/// timeout, and recent narratives are cached so repeated questions do not
/// re-hit the service.
pub struct HttpNarrator {
    client: Client,
    config: NarratorConfig,
    cache: Mutex<LruCache<String, String>>,
}

impl HttpNarrator {
    const CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(256) {
        Some(size) => size,
        None => panic!("Cache size must be non-zero"),
    };

    /// Creates a narrator for the configured endpoint. Fails on an invalid
    /// configuration (bad URL, zero timeout).
    pub fn new(config: NarratorConfig) -> Result<Self, AppError> {
        config.validate()?;
        url::Url::parse(&config.endpoint)?;
        info!(endpoint = %config.endpoint, "HTTP narrator configured");

        Ok(Self {
            client: Client::new(),
            config,
            cache: Mutex::new(LruCache::new(Self::CACHE_SIZE)),
        })
    }

    fn reasoning_prompt(user_message: &str, chosen_answer: &str) -> String {
        format!(
            "You are a reasoning assistant that explains why a flood-safety chatbot replied the \
             way it did.\n\
             In one clear, supportive sentence, explain why this reply was chosen, and say \
             whether it came from the verified flood-safety knowledge base or from general \
             guidance. Do not invent any new facts, lists, or numbers.\n\
             User message: \"{}\"\n\
             Chatbot reply: \"{}\"",
            user_message, chosen_answer
        )
    }

    fn request_url(&self) -> String {
        match &self.config.api_key {
            Some(key) => format!("{}?key={}", self.config.endpoint, key),
            None => self.config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl Narrator for HttpNarrator {
    async fn explain(&self, user_message: &str, chosen_answer: &str) -> Result<String, AppError> {
        let cache_key = format!("{}\n{}", user_message, chosen_answer);

        if let Some(cached) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&cache_key)
        {
            debug!("narrator cache hit");
            return Ok(cached.clone());
        }

        let prompt = Self::reasoning_prompt(user_message, chosen_answer);
        let payload = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let request_future = self.client.post(self.request_url()).json(&payload).send();
        let res = timeout(Duration::from_secs(self.config.timeout_secs), request_future).await??;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Actor(ActorError::NarratorError(format!(
                "Generation request failed with status {}: {}",
                status, body
            ))));
        }

        let json: serde_json::Value = res.json().await?;
        let text = json
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|value| value.as_str())
            .ok_or_else(|| {
                AppError::Actor(ActorError::NarratorError(
                    "Generation response carried no candidate text".to_string(),
                ))
            })?
            .trim()
            .to_string();

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(cache_key, text.clone());

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn narrator_for(server: &MockServer, api_key: Option<&str>) -> HttpNarrator {
        let config = NarratorConfig {
            endpoint: format!("{}/api/generate", server.uri()),
            api_key: api_key.map(str::to_string),
            timeout_secs: 5,
        };
        HttpNarrator::new(config).expect("config should be valid")
    }

    fn candidate_body(text: &str) -> serde_json::Value {
        json!({
            "candidates": [
                { "content": { "parts": [{ "text": text }] } }
            ]
        })
    }

    #[tokio::test]
    async fn test_explain_success() {
        // 1. Arrange
        let mock_server = MockServer::start().await;
        let narrator = narrator_for(&mock_server, None);

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(candidate_body("Because the knowledge base covers kits.")),
            )
            .mount(&mock_server)
            .await;

        // 2. Act
        let result = narrator.explain("what goes in a kit", "Water and food.").await;

        // 3. Assert
        assert_eq!(
            result.expect("explain should succeed"),
            "Because the knowledge base covers kits."
        );
    }

    #[tokio::test]
    async fn test_explain_server_error() {
        let mock_server = MockServer::start().await;
        let narrator = narrator_for(&mock_server, None);

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let result = narrator.explain("question", "answer").await;

        assert!(result.is_err());
        if let Err(AppError::Actor(ActorError::NarratorError(message))) = result {
            assert!(message.contains("status 500"));
        } else {
            panic!("Expected ActorError::NarratorError, got something else.");
        }
    }

    #[tokio::test]
    async fn test_explain_malformed_body() {
        let mock_server = MockServer::start().await;
        let narrator = narrator_for(&mock_server, None);

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&mock_server)
            .await;

        let result = narrator.explain("question", "answer").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_api_key_is_sent_as_query_param() {
        let mock_server = MockServer::start().await;
        let narrator = narrator_for(&mock_server, Some("sekret"));

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(query_param("key", "sekret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body("ok")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = narrator.explain("question", "answer").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_repeat_requests_hit_the_cache() {
        let mock_server = MockServer::start().await;
        let narrator = narrator_for(&mock_server, None);

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate_body("cached")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let first = narrator.explain("same question", "same answer").await;
        let second = narrator.explain("same question", "same answer").await;

        assert_eq!(first.expect("first call"), "cached");
        assert_eq!(second.expect("second call"), "cached");
    }

    #[tokio::test]
    async fn test_invalid_endpoint_is_rejected() {
        let config = NarratorConfig {
            endpoint: "not a url".to_string(),
            api_key: None,
            timeout_secs: 5,
        };
        assert!(HttpNarrator::new(config).is_err());
    }

    #[tokio::test]
    async fn test_static_narrator_always_answers() {
        let narrator = StaticNarrator::new();

        let sourced = narrator
            .explain("kit?", "Pack water.\n\nSource: Get Ready Queensland.")
            .await
            .expect("static narrator cannot fail");
        assert!(sourced.contains("knowledge base"));

        let silent = narrator
            .explain("should I leave", "")
            .await
            .expect("static narrator cannot fail");
        assert!(!silent.is_empty());
    }
}
