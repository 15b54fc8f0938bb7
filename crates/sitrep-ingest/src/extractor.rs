//! Structured field extraction through a chat-completion model.

use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::retry::retry_with_backoff;
use crate::types::{ExtractedEvent, IngestConfig};

/// Capability seam for structured event extraction.
pub trait ExtractEvent {
    /// Extract structured event fields from a title and article body.
    ///
    /// `Ok(None)` means the model answered but produced nothing parseable;
    /// the headline is dropped rather than written with partial fields.
    async fn extract(
        &self,
        title: &str,
        body: &str,
    ) -> Result<Option<ExtractedEvent>, IngestError>;
}

/// Chat-completion extraction client (OpenAI-compatible serving layer).
pub struct LlmExtractor {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    fallback_models: Vec<String>,
    max_retries: u32,
    backoff_base_ms: u64,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    /// Ordered fallbacks the serving layer tries when the primary model
    /// is unavailable.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    models: Vec<&'a str>,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmExtractor {
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the client cannot be constructed.
    pub fn new(config: &IngestConfig) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(60)))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.llm_base_url.clone(),
            api_key: config.llm_api_key.clone(),
            model: config.llm_model.clone(),
            fallback_models: config.llm_fallback_models.clone(),
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String, IngestError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            models: self.fallback_models.iter().map(String::as_str).collect(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let text = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|source| IngestError::Deserialize {
                context: "chat completion response".to_string(),
                source,
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| IngestError::EmptyCompletion {
                context: "event extraction".to_string(),
            })
    }
}

impl ExtractEvent for LlmExtractor {
    async fn extract(
        &self,
        title: &str,
        body: &str,
    ) -> Result<Option<ExtractedEvent>, IngestError> {
        let prompt = build_prompt(title, body);
        let content = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.complete(&prompt)
        })
        .await?;
        Ok(parse_extraction(&content))
    }
}

/// The strict prompt contract: one JSON object with fixed keys, null for
/// unknown fields, and the literal reply `null` when there is no event.
pub fn build_prompt(title: &str, body: &str) -> String {
    format!(
        "You are an analyst recording armed-conflict events from Indian news \
reports. Read the article and decide whether it describes a qualifying \
security event directly related to India. If no qualifying event is found, \
return: null\n\
Otherwise answer with exactly one JSON object and nothing else, using \
these keys:\n\
\"event_date\": the date the event happened, formatted YYYY-MM-DD, or null\n\
\"actor1\": the primary actor (force, group, or organisation), or null\n\
\"actor2\": the opposing or secondary actor, or null\n\
\"country\": the country the event took place in, or null\n\
\"admin1\": the state or union territory, or null\n\
\"admin2\": the district, or null\n\
\"location\": the town or village, or null\n\
\"fatalities\": the number of people killed as an integer, or null\n\
\"civilian_targeting\": 1 if civilians were deliberately targeted, else 0\n\
Use null when the article does not say. Do not guess coordinates.\n\n\
Headline: {title}\n\nArticle: {body}"
    )
}

/// Parse the first JSON object out of the model's reply.
///
/// Models wrap the object in prose or code fences; the first non-greedy
/// brace-delimited block is taken as the answer. No block, or a block that does not
/// parse, yields `None`.
pub fn parse_extraction(content: &str) -> Option<ExtractedEvent> {
    let re = Regex::new(r"(?s)\{.*?\}").expect("valid json block regex");
    let block = re.find(content)?.as_str();
    match serde_json::from_str::<ExtractedEvent>(block) {
        Ok(extracted) => Some(extracted),
        Err(error) => {
            tracing::debug!(error = %error, "extraction block did not parse");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parse_extraction_reads_a_plain_object() {
        let content = r#"{"event_date": "2025-06-28", "actor1": "Security forces",
            "admin1": "Jammu and Kashmir", "fatalities": 2, "civilian_targeting": 0}"#;
        let extracted = parse_extraction(content).expect("extracted");
        assert_eq!(extracted.event_date.as_deref(), Some("2025-06-28"));
        assert_eq!(extracted.fatalities, Some(2));
        assert_eq!(extracted.actor2, None);
    }

    #[test]
    fn parse_extraction_skips_surrounding_prose() {
        let content = "Here is the event:\n```json\n{\"location\": \"Poonch\"}\n```\nDone.";
        let extracted = parse_extraction(content).expect("extracted");
        assert_eq!(extracted.location.as_deref(), Some("Poonch"));
    }

    #[test]
    fn prompt_offers_the_no_event_marker() {
        let prompt = build_prompt("Some headline", "Some body.");
        assert!(
            prompt.contains("If no qualifying event is found, return: null"),
            "prompt must give the model a sanctioned way to report no event"
        );
        assert!(prompt.contains("directly related to India"));
    }

    #[test]
    fn parse_extraction_is_none_without_a_json_block() {
        assert!(parse_extraction("I cannot determine the event details.").is_none());
        // The prompt's sanctioned no-event reply carries no object either.
        assert!(parse_extraction("null").is_none());
    }

    #[test]
    fn parse_extraction_is_none_for_unparseable_block() {
        assert!(parse_extraction("{not valid json}").is_none());
    }

    fn test_config(base_url: String) -> IngestConfig {
        IngestConfig {
            news_index_url: String::new(),
            index_pages: 1,
            request_timeout_secs: 5,
            user_agent: "sitrep-test/0.1".to_string(),
            max_retries: 0,
            retry_backoff_base_ms: 0,
            classifier_url: String::new(),
            classifier_api_token: None,
            llm_base_url: base_url,
            llm_api_key: Some("sk-test".to_string()),
            llm_model: "primary-model".to_string(),
            llm_fallback_models: vec!["fallback-a".to_string(), "fallback-b".to_string()],
            geocoder_url: String::new(),
            weather_url: String::new(),
        }
    }

    #[tokio::test]
    async fn extract_posts_model_list_and_parses_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "primary-model",
                "models": ["fallback-a", "fallback-b"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {
                        "content": "{\"event_date\": \"2025-06-28\", \"admin2\": \"Kupwara\"}"
                    }
                }]
            })))
            .mount(&server)
            .await;

        let extractor = LlmExtractor::new(&test_config(server.uri())).expect("extractor");
        let extracted = extractor
            .extract("Encounter in Kupwara", "Two militants were killed.")
            .await
            .expect("extract")
            .expect("event");
        assert_eq!(extracted.admin2.as_deref(), Some("Kupwara"));
    }

    #[tokio::test]
    async fn extract_treats_empty_completion_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": ""}}]
            })))
            .mount(&server)
            .await;

        let extractor = LlmExtractor::new(&test_config(server.uri())).expect("extractor");
        let result = extractor.extract("title", "body").await;
        assert!(matches!(result, Err(IngestError::EmptyCompletion { .. })));
    }

    #[tokio::test]
    async fn extract_returns_none_when_the_reply_has_no_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "No event could be identified."}}]
            })))
            .mount(&server)
            .await;

        let extractor = LlmExtractor::new(&test_config(server.uri())).expect("extractor");
        let result = extractor.extract("title", "body").await.expect("extract");
        assert!(result.is_none());
    }
}
