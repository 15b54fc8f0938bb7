//! Coarse zero-shot categorization of headline snippets.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sitrep_core::EventType;

use crate::error::IngestError;
use crate::retry::retry_with_backoff;
use crate::types::IngestConfig;

/// Hypothesis strings scored by the zero-shot model, each mapped to the
/// category it stands for. `Other` is the reject bucket.
const HYPOTHESES: &[(&str, EventType)] = &[
    (
        "an armed clash or battle between organized armed groups",
        EventType::Battles,
    ),
    (
        "a bombing, explosion, or remote attack",
        EventType::ExplosionsRemoteViolence,
    ),
    (
        "violence against unarmed civilians",
        EventType::ViolenceAgainstCivilians,
    ),
    (
        "a strategic or political development involving security forces",
        EventType::StrategicDevelopments,
    ),
    ("news unrelated to conflict or security", EventType::Other),
];

/// Minimum top-label score for a snippet to count as an event.
const ACCEPT_THRESHOLD: f64 = 0.4;

/// How much of the article body joins the title in the scored snippet.
const SNIPPET_BODY_CHARS: usize = 500;

/// Capability seam for coarse event categorization.
pub trait ClassifySnippet {
    /// Score the headline snippet and return its category.
    ///
    /// `Ok(None)` means the model answered but the snippet is not an event
    /// (low confidence or the reject label won).
    async fn classify(&self, title: &str, body: &str)
        -> Result<Option<EventType>, IngestError>;
}

/// Hosted zero-shot inference client.
pub struct ZeroShotClassifier {
    client: reqwest::Client,
    url: String,
    api_token: Option<String>,
    max_retries: u32,
    backoff_base_ms: u64,
}

#[derive(Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters,
}

#[derive(Serialize)]
struct ZeroShotParameters {
    candidate_labels: Vec<&'static str>,
}

#[derive(Deserialize)]
struct ZeroShotResponse {
    labels: Vec<String>,
    scores: Vec<f64>,
}

impl ZeroShotClassifier {
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the client cannot be constructed.
    pub fn new(config: &IngestConfig) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            url: config.classifier_url.clone(),
            api_token: config.classifier_api_token.clone(),
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        })
    }

    async fn score(&self, snippet: &str) -> Result<ZeroShotResponse, IngestError> {
        let request = ZeroShotRequest {
            inputs: snippet,
            parameters: ZeroShotParameters {
                candidate_labels: HYPOTHESES.iter().map(|(label, _)| *label).collect(),
            },
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|source| IngestError::Deserialize {
            context: "zero-shot classifier response".to_string(),
            source,
        })
    }
}

impl ClassifySnippet for ZeroShotClassifier {
    async fn classify(
        &self,
        title: &str,
        body: &str,
    ) -> Result<Option<EventType>, IngestError> {
        let text = snippet(title, body);
        let scored = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.score(&text)
        })
        .await?;
        Ok(decide(&scored.labels, &scored.scores))
    }
}

/// Build the scored snippet: title plus the opening of the body.
pub fn snippet(title: &str, body: &str) -> String {
    let lead: String = body.chars().take(SNIPPET_BODY_CHARS).collect();
    format!("{title}. {lead}")
}

/// Decide the category from the model's ranked labels.
///
/// Labels arrive sorted by descending score; only the top one matters. The
/// snippet is accepted when the top label clears the threshold and is not
/// the reject bucket.
pub fn decide(labels: &[String], scores: &[f64]) -> Option<EventType> {
    let top_label = labels.first()?;
    let top_score = scores.first().copied()?;
    if top_score <= ACCEPT_THRESHOLD {
        return None;
    }
    let (_, event_type) = HYPOTHESES
        .iter()
        .find(|(label, _)| label == top_label)?;
    match event_type {
        EventType::Other => None,
        accepted => Some(*accepted),
    }
}
