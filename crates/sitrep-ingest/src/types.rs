use serde::Deserialize;

use sitrep_core::WeatherCondition;

/// A candidate article discovered on the news index, keyed by URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateHeadline {
    pub url: String,
    pub title: String,
    /// Publication timestamp as the index markup carries it (ISO-8601-ish).
    /// Compared lexicographically for last-write-wins deduplication.
    pub published_at: String,
}

/// Structured fields the extraction model pulled out of an article.
///
/// Every field is optional: the prompt contract asks for all of them, but
/// models omit or null fields freely, and the assembler substitutes defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedEvent {
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub actor1: Option<String>,
    #[serde(default)]
    pub actor2: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub admin1: Option<String>,
    #[serde(default)]
    pub admin2: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub fatalities: Option<i64>,
    #[serde(default)]
    pub civilian_targeting: Option<i64>,
}

/// A resolved latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geocoordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Historical weather for the event's date and place.
///
/// `condition` is `None` when the weather service itself failed, and
/// `Some(Unknown)` when the service answered but carried no weather code —
/// the distinction costs nothing and keeps failure observable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherObservation {
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub condition: Option<WeatherCondition>,
}

impl WeatherObservation {
    /// The all-null observation used when enrichment is skipped or fails.
    #[must_use]
    pub fn absent() -> Self {
        Self {
            max_temp: None,
            min_temp: None,
            condition: None,
        }
    }
}

/// Configuration for one ingestion batch.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// News index listing URL; the page number is appended verbatim.
    pub news_index_url: String,
    pub index_pages: u32,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub classifier_url: String,
    pub classifier_api_token: Option<String>,
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_fallback_models: Vec<String>,
    pub geocoder_url: String,
    pub weather_url: String,
}

impl IngestConfig {
    #[must_use]
    pub fn from_app_config(config: &sitrep_core::AppConfig) -> Self {
        Self {
            news_index_url: config.news_index_url.clone(),
            index_pages: config.ingest_index_pages,
            request_timeout_secs: config.ingest_request_timeout_secs,
            user_agent: config.ingest_user_agent.clone(),
            max_retries: config.ingest_max_retries,
            retry_backoff_base_ms: config.ingest_retry_backoff_base_ms,
            classifier_url: config.classifier_url.clone(),
            classifier_api_token: config.classifier_api_token.clone(),
            llm_base_url: config.llm_base_url.clone(),
            llm_api_key: config.llm_api_key.clone(),
            llm_model: config.llm_model.clone(),
            llm_fallback_models: config.llm_fallback_models.clone(),
            geocoder_url: config.geocoder_url.clone(),
            weather_url: config.weather_url.clone(),
        }
    }
}
