//! Place-name geocoding for extracted events.

use std::time::Duration;

use serde::Deserialize;

use crate::error::IngestError;
use crate::retry::retry_with_backoff;
use crate::types::{ExtractedEvent, Geocoordinate, IngestConfig};

/// Capability seam for resolving an extracted place to coordinates.
pub trait Geocode {
    /// Resolve the event's place fields to a coordinate pair.
    ///
    /// `Ok(None)` covers both an empty query (no place fields at all) and a
    /// query the geocoder could not match.
    async fn geocode(
        &self,
        event: &ExtractedEvent,
    ) -> Result<Option<Geocoordinate>, IngestError>;
}

/// Nominatim-style place search client.
pub struct PlaceGeocoder {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

#[derive(Deserialize)]
struct PlaceResult {
    lat: String,
    lon: String,
}

impl PlaceGeocoder {
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
            base_url: config.geocoder_url.clone(),
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<PlaceResult>, IngestError> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|source| IngestError::Deserialize {
            context: "geocoder response".to_string(),
            source,
        })
    }
}

impl Geocode for PlaceGeocoder {
    async fn geocode(
        &self,
        event: &ExtractedEvent,
    ) -> Result<Option<Geocoordinate>, IngestError> {
        let Some(query) = place_query(event) else {
            return Ok(None);
        };

        let results = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.search(&query)
        })
        .await?;

        let Some(first) = results.into_iter().next() else {
            return Ok(None);
        };

        // The search API returns coordinates as strings.
        match (first.lat.parse::<f64>(), first.lon.parse::<f64>()) {
            (Ok(lat), Ok(lon)) => Ok(Some(Geocoordinate { lat, lon })),
            _ => {
                tracing::warn!(query = %query, "geocoder returned unparseable coordinates");
                Ok(None)
            }
        }
    }
}

/// Compose the search query from the most to least specific place fields.
///
/// Returns `None` when no field carries text, so callers skip the lookup.
pub fn place_query(event: &ExtractedEvent) -> Option<String> {
    let parts: Vec<&str> = [&event.location, &event.admin2, &event.admin1]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn place_query_joins_specific_to_general() {
        let event = ExtractedEvent {
            location: Some("Sopore".to_string()),
            admin2: Some("Baramulla".to_string()),
            admin1: Some("Jammu and Kashmir".to_string()),
            ..ExtractedEvent::default()
        };
        assert_eq!(
            place_query(&event).as_deref(),
            Some("Sopore, Baramulla, Jammu and Kashmir")
        );
    }

    #[test]
    fn place_query_skips_missing_and_blank_fields() {
        let event = ExtractedEvent {
            location: None,
            admin2: Some("  ".to_string()),
            admin1: Some("Manipur".to_string()),
            ..ExtractedEvent::default()
        };
        assert_eq!(place_query(&event).as_deref(), Some("Manipur"));
    }

    #[test]
    fn place_query_is_none_when_everything_is_absent() {
        assert!(place_query(&ExtractedEvent::default()).is_none());
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
            llm_base_url: String::new(),
            llm_api_key: None,
            llm_model: String::new(),
            llm_fallback_models: vec![],
            geocoder_url: base_url,
            weather_url: String::new(),
        }
    }

    #[tokio::test]
    async fn geocode_takes_the_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Sopore, Baramulla"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"lat": "34.3000", "lon": "74.4667", "display_name": "Sopore"},
                {"lat": "0.0", "lon": "0.0", "display_name": "elsewhere"}
            ])))
            .mount(&server)
            .await;

        let geocoder = PlaceGeocoder::new(&test_config(server.uri())).expect("geocoder");
        let event = ExtractedEvent {
            location: Some("Sopore".to_string()),
            admin2: Some("Baramulla".to_string()),
            ..ExtractedEvent::default()
        };
        let coordinate = geocoder.geocode(&event).await.expect("geocode").expect("hit");
        assert!((coordinate.lat - 34.3).abs() < 1e-6);
        assert!((coordinate.lon - 74.4667).abs() < 1e-6);
    }

    #[tokio::test]
    async fn geocode_returns_none_for_an_empty_result_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let geocoder = PlaceGeocoder::new(&test_config(server.uri())).expect("geocoder");
        let event = ExtractedEvent {
            location: Some("Nowhere".to_string()),
            ..ExtractedEvent::default()
        };
        assert!(geocoder.geocode(&event).await.expect("geocode").is_none());
    }

    #[tokio::test]
    async fn geocode_skips_the_call_when_the_query_is_empty() {
        // No server at all: a request would fail, so None proves the skip.
        let geocoder = PlaceGeocoder::new(&test_config(
            "http://127.0.0.1:9".to_string(),
        ))
        .expect("geocoder");
        let result = geocoder.geocode(&ExtractedEvent::default()).await;
        assert!(matches!(result, Ok(None)));
    }
}
