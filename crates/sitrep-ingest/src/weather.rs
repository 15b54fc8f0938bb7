//! Historical weather enrichment for event records.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use sitrep_core::WeatherCondition;

use crate::error::IngestError;
use crate::retry::retry_with_backoff;
use crate::types::{Geocoordinate, IngestConfig, WeatherObservation};

/// Capability seam for historical weather lookup.
///
/// Enrichment never fails a headline: implementations degrade to the
/// all-null observation on any error.
pub trait FetchWeather {
    async fn fetch_weather(
        &self,
        coordinate: Geocoordinate,
        date: NaiveDate,
    ) -> WeatherObservation;
}

/// Daily-archive weather client (Open-Meteo style API).
pub struct ArchiveWeatherClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

#[derive(Deserialize)]
struct ArchiveResponse {
    daily: DailyArrays,
}

/// Parallel per-day arrays; index 0 holds the single requested date.
#[derive(Deserialize)]
struct DailyArrays {
    #[serde(default)]
    weather_code: Vec<Option<i32>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
}

impl ArchiveWeatherClient {
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
            base_url: config.weather_url.clone(),
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        })
    }

    async fn fetch_archive(
        &self,
        coordinate: Geocoordinate,
        date: NaiveDate,
    ) -> Result<ArchiveResponse, IngestError> {
        let url = format!("{}/v1/archive", self.base_url);
        let day = date.format("%Y-%m-%d").to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", coordinate.lat.to_string().as_str()),
                ("longitude", coordinate.lon.to_string().as_str()),
                ("start_date", day.as_str()),
                ("end_date", day.as_str()),
                (
                    "daily",
                    "weather_code,temperature_2m_max,temperature_2m_min",
                ),
                ("timezone", "auto"),
            ])
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
            context: "weather archive response".to_string(),
            source,
        })
    }
}

impl FetchWeather for ArchiveWeatherClient {
    async fn fetch_weather(
        &self,
        coordinate: Geocoordinate,
        date: NaiveDate,
    ) -> WeatherObservation {
        let result = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.fetch_archive(coordinate, date)
        })
        .await;

        match result {
            Ok(archive) => observation_from_daily(&archive.daily),
            Err(error) => {
                tracing::warn!(
                    lat = coordinate.lat,
                    lon = coordinate.lon,
                    date = %date,
                    error = %error,
                    "weather lookup failed, continuing without enrichment"
                );
                WeatherObservation::absent()
            }
        }
    }
}

/// Read the single requested day out of the parallel arrays.
fn observation_from_daily(daily: &DailyArrays) -> WeatherObservation {
    let code = daily.weather_code.first().copied().flatten();
    WeatherObservation {
        max_temp: daily.temperature_2m_max.first().copied().flatten(),
        min_temp: daily.temperature_2m_min.first().copied().flatten(),
        condition: Some(WeatherCondition::from_code(code)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

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
            geocoder_url: String::new(),
            weather_url: base_url,
        }
    }

    fn coordinate() -> Geocoordinate {
        Geocoordinate {
            lat: 34.0837,
            lon: 74.7973,
        }
    }

    #[tokio::test]
    async fn fetch_weather_buckets_the_first_day() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/archive"))
            .and(query_param("start_date", "2025-06-28"))
            .and(query_param("end_date", "2025-06-28"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "daily": {
                    "weather_code": [63],
                    "temperature_2m_max": [29.4],
                    "temperature_2m_min": [21.1]
                }
            })))
            .mount(&server)
            .await;

        let client = ArchiveWeatherClient::new(&test_config(server.uri())).expect("client");
        let date = NaiveDate::from_ymd_opt(2025, 6, 28).expect("date");
        let observation = client.fetch_weather(coordinate(), date).await;

        assert_eq!(observation.condition, Some(WeatherCondition::Rain));
        assert_eq!(observation.max_temp, Some(29.4));
        assert_eq!(observation.min_temp, Some(21.1));
    }

    #[tokio::test]
    async fn fetch_weather_maps_a_missing_code_to_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "daily": {
                    "weather_code": [null],
                    "temperature_2m_max": [31.0],
                    "temperature_2m_min": [24.5]
                }
            })))
            .mount(&server)
            .await;

        let client = ArchiveWeatherClient::new(&test_config(server.uri())).expect("client");
        let date = NaiveDate::from_ymd_opt(2025, 6, 28).expect("date");
        let observation = client.fetch_weather(coordinate(), date).await;

        assert_eq!(observation.condition, Some(WeatherCondition::Unknown));
        assert_eq!(observation.max_temp, Some(31.0));
    }

    #[tokio::test]
    async fn fetch_weather_degrades_to_absent_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ArchiveWeatherClient::new(&test_config(server.uri())).expect("client");
        let date = NaiveDate::from_ymd_opt(2025, 6, 28).expect("date");
        let observation = client.fetch_weather(coordinate(), date).await;

        assert_eq!(observation, WeatherObservation::absent());
    }

    #[tokio::test]
    async fn fetch_weather_degrades_to_absent_on_garbage_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        let client = ArchiveWeatherClient::new(&test_config(server.uri())).expect("client");
        let date = NaiveDate::from_ymd_opt(2025, 6, 28).expect("date");
        let observation = client.fetch_weather(coordinate(), date).await;

        assert_eq!(observation, WeatherObservation::absent());
    }
}
