//! Batch orchestration: collected headlines in, assembled records out.

use chrono::Utc;
use sitrep_core::NewEvent;

use crate::assemble::{assemble_record, resolve_event_date};
use crate::classifier::{ClassifySnippet, ZeroShotClassifier};
use crate::collector::HeadlineCollector;
use crate::error::IngestError;
use crate::extractor::{ExtractEvent, LlmExtractor};
use crate::fetcher::{ArticleFetcher, FetchArticle};
use crate::geocode::{Geocode, PlaceGeocoder};
use crate::types::{CandidateHeadline, IngestConfig, WeatherObservation};
use crate::weather::{ArchiveWeatherClient, FetchWeather};

/// Drives each headline through the stage sequence.
///
/// Generic over the capability seams so tests can run the whole flow on
/// fakes. Headlines are independent: one failing never touches the rest.
pub struct IngestPipeline<F, C, E, G, W> {
    fetcher: F,
    classifier: C,
    extractor: E,
    geocoder: G,
    weather: W,
}

impl<F, C, E, G, W> IngestPipeline<F, C, E, G, W>
where
    F: FetchArticle,
    C: ClassifySnippet,
    E: ExtractEvent,
    G: Geocode,
    W: FetchWeather,
{
    pub fn new(fetcher: F, classifier: C, extractor: E, geocoder: G, weather: W) -> Self {
        Self {
            fetcher,
            classifier,
            extractor,
            geocoder,
            weather,
        }
    }

    /// Process every headline sequentially and return the assembled batch.
    pub async fn run(&self, headlines: Vec<CandidateHeadline>) -> Vec<NewEvent> {
        let today = Utc::now().date_naive();
        let total = headlines.len();
        let mut records = Vec::new();

        for headline in headlines {
            match self.process(&headline, today).await {
                Ok(Some(record)) => {
                    tracing::debug!(url = %headline.url, event_type = %record.event_type, "record assembled");
                    records.push(record);
                }
                Ok(None) => {
                    tracing::debug!(url = %headline.url, "headline dropped");
                }
                Err(error) => {
                    tracing::warn!(url = %headline.url, error = %error, "headline failed");
                }
            }
        }

        tracing::info!(
            candidates = total,
            records = records.len(),
            "ingestion batch assembled"
        );
        records
    }

    async fn process(
        &self,
        headline: &CandidateHeadline,
        today: chrono::NaiveDate,
    ) -> Result<Option<NewEvent>, IngestError> {
        let Some(body) = self.fetcher.fetch_article(&headline.url).await? else {
            return Ok(None);
        };

        let Some(event_type) = self.classifier.classify(&headline.title, &body).await? else {
            return Ok(None);
        };

        let Some(extracted) = self.extractor.extract(&headline.title, &body).await? else {
            return Ok(None);
        };

        // Geocoding degrades rather than drops: a record without
        // coordinates is still worth keeping.
        let coordinate = match self.geocoder.geocode(&extracted).await {
            Ok(coordinate) => coordinate,
            Err(error) => {
                tracing::warn!(url = %headline.url, error = %error, "geocoding failed, keeping record without coordinates");
                None
            }
        };

        let event_date = resolve_event_date(&extracted, headline, today);
        let weather = match coordinate {
            Some(coordinate) => self.weather.fetch_weather(coordinate, event_date).await,
            None => WeatherObservation::absent(),
        };

        Ok(Some(assemble_record(
            headline,
            &extracted,
            event_type,
            event_date,
            coordinate,
            weather,
        )))
    }
}

/// Run one full ingestion batch with the HTTP-backed stage implementations.
///
/// # Errors
///
/// Returns an error only when headline collection itself fails; every later
/// stage failure is contained to its headline.
pub async fn run_ingest(config: &IngestConfig) -> Result<Vec<NewEvent>, IngestError> {
    let collector = HeadlineCollector::new(config)?;
    let headlines = collector.collect(config.index_pages).await?;

    let pipeline = IngestPipeline::new(
        ArticleFetcher::new(config)?,
        ZeroShotClassifier::new(config)?,
        LlmExtractor::new(config)?,
        PlaceGeocoder::new(config)?,
        ArchiveWeatherClient::new(config)?,
    );
    Ok(pipeline.run(headlines).await)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::NaiveDate;
    use sitrep_core::EventType;

    use super::*;
    use crate::types::{ExtractedEvent, Geocoordinate};

    struct FakeFetcher;

    impl FetchArticle for FakeFetcher {
        async fn fetch_article(&self, url: &str) -> Result<Option<String>, IngestError> {
            if url.contains("unreachable") {
                return Err(IngestError::UnexpectedStatus {
                    status: 503,
                    url: url.to_owned(),
                });
            }
            if url.contains("bodyless") {
                return Ok(None);
            }
            Ok(Some("An encounter broke out early in the morning.".to_string()))
        }
    }

    struct FakeClassifier {
        category: Option<EventType>,
    }

    impl ClassifySnippet for FakeClassifier {
        async fn classify(
            &self,
            _title: &str,
            _body: &str,
        ) -> Result<Option<EventType>, IngestError> {
            Ok(self.category)
        }
    }

    struct FakeExtractor;

    impl ExtractEvent for FakeExtractor {
        async fn extract(
            &self,
            _title: &str,
            _body: &str,
        ) -> Result<Option<ExtractedEvent>, IngestError> {
            Ok(Some(ExtractedEvent {
                event_date: Some("2025-06-28".to_string()),
                admin1: Some("Jammu and Kashmir".to_string()),
                location: Some("Kulgam".to_string()),
                fatalities: Some(2),
                ..ExtractedEvent::default()
            }))
        }
    }

    enum FakeGeocoder {
        Hit,
        Miss,
        Broken,
    }

    impl Geocode for FakeGeocoder {
        async fn geocode(
            &self,
            _event: &ExtractedEvent,
        ) -> Result<Option<Geocoordinate>, IngestError> {
            match self {
                Self::Hit => Ok(Some(Geocoordinate {
                    lat: 33.64,
                    lon: 75.02,
                })),
                Self::Miss => Ok(None),
                Self::Broken => Err(IngestError::UnexpectedStatus {
                    status: 500,
                    url: "geocoder".to_string(),
                }),
            }
        }
    }

    struct CountingWeather {
        calls: AtomicU32,
    }

    impl CountingWeather {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
            }
        }
    }

    impl FetchWeather for &CountingWeather {
        async fn fetch_weather(
            &self,
            _coordinate: Geocoordinate,
            _date: NaiveDate,
        ) -> WeatherObservation {
            self.calls.fetch_add(1, Ordering::SeqCst);
            WeatherObservation {
                max_temp: Some(28.0),
                min_temp: Some(19.0),
                condition: Some(sitrep_core::WeatherCondition::Clear),
            }
        }
    }

    fn headline(url: &str) -> CandidateHeadline {
        CandidateHeadline {
            url: url.to_string(),
            title: "Encounter breaks out in Kulgam".to_string(),
            published_at: "2025-06-29T08:00:00+05:30".to_string(),
        }
    }

    #[tokio::test]
    async fn a_failing_headline_does_not_sink_the_batch() {
        let weather = CountingWeather::new();
        let pipeline = IngestPipeline::new(
            FakeFetcher,
            FakeClassifier {
                category: Some(EventType::Battles),
            },
            FakeExtractor,
            FakeGeocoder::Hit,
            &weather,
        );

        let records = pipeline
            .run(vec![
                headline("https://news.example/a.ece"),
                headline("https://news.example/unreachable.ece"),
                headline("https://news.example/bodyless.ece"),
                headline("https://news.example/b.ece"),
            ])
            .await;

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.event_type == EventType::Battles));
    }

    #[tokio::test]
    async fn rejected_classification_drops_the_headline() {
        let weather = CountingWeather::new();
        let pipeline = IngestPipeline::new(
            FakeFetcher,
            FakeClassifier { category: None },
            FakeExtractor,
            FakeGeocoder::Hit,
            &weather,
        );

        let records = pipeline.run(vec![headline("https://news.example/a.ece")]).await;
        assert!(records.is_empty());
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn weather_is_skipped_when_geocoding_misses() {
        let weather = CountingWeather::new();
        let pipeline = IngestPipeline::new(
            FakeFetcher,
            FakeClassifier {
                category: Some(EventType::ExplosionsRemoteViolence),
            },
            FakeExtractor,
            FakeGeocoder::Miss,
            &weather,
        );

        let records = pipeline.run(vec![headline("https://news.example/a.ece")]).await;

        assert_eq!(records.len(), 1);
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
        assert_eq!(records[0].latitude, None);
        assert_eq!(records[0].weather_condition, None);
        assert_eq!(records[0].max_temp, None);
    }

    #[tokio::test]
    async fn geocoder_failure_degrades_instead_of_dropping() {
        let weather = CountingWeather::new();
        let pipeline = IngestPipeline::new(
            FakeFetcher,
            FakeClassifier {
                category: Some(EventType::Battles),
            },
            FakeExtractor,
            FakeGeocoder::Broken,
            &weather,
        );

        let records = pipeline.run(vec![headline("https://news.example/a.ece")]).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].latitude, None);
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn assembled_record_carries_weather_when_geocoded() {
        let weather = CountingWeather::new();
        let pipeline = IngestPipeline::new(
            FakeFetcher,
            FakeClassifier {
                category: Some(EventType::Battles),
            },
            FakeExtractor,
            FakeGeocoder::Hit,
            &weather,
        );

        let records = pipeline.run(vec![headline("https://news.example/a.ece")]).await;

        assert_eq!(records.len(), 1);
        assert_eq!(weather.calls.load(Ordering::SeqCst), 1);
        let record = &records[0];
        assert_eq!(
            record.event_date,
            NaiveDate::from_ymd_opt(2025, 6, 28).expect("date")
        );
        assert_eq!(record.latitude, Some(33.64));
        assert_eq!(record.max_temp, Some(28.0));
        assert_eq!(record.fatalities, 2);
    }
}
