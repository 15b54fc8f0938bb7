//! Incremental ingestion of conflict events from a national news source.
//!
//! One batch walks the paginated latest-news index, keyword-gates the
//! headlines, and runs each survivor through fetch, zero-shot
//! classification, structured extraction, geocoding, and weather
//! enrichment before assembling the canonical record.

pub mod assemble;
pub mod classifier;
pub mod collector;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod geocode;
pub mod keywords;
pub mod pipeline;
pub mod retry;
pub mod types;
pub mod weather;

pub use assemble::{assemble_record, resolve_event_date};
pub use classifier::{ClassifySnippet, ZeroShotClassifier};
pub use collector::HeadlineCollector;
pub use error::IngestError;
pub use extractor::{ExtractEvent, LlmExtractor};
pub use fetcher::{ArticleFetcher, FetchArticle};
pub use geocode::{Geocode, PlaceGeocoder};
pub use pipeline::{run_ingest, IngestPipeline};
pub use types::{
    CandidateHeadline, ExtractedEvent, Geocoordinate, IngestConfig, WeatherObservation,
};
pub use weather::{ArchiveWeatherClient, FetchWeather};
