//! Domain types for security/conflict event records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Source metadata stamped on every record produced by the daily pipeline.
pub const SOURCE_NAME: &str = "The Hindu";
pub const SOURCE_SCALE: &str = "national";

/// Country substituted when the extraction does not name one.
pub const DEFAULT_COUNTRY: &str = "India";

/// Coarse event category, matching the ACLED-style taxonomy the dashboard
/// aggregates by.
///
/// `Other` is terminal: a headline classified as `Other` (or below the
/// model's confidence threshold) never reaches extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    StrategicDevelopments,
    Battles,
    ExplosionsRemoteViolence,
    ViolenceAgainstCivilians,
    Other,
}

impl EventType {
    /// Canonical string stored in the `events.event_type` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::StrategicDevelopments => "Strategic developments",
            EventType::Battles => "Battles",
            EventType::ExplosionsRemoteViolence => "Explosions/Remote violence",
            EventType::ViolenceAgainstCivilians => "Violence against civilians",
            EventType::Other => "Other",
        }
    }

    /// Parse the canonical column string back into a variant.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "Strategic developments" => Some(EventType::StrategicDevelopments),
            "Battles" => Some(EventType::Battles),
            "Explosions/Remote violence" => Some(EventType::ExplosionsRemoteViolence),
            "Violence against civilians" => Some(EventType::ViolenceAgainstCivilians),
            "Other" => Some(EventType::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Simplified weather condition bucketed from a WMO daily weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    FogHaze,
    Rain,
    Snow,
    Thunderstorm,
    Extreme,
    Unknown,
}

impl WeatherCondition {
    /// Bucket a raw WMO weather code into a simplified condition.
    ///
    /// An absent code maps to `Unknown`; a present code outside every known
    /// range maps to `Extreme`.
    #[must_use]
    pub fn from_code(code: Option<i32>) -> Self {
        let Some(code) = code else {
            return WeatherCondition::Unknown;
        };
        match code {
            0 => WeatherCondition::Clear,
            1..=3 => WeatherCondition::Cloudy,
            45..=48 => WeatherCondition::FogHaze,
            51..=67 | 80..=86 => WeatherCondition::Rain,
            71..=77 => WeatherCondition::Snow,
            95..=99 => WeatherCondition::Thunderstorm,
            _ => WeatherCondition::Extreme,
        }
    }

    /// Canonical string stored in the `events.weather_condition` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear",
            WeatherCondition::Cloudy => "Cloudy",
            WeatherCondition::FogHaze => "Fog/Haze",
            WeatherCondition::Rain => "Rain",
            WeatherCondition::Snow => "Snow",
            WeatherCondition::Thunderstorm => "Thunderstorm",
            WeatherCondition::Extreme => "Extreme",
            WeatherCondition::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully assembled, store-ready event record.
///
/// Created once per accepted headline per pipeline run, immutable thereafter,
/// and persisted exactly once — there is no update path. `event_date` and
/// `event_type` are always present; every enrichment field degrades to
/// `None`/`0` rather than blocking the write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub event_date: NaiveDate,
    pub event_type: EventType,
    pub actor1: Option<String>,
    pub actor2: Option<String>,
    pub country: String,
    pub admin1: Option<String>,
    pub admin2: Option<String>,
    pub admin3: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub fatalities: i32,
    pub civilian_targeting: i16,
    pub source: String,
    pub source_scale: String,
    pub source_url: String,
    /// Headline title, kept as free-text context for the timeline view.
    pub notes: Option<String>,
    pub weather_condition: Option<WeatherCondition>,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
}
