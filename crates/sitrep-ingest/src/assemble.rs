//! Final record assembly from the pipeline's stage outputs.

use chrono::NaiveDate;
use sitrep_core::{EventType, NewEvent, DEFAULT_COUNTRY, SOURCE_NAME, SOURCE_SCALE};

use crate::types::{CandidateHeadline, ExtractedEvent, Geocoordinate, WeatherObservation};

/// Resolve the event date from the extraction, the headline's publication
/// timestamp, and finally the run date.
pub fn resolve_event_date(
    extracted: &ExtractedEvent,
    headline: &CandidateHeadline,
    today: NaiveDate,
) -> NaiveDate {
    if let Some(date) = extracted
        .event_date
        .as_deref()
        .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
    {
        return date;
    }
    // Publication timestamps open with the YYYY-MM-DD date.
    if let Some(date) = headline
        .published_at
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    {
        return date;
    }
    today
}

/// Build the canonical record. Pure: every input has already been fetched.
#[must_use]
pub fn assemble_record(
    headline: &CandidateHeadline,
    extracted: &ExtractedEvent,
    event_type: EventType,
    event_date: NaiveDate,
    coordinate: Option<Geocoordinate>,
    weather: WeatherObservation,
) -> NewEvent {
    let fatalities = extracted
        .fatalities
        .and_then(|n| i32::try_from(n).ok())
        .map_or(0, |n| n.max(0));
    let civilian_targeting = i16::from(extracted.civilian_targeting == Some(1));

    NewEvent {
        event_date,
        event_type,
        actor1: non_empty(extracted.actor1.as_deref()),
        actor2: non_empty(extracted.actor2.as_deref()),
        admin1: non_empty(extracted.admin1.as_deref()),
        admin2: non_empty(extracted.admin2.as_deref()),
        admin3: None,
        location: non_empty(extracted.location.as_deref()),
        country: non_empty(extracted.country.as_deref())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        latitude: coordinate.map(|c| c.lat),
        longitude: coordinate.map(|c| c.lon),
        fatalities,
        civilian_targeting,
        source: SOURCE_NAME.to_string(),
        source_scale: SOURCE_SCALE.to_string(),
        source_url: headline.url.clone(),
        notes: Some(headline.title.clone()),
        weather_condition: weather.condition,
        max_temp: weather.max_temp,
        min_temp: weather.min_temp,
    }
}

fn non_empty(field: Option<&str>) -> Option<String> {
    field
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}
