//! Write path for the `events` table.
//!
//! Records are inserted one at a time; a failure on one record never blocks
//! the rest of the batch. There is deliberately no transaction spanning a
//! batch — partial success is an accepted outcome of the daily pipeline.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use sitrep_core::NewEvent;

use crate::DbError;

/// A row from the `events` table.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
    pub event_date: NaiveDate,
    pub event_type: String,
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
    pub notes: Option<String>,
    pub weather_condition: Option<String>,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Insert a single event record and return its generated id.
///
/// The `geom` point column is generated by the database from
/// (`longitude`, `latitude`) and is never bound here.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_event(pool: &PgPool, event: &NewEvent) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO events \
             (event_date, event_type, actor1, actor2, country, admin1, admin2, admin3, \
              location, latitude, longitude, fatalities, civilian_targeting, \
              source, source_scale, source_url, notes, weather_condition, max_temp, min_temp) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20) \
         RETURNING id",
    )
    .bind(event.event_date)
    .bind(event.event_type.as_str())
    .bind(&event.actor1)
    .bind(&event.actor2)
    .bind(&event.country)
    .bind(&event.admin1)
    .bind(&event.admin2)
    .bind(&event.admin3)
    .bind(&event.location)
    .bind(event.latitude)
    .bind(event.longitude)
    .bind(event.fatalities)
    .bind(event.civilian_targeting)
    .bind(&event.source)
    .bind(&event.source_scale)
    .bind(&event.source_url)
    .bind(&event.notes)
    .bind(event.weather_condition.map(|c| c.as_str()))
    .bind(event.max_temp)
    .bind(event.min_temp)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Write a batch of assembled records, isolating per-record failures.
///
/// Each record is an independent insert; a failed insert is logged with its
/// source URL and skipped. Returns the number of records actually written.
pub async fn write_events(pool: &PgPool, events: &[NewEvent]) -> usize {
    let mut written = 0usize;

    for event in events {
        match insert_event(pool, event).await {
            Ok(id) => {
                tracing::debug!(id, source_url = %event.source_url, "event inserted");
                written += 1;
            }
            Err(e) => {
                tracing::warn!(
                    source_url = %event.source_url,
                    error = %e,
                    "event insert failed; skipping record"
                );
            }
        }
    }

    written
}
