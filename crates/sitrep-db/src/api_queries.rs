//! Read queries backing the dashboard API.
//!
//! All of these are simple parameterized aggregations over the `events`
//! table; the shapes mirror what the dashboard charts consume.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use sqlx::{PgPool, QueryBuilder};

use crate::events::EventRow;
use crate::DbError;

/// Filter parameters for the GeoJSON event query.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub states: Option<Vec<String>>,
    pub event_types: Option<Vec<String>>,
    pub from_year: Option<i32>,
    pub to_year: Option<i32>,
}

/// One event row destined for a GeoJSON `Feature`.
///
/// `geometry` is the server-computed point rendered by `ST_AsGeoJSON`, or
/// `None` for records that never geocoded.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventFeatureRow {
    pub id: i64,
    pub event_date: NaiveDate,
    pub event_type: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geometry: Option<Value>,
    pub fatalities: i32,
    pub notes: Option<String>,
}

/// Fetch events matching the filter, with their GeoJSON geometry.
///
/// Filters compose with AND; an unset filter component matches everything.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn fetch_filtered_events(
    pool: &PgPool,
    filter: &EventFilter,
) -> Result<Vec<EventFeatureRow>, DbError> {
    let mut builder = QueryBuilder::new(
        "SELECT id, event_date, event_type, location, latitude, longitude, \
                ST_AsGeoJSON(geom)::jsonb AS geometry, fatalities, notes \
         FROM events WHERE 1=1",
    );

    if let Some(states) = &filter.states {
        builder.push(" AND admin1 = ANY(");
        builder.push_bind(states.clone());
        builder.push(")");
    }
    if let Some(event_types) = &filter.event_types {
        builder.push(" AND event_type = ANY(");
        builder.push_bind(event_types.clone());
        builder.push(")");
    }
    if let Some(from_year) = filter.from_year {
        builder.push(" AND event_date >= make_date(");
        builder.push_bind(from_year);
        builder.push(", 1, 1)");
    }
    if let Some(to_year) = filter.to_year {
        builder.push(" AND event_date <= make_date(");
        builder.push_bind(to_year);
        builder.push(", 12, 31)");
    }

    builder.push(" ORDER BY event_date DESC, id DESC");

    let rows = builder
        .build_query_as::<EventFeatureRow>()
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Fetch a single event row by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when no row has that id, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_event_by_id(pool: &PgPool, id: i64) -> Result<EventRow, DbError> {
    let row = sqlx::query_as::<_, EventRow>(
        "SELECT id, event_date, event_type, actor1, actor2, country, admin1, admin2, admin3, \
                location, latitude, longitude, fatalities, civilian_targeting, source, \
                source_scale, source_url, notes, weather_condition, max_temp, min_temp, created_at \
         FROM events WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Headline KPI counts for the dashboard cards.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct KpiSummaryRow {
    pub total_events: i64,
    pub events_this_week: i64,
    pub fatalities: i64,
    pub explosions: i64,
    pub strategic: i64,
    pub civilian_targeting: i64,
}

/// Aggregate KPI counts across all events.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_kpi_summary(pool: &PgPool) -> Result<KpiSummaryRow, DbError> {
    let row = sqlx::query_as::<_, KpiSummaryRow>(
        "SELECT COUNT(*) AS total_events, \
                COALESCE(SUM(CASE WHEN event_date >= date_trunc('week', CURRENT_DATE) - INTERVAL '7 days' \
                                   AND event_date < date_trunc('week', CURRENT_DATE) \
                             THEN 1 ELSE 0 END), 0) AS events_this_week, \
                COALESCE(SUM(fatalities), 0) AS fatalities, \
                COALESCE(SUM(CASE WHEN event_type = 'Explosions/Remote violence' THEN 1 ELSE 0 END), 0) AS explosions, \
                COALESCE(SUM(CASE WHEN event_type = 'Strategic developments' THEN 1 ELSE 0 END), 0) AS strategic, \
                COALESCE(SUM(civilian_targeting), 0) AS civilian_targeting \
         FROM events",
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Per-quarter event counts broken down by category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TrendRow {
    pub quarter_year: String,
    pub violence: i64,
    pub strategic: i64,
    pub battles: i64,
    pub explosions: i64,
}

/// Quarterly trend of event counts per category, oldest quarter first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_event_trend(pool: &PgPool) -> Result<Vec<TrendRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendRow>(
        "SELECT CONCAT('Q', EXTRACT(QUARTER FROM event_date), ' ', EXTRACT(YEAR FROM event_date)) AS quarter_year, \
                SUM(CASE WHEN event_type = 'Violence against civilians' THEN 1 ELSE 0 END) AS violence, \
                SUM(CASE WHEN event_type = 'Strategic developments' THEN 1 ELSE 0 END) AS strategic, \
                SUM(CASE WHEN event_type = 'Battles' THEN 1 ELSE 0 END) AS battles, \
                SUM(CASE WHEN event_type = 'Explosions/Remote violence' THEN 1 ELSE 0 END) AS explosions \
         FROM events \
         GROUP BY quarter_year \
         ORDER BY MIN(event_date)",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// One entry in the most-recent-events timeline.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TimelineRow {
    pub date: String,
    pub event_type: String,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub fatalities: i32,
}

/// The ten most recent events, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_event_timeline(pool: &PgPool) -> Result<Vec<TimelineRow>, DbError> {
    let rows = sqlx::query_as::<_, TimelineRow>(
        "SELECT TO_CHAR(event_date, 'Month DD, YYYY') AS date, \
                event_type, \
                NULLIF(CONCAT_WS(', ', admin2, admin1), '') AS location, \
                notes, fatalities \
         FROM events \
         ORDER BY event_date DESC, id DESC \
         LIMIT 10",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Total event count per category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TypeSummaryRow {
    pub battles: i64,
    pub explosions: i64,
    pub strategic: i64,
    pub violence: i64,
}

/// Per-category event totals for the pie chart.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_event_type_summary(pool: &PgPool) -> Result<TypeSummaryRow, DbError> {
    let row = sqlx::query_as::<_, TypeSummaryRow>(
        "SELECT COALESCE(SUM(CASE WHEN event_type = 'Battles' THEN 1 ELSE 0 END), 0) AS battles, \
                COALESCE(SUM(CASE WHEN event_type = 'Explosions/Remote violence' THEN 1 ELSE 0 END), 0) AS explosions, \
                COALESCE(SUM(CASE WHEN event_type = 'Strategic developments' THEN 1 ELSE 0 END), 0) AS strategic, \
                COALESCE(SUM(CASE WHEN event_type = 'Violence against civilians' THEN 1 ELSE 0 END), 0) AS violence \
         FROM events",
    )
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// One of the top-5 locations by event count.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopLocationRow {
    pub admin2: Option<String>,
    pub admin1: Option<String>,
    pub event_count: i64,
    pub fatalities: i64,
}

/// The five (district, state) pairs with the most events.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_top_locations(pool: &PgPool) -> Result<Vec<TopLocationRow>, DbError> {
    let rows = sqlx::query_as::<_, TopLocationRow>(
        "SELECT admin2, admin1, COUNT(*) AS event_count, COALESCE(SUM(fatalities), 0) AS fatalities \
         FROM events \
         GROUP BY admin2, admin1 \
         ORDER BY event_count DESC \
         LIMIT 5",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fatality totals per category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FatalitiesByTypeRow {
    pub event_type: String,
    pub fatalities: i64,
}

/// Fatalities summed per category.
///
/// Strategic developments are excluded: those records track deployments and
/// decisions, so their fatality counts would only add noise to the chart.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_event_fatalities(pool: &PgPool) -> Result<Vec<FatalitiesByTypeRow>, DbError> {
    let rows = sqlx::query_as::<_, FatalitiesByTypeRow>(
        "SELECT event_type, COALESCE(SUM(fatalities), 0) AS fatalities \
         FROM events \
         WHERE event_type != 'Strategic developments' \
         GROUP BY event_type",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
