//! Dashboard read endpoints over the events table.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sitrep_db::{DbError, EventFeatureRow, EventFilter};

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Comma-separated state (admin1) names.
    pub states: Option<String>,
    /// Comma-separated canonical category strings.
    pub event_types: Option<String>,
    pub from_year: Option<i32>,
    pub to_year: Option<i32>,
}

/// Split a comma-separated query value into trimmed, non-empty entries.
fn csv_list(raw: Option<&str>) -> Option<Vec<String>> {
    let values: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

impl EventsQuery {
    fn into_filter(self) -> EventFilter {
        EventFilter {
            states: csv_list(self.states.as_deref()),
            event_types: csv_list(self.event_types.as_deref()),
            from_year: self.from_year,
            to_year: self.to_year,
        }
    }
}

/// Render one event row as a GeoJSON `Feature`.
///
/// Missing location and notes render as "N/A" here, at the presentation
/// boundary only; the stored rows keep their nulls.
fn feature_from_row(row: &EventFeatureRow) -> Value {
    json!({
        "type": "Feature",
        "geometry": row.geometry,
        "properties": {
            "id": row.id,
            "event_date": row.event_date.format("%Y-%m-%d").to_string(),
            "event_type": row.event_type,
            "location": row.location.as_deref().unwrap_or("N/A"),
            "fatalities": row.fatalities,
            "notes": row.notes.as_deref().unwrap_or("N/A"),
        }
    })
}

pub async fn events_geojson(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<EventsQuery>,
) -> impl IntoResponse {
    let filter = query.into_filter();
    match sitrep_db::fetch_filtered_events(&state.pool, &filter).await {
        Ok(rows) => {
            // The map only plots geocoded events.
            let features: Vec<Value> = rows
                .iter()
                .filter(|row| row.geometry.is_some())
                .map(feature_from_row)
                .collect();
            Ok(Json(ApiResponse {
                data: json!({
                    "type": "FeatureCollection",
                    "features": features,
                }),
                meta: ResponseMeta::new(req_id.0),
            }))
        }
        Err(e) => Err(map_db_error(req_id.0, &e)),
    }
}

pub async fn event_by_id(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match sitrep_db::get_event_by_id(&state.pool, id).await {
        Ok(row) => Ok(Json(ApiResponse {
            data: row,
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(DbError::NotFound) => Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("no event with id {id}"),
        )),
        Err(e) => Err(map_db_error(req_id.0, &e)),
    }
}

pub async fn kpi_summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match sitrep_db::get_kpi_summary(&state.pool).await {
        Ok(row) => Ok(Json(ApiResponse {
            data: row,
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(e) => Err(map_db_error(req_id.0, &e)),
    }
}

pub async fn event_trend(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match sitrep_db::get_event_trend(&state.pool).await {
        Ok(rows) => Ok(Json(ApiResponse {
            data: rows,
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(e) => Err(map_db_error(req_id.0, &e)),
    }
}

pub async fn event_timeline(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match sitrep_db::get_event_timeline(&state.pool).await {
        Ok(rows) => Ok(Json(ApiResponse {
            data: rows,
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(e) => Err(map_db_error(req_id.0, &e)),
    }
}

pub async fn event_types_summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match sitrep_db::get_event_type_summary(&state.pool).await {
        Ok(row) => Ok(Json(ApiResponse {
            data: row,
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(e) => Err(map_db_error(req_id.0, &e)),
    }
}

pub async fn top_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match sitrep_db::get_top_locations(&state.pool).await {
        Ok(rows) => Ok(Json(ApiResponse {
            data: rows,
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(e) => Err(map_db_error(req_id.0, &e)),
    }
}

pub async fn event_fatalities(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match sitrep_db::get_event_fatalities(&state.pool).await {
        Ok(rows) => Ok(Json(ApiResponse {
            data: rows,
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(e) => Err(map_db_error(req_id.0, &e)),
    }
}
