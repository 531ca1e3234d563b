// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event feed and drill (synthetic event) routes.

use crate::error::{AppError, Result};
use crate::models::SeismicEvent;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default feed window when the caller gives no bounds: the last 30 days.
const DEFAULT_WINDOW_MS: i64 = 30 * 24 * 60 * 60 * 1000;
/// Default magnitude floor for the public feed.
const DEFAULT_MIN_MAGNITUDE: f64 = 3.0;

/// Public feed route plus authenticated drill routes. Auth is applied to the
/// drill routes in routes/mod.rs.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/earthquakes", get(get_earthquakes))
}

pub fn drill_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/drills",
        get(list_drills).post(create_drill).delete(purge_drills),
    )
}

// ─── Event Feed ──────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedQuery {
    /// Window start (epoch ms). Defaults to 30 days ago.
    start_date: Option<i64>,
    /// Window end (epoch ms). Defaults to now.
    end_date: Option<i64>,
    min_magnitude: Option<f64>,
    /// Merge stored drill events into the response
    #[serde(default)]
    include_synthetic: bool,
}

/// Get normalized seismic events, newest first.
///
/// Upstream catalog records are normalized at the feed boundary; optionally
/// merged with stored drill events.
async fn get_earthquakes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FeedQuery>,
) -> Result<Json<Vec<SeismicEvent>>> {
    let end_ms = params
        .end_date
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
    let start_ms = params.start_date.unwrap_or(end_ms - DEFAULT_WINDOW_MS);
    let min_magnitude = params.min_magnitude.unwrap_or(DEFAULT_MIN_MAGNITUDE);

    if start_ms > end_ms {
        return Err(AppError::BadRequest(
            "startDate must not be after endDate".to_string(),
        ));
    }

    let mut events = state.feed.fetch_window(start_ms, end_ms, min_magnitude).await?;

    if params.include_synthetic {
        let drills = state.db.list_drill_events(start_ms, end_ms).await?;
        events.extend(
            drills
                .into_iter()
                .filter(|e| e.magnitude >= min_magnitude),
        );
        events.sort_by_key(|e| std::cmp::Reverse(e.occurred_at_ms));
    }

    Ok(Json(events))
}

// ─── Drills ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct DrillPayload {
    occurred_at_ms: i64,
    latitude: f64,
    longitude: f64,
    depth_km: f64,
    magnitude: f64,
    place: String,
}

#[derive(Serialize)]
struct DrillResponse {
    event: SeismicEvent,
    message: String,
}

/// Inject a synthetic event for a drill.
async fn create_drill(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DrillPayload>,
) -> Result<(StatusCode, Json<DrillResponse>)> {
    if payload.place.is_empty() {
        return Err(AppError::BadRequest("place is required".to_string()));
    }
    if !payload.magnitude.is_finite() || payload.magnitude < 0.0 || payload.magnitude > 10.0 {
        return Err(AppError::BadRequest(
            "magnitude must be between 0 and 10".to_string(),
        ));
    }

    let event = SeismicEvent {
        occurred_at_ms: payload.occurred_at_ms,
        latitude: Some(payload.latitude),
        longitude: Some(payload.longitude),
        depth_km: Some(payload.depth_km),
        magnitude: payload.magnitude,
        place: payload.place,
        is_synthetic: true,
    };

    state.db.set_drill_event(&event).await?;
    tracing::info!(place = %event.place, magnitude = event.magnitude, "Drill event created");

    Ok((
        StatusCode::CREATED,
        Json(DrillResponse {
            event,
            message: "Drill event created successfully".to_string(),
        }),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrillQuery {
    start_date: Option<i64>,
    end_date: Option<i64>,
}

/// List stored drill events, newest first.
async fn list_drills(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DrillQuery>,
) -> Result<Json<Vec<SeismicEvent>>> {
    let end_ms = params
        .end_date
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
    let start_ms = params.start_date.unwrap_or(0);

    let drills = state.db.list_drill_events(start_ms, end_ms).await?;
    Ok(Json(drills))
}

#[derive(Serialize)]
struct PurgeResponse {
    deleted: usize,
}

/// Bulk-purge all stored drill events.
async fn purge_drills(State(state): State<Arc<AppState>>) -> Result<Json<PurgeResponse>> {
    let deleted = state.db.purge_drill_events().await?;
    Ok(Json(PurgeResponse { deleted }))
}
