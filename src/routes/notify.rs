// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fan-out trigger route.
//!
//! Called by the alert-detection path (watcher or drill injector) for one
//! event; never a public unauthenticated endpoint.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthRecipient;
use crate::models::SeismicEvent;
use crate::services::{NotifyOutcome, TriggerOverride};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Notification routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/notifications/earthquake", post(notify_earthquake))
}

#[derive(Deserialize)]
struct NotifyRequest {
    latitude: f64,
    longitude: f64,
    magnitude: f64,
    #[serde(default)]
    place: String,
    depth_km: Option<f64>,
    occurred_at_ms: Option<i64>,
    #[serde(default)]
    is_synthetic: bool,
    /// Live, not-yet-persisted settings of the triggering recipient
    current_settings: Option<TriggerOverride>,
}

/// Fan one event out to all SMS-enabled recipients in range.
///
/// A failed delivery is reported as 502 with the would-have-notified
/// recipient list preserved in the body for operator audit; it is never
/// retried here.
async fn notify_earthquake(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthRecipient>,
    Json(payload): Json<NotifyRequest>,
) -> Result<(StatusCode, Json<NotifyOutcome>)> {
    if !payload.latitude.is_finite()
        || !payload.longitude.is_finite()
        || !payload.magnitude.is_finite()
    {
        return Err(AppError::BadRequest(
            "latitude, longitude and magnitude are required".to_string(),
        ));
    }

    let event = SeismicEvent {
        occurred_at_ms: payload
            .occurred_at_ms
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
        latitude: Some(payload.latitude),
        longitude: Some(payload.longitude),
        depth_km: payload.depth_km,
        magnitude: payload.magnitude,
        place: payload.place,
        is_synthetic: payload.is_synthetic,
    };

    // Each invocation reads its own threshold snapshot
    let targets = state.db.load_sms_targets().await?;

    let trigger = match &payload.current_settings {
        Some(live) => {
            let recipient = state
                .db
                .get_recipient(&auth.recipient_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Recipient {} not found", auth.recipient_id))
                })?;
            Some((recipient, live))
        }
        None => None,
    };

    let outcome = state
        .notifier
        .notify(
            &event,
            trigger.as_ref().map(|(r, live)| (r, *live)),
            &targets,
        )
        .await;

    let status = if outcome.delivered {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((status, Json(outcome)))
}
