// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Alert threshold routes for authenticated recipients.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthRecipient;
use crate::models::{AlertThreshold, ThresholdPayload};
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

/// Threshold routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/thresholds",
        get(list_thresholds).post(create_threshold).put(update_threshold),
    )
}

/// Response wrapper for threshold writes.
#[derive(Serialize)]
pub struct ThresholdResponse {
    pub threshold: AlertThreshold,
    pub message: String,
}

/// List the caller's thresholds.
///
/// The current design stores one threshold per recipient; the response is an
/// array so the shape survives a future many-thresholds design.
async fn list_thresholds(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthRecipient>,
) -> Result<Json<Vec<AlertThreshold>>> {
    let thresholds = state
        .db
        .get_threshold(&auth.recipient_id)
        .await?
        .into_iter()
        .collect();
    Ok(Json(thresholds))
}

/// Create the caller's threshold.
async fn create_threshold(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthRecipient>,
    Json(payload): Json<ThresholdPayload>,
) -> Result<(StatusCode, Json<ThresholdResponse>)> {
    validate(&payload)?;

    let threshold = payload.into_threshold(&auth.recipient_id, &now_rfc3339());
    state.db.set_threshold(&threshold).await?;

    tracing::info!(owner = %auth.recipient_id, "Alert threshold created");
    Ok((
        StatusCode::CREATED,
        Json(ThresholdResponse {
            threshold,
            message: "Alert threshold created successfully".to_string(),
        }),
    ))
}

/// Fully replace the caller's threshold. No history is retained.
async fn update_threshold(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthRecipient>,
    Json(payload): Json<ThresholdPayload>,
) -> Result<Json<ThresholdResponse>> {
    validate(&payload)?;

    if state.db.get_threshold(&auth.recipient_id).await?.is_none() {
        return Err(AppError::NotFound("Alert threshold not found".to_string()));
    }

    let threshold = payload.into_threshold(&auth.recipient_id, &now_rfc3339());
    state.db.set_threshold(&threshold).await?;

    tracing::info!(owner = %auth.recipient_id, "Alert threshold updated");
    Ok(Json(ThresholdResponse {
        threshold,
        message: "Alert threshold updated successfully".to_string(),
    }))
}

/// Reject invalid configuration at the write boundary so matching logic can
/// assume validated input.
fn validate(payload: &ThresholdPayload) -> Result<()> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid threshold: {e}")))
}
