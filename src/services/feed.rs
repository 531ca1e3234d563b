// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event feed client for a USGS-compatible earthquake catalog.
//!
//! Raw feed records are normalized into [`SeismicEvent`] here and nowhere
//! else. Malformed records (no magnitude, or no coordinates and no place) are
//! dropped at this boundary so a corrected re-delivery is still evaluated
//! later.

use crate::models::SeismicEvent;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

/// Bounded timeout for one feed fetch; the monitor must never hang on a slow
/// provider.
const FEED_TIMEOUT: Duration = Duration::from_secs(10);

/// Philippines bounding box for the catalog query.
const BBOX_MIN_LATITUDE: f64 = 5.0;
const BBOX_MAX_LATITUDE: f64 = 20.0;
const BBOX_MIN_LONGITUDE: f64 = 115.0;
const BBOX_MAX_LONGITUDE: f64 = 130.0;

/// Source of recent seismic events.
///
/// The monitor is generic over this so tests can script the feed and drive
/// cycles deterministically.
pub trait EventFeed {
    /// Events in `[start_ms, end_ms]` at or above `min_magnitude`, newest
    /// first.
    fn recent_events(
        &self,
        start_ms: i64,
        end_ms: i64,
        min_magnitude: f64,
    ) -> impl Future<Output = Result<Vec<SeismicEvent>, FeedError>> + Send;
}

/// HTTP client for the upstream earthquake catalog.
#[derive(Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    base_url: String,
}

impl FeedClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(FEED_TIMEOUT)
                .build()
                .expect("reqwest client"),
            base_url,
        }
    }

    /// Fetch and normalize one catalog window.
    pub async fn fetch_window(
        &self,
        start_ms: i64,
        end_ms: i64,
        min_magnitude: f64,
    ) -> Result<Vec<SeismicEvent>, FeedError> {
        let start = format_epoch_ms(start_ms)?;
        let end = format_epoch_ms(end_ms)?;

        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("format", "geojson".to_string()),
                ("starttime", start),
                ("endtime", end),
                ("minmagnitude", min_magnitude.to_string()),
                ("minlatitude", BBOX_MIN_LATITUDE.to_string()),
                ("maxlatitude", BBOX_MAX_LATITUDE.to_string()),
                ("minlongitude", BBOX_MIN_LONGITUDE.to_string()),
                ("maxlongitude", BBOX_MAX_LONGITUDE.to_string()),
                ("orderby", "time".to_string()),
            ])
            .send()
            .await
            .map_err(|e| FeedError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Upstream(format!("HTTP {}: {}", status, body)));
        }

        let catalog: CatalogResponse = response
            .json()
            .await
            .map_err(|e| FeedError::Parse(e.to_string()))?;

        Ok(normalize(catalog))
    }
}

impl EventFeed for FeedClient {
    async fn recent_events(
        &self,
        start_ms: i64,
        end_ms: i64,
        min_magnitude: f64,
    ) -> Result<Vec<SeismicEvent>, FeedError> {
        self.fetch_window(start_ms, end_ms, min_magnitude).await
    }
}

fn format_epoch_ms(ms: i64) -> Result<String, FeedError> {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .ok_or_else(|| FeedError::Request(format!("timestamp out of range: {ms}")))
}

/// Convert the raw catalog payload into normalized events, dropping records
/// the engine cannot evaluate.
fn normalize(catalog: CatalogResponse) -> Vec<SeismicEvent> {
    let mut events = Vec::with_capacity(catalog.features.len());

    for feature in catalog.features {
        let Some(magnitude) = feature.properties.mag else {
            tracing::debug!("Dropping feed record without magnitude");
            continue;
        };

        let coords = &feature.geometry.coordinates;
        let longitude = coords.first().copied().filter(|v| v.is_finite());
        let latitude = coords.get(1).copied().filter(|v| v.is_finite());
        let depth_km = coords.get(2).copied().filter(|v| v.is_finite());
        let place = feature.properties.place.unwrap_or_default();

        if longitude.is_none() && latitude.is_none() && place.is_empty() {
            tracing::debug!("Dropping feed record with no epicenter and no place");
            continue;
        }

        events.push(SeismicEvent {
            occurred_at_ms: feature.properties.time,
            latitude,
            longitude,
            depth_km,
            magnitude,
            place,
            is_synthetic: false,
        });
    }

    // Catalog order is newest-first already, but don't rely on it
    events.sort_by_key(|e| std::cmp::Reverse(e.occurred_at_ms));
    events
}

/// Raw catalog response shapes (GeoJSON feature collection).
#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    features: Vec<CatalogFeature>,
}

#[derive(Debug, Deserialize)]
struct CatalogFeature {
    properties: CatalogProperties,
    geometry: CatalogGeometry,
}

#[derive(Debug, Deserialize)]
struct CatalogProperties {
    mag: Option<f64>,
    place: Option<String>,
    time: i64,
}

#[derive(Debug, Deserialize)]
struct CatalogGeometry {
    /// `[longitude, latitude, depth_km]`
    #[serde(default)]
    coordinates: Vec<f64>,
}

/// Errors from feed fetching. All of these are transient from the monitor's
/// point of view: the cycle is skipped and the next tick retries.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Feed request failed: {0}")]
    Request(String),

    #[error("Feed upstream error: {0}")]
    Upstream(String),

    #[error("Feed response parse error: {0}")]
    Parse(String),
}
