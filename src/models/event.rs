// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Normalized seismic event model.
//!
//! Every record entering the engine is converted to [`SeismicEvent`] exactly
//! once, at the feed boundary. Downstream code never sees the raw feed shape.

use geo::Point;
use serde::{Deserialize, Serialize};

/// A single seismic event as observed from the feed.
///
/// Value type: never mutated after construction. Coordinates may be absent
/// on some feed records; matching then resolves the epicenter from `place`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeismicEvent {
    /// Occurrence time (Unix epoch milliseconds)
    pub occurred_at_ms: i64,
    /// Epicenter latitude (absent on some provider records)
    pub latitude: Option<f64>,
    /// Epicenter longitude (absent on some provider records)
    pub longitude: Option<f64>,
    /// Hypocenter depth in kilometers
    pub depth_km: Option<f64>,
    /// Magnitude
    pub magnitude: f64,
    /// Human-readable place description (e.g. "12 km SE of Lucena, Philippines")
    pub place: String,
    /// True for operator-injected drill events
    #[serde(default)]
    pub is_synthetic: bool,
}

impl SeismicEvent {
    /// Deterministic identity derived from event content.
    ///
    /// The feed supplies no stable primary id, so place + magnitude +
    /// occurrence time serve as the natural key.
    pub fn identity(&self) -> String {
        format!("{}-{}-{}", self.place, self.magnitude, self.occurred_at_ms)
    }

    /// Epicenter as a point, when the record carries its own coordinates.
    pub fn epicenter(&self) -> Option<Point<f64>> {
        match (self.longitude, self.latitude) {
            (Some(lon), Some(lat)) if lon.is_finite() && lat.is_finite() => {
                Some(Point::new(lon, lat))
            }
            _ => None,
        }
    }
}
