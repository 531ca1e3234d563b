// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Alert threshold models: the persisted per-recipient configuration and the
//! client-side effective settings.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default minimum magnitude for a new threshold.
pub const DEFAULT_MINIMUM_MAGNITUDE: f64 = 4.0;
/// Default alert radius in kilometers for a new threshold.
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Stored alert threshold record in Firestore (one per recipient).
///
/// Owned and mutated only by its recipient; updates are full replaces with no
/// history retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertThreshold {
    /// Recipient id (also used as document id)
    pub owner_id: String,
    /// Anchor latitude
    pub latitude: f64,
    /// Anchor longitude
    pub longitude: f64,
    /// Human-readable anchor label (e.g. "Quezon City, Philippines")
    pub location_label: String,
    /// Minimum magnitude to alert on
    pub minimum_magnitude: f64,
    /// Alert radius around the anchor, in kilometers
    pub radius_km: f64,
    /// Deliver SMS alerts for matching events
    pub sms_enabled: bool,
    /// Raise local (push-style) alerts for matching events
    pub push_enabled: bool,
    /// When this record was last written (RFC 3339)
    pub updated_at: String,
}

/// Request payload for creating or replacing a threshold.
///
/// Validation happens here, at the write boundary; matching logic may assume
/// validated input.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ThresholdPayload {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(length(min = 1, max = 200))]
    pub location_label: String,
    #[validate(range(min = 0.0, max = 10.0))]
    #[serde(default = "default_minimum_magnitude")]
    pub minimum_magnitude: f64,
    #[validate(range(exclusive_min = 0.0))]
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
    #[serde(default)]
    pub sms_enabled: bool,
    #[serde(default = "default_push_enabled")]
    pub push_enabled: bool,
}

fn default_minimum_magnitude() -> f64 {
    DEFAULT_MINIMUM_MAGNITUDE
}

fn default_radius_km() -> f64 {
    DEFAULT_RADIUS_KM
}

fn default_push_enabled() -> bool {
    true
}

impl ThresholdPayload {
    /// Build the stored record for `owner_id`.
    pub fn into_threshold(self, owner_id: &str, now: &str) -> AlertThreshold {
        AlertThreshold {
            owner_id: owner_id.to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            location_label: self.location_label,
            minimum_magnitude: self.minimum_magnitude,
            radius_km: self.radius_km,
            sms_enabled: self.sms_enabled,
            push_enabled: self.push_enabled,
            updated_at: now.to_string(),
        }
    }
}

/// The client-side effective threshold used by the event monitor.
///
/// Unlike [`AlertThreshold`], the anchor is optional: a recipient may run the
/// watcher with no configured location at all, in which case matching falls
/// back to the device coordinate, then to magnitude-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSettings {
    pub minimum_magnitude: f64,
    pub radius_km: f64,
    /// Configured anchor latitude, if the recipient picked a location
    pub latitude: Option<f64>,
    /// Configured anchor longitude, if the recipient picked a location
    pub longitude: Option<f64>,
    /// Configured place label, resolvable through the gazetteer
    pub location_label: Option<String>,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            minimum_magnitude: DEFAULT_MINIMUM_MAGNITUDE,
            radius_km: DEFAULT_RADIUS_KM,
            latitude: None,
            longitude: None,
            location_label: None,
        }
    }
}
