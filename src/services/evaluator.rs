// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-recipient match evaluation: does one event warrant an alert under one
//! effective threshold?

use crate::models::{LocalSettings, SeismicEvent};
use crate::services::gazetteer::Gazetteer;
use crate::services::geo::point_distance_km;
use geo::Point;

/// Where a recipient's alert anchor came from.
///
/// The fallback chain is explicit so callers can distinguish a configured
/// coordinate from a best-effort resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedAnchor {
    /// Explicitly configured coordinate
    Configured(Point<f64>),
    /// Resolved from the configured place label through the gazetteer
    Labeled(Point<f64>),
    /// Last-known device coordinate
    Device(Point<f64>),
    /// No location available; matching degrades to the magnitude gate alone
    MagnitudeOnly,
}

impl ResolvedAnchor {
    pub fn point(&self) -> Option<Point<f64>> {
        match self {
            ResolvedAnchor::Configured(p)
            | ResolvedAnchor::Labeled(p)
            | ResolvedAnchor::Device(p) => Some(*p),
            ResolvedAnchor::MagnitudeOnly => None,
        }
    }
}

/// Resolve the alert anchor for a recipient.
///
/// Order: configured coordinate, configured place label, device coordinate,
/// magnitude-only sentinel.
pub fn resolve_anchor(
    settings: &LocalSettings,
    device_location: Option<Point<f64>>,
    gazetteer: &Gazetteer,
) -> ResolvedAnchor {
    if let (Some(lat), Some(lon)) = (settings.latitude, settings.longitude) {
        return ResolvedAnchor::Configured(Point::new(lon, lat));
    }

    if let Some(label) = settings.location_label.as_deref() {
        if let Some(point) = gazetteer.lookup(label) {
            return ResolvedAnchor::Labeled(point);
        }
    }

    if let Some(point) = device_location {
        return ResolvedAnchor::Device(point);
    }

    ResolvedAnchor::MagnitudeOnly
}

/// Resolve the event's epicenter, preferring its own coordinates and falling
/// back to a gazetteer resolution of the place description.
pub fn event_epicenter(event: &SeismicEvent, gazetteer: &Gazetteer) -> Point<f64> {
    event
        .epicenter()
        .unwrap_or_else(|| gazetteer.resolve_or_default(&event.place))
}

/// Decide match/no-match for one event against one effective threshold.
///
/// The no-location case is fail-open: once the magnitude gate passes, a
/// recipient with no resolvable anchor is still alerted. Under-alerting is
/// worse than over-alerting here.
pub fn matches(
    event: &SeismicEvent,
    settings: &LocalSettings,
    device_location: Option<Point<f64>>,
    gazetteer: &Gazetteer,
) -> bool {
    if event.magnitude < settings.minimum_magnitude {
        return false;
    }

    let anchor = match resolve_anchor(settings, device_location, gazetteer).point() {
        Some(point) => point,
        None => return true,
    };

    let epicenter = event_epicenter(event, gazetteer);
    point_distance_km(anchor, epicenter) <= settings.radius_km
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gazetteer() -> Gazetteer {
        Gazetteer::load_from_json(
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {
                        "type": "Feature",
                        "properties": { "name": "Manila, Philippines" },
                        "geometry": { "type": "Point", "coordinates": [120.9842, 14.5995] }
                    },
                    {
                        "type": "Feature",
                        "properties": { "name": "Baguio, Philippines" },
                        "geometry": { "type": "Point", "coordinates": [120.5960, 16.4023] }
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    fn settings(lat: f64, lon: f64, min_mag: f64, radius: f64) -> LocalSettings {
        LocalSettings {
            minimum_magnitude: min_mag,
            radius_km: radius,
            latitude: Some(lat),
            longitude: Some(lon),
            location_label: None,
        }
    }

    fn event(lat: f64, lon: f64, magnitude: f64) -> SeismicEvent {
        SeismicEvent {
            occurred_at_ms: 1_700_000_000_000,
            latitude: Some(lat),
            longitude: Some(lon),
            depth_km: Some(10.0),
            magnitude,
            place: "somewhere offshore".to_string(),
            is_synthetic: false,
        }
    }

    #[test]
    fn test_nearby_event_matches() {
        let s = settings(14.60, 120.98, 4.0, 100.0);
        assert!(matches(&event(14.65, 121.03, 4.5), &s, None, &gazetteer()));
    }

    #[test]
    fn test_magnitude_gate_rejects() {
        let s = settings(14.60, 120.98, 4.0, 100.0);
        assert!(!matches(&event(14.65, 121.03, 3.9), &s, None, &gazetteer()));
    }

    #[test]
    fn test_distant_event_rejected() {
        // Baguio is roughly 204 km from Manila, outside a 100 km radius
        let s = settings(14.60, 120.98, 4.0, 100.0);
        assert!(!matches(&event(16.40, 120.60, 5.0), &s, None, &gazetteer()));
    }

    #[test]
    fn test_anchor_prefers_configured_coordinate() {
        let mut s = settings(14.60, 120.98, 4.0, 100.0);
        s.location_label = Some("Baguio, Philippines".to_string());

        let anchor = resolve_anchor(&s, Some(Point::new(0.0, 0.0)), &gazetteer());
        assert!(matches!(anchor, ResolvedAnchor::Configured(_)));
    }

    #[test]
    fn test_anchor_falls_back_to_label_then_device() {
        let mut s = LocalSettings {
            location_label: Some("Baguio, Philippines".to_string()),
            ..LocalSettings::default()
        };

        let anchor = resolve_anchor(&s, None, &gazetteer());
        match anchor {
            ResolvedAnchor::Labeled(p) => assert_eq!(p.y(), 16.4023),
            other => panic!("expected labeled anchor, got {other:?}"),
        }

        s.location_label = Some("Atlantis".to_string());
        let device = Point::new(121.0, 14.6);
        let anchor = resolve_anchor(&s, Some(device), &gazetteer());
        assert_eq!(anchor, ResolvedAnchor::Device(device));
    }

    #[test]
    fn test_no_location_is_magnitude_only_and_fail_open() {
        let s = LocalSettings::default();
        assert_eq!(
            resolve_anchor(&s, None, &gazetteer()),
            ResolvedAnchor::MagnitudeOnly
        );

        // Magnitude gate passed with no anchor: alert anyway
        assert!(matches(&event(16.40, 120.60, 4.5), &s, None, &gazetteer()));
        // Magnitude gate still applies
        assert!(!matches(&event(16.40, 120.60, 3.0), &s, None, &gazetteer()));
    }

    #[test]
    fn test_event_without_coordinates_resolves_place() {
        let s = settings(14.60, 120.98, 4.0, 50.0);
        let mut e = event(0.0, 0.0, 5.0);
        e.latitude = None;
        e.longitude = None;
        e.place = "Manila, Philippines".to_string();

        // Place resolves to Manila, well inside the radius
        assert!(matches(&e, &s, None, &gazetteer()));
    }

    #[test]
    fn test_magnitude_gate_monotonicity() {
        let s = settings(14.60, 120.98, 4.0, 100.0);
        let g = gazetteer();
        let base = event(14.65, 121.03, 4.2);
        assert!(matches(&base, &s, None, &g));

        for bump in [0.0, 0.3, 1.0, 3.0] {
            let stronger = event(14.65, 121.03, 4.2 + bump);
            assert!(matches(&stronger, &s, None, &g));
        }
    }
}
