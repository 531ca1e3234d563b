// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Static place-name gazetteer for approximate coordinate resolution.
//!
//! Feed records occasionally arrive without epicenter coordinates, and local
//! settings may anchor on a place label instead of an explicit coordinate.
//! Both resolve through this lookup table.

use geo::Point;
use geojson::GeoJson;
use std::fs;
use std::path::Path;

/// Fallback anchor used when a place name cannot be resolved: Manila.
pub const DEFAULT_ANCHOR: (f64, f64) = (120.9842, 14.5995);

/// A named place with its representative coordinate.
#[derive(Debug, Clone)]
struct Place {
    name: String,
    point: Point<f64>,
}

/// Service for resolving place names to coordinates.
#[derive(Default, Clone)]
pub struct Gazetteer {
    places: Vec<Place>,
}

impl Gazetteer {
    /// Load places from a GeoJSON file of `Point` features.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, GazetteerError> {
        let json_data = fs::read_to_string(path.as_ref())
            .map_err(|e| GazetteerError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load places from a GeoJSON string.
    pub fn load_from_json(json_data: &str) -> Result<Self, GazetteerError> {
        let geojson: GeoJson = json_data
            .parse()
            .map_err(|e: geojson::Error| GazetteerError::ParseError(e.to_string()))?;

        let mut places = Vec::new();

        if let GeoJson::FeatureCollection(collection) = geojson {
            for feature in collection.features {
                let name = match feature.property("name").and_then(|v| v.as_str()) {
                    Some(n) if !n.is_empty() => n.to_string(),
                    // A nameless place can never be looked up
                    _ => continue,
                };

                if let Some(geom) = feature.geometry {
                    use std::convert::TryInto;
                    let point: Point<f64> = geom
                        .value
                        .try_into()
                        .map_err(|_| GazetteerError::UnsupportedGeometry)?;
                    places.push(Place { name, point });
                }
            }
        }

        tracing::info!(count = places.len(), "Loaded gazetteer places");
        Ok(Self { places })
    }

    /// Number of places in the table.
    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Look up a place name: exact match first, then a partial city-name
    /// match in either direction ("Lucena" vs "12 km SE of Lucena,
    /// Philippines").
    pub fn lookup(&self, name: &str) -> Option<Point<f64>> {
        if name.is_empty() {
            return None;
        }

        if let Some(place) = self.places.iter().find(|p| p.name == name) {
            return Some(place.point);
        }

        let query_lower = name.to_lowercase();
        let query_city = city_part(&query_lower);

        self.places
            .iter()
            .find(|p| {
                let key_lower = p.name.to_lowercase();
                let key_city = city_part(&key_lower);
                query_lower.contains(key_city) || key_lower.contains(query_city)
            })
            .map(|p| p.point)
    }

    /// Look up a place name, falling back to [`DEFAULT_ANCHOR`] on a miss.
    ///
    /// Evaluation proceeds on a geocoding miss rather than failing closed.
    pub fn resolve_or_default(&self, name: &str) -> Point<f64> {
        self.lookup(name).unwrap_or_else(|| {
            tracing::debug!(place = name, "Gazetteer miss, using default anchor");
            Point::new(DEFAULT_ANCHOR.0, DEFAULT_ANCHOR.1)
        })
    }
}

/// First comma-separated segment, trimmed ("Lucena, Philippines" -> "lucena").
fn city_part(name: &str) -> &str {
    name.split(',').next().unwrap_or(name).trim()
}

/// Errors from gazetteer loading.
#[derive(Debug, thiserror::Error)]
pub enum GazetteerError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse GeoJSON: {0}")]
    ParseError(String),

    #[error("Unsupported geometry type (expected Point)")]
    UnsupportedGeometry,
}
