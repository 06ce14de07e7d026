//! Minimal GeoJSON envelopes handed to the map layer.
//!
//! Geometry is kept as raw JSON: polygons come straight from the spatial
//! backend and are never inspected here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature<P> {
    pub properties: P,
    pub geometry: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection<P> {
    pub features: Vec<Feature<P>>,
}

impl<P> FeatureCollection<P> {
    #[must_use]
    pub fn new(features: Vec<Feature<P>>) -> Self {
        Self { features }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl<P> Default for FeatureCollection<P> {
    fn default() -> Self {
        Self {
            features: Vec::new(),
        }
    }
}

/// GeoJSON point geometry; note the `[lng, lat]` order.
#[must_use]
pub fn point(longitude: f64, latitude: f64) -> serde_json::Value {
    serde_json::json!({
        "type": "Point",
        "coordinates": [longitude, latitude],
    })
}
