//! Coordinates, bounding boxes and distance helpers.

use serde::{Deserialize, Serialize};

use crate::retailers::Retailer;
use crate::CoreError;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Builds a validated bounding box.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidBounds`] when an edge is not finite, lies
    /// outside the valid degree range, or `south > north`.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self, CoreError> {
        let edges = [west, south, east, north];
        if edges.iter().any(|v| !v.is_finite()) {
            return Err(CoreError::InvalidBounds(
                "edges must be finite numbers".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&south) || !(-90.0..=90.0).contains(&north) {
            return Err(CoreError::InvalidBounds(format!(
                "latitudes {south}..{north} outside -90..=90"
            )));
        }
        if !(-180.0..=180.0).contains(&west) || !(-180.0..=180.0).contains(&east) {
            return Err(CoreError::InvalidBounds(format!(
                "longitudes {west}..{east} outside -180..=180"
            )));
        }
        if south > north {
            return Err(CoreError::InvalidBounds(format!(
                "south {south} is north of {north}"
            )));
        }
        Ok(Self {
            west,
            south,
            east,
            north,
        })
    }

    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        position.latitude >= self.south
            && position.latitude <= self.north
            && position.longitude >= self.west
            && position.longitude <= self.east
    }

    #[must_use]
    pub fn center(&self) -> Position {
        Position {
            latitude: (self.south + self.north) / 2.0,
            longitude: (self.west + self.east) / 2.0,
        }
    }
}

/// Smallest bounding box containing every mappable retailer.
///
/// Returns `None` when no record has coordinates.
#[must_use]
pub fn fit_bounds(retailers: &[Retailer]) -> Option<BoundingBox> {
    retailers
        .iter()
        .filter_map(Retailer::position)
        .fold(None, |acc: Option<BoundingBox>, p| {
            Some(match acc {
                None => BoundingBox {
                    west: p.longitude,
                    south: p.latitude,
                    east: p.longitude,
                    north: p.latitude,
                },
                Some(b) => BoundingBox {
                    west: b.west.min(p.longitude),
                    south: b.south.min(p.latitude),
                    east: b.east.max(p.longitude),
                    north: b.north.max(p.latitude),
                },
            })
        })
}

/// Great-circle distance in kilometres.
#[must_use]
pub fn haversine_km(from: Position, to: Position) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lng = (to.longitude - from.longitude).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Human-readable distance: metres below 1 km, one decimal of km above.
#[must_use]
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0} m", km * 1000.0)
    } else {
        format!("{km:.1} km")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapsLinkMode {
    /// Pin the location.
    Search,
    /// Turn-by-turn directions to the location; preferred on mobile.
    Directions,
}

#[must_use]
pub fn google_maps_url(position: Position, mode: MapsLinkMode) -> String {
    let Position {
        latitude,
        longitude,
    } = position;
    match mode {
        MapsLinkMode::Search => {
            format!("https://www.google.com/maps/search/?api=1&query={latitude},{longitude}")
        }
        MapsLinkMode::Directions => {
            format!("https://www.google.com/maps/dir/?api=1&destination={latitude},{longitude}")
        }
    }
}
