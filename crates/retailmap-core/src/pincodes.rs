//! India pincode boundary features returned by the spatial backend.

use serde::{Deserialize, Serialize};

use crate::geojson::{Feature, FeatureCollection};

/// Descriptive attributes attached to each boundary polygon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PincodeProperties {
    pub pincode: String,
    #[serde(default)]
    pub office_name: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

pub type PincodeFeature = Feature<PincodeProperties>;

/// Boundary polygons for one viewport query. Replaced wholesale per query.
pub type PincodeCollection = FeatureCollection<PincodeProperties>;

/// Looks up the boundary for a specific pincode, if loaded.
#[must_use]
pub fn find_pincode<'a>(collection: &'a PincodeCollection, pincode: &str) -> Option<&'a PincodeFeature> {
    collection
        .features
        .iter()
        .find(|f| f.properties.pincode == pincode.trim())
}
