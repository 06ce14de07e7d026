//! Viewport query against the `PostGIS` pincode RPC.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use retailmap_core::geojson::Feature;
use retailmap_core::{BoundingBox, PincodeCollection, PincodeProperties};

use crate::error::SupabaseError;

use super::SupabaseClient;

#[derive(Debug, Serialize)]
struct ViewportParams {
    min_lng: f64,
    min_lat: f64,
    max_lng: f64,
    max_lat: f64,
    zoom_level: f64,
}

#[derive(Debug, Deserialize)]
struct PincodeRow {
    pincode: String,
    #[serde(default)]
    office_name: Option<String>,
    #[serde(default)]
    district: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    geometry: serde_json::Value,
}

impl PincodeRow {
    fn into_feature(self) -> Feature<PincodeProperties> {
        // Some deployments return ST_AsGeoJSON text rather than json.
        let geometry = match self.geometry {
            serde_json::Value::String(text) => {
                serde_json::from_str(&text).unwrap_or(serde_json::Value::Null)
            }
            other => other,
        };
        Feature {
            properties: PincodeProperties {
                pincode: self.pincode,
                office_name: self.office_name,
                district: self.district,
                state: self.state,
            },
            geometry,
        }
    }
}

impl SupabaseClient {
    /// Returns the pincode boundaries intersecting `bounds` at `zoom`.
    ///
    /// The backend picks the geometry simplification from `zoom_level`.
    /// A `null` response is treated as an empty collection.
    ///
    /// # Errors
    ///
    /// Propagates [`SupabaseError`] from the RPC after retries.
    pub async fn pincodes_in_viewport(
        &self,
        bounds: BoundingBox,
        zoom: f64,
    ) -> Result<PincodeCollection, SupabaseError> {
        let url = self.rest_url("rpc/get_pincodes_in_viewport")?;
        let params = ViewportParams {
            min_lng: bounds.west,
            min_lat: bounds.south,
            max_lng: bounds.east,
            max_lat: bounds.north,
            zoom_level: zoom,
        };
        tracing::debug!(?bounds, zoom, "querying pincodes in viewport");

        let started = Instant::now();
        let rows: Option<Vec<PincodeRow>> = self
            .execute("pincode viewport rows", |client| {
                client.post(url.clone()).json(&params)
            })
            .await?;

        let features: Vec<_> = rows
            .unwrap_or_default()
            .into_iter()
            .map(PincodeRow::into_feature)
            .collect();
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(features = features.len(), elapsed_ms, "pincode boundaries loaded");
        Ok(PincodeCollection::new(features))
    }
}
