//! Bulk import of India pincode boundary polygons.
//!
//! Source files are GeoJSON feature collections published with several
//! property naming schemes (`Pincode`, `pincode`, `PIN`, ...). Rows are
//! normalized into [`BoundaryRow`]s and sent to the
//! `import_pincode_boundaries` RPC in fixed-size batches. A batch that fails
//! is retried row by row so one bad polygon costs one row, not fifty.

use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::SupabaseClient;
use crate::error::SupabaseError;

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_INTER_BATCH_DELAY_MS: u64 = 200;
pub const UNKNOWN_PINCODE: &str = "UNKNOWN";

/// One boundary ready for insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryRow {
    pub pincode: String,
    pub office_name: String,
    pub district: String,
    pub state: String,
    pub geometry: Value,
}

impl BoundaryRow {
    /// Normalizes one GeoJSON feature.
    ///
    /// The first non-empty of each alias list wins; numbers are stringified.
    #[must_use]
    pub fn from_feature(feature: &Value) -> Self {
        let empty = Map::new();
        let props = feature
            .get("properties")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        Self {
            pincode: first_present(props, &["Pincode", "pincode", "PIN"])
                .unwrap_or_else(|| UNKNOWN_PINCODE.to_string()),
            office_name: first_present(props, &["Office_Name", "office_name"]).unwrap_or_default(),
            district: first_present(props, &["Division", "district", "DISTRICT"])
                .unwrap_or_default(),
            state: first_present(props, &["Circle", "state", "STATE"]).unwrap_or_default(),
            geometry: feature.get("geometry").cloned().unwrap_or(Value::Null),
        }
    }
}

fn first_present(props: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match props.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    })
}

/// Parses a GeoJSON feature collection into boundary rows.
///
/// # Errors
///
/// Returns [`SupabaseError::Deserialize`] for malformed JSON and
/// [`SupabaseError::InvalidInput`] when there is no `features` array.
pub fn parse_boundary_file(content: &str) -> Result<Vec<BoundaryRow>, SupabaseError> {
    let document: Value =
        serde_json::from_str(content).map_err(|e| SupabaseError::Deserialize {
            context: "pincode boundary file".to_string(),
            source: e,
        })?;
    let features = document
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            SupabaseError::InvalidInput("boundary file has no \"features\" array".to_string())
        })?;
    Ok(features.iter().map(BoundaryRow::from_feature).collect())
}

/// Outcome of an import run. Counts are rows, not batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub batches: usize,
    pub imported: usize,
    pub failed: usize,
}

impl ImportReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.imported + self.failed
    }
}

#[derive(Serialize)]
struct ImportParams<'a> {
    rows: &'a [BoundaryRow],
}

impl SupabaseClient {
    async fn insert_boundaries(&self, rows: &[BoundaryRow]) -> Result<(), SupabaseError> {
        let url = self.rest_url("rpc/import_pincode_boundaries")?;
        let params = ImportParams { rows };
        let _: Value = self
            .execute("pincode import response", |client| {
                client.post(url.clone()).json(&params)
            })
            .await?;
        Ok(())
    }

    /// Inserts `rows` in batches of `batch_size`, pausing
    /// `inter_batch_delay_ms` between batches.
    ///
    /// Failures never abort the run. A failed batch is retried one row at a
    /// time and each row that still fails is counted in
    /// [`ImportReport::failed`].
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::InvalidInput`] if `batch_size` is zero.
    pub async fn import_pincode_boundaries(
        &self,
        rows: &[BoundaryRow],
        batch_size: usize,
        inter_batch_delay_ms: u64,
    ) -> Result<ImportReport, SupabaseError> {
        if batch_size == 0 {
            return Err(SupabaseError::InvalidInput(
                "batch size must be at least 1".to_string(),
            ));
        }

        let total_batches = rows.len().div_ceil(batch_size);
        let mut report = ImportReport::default();

        for (index, batch) in rows.chunks(batch_size).enumerate() {
            if index > 0 && inter_batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(inter_batch_delay_ms)).await;
            }
            report.batches += 1;
            let batch_num = index + 1;

            match self.insert_boundaries(batch).await {
                Ok(()) => {
                    report.imported += batch.len();
                    tracing::info!(batch = batch_num, total_batches, rows = batch.len(), "batch imported");
                }
                Err(err) => {
                    tracing::warn!(
                        batch = batch_num,
                        total_batches,
                        error = %err,
                        "batch import failed, retrying rows individually"
                    );
                    for row in batch {
                        match self.insert_boundaries(std::slice::from_ref(row)).await {
                            Ok(()) => report.imported += 1,
                            Err(err) => {
                                tracing::warn!(pincode = %row.pincode, error = %err, "pincode import failed");
                                report.failed += 1;
                            }
                        }
                    }
                }
            }
        }

        tracing::info!(
            imported = report.imported,
            failed = report.failed,
            batches = report.batches,
            "pincode import finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn property_aliases_fall_back_in_order() {
        let feature = json!({
            "type": "Feature",
            "properties": {
                "PIN": 560001,
                "Office_Name": "Bangalore GPO",
                "district": "",
                "DISTRICT": "Bangalore",
                "Circle": "Karnataka"
            },
            "geometry": {"type": "Polygon", "coordinates": []}
        });
        let row = BoundaryRow::from_feature(&feature);
        assert_eq!(row.pincode, "560001");
        assert_eq!(row.office_name, "Bangalore GPO");
        assert_eq!(row.district, "Bangalore");
        assert_eq!(row.state, "Karnataka");
        assert_eq!(row.geometry["type"], "Polygon");
    }

    #[test]
    fn missing_properties_use_unknown_and_blanks() {
        let row = BoundaryRow::from_feature(&json!({"type": "Feature", "geometry": null}));
        assert_eq!(row.pincode, UNKNOWN_PINCODE);
        assert!(row.office_name.is_empty());
        assert!(row.district.is_empty());
        assert!(row.state.is_empty());
    }

    #[test]
    fn parse_boundary_file_requires_features() {
        let rows = parse_boundary_file(
            r#"{"type":"FeatureCollection","features":[{"properties":{"Pincode":"110001"},"geometry":null}]}"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pincode, "110001");

        assert!(matches!(
            parse_boundary_file(r#"{"type":"FeatureCollection"}"#),
            Err(SupabaseError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_boundary_file("{"),
            Err(SupabaseError::Deserialize { .. })
        ));
    }
}
