//! Retailer records as stored by the backend.
//!
//! Every field except `id`, `name` and `address` is optional in practice:
//! rows imported from spreadsheets routinely miss coordinates, carry free-form
//! dates or leave the status blank. Deserialization therefore degrades to
//! `None` instead of rejecting a row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::geo::Position;
use crate::CoreError;

/// A retailer row from the `retailers` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retailer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_order_date: Option<DateTime<Utc>>,
    /// Free-form status label, usually one of `Active`, `Idle`, `Churn`.
    #[serde(default)]
    pub retailer_status: Option<String>,
    /// Secondary retailer code used by deep links.
    #[serde(default)]
    pub sk_id: Option<String>,
    #[serde(default)]
    pub trader_name: Option<String>,
    #[serde(default)]
    pub buying_category: Option<String>,
    #[serde(default)]
    pub teamlead_name: Option<String>,
    /// Fulfillment-location code.
    #[serde(default)]
    pub darkstore: Option<String>,
    /// Soft-delete flag: `false` means the retailer is hidden.
    #[serde(default = "default_true", deserialize_with = "lenient_bool")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_visit_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub next_scheduled_visit: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Retailer {
    /// Returns the coordinate pair when both halves are present.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Position {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_mappable(&self) -> bool {
        self.position().is_some()
    }

    #[must_use]
    pub fn status(&self) -> Option<RetailerStatus> {
        self.retailer_status.as_deref().map(RetailerStatus::parse)
    }

    /// Convenience constructor for a minimal mappable record.
    #[must_use]
    pub fn new(id: &str, name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            address: String::new(),
            phone: None,
            latitude: Some(latitude),
            longitude: Some(longitude),
            state: None,
            city: None,
            pincode: None,
            last_order_date: None,
            retailer_status: None,
            sk_id: None,
            trader_name: None,
            buying_category: None,
            teamlead_name: None,
            darkstore: None,
            is_active: true,
            last_visit_date: None,
            next_scheduled_visit: None,
            notes: None,
        }
    }
}

/// Known retailer statuses. The set is open: anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetailerStatus {
    Active,
    Idle,
    Churn,
    Other(String),
}

impl RetailerStatus {
    /// Case-insensitive parse; never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "active" => RetailerStatus::Active,
            "idle" => RetailerStatus::Idle,
            "churn" => RetailerStatus::Churn,
            _ => RetailerStatus::Other(raw.trim().to_string()),
        }
    }
}

impl std::fmt::Display for RetailerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetailerStatus::Active => write!(f, "Active"),
            RetailerStatus::Idle => write!(f, "Idle"),
            RetailerStatus::Churn => write!(f, "Churn"),
            RetailerStatus::Other(label) => write!(f, "{label}"),
        }
    }
}

/// A row from `retailer_categories`; overrides the built-in status colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailerCategory {
    pub id: i64,
    pub name: String,
    pub color_hex: String,
    #[serde(default)]
    pub icon_name: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Parses the date formats the backend and CLI users produce.
///
/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD HH:MM:SS`
/// timestamps (taken as UTC) and plain `YYYY-MM-DD` dates (UTC midnight).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Strict variant of [`parse_timestamp`] for user input.
///
/// # Errors
///
/// Returns [`CoreError::InvalidDate`] when no supported format matches.
pub fn parse_date_arg(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    parse_timestamp(raw).ok_or_else(|| CoreError::InvalidDate(raw.to_string()))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => parse_timestamp(&s),
        _ => None,
    })
}

fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let value = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::String(s)) => !matches!(
            s.trim().to_lowercase().as_str(),
            "false" | "0" | "no" | "hidden"
        ),
        _ => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn deserializes_full_row() {
        let row = json!({
            "id": "7f1c",
            "name": "Sharma General Store",
            "address": "12 MG Road",
            "phone": "+91 98765 43210",
            "latitude": 12.9716,
            "longitude": 77.5946,
            "state": "Karnataka",
            "city": "Bengaluru",
            "pincode": "560001",
            "last_order_date": "2024-03-01T10:30:00+05:30",
            "retailer_status": "Active",
            "sk_id": "SK-001",
            "trader_name": "R. Sharma",
            "buying_category": "FMCG",
            "teamlead_name": "Anita",
            "darkstore": "BLR-01",
            "is_active": true,
            "last_visit_date": "2024-02-20",
            "next_scheduled_visit": null,
            "notes": null
        });
        let retailer: Retailer = serde_json::from_value(row).unwrap();
        assert_eq!(retailer.name, "Sharma General Store");
        assert_eq!(
            retailer.position(),
            Some(Position {
                latitude: 12.9716,
                longitude: 77.5946
            })
        );
        assert_eq!(
            retailer.last_order_date,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 5, 0, 0).unwrap())
        );
        assert_eq!(
            retailer.last_visit_date,
            Some(Utc.with_ymd_and_hms(2024, 2, 20, 0, 0, 0).unwrap())
        );
        assert_eq!(retailer.status(), Some(RetailerStatus::Active));
        assert!(retailer.next_scheduled_visit.is_none());
    }

    #[test]
    fn sparse_row_degrades_instead_of_failing() {
        let row = json!({
            "id": "1",
            "name": "No Coordinates",
            "latitude": null,
            "longitude": "not a number",
            "last_visit_date": "yesterday-ish"
        });
        let retailer: Retailer = serde_json::from_value(row).unwrap();
        assert!(!retailer.is_mappable());
        assert!(retailer.last_visit_date.is_none());
        assert!(retailer.is_active, "visibility defaults to visible");
        assert_eq!(retailer.address, "");
    }

    #[test]
    fn numeric_string_coordinates_are_accepted() {
        let row = json!({"id": "2", "name": "Str", "latitude": " 19.07 ", "longitude": "72.87"});
        let retailer: Retailer = serde_json::from_value(row).unwrap();
        assert!(retailer.is_mappable());
    }

    #[test]
    fn status_parse_is_case_insensitive_and_open() {
        assert_eq!(RetailerStatus::parse("CHURN"), RetailerStatus::Churn);
        assert_eq!(RetailerStatus::parse(" idle "), RetailerStatus::Idle);
        assert_eq!(
            RetailerStatus::parse("Prospect"),
            RetailerStatus::Other("Prospect".to_string())
        );
    }

    #[test]
    fn parse_timestamp_formats() {
        let midnight = Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-06"), Some(midnight));
        assert_eq!(parse_timestamp("2024-05-06T00:00:00Z"), Some(midnight));
        assert_eq!(parse_timestamp("2024-05-06 00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2024-05-06T00:00:00.000"), Some(midnight));
        assert!(parse_timestamp("").is_none());
        assert!(parse_date_arg("06/05/2024").is_err());
    }

    #[test]
    fn serialized_record_deserializes_back() {
        let mut retailer = Retailer::new("9", "Round Trip", 28.6, 77.2);
        retailer.last_visit_date = parse_timestamp("2024-01-15");
        retailer.is_active = false;
        let encoded = serde_json::to_value(&retailer).unwrap();
        let decoded: Retailer = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, retailer);
    }
}
