//! Marker styling and map feature building.
//!
//! Color precedence for a retailer marker:
//! 1. hidden (soft-deleted) retailers are gray,
//! 2. a scheduled visit due within two days is amber,
//! 3. otherwise the status color from the palette.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geojson::{point, Feature, FeatureCollection};
use crate::retailers::{Retailer, RetailerCategory};

pub const HIDDEN_COLOR: &str = "#95A5A6";
pub const VISIT_DUE_COLOR: &str = "#F39C12";
/// Days ahead in which a scheduled visit turns the marker amber.
pub const VISIT_DUE_WINDOW_DAYS: i64 = 2;

const FALLBACK_STATUS: &str = "Active";
const FALLBACK_ICON: &str = "map-pin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusStyle {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Status name → color/icon lookup. Exact match first, then case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPalette {
    styles: Vec<StatusStyle>,
}

impl Default for StatusPalette {
    fn default() -> Self {
        Self::new(vec![
            style("Active", "#2ECC71", "map-pin"),
            style("Idle", "#F39C12", "clock"),
            style("Churn", "#E74C3C", "x-circle"),
        ])
    }
}

fn style(name: &str, color: &str, icon: &str) -> StatusStyle {
    StatusStyle {
        name: name.to_string(),
        color: color.to_string(),
        icon: Some(icon.to_string()),
    }
}

impl StatusPalette {
    #[must_use]
    pub fn new(styles: Vec<StatusStyle>) -> Self {
        Self { styles }
    }

    #[must_use]
    pub fn styles(&self) -> &[StatusStyle] {
        &self.styles
    }

    /// Overrides colors (and icons, when given) with backend category rows.
    /// Unknown category names are added.
    #[must_use]
    pub fn apply_categories(mut self, categories: &[RetailerCategory]) -> Self {
        for category in categories {
            match self.styles.iter_mut().find(|s| s.name == category.name) {
                Some(existing) => {
                    existing.color.clone_from(&category.color_hex);
                    if category.icon_name.is_some() {
                        existing.icon.clone_from(&category.icon_name);
                    }
                }
                None => self.styles.push(StatusStyle {
                    name: category.name.clone(),
                    color: category.color_hex.clone(),
                    icon: category.icon_name.clone(),
                }),
            }
        }
        self
    }

    fn lookup(&self, status: &str) -> Option<&StatusStyle> {
        self.styles.iter().find(|s| s.name == status).or_else(|| {
            let lower = status.to_lowercase();
            self.styles.iter().find(|s| s.name.to_lowercase() == lower)
        })
    }

    fn fallback(&self) -> Option<&StatusStyle> {
        self.lookup(FALLBACK_STATUS)
    }

    /// Color for a status label; unknown statuses use the `Active` color.
    #[must_use]
    pub fn color(&self, status: &str) -> &str {
        self.lookup(status)
            .or_else(|| self.fallback())
            .map_or("#2ECC71", |s| s.color.as_str())
    }

    #[must_use]
    pub fn icon(&self, status: &str) -> &str {
        self.lookup(status)
            .and_then(|s| s.icon.as_deref())
            .unwrap_or(FALLBACK_ICON)
    }
}

/// Whole days from `now` until `visit`, truncated toward zero.
fn days_until(visit: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (visit - now).num_days()
}

#[must_use]
pub fn visit_due_soon(retailer: &Retailer, now: DateTime<Utc>) -> bool {
    retailer
        .next_scheduled_visit
        .map(|visit| days_until(visit, now))
        .is_some_and(|days| (0..=VISIT_DUE_WINDOW_DAYS).contains(&days))
}

#[must_use]
pub fn marker_color(retailer: &Retailer, palette: &StatusPalette, now: DateTime<Utc>) -> String {
    if !retailer.is_active {
        return HIDDEN_COLOR.to_string();
    }
    if visit_due_soon(retailer, now) {
        return VISIT_DUE_COLOR.to_string();
    }
    palette
        .color(retailer.retailer_status.as_deref().unwrap_or(FALLBACK_STATUS))
        .to_string()
}

#[must_use]
pub fn marker_icon<'a>(retailer: &Retailer, palette: &'a StatusPalette) -> &'a str {
    palette.icon(retailer.retailer_status.as_deref().unwrap_or(FALLBACK_STATUS))
}

/// Properties of one retailer point on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerProperties {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub color: String,
    pub icon: String,
}

/// Point features for every mappable retailer; records without
/// coordinates are skipped.
#[must_use]
pub fn retailer_features(
    retailers: &[Retailer],
    palette: &StatusPalette,
    now: DateTime<Utc>,
) -> FeatureCollection<MarkerProperties> {
    let features = retailers
        .iter()
        .filter_map(|r| {
            let position = r.position()?;
            Some(Feature {
                properties: MarkerProperties {
                    id: r.id.clone(),
                    name: r.name.clone(),
                    category: r.retailer_status.clone(),
                    color: marker_color(r, palette, now),
                    icon: marker_icon(r, palette).to_string(),
                },
                geometry: point(position.longitude, position.latitude),
            })
        })
        .collect();
    FeatureCollection::new(features)
}

/// Zoom to fly to after a cluster click.
///
/// Uses the map library's expansion zoom when it could compute one, else
/// zooms in two levels, never past `max_zoom`.
#[must_use]
pub fn cluster_zoom(expansion_zoom: Option<f64>, current_zoom: f64, max_zoom: f64) -> f64 {
    match expansion_zoom {
        Some(zoom) => zoom.min(max_zoom),
        None => (current_zoom + 2.0).min(max_zoom),
    }
}

/// Cluster circle color by point count, matching the map layer's step scale.
#[must_use]
pub fn cluster_color(point_count: usize) -> &'static str {
    match point_count {
        0..=9 => "#3498DB",
        10..=29 => "#F39C12",
        _ => "#E74C3C",
    }
}
