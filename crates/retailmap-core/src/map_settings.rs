use std::collections::HashSet;
use std::f64::consts::{FRAC_PI_4, TAU};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geo::BoundingBox;
use crate::markers::{StatusPalette, StatusStyle};
use crate::ConfigError;

const TILE_SIZE: f64 = 256.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialView {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSettings {
    /// Highest zoom at which points are still clustered.
    pub max_zoom: f64,
    /// Cluster radius in pixels.
    pub radius: u32,
}

/// Presentation defaults for the map layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub initial_view: InitialView,
    pub style: String,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub cluster: ClusterSettings,
    /// Padding in pixels used when fitting the map to all markers.
    pub fit_padding: u32,
    /// Zoom cap when fitting the map to all markers.
    pub fit_max_zoom: f64,
    pub status_colors: Vec<StatusStyle>,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            initial_view: InitialView {
                longitude: 78.9629,
                latitude: 20.5937,
                zoom: 5.0,
            },
            style: "mapbox://styles/mapbox/streets-v12".to_string(),
            min_zoom: 3.0,
            max_zoom: 20.0,
            cluster: ClusterSettings {
                max_zoom: 16.0,
                radius: 30,
            },
            fit_padding: 50,
            fit_max_zoom: 15.0,
            status_colors: StatusPalette::default().styles().to_vec(),
        }
    }
}

impl MapSettings {
    #[must_use]
    pub fn palette(&self) -> StatusPalette {
        StatusPalette::new(self.status_colors.clone())
    }

    /// Camera that frames `bounds` in a `width` x `height` pixel map.
    ///
    /// Leaves `fit_padding` pixels on every side, then clamps the zoom to
    /// `min_zoom..=fit_max_zoom` so a single marker is not shown at street
    /// level.
    #[must_use]
    pub fn fit_view(&self, bounds: &BoundingBox, width: u32, height: u32) -> InitialView {
        let padding = 2.0 * f64::from(self.fit_padding);
        let usable_width = (f64::from(width) - padding).max(1.0);
        let usable_height = (f64::from(height) - padding).max(1.0);

        let (south_y, north_y) = (mercator_y(bounds.south), mercator_y(bounds.north));
        let lng_span = (bounds.east - bounds.west).max(f64::EPSILON);
        let y_span = (north_y - south_y).max(f64::EPSILON);

        let zoom_x = (usable_width * 360.0 / (TILE_SIZE * lng_span)).log2();
        let zoom_y = (usable_height * TAU / (TILE_SIZE * y_span)).log2();
        let zoom = zoom_x
            .min(zoom_y)
            .min(self.fit_max_zoom)
            .max(self.min_zoom);

        InitialView {
            longitude: (bounds.west + bounds.east) / 2.0,
            latitude: ((south_y + north_y) / 2.0).sinh().atan().to_degrees(),
            zoom,
        }
    }
}

fn mercator_y(latitude: f64) -> f64 {
    (FRAC_PI_4 + latitude.to_radians() / 2.0).tan().ln()
}

/// Load and validate map settings from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_map_settings(path: &Path) -> Result<MapSettings, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SettingsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_map_settings(&content)
}

/// Parse and validate map settings from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_map_settings(content: &str) -> Result<MapSettings, ConfigError> {
    let settings: MapSettings = serde_yaml::from_str(content)?;
    validate_map_settings(&settings)?;
    Ok(settings)
}

fn validate_map_settings(settings: &MapSettings) -> Result<(), ConfigError> {
    if !(0.0..=24.0).contains(&settings.min_zoom) || !(0.0..=24.0).contains(&settings.max_zoom) {
        return Err(ConfigError::Validation(format!(
            "zoom range {}..{} must lie within 0..=24",
            settings.min_zoom, settings.max_zoom
        )));
    }
    if settings.min_zoom > settings.max_zoom {
        return Err(ConfigError::Validation(format!(
            "min_zoom {} exceeds max_zoom {}",
            settings.min_zoom, settings.max_zoom
        )));
    }
    if settings.cluster.max_zoom > settings.max_zoom {
        return Err(ConfigError::Validation(format!(
            "cluster.max_zoom {} exceeds max_zoom {}",
            settings.cluster.max_zoom, settings.max_zoom
        )));
    }
    let view = &settings.initial_view;
    if !(-90.0..=90.0).contains(&view.latitude) || !(-180.0..=180.0).contains(&view.longitude) {
        return Err(ConfigError::Validation(format!(
            "initial_view ({}, {}) is not a valid coordinate",
            view.latitude, view.longitude
        )));
    }

    let mut seen = HashSet::new();
    for style in &settings.status_colors {
        if style.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "status name must be non-empty".to_string(),
            ));
        }
        if !is_hex_color(&style.color) {
            return Err(ConfigError::Validation(format!(
                "status '{}' has invalid color '{}'; expected #RRGGBB",
                style.name, style.color
            )));
        }
        if !seen.insert(style.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate status: '{}'",
                style.name
            )));
        }
    }

    Ok(())
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
