pub mod app_config;
pub mod config;
pub mod dashboard;
pub mod deep_link;
pub mod filters;
pub mod geo;
pub mod geojson;
pub mod geolocation;
pub mod map_settings;
pub mod markers;
pub mod pincodes;
pub mod retailers;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use dashboard::{Dashboard, DashboardEvent, DashboardView};
pub use filters::{active_filter_count, apply_filters, DateRange, FilterState, UrlOverrides};
pub use geo::{BoundingBox, Position};
pub use geolocation::GeolocationError;
pub use map_settings::{load_map_settings, MapSettings};
pub use markers::{marker_color, StatusPalette};
pub use pincodes::{PincodeCollection, PincodeFeature, PincodeProperties};
pub use retailers::{Retailer, RetailerCategory, RetailerStatus};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read map settings file {path}: {source}")]
    SettingsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse map settings: {0}")]
    SettingsFileParse(#[from] serde_yaml::Error),

    #[error("invalid map settings: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid bounding box: {0}")]
    InvalidBounds(String),

    #[error("invalid date \"{0}\": expected YYYY-MM-DD or RFC 3339")]
    InvalidDate(String),
}
