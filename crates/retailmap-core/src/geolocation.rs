//! Device geolocation outcomes.
//!
//! Failures are never fatal; they only become a status line for the user.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location information unavailable")]
    PositionUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Geolocation is not supported by your browser")]
    Unsupported,
    #[error("Unable to retrieve your location")]
    Other,
}

impl GeolocationError {
    /// Maps the W3C `GeolocationPositionError.code` values.
    #[must_use]
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => GeolocationError::PermissionDenied,
            2 => GeolocationError::PositionUnavailable,
            3 => GeolocationError::Timeout,
            _ => GeolocationError::Other,
        }
    }
}
