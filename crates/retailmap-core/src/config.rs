use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        match lookup(var) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingEnvVar(var.to_string())),
        }
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|value| !value.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_zoom = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let zoom = raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if !(0.0..=24.0).contains(&zoom) {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("zoom {zoom} is outside 0..=24"),
            });
        }
        Ok(zoom)
    };

    let supabase_url = require("SUPABASE_URL")?;
    if !(supabase_url.starts_with("https://") || supabase_url.starts_with("http://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "SUPABASE_URL".to_string(),
            reason: "must start with http:// or https://".to_string(),
        });
    }
    let supabase_anon_key = require("SUPABASE_ANON_KEY")?;
    let supabase_service_key = optional("SUPABASE_SERVICE_KEY");
    let mapbox_token = optional("MAPBOX_ACCESS_TOKEN");

    let env = parse_environment(&or_default("RETAILMAP_ENV", "development"));
    let log_level = or_default("RETAILMAP_LOG_LEVEL", "info");
    let map_settings_path = optional("RETAILMAP_MAP_SETTINGS").map(PathBuf::from);

    let request_timeout_secs = parse_u64("RETAILMAP_REQUEST_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("RETAILMAP_MAX_RETRIES", "3")?;
    let retry_backoff_base_secs = parse_u64("RETAILMAP_RETRY_BACKOFF_BASE_SECS", "1")?;
    let page_size = parse_u32("RETAILMAP_PAGE_SIZE", "1000")?;
    if page_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "RETAILMAP_PAGE_SIZE".to_string(),
            reason: "page size must be at least 1".to_string(),
        });
    }
    let pincode_min_zoom = parse_zoom("RETAILMAP_PINCODE_MIN_ZOOM", "12")?;
    let debounce_ms = parse_u64("RETAILMAP_DEBOUNCE_MS", "300")?;

    Ok(AppConfig {
        supabase_url: supabase_url.trim_end_matches('/').to_string(),
        supabase_anon_key,
        supabase_service_key,
        mapbox_token,
        env,
        log_level,
        map_settings_path,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_secs,
        page_size,
        pincode_min_zoom,
        debounce_ms,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
