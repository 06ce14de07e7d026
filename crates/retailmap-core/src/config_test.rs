use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid values.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("SUPABASE_URL", "https://project.supabase.co/");
    m.insert("SUPABASE_ANON_KEY", "anon-key");
    m
}

#[test]
fn parse_environment_variants() {
    assert_eq!(parse_environment("development"), Environment::Development);
    assert_eq!(parse_environment("test"), Environment::Test);
    assert_eq!(parse_environment("production"), Environment::Production);
}

#[test]
fn parse_environment_unknown_defaults_to_development() {
    assert_eq!(parse_environment("staging"), Environment::Development);
}

#[test]
fn build_app_config_fails_without_supabase_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "SUPABASE_URL"),
        "expected MissingEnvVar(SUPABASE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_without_anon_key() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("SUPABASE_URL", "https://project.supabase.co");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "SUPABASE_ANON_KEY"),
        "expected MissingEnvVar(SUPABASE_ANON_KEY), got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_anon_key_as_missing() {
    let mut map = full_env();
    map.insert("SUPABASE_ANON_KEY", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "SUPABASE_ANON_KEY"),
        "expected MissingEnvVar(SUPABASE_ANON_KEY), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_url_without_scheme() {
    let mut map = full_env();
    map.insert("SUPABASE_URL", "project.supabase.co");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "SUPABASE_URL"),
        "expected InvalidEnvVar(SUPABASE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.supabase_url, "https://project.supabase.co");
    assert_eq!(cfg.supabase_anon_key, "anon-key");
    assert!(cfg.supabase_service_key.is_none());
    assert!(cfg.mapbox_token.is_none());
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.map_settings_path.is_none());
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.retry_backoff_base_secs, 1);
    assert_eq!(cfg.page_size, 1000);
    assert!((cfg.pincode_min_zoom - 12.0).abs() < f64::EPSILON);
    assert_eq!(cfg.debounce_ms, 300);
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = full_env();
    map.insert("RETAILMAP_ENV", "production");
    map.insert("RETAILMAP_PAGE_SIZE", "250");
    map.insert("RETAILMAP_PINCODE_MIN_ZOOM", "10.5");
    map.insert("RETAILMAP_DEBOUNCE_MS", "150");
    map.insert("MAPBOX_ACCESS_TOKEN", "pk.test");
    map.insert("RETAILMAP_MAP_SETTINGS", "config/map.yaml");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Production);
    assert_eq!(cfg.page_size, 250);
    assert!((cfg.pincode_min_zoom - 10.5).abs() < f64::EPSILON);
    assert_eq!(cfg.debounce_ms, 150);
    assert_eq!(cfg.require_map_token().unwrap(), "pk.test");
    assert_eq!(
        cfg.map_settings_path.as_deref(),
        Some(std::path::Path::new("config/map.yaml"))
    );
}

#[test]
fn build_app_config_rejects_zero_page_size() {
    let mut map = full_env();
    map.insert("RETAILMAP_PAGE_SIZE", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "RETAILMAP_PAGE_SIZE"),
        "expected InvalidEnvVar(RETAILMAP_PAGE_SIZE), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_out_of_range_zoom() {
    let mut map = full_env();
    map.insert("RETAILMAP_PINCODE_MIN_ZOOM", "40");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "RETAILMAP_PINCODE_MIN_ZOOM"),
        "expected InvalidEnvVar(RETAILMAP_PINCODE_MIN_ZOOM), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_invalid_retries() {
    let mut map = full_env();
    map.insert("RETAILMAP_MAX_RETRIES", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "RETAILMAP_MAX_RETRIES"),
        "expected InvalidEnvVar(RETAILMAP_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn missing_map_token_is_a_config_error() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let err = cfg.require_map_token().unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "MAPBOX_ACCESS_TOKEN"));
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = full_env();
    map.insert("SUPABASE_SERVICE_KEY", "service-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("anon-key"));
    assert!(!rendered.contains("service-secret"));
    assert!(rendered.contains("[redacted]"));
}
