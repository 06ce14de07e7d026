use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Privileged key used only by the pincode import.
    pub supabase_service_key: Option<String>,
    pub mapbox_token: Option<String>,
    pub env: Environment,
    pub log_level: String,
    pub map_settings_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    pub page_size: u32,
    /// Below this zoom no pincode boundaries are requested.
    pub pincode_min_zoom: f64,
    pub debounce_ms: u64,
}

impl AppConfig {
    /// Returns the map token or a configuration error explaining where to set it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::MissingEnvVar`] when `MAPBOX_ACCESS_TOKEN` is unset.
    pub fn require_map_token(&self) -> Result<&str, crate::ConfigError> {
        self.mapbox_token
            .as_deref()
            .ok_or_else(|| crate::ConfigError::MissingEnvVar("MAPBOX_ACCESS_TOKEN".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_anon_key", &"[redacted]")
            .field(
                "supabase_service_key",
                &self.supabase_service_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "mapbox_token",
                &self.mapbox_token.as_ref().map(|_| "[redacted]"),
            )
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("map_settings_path", &self.map_settings_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field("page_size", &self.page_size)
            .field("pincode_min_zoom", &self.pincode_min_zoom)
            .field("debounce_ms", &self.debounce_ms)
            .finish()
    }
}
