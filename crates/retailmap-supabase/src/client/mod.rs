//! HTTP client for the Supabase REST (`PostgREST`) API.

mod pincodes;
mod retailers;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use retailmap_core::AppConfig;

use crate::error::SupabaseError;
use crate::postgrest::error_message;
use crate::retry::retry_with_backoff;

/// Maximum number of pages to fetch before returning an error.
///
/// Each page request may be retried up to `max_retries` times on transient
/// errors, so the worst-case request count is `MAX_PAGES * (1 + max_retries)`.
pub(crate) const MAX_PAGES: usize = 500;

pub(crate) const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Client for one Supabase project.
///
/// Every request carries the project key as both `apikey` and bearer token.
/// Rate limiting (429), transport failures and 5xx responses are retried
/// with exponential backoff up to `max_retries` additional attempts; other
/// non-2xx statuses surface immediately as [`SupabaseError::UnexpectedStatus`].
pub struct SupabaseClient {
    pub(crate) client: Client,
    /// Project origin with a trailing slash, e.g. `https://abc.supabase.co/`.
    pub(crate) base_url: Url,
    api_key: String,
    pub(crate) page_size: u32,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[redacted]")
            .field("page_size", &self.page_size)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Creates a client for the project at `base_url` with retries disabled.
    ///
    /// # Errors
    ///
    /// - [`SupabaseError::InvalidBaseUrl`] if `base_url` is not an absolute
    ///   `http(s)` URL.
    /// - [`SupabaseError::InvalidInput`] if `api_key` is blank.
    /// - [`SupabaseError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, SupabaseError> {
        let base_url = parse_base_url(base_url)?;
        if api_key.trim().is_empty() {
            return Err(SupabaseError::InvalidInput(
                "Supabase API key must not be empty".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("retailmap/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.trim().to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_retries: 0,
            backoff_base_secs: 0,
        })
    }

    /// Builds a client with the anon key and the retry/page settings from `config`.
    ///
    /// # Errors
    ///
    /// Same as [`SupabaseClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, SupabaseError> {
        Ok(Self::new(
            &config.supabase_url,
            &config.supabase_anon_key,
            config.request_timeout_secs,
        )?
        .with_retry(config.max_retries, config.retry_backoff_base_secs)
        .with_page_size(config.page_size))
    }

    /// Sets the retry policy: `max_retries` additional attempts, waiting
    /// `backoff_base_secs * 2^n` seconds before the n-th retry.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_secs: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_secs = backoff_base_secs;
        self
    }

    /// Page size for paginated table reads. Zero is ignored.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        if page_size > 0 {
            self.page_size = page_size;
        }
        self
    }

    /// Replaces the key sent with each request, e.g. with the service key
    /// for the boundary import.
    #[must_use]
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = api_key.trim().to_string();
        self
    }

    pub(crate) fn rest_url(&self, path: &str) -> Result<Url, SupabaseError> {
        self.base_url
            .join(&format!("rest/v1/{path}"))
            .map_err(|e| SupabaseError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Sends the request produced by `build`, retrying transient failures,
    /// and decodes the JSON body. An empty body decodes as JSON `null`.
    pub(crate) async fn execute<T, F>(&self, context: &str, build: F) -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let client = &self.client;
        let api_key = self.api_key.as_str();
        let build = &build;

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async move {
            let response = build(client)
                .header("apikey", api_key)
                .bearer_auth(api_key)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;
            let status = response.status();
            let url = response.url().to_string();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(SupabaseError::RateLimited { retry_after_secs });
            }

            let body = response.text().await?;

            if !status.is_success() {
                let reason = status.canonical_reason().unwrap_or("request failed");
                return Err(SupabaseError::UnexpectedStatus {
                    status: status.as_u16(),
                    url,
                    message: error_message(&body, reason),
                });
            }

            let text = if body.trim().is_empty() { "null" } else { body.as_str() };
            serde_json::from_str::<T>(text).map_err(|e| SupabaseError::Deserialize {
                context: context.to_string(),
                source: e,
            })
        })
        .await
    }
}

fn parse_base_url(raw: &str) -> Result<Url, SupabaseError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| SupabaseError::InvalidBaseUrl {
        url: trimmed.to_string(),
        reason,
    };
    let mut url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be used as a base".to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    Ok(url)
}
