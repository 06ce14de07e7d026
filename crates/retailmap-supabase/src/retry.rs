//! Retry with exponential backoff for transient backend errors.
//!
//! Rate limiting, transport failures and 5xx responses are retried.
//! Client errors, shape errors and guard errors are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::SupabaseError;

fn is_retriable(err: &SupabaseError) -> bool {
    match err {
        SupabaseError::RateLimited { .. } | SupabaseError::Http(_) => true,
        SupabaseError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Executes `operation`, retrying transient failures.
///
/// Sleeps `backoff_base_secs * 2^attempt` seconds between attempts, for at
/// most `max_retries` additional attempts after the first. With
/// `max_retries = 3` the operation runs at most 4 times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, SupabaseError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SupabaseError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient backend error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
