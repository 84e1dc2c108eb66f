//! Transport retry for Google calls.
//!
//! Throttling (429), request timeouts (408), 5xx answers and connect/timeout
//! failures are retried with capped exponential backoff. A numeric
//! `Retry-After` header overrides the computed delay, up to a ceiling.

use std::time::Duration;

use reqwest::blocking::{RequestBuilder, Response};
use reqwest::StatusCode;

use super::GoogleApiError;

/// Longest wait honored from a `Retry-After` header.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// No retries, for tests and one-shot probes.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based): base × 2^(attempt-1), capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after
            .map(|d| d.min(MAX_RETRY_AFTER))
            .unwrap_or_else(|| self.backoff(attempt))
    }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Send `request`, retrying per `policy`.
///
/// Requests whose body cannot be cloned are sent once. The last response is
/// returned as-is once attempts run out, so callers see the real status.
pub fn send_with_retry(request: RequestBuilder, policy: &RetryPolicy) -> Result<Response, GoogleApiError> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let Some(this_try) = request.try_clone() else {
            return Ok(request.send()?);
        };
        let last = attempt >= attempts;

        match this_try.send() {
            Ok(response) if !last && is_retryable_status(response.status()) => {
                let delay = policy.delay_for(attempt, retry_after(&response));
                log::warn!(
                    "Google API returned {}, retry {}/{} in {:?}",
                    response.status(),
                    attempt,
                    attempts - 1,
                    delay
                );
                std::thread::sleep(delay);
            }
            Ok(response) => return Ok(response),
            Err(e) if !last && (e.is_timeout() || e.is_connect()) => {
                let delay = policy.delay_for(attempt, None);
                log::warn!(
                    "Google API transport error ({}), retry {}/{} in {:?}",
                    e,
                    attempt,
                    attempts - 1,
                    delay
                );
                std::thread::sleep(delay);
            }
            Err(e) => return Err(GoogleApiError::Http(e)),
        }
        attempt += 1;
    }
}
