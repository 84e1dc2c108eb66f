//! Blocking Google API client.
//!
//! One [`GoogleSession`] holds the OAuth token and HTTP client; the
//! per-service modules are free functions over it:
//! - calendar: Calendar v3 events (meeting source)
//! - gmail: Gmail v1 threads (correspondence source)
//! - drive: Drive v3 listing and file moves
//! - docs: Docs v1 text export and report publishing
//!
//! Token loading/refresh lives in `token_store` and `auth`; transport retry in
//! `retry`.

pub mod auth;
pub mod calendar;
pub mod docs;
pub mod drive;
pub mod gmail;
pub mod retry;
pub mod token_store;

use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use serde::de::DeserializeOwned;

pub use retry::{send_with_retry, RetryPolicy};
pub use token_store::GoogleToken;

/// Per-request timeout for Google calls.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum GoogleApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("authorization expired or revoked")]
    AuthExpired,
    #[error("no token at {0}")]
    TokenNotFound(PathBuf),
    #[error("could not refresh access token: {0}")]
    RefreshFailed(String),
    #[error("Google returned {status}: {message}")]
    ApiError { status: u16, message: String },
    #[error("token file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a JSON response body. 401 means the grant is gone; other failure
/// statuses carry the response text.
fn decode_json<T: DeserializeOwned>(response: reqwest::blocking::Response) -> Result<T, GoogleApiError> {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(GoogleApiError::AuthExpired);
    }
    if !status.is_success() {
        return Err(GoogleApiError::ApiError {
            status: status.as_u16(),
            message: response.text().unwrap_or_default(),
        });
    }
    Ok(response.json()?)
}

// ============================================================================
// Session
// ============================================================================

/// An authorized session shared by the calendar, mail, drive and docs clients.
///
/// The access token is refreshed on demand and the refreshed token is written
/// back to `token.json`.
pub struct GoogleSession {
    token_path: PathBuf,
    http: reqwest::blocking::Client,
    policy: RetryPolicy,
    token: Mutex<GoogleToken>,
}

impl GoogleSession {
    pub fn open(token_path: &Path) -> Result<Self, GoogleApiError> {
        let token = token_store::load_token(token_path)?;
        let http = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self {
            token_path: token_path.to_path_buf(),
            http,
            policy: RetryPolicy::default(),
            token: Mutex::new(token),
        })
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn lock_token(&self) -> MutexGuard<'_, GoogleToken> {
        self.token.lock()
    }

    /// Email of the authorized account, if the token records it.
    pub fn account_email(&self) -> Option<String> {
        self.lock_token().account_email().map(str::to_string)
    }

    /// A usable access token.
    pub fn access_token(&self) -> Result<String, GoogleApiError> {
        let mut token = self.lock_token();
        if token.needs_refresh(chrono::Utc::now()) {
            log::debug!("Access token expired, refreshing");
            let refreshed = auth::refresh(&self.http, &token)?;
            token_store::save_token(&self.token_path, &refreshed)?;
            *token = refreshed;
        }
        Ok(token.token.clone())
    }

    pub fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GoogleApiError> {
        let request = self.http.get(url).bearer_auth(self.access_token()?).query(query);
        decode_json(send_with_retry(request, &self.policy)?)
    }

    pub fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, GoogleApiError> {
        let request = self.http.post(url).bearer_auth(self.access_token()?).json(body);
        decode_json(send_with_retry(request, &self.policy)?)
    }

    /// PATCH with query parameters only; the body is an empty object.
    pub fn patch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GoogleApiError> {
        let request = self
            .http
            .patch(url)
            .bearer_auth(self.access_token()?)
            .query(query)
            .json(&serde_json::json!({}));
        decode_json(send_with_retry(request, &self.policy)?)
    }
}
