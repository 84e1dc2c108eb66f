//! Access-token refresh against the OAuth token endpoint.
//!
//! Desktop clients can be registered without a secret, so the first attempt
//! sends the client id only. Google answers `invalid_client` when the secret
//! is required; the request is then repeated once with it.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{GoogleApiError, GoogleToken};

/// Lifetime assumed when the endpoint omits `expires_in`.
const DEFAULT_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// A fresh copy of `token` with a new access token and expiry.
pub fn refresh(
    http: &reqwest::blocking::Client,
    token: &GoogleToken,
) -> Result<GoogleToken, GoogleApiError> {
    let refresh_token = token
        .refresh_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or(GoogleApiError::AuthExpired)?;

    let (status, body) = post_refresh(http, token, refresh_token, false)?;
    let (status, body) = if needs_client_secret(status, &body) && token.client_secret.is_some() {
        log::debug!("Token endpoint wants the client secret, retrying");
        post_refresh(http, token, refresh_token, true)?
    } else {
        (status, body)
    };

    if !(200..300).contains(&status) {
        return Err(classify_refresh_failure(status, &body));
    }
    let response: RefreshResponse = serde_json::from_str(&body)?;
    refreshed_token(token, response, Utc::now())
}

fn post_refresh(
    http: &reqwest::blocking::Client,
    token: &GoogleToken,
    refresh_token: &str,
    with_secret: bool,
) -> Result<(u16, String), GoogleApiError> {
    let mut form: Vec<(&str, &str)> = vec![
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", token.client_id.as_str()),
    ];
    if let (true, Some(secret)) = (with_secret, token.client_secret.as_deref()) {
        form.push(("client_secret", secret));
    }

    let response = http.post(&token.token_uri).form(&form).send()?;
    let status = response.status().as_u16();
    Ok((status, response.text().unwrap_or_default()))
}

fn needs_client_secret(status: u16, body: &str) -> bool {
    status == 400 && body.contains("invalid_client")
}

/// Revoked or expired grants need a new authorization; anything else is a
/// refresh failure worth retrying on a later run.
fn classify_refresh_failure(status: u16, body: &str) -> GoogleApiError {
    let body_lower = body.to_lowercase();
    let grant_gone = body_lower.contains("invalid_grant") || body_lower.contains("token has been expired");
    match status {
        400 | 401 if grant_gone => GoogleApiError::AuthExpired,
        _ => GoogleApiError::RefreshFailed(format!("HTTP {}: {}", status, body.trim())),
    }
}

fn refreshed_token(
    token: &GoogleToken,
    response: RefreshResponse,
    now: DateTime<Utc>,
) -> Result<GoogleToken, GoogleApiError> {
    let access_token = response
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| GoogleApiError::RefreshFailed("no access_token in response".into()))?;
    let lifetime = response.expires_in.unwrap_or(DEFAULT_LIFETIME_SECS);

    Ok(GoogleToken {
        token: access_token,
        expiry: Some((now + chrono::Duration::seconds(lifetime)).to_rfc3339()),
        ..token.clone()
    })
}
