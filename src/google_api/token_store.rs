//! `token.json`: the authorized-user credentials every Google call runs on.
//!
//! The file is produced by Google's own OAuth helpers (google-auth's
//! `Credentials.to_json()`), so field names follow that layout. It is only
//! ever rewritten after a successful refresh.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GoogleApiError;

const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the recorded expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Authorized-user credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleToken {
    #[serde(alias = "access_token")]
    pub token: String,
    pub refresh_token: Option<String>,
    #[serde(default = "google_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// RFC 3339, or a naive UTC timestamp without offset.
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default, alias = "email")]
    pub account: Option<String>,
    #[serde(default)]
    pub universe_domain: Option<String>,
}

fn google_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

impl GoogleToken {
    /// Parsed expiry. `None` when absent or unreadable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.expiry.as_deref()?.trim();
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|n| n.and_utc()))
            .ok()
    }

    /// True when the access token must be refreshed before use at `now`.
    /// An unknown expiry always needs a refresh.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(at) => at <= now + chrono::Duration::seconds(EXPIRY_SKEW_SECS),
            None => true,
        }
    }

    /// The account email, if recorded and non-blank.
    pub fn account_email(&self) -> Option<&str> {
        self.account.as_deref().map(str::trim).filter(|a| !a.is_empty())
    }
}

pub fn load_token(path: &Path) -> Result<GoogleToken, GoogleApiError> {
    if !path.exists() {
        return Err(GoogleApiError::TokenNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write the token atomically, readable by the owner only.
pub fn save_token(path: &Path, token: &GoogleToken) -> Result<(), GoogleApiError> {
    let content = serde_json::to_string_pretty(token)?;
    crate::util::atomic_write_str(path, &content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(expiry: Option<String>) -> GoogleToken {
        serde_json::from_value(serde_json::json!({
            "token": "ya29.a",
            "refresh_token": "1//r",
            "client_id": "client",
            "expiry": expiry,
        }))
        .unwrap()
    }

    #[test]
    fn test_reads_google_auth_layout() {
        let token: GoogleToken = serde_json::from_str(
            r#"{
                "token": "ya29.abc",
                "refresh_token": "1//refresh",
                "token_uri": "https://oauth2.googleapis.com/token",
                "client_id": "client.apps.googleusercontent.com",
                "client_secret": "secret",
                "scopes": ["https://www.googleapis.com/auth/calendar.readonly"],
                "expiry": "2026-02-08T12:00:00.000000Z",
                "account": "me@myco.com",
                "universe_domain": "googleapis.com"
            }"#,
        )
        .unwrap();
        assert_eq!(token.token, "ya29.abc");
        assert_eq!(token.account_email(), Some("me@myco.com"));
        assert_eq!(token.scopes.len(), 1);
        assert!(token.expires_at().is_some());
    }

    #[test]
    fn test_access_token_alias_and_default_uri() {
        let token: GoogleToken =
            serde_json::from_str(r#"{"access_token": "ya29.x", "client_id": "c"}"#).unwrap();
        assert_eq!(token.token, "ya29.x");
        assert_eq!(token.token_uri, GOOGLE_TOKEN_URI);
        assert!(token.refresh_token.is_none());
    }

    #[test]
    fn test_needs_refresh() {
        let now = Utc::now();
        assert!(token(None).needs_refresh(now));
        assert!(token(Some("garbage".into())).needs_refresh(now));
        assert!(!token(Some((now + Duration::hours(1)).to_rfc3339())).needs_refresh(now));
        assert!(token(Some((now - Duration::hours(1)).to_rfc3339())).needs_refresh(now));
        // Inside the skew window.
        assert!(token(Some((now + Duration::seconds(30)).to_rfc3339())).needs_refresh(now));
    }

    #[test]
    fn test_naive_expiry_is_utc() {
        let now = Utc::now();
        let naive = (now + Duration::hours(1)).format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        assert!(!token(Some(naive)).needs_refresh(now));
    }

    #[test]
    fn test_missing_token_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        assert!(matches!(
            load_token(&path),
            Err(GoogleApiError::TokenNotFound(p)) if p == path
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let mut original = token(None);
        original.account = Some("me@myco.com".into());

        save_token(&path, &original).unwrap();
        let loaded = load_token(&path).unwrap();
        assert_eq!(loaded.token, "ya29.a");
        assert_eq!(loaded.account_email(), Some("me@myco.com"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_malformed_token_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_token(&path), Err(GoogleApiError::Json(_))));
    }
}
