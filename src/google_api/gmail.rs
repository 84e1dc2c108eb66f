//! Gmail API v1: recent correspondence with one company domain.
//!
//! Searches `(from:D OR to:D)` minus calendar-invite noise, fetches each
//! message in full, extracts the plain-text body, and renders the threads as
//! a "YOU wrote / THEY wrote" transcript for summarization.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use serde::Deserialize;

use super::{GoogleApiError, GoogleSession};
use crate::error::ReportError;
use crate::util::domain_from_email;
use crate::workflow::CorrespondenceSource;

const MESSAGES_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages";
const PROFILE_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/profile";

/// Upper bound on messages pulled per domain.
const MAX_MESSAGES: &str = "100";

/// Separator between rendered threads.
pub const THREAD_SEPARATOR: &str = "\n\n=== NEW THREAD ===\n\n";

// ============================================================================
// API response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageStub>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageStub {
    id: String,
    #[serde(default)]
    thread_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FullMessageDetail {
    #[serde(default)]
    thread_id: String,
    #[serde(default)]
    internal_date: Option<String>,
    #[serde(default)]
    payload: Option<FullPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FullPayload {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    body: Option<PayloadBody>,
    #[serde(default)]
    parts: Vec<FullPayload>,
}

#[derive(Debug, Deserialize)]
struct Header {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayloadBody {
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    #[serde(default)]
    email_address: String,
}

// ============================================================================
// Public types
// ============================================================================

/// One message in a thread, labelled by which side wrote it.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadMessage {
    pub sender: String,
    pub body: String,
    /// Raw `Date` header, shown to the model as-is.
    pub timestamp: String,
    /// Milliseconds since epoch; used for ordering.
    pub sort_key: i64,
    pub is_you: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailThread {
    pub thread_id: String,
    pub subject: String,
    pub messages: Vec<ThreadMessage>,
}

// ============================================================================
// Body + header helpers
// ============================================================================

/// Gmail search for one domain since `after`.
pub fn domain_query(domain: &str, after: NaiveDate) -> String {
    format!(
        "(from:{domain} OR to:{domain}) \
         -subject:(Accepted OR Declined OR \"Invitation:\" OR \"Updated invitation:\") \
         after:{}",
        after.format("%Y/%m/%d")
    )
}

fn multi_newline_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"\n{3,}").expect("valid newline regex"))
}

/// Plain-text body of a message, walking nested multiparts.
///
/// The first `text/plain` part wins. Runs of three or more newlines collapse
/// to one blank line.
fn extract_body_text(payload: &FullPayload) -> String {
    let raw = find_plain_text(payload).unwrap_or_default();
    multi_newline_re()
        .replace_all(raw.trim(), "\n\n")
        .into_owned()
}

fn find_plain_text(payload: &FullPayload) -> Option<String> {
    if payload.mime_type == "text/plain" {
        if let Some(data) = payload.body.as_ref().and_then(|b| b.data.as_deref()) {
            return decode_url_safe_base64(data);
        }
    }
    for part in &payload.parts {
        if part.mime_type == "text/plain" || part.mime_type.starts_with("multipart/") {
            if let Some(text) = find_plain_text(part).filter(|t| !t.trim().is_empty()) {
                return Some(text);
            }
        }
    }
    None
}

/// Decode URL-safe base64 as used by Gmail API, with or without padding.
fn decode_url_safe_base64(data: &str) -> Option<String> {
    use base64::Engine;
    let trimmed = data.trim().trim_end_matches('=');
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(trimmed)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

fn header_value<'a>(headers: &'a [Header], name: &str) -> &'a str {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
        .unwrap_or("")
}

/// Address part of a `From` header like `"Jane Doe" <jane@acme.com>`.
fn sender_address(from: &str) -> &str {
    match (from.find('<'), from.rfind('>')) {
        (Some(lt), Some(gt)) if lt < gt => from[lt + 1..gt].trim(),
        _ => from.trim(),
    }
}

// ============================================================================
// Thread assembly + rendering
// ============================================================================

/// Group fetched messages into threads, oldest message first.
///
/// Threads keep the order in which their first message was seen.
fn group_threads(messages: Vec<(String, FullMessageDetail)>, user_domain: &str) -> Vec<EmailThread> {
    let mut threads: Vec<EmailThread> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (fallback_thread_id, detail) in messages {
        let thread_id = if detail.thread_id.is_empty() {
            fallback_thread_id
        } else {
            detail.thread_id.clone()
        };
        let Some(payload) = detail.payload.as_ref() else {
            continue;
        };
        let sender = header_value(&payload.headers, "From").to_string();
        let sender_domain = domain_from_email(sender_address(&sender));
        let message = ThreadMessage {
            body: extract_body_text(payload),
            timestamp: header_value(&payload.headers, "Date").to_string(),
            sort_key: detail
                .internal_date
                .as_deref()
                .and_then(|d| d.parse().ok())
                .unwrap_or(0),
            is_you: !user_domain.is_empty() && sender_domain == user_domain,
            sender,
        };

        let slot = *index.entry(thread_id.clone()).or_insert_with(|| {
            threads.push(EmailThread {
                thread_id,
                subject: header_value(&payload.headers, "Subject").to_string(),
                messages: Vec::new(),
            });
            threads.len() - 1
        });
        threads[slot].messages.push(message);
    }

    for thread in &mut threads {
        thread.messages.sort_by_key(|m| m.sort_key);
    }
    threads
}

/// Render a thread as a transcript for the model.
pub fn format_thread(thread: &EmailThread) -> String {
    let mut lines = vec![format!("Subject: {}", thread.subject), String::new()];
    for msg in &thread.messages {
        let label = if msg.is_you { "YOU wrote:" } else { "THEY wrote:" };
        lines.push(format!("--- {} ({}) ---", label, msg.timestamp));
        lines.push(msg.body.clone());
        lines.push(String::new());
    }
    lines.join("\n")
}

/// Render all threads; empty string when there are none.
pub fn format_threads(threads: &[EmailThread]) -> String {
    threads
        .iter()
        .map(format_thread)
        .collect::<Vec<_>>()
        .join(THREAD_SEPARATOR)
}

// ============================================================================
// Gmail API
// ============================================================================

/// Email address of the authorized mailbox.
pub fn fetch_user_email(session: &GoogleSession) -> Result<String, GoogleApiError> {
    let profile: ProfileResponse = session.get_json(PROFILE_URL, &[])?;
    Ok(profile.email_address)
}

/// Threads involving `domain` since `after`.
///
/// A message that fails to fetch is logged and skipped.
pub fn search_domain_threads(
    session: &GoogleSession,
    domain: &str,
    after: NaiveDate,
    user_domain: &str,
) -> Result<Vec<EmailThread>, GoogleApiError> {
    let query = domain_query(domain, after);
    let list: MessageListResponse = session.get_json(
        MESSAGES_URL,
        &[("q", query.as_str()), ("maxResults", MAX_MESSAGES)],
    )?;

    let mut details = Vec::with_capacity(list.messages.len());
    for stub in list.messages {
        let url = format!("{}/{}", MESSAGES_URL, stub.id);
        match session.get_json::<FullMessageDetail>(&url, &[("format", "full")]) {
            Ok(detail) => {
                let fallback = if stub.thread_id.is_empty() {
                    stub.id.clone()
                } else {
                    stub.thread_id.clone()
                };
                details.push((fallback, detail));
            }
            Err(GoogleApiError::AuthExpired) => return Err(GoogleApiError::AuthExpired),
            Err(e) => log::warn!("Gmail: skipping message {}: {}", stub.id, e),
        }
    }

    Ok(group_threads(details, user_domain))
}

/// Gmail as the run's correspondence source.
pub struct GmailCorrespondence {
    session: Arc<GoogleSession>,
    today: NaiveDate,
    user_domain: OnceLock<String>,
}

impl GmailCorrespondence {
    pub fn new(session: Arc<GoogleSession>) -> Self {
        Self {
            session,
            today: chrono::Local::now().date_naive(),
            user_domain: OnceLock::new(),
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Domain of the mailbox owner; looked up once per run.
    fn user_domain(&self) -> Result<&str, GoogleApiError> {
        if let Some(domain) = self.user_domain.get() {
            return Ok(domain.as_str());
        }
        let email = match fetch_user_email(&self.session) {
            Ok(email) => email,
            Err(GoogleApiError::AuthExpired) => return Err(GoogleApiError::AuthExpired),
            Err(e) => {
                log::warn!("Gmail profile lookup failed, using token account: {}", e);
                self.session.account_email().unwrap_or_default()
            }
        };
        Ok(self
            .user_domain
            .get_or_init(|| domain_from_email(&email))
            .as_str())
    }
}

impl CorrespondenceSource for GmailCorrespondence {
    fn get_correspondence(&self, domain: &str, lookback_days: u32) -> Result<String, ReportError> {
        let user_domain = self.user_domain()?.to_string();
        let after = crate::notes::cutoff_date(self.today, lookback_days);
        let threads = search_domain_threads(&self.session, domain, after, &user_domain)?;
        log::debug!("Gmail: {} threads for {}", threads.len(), domain);
        Ok(format_threads(&threads))
    }
}
