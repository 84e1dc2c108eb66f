//! Google Calendar API v3: external meetings for the lookback window.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, SecondsFormat, Utc};
use serde::Deserialize;

use super::{GoogleApiError, GoogleSession};
use crate::error::ReportError;
use crate::types::Meeting;
use crate::util::domain_from_email;
use crate::workflow::MeetingSource;

const EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";

/// Calendar colors reserved for non-customer time.
///
/// 1 Lavender (internal), 3 Grape (personal), 6 Tangerine (admin), 8 Graphite (blocks).
pub const EXCLUDED_COLOR_IDS: [&str; 4] = ["1", "3", "6", "8"];

// ============================================================================
// API response types (deserialized from Google Calendar JSON)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<GoogleEventRaw>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventRaw {
    #[serde(default)]
    id: String,
    #[serde(default)]
    summary: Option<String>,
    start: Option<EventDateTime>,
    end: Option<EventDateTime>,
    #[serde(default)]
    attendees: Vec<Attendee>,
    #[serde(default)]
    color_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDateTime {
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Attendee {
    #[serde(default)]
    email: String,
    #[serde(default)]
    response_status: Option<String>,
    #[serde(default)]
    resource: Option<bool>,
    #[serde(rename = "self", default)]
    is_self: Option<bool>,
}

// ============================================================================
// Event filtering
// ============================================================================

/// Normalize a raw event into a [`Meeting`], or `None` if it is not an
/// external meeting worth reporting on.
///
/// Skipped: cancelled events, events the owner declined, reserved colors,
/// all-day events, and meetings without any attendee outside `internal_domain`.
fn meeting_from_event(event: GoogleEventRaw, internal_domain: &str) -> Option<Meeting> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }
    if event
        .color_id
        .as_deref()
        .is_some_and(|c| EXCLUDED_COLOR_IDS.contains(&c))
    {
        return None;
    }

    let self_declined = event
        .attendees
        .iter()
        .any(|a| a.is_self == Some(true) && a.response_status.as_deref() == Some("declined"));
    if self_declined {
        return None;
    }

    let start = event.start.as_ref()?;
    if start.date.is_some() && start.date_time.is_none() {
        log::debug!("Skipping all-day event '{}'", event.summary.as_deref().unwrap_or(""));
        return None;
    }
    let start_time = start.date_time.clone()?;
    let date = NaiveDate::parse_from_str(start_time.get(..10)?, "%Y-%m-%d").ok()?;

    let internal_domain = internal_domain.to_lowercase();
    let attendees: Vec<String> = event
        .attendees
        .iter()
        .filter(|a| a.resource != Some(true))
        .map(|a| a.email.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect();
    let domains: BTreeSet<String> = attendees
        .iter()
        .map(|email| domain_from_email(email))
        .filter(|d| !d.is_empty() && *d != internal_domain)
        .collect();
    if domains.is_empty() {
        return None;
    }

    let end_time = event
        .end
        .as_ref()
        .and_then(|e| e.date_time.clone())
        .unwrap_or_default();

    Some(Meeting {
        id: event.id,
        date,
        title: event
            .summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "No Title".to_string()),
        attendees,
        domains,
        start_time,
        end_time,
    })
}

// ============================================================================
// Calendar API
// ============================================================================

/// Fetch external meetings between `now - lookback_days` and now.
///
/// Handles pagination (maxResults=250, pageToken).
pub fn fetch_meetings(
    session: &GoogleSession,
    lookback_days: u32,
    internal_domain: &str,
) -> Result<Vec<Meeting>, GoogleApiError> {
    let now = Utc::now();
    let time_min = (now - chrono::Duration::days(i64::from(lookback_days)))
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    let time_max = now.to_rfc3339_opts(SecondsFormat::Secs, true);

    let mut meetings = Vec::new();
    let mut total_events = 0usize;
    let mut page_token: Option<String> = None;

    loop {
        let mut query = vec![
            ("timeMin", time_min.as_str()),
            ("timeMax", time_max.as_str()),
            ("singleEvents", "true"),
            ("orderBy", "startTime"),
            ("maxResults", "250"),
        ];
        if let Some(ref token) = page_token {
            query.push(("pageToken", token.as_str()));
        }

        let body: CalendarListResponse = session.get_json(EVENTS_URL, &query)?;
        total_events += body.items.len();
        meetings.extend(
            body.items
                .into_iter()
                .filter_map(|event| meeting_from_event(event, internal_domain)),
        );

        match body.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    log::info!(
        "Calendar: {} external meetings out of {} events",
        meetings.len(),
        total_events
    );
    Ok(meetings)
}

/// Google Calendar as the run's meeting source.
pub struct CalendarMeetings {
    session: Arc<GoogleSession>,
    internal_domain: String,
}

impl CalendarMeetings {
    pub fn new(session: Arc<GoogleSession>, internal_domain: impl Into<String>) -> Self {
        Self {
            session,
            internal_domain: internal_domain.into(),
        }
    }
}

impl MeetingSource for CalendarMeetings {
    fn fetch_meetings(&self, lookback_days: u32) -> Result<Vec<Meeting>, ReportError> {
        Ok(fetch_meetings(&self.session, lookback_days, &self.internal_domain)?)
    }
}
