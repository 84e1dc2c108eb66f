//! Per-entity context blob fed to the summarizer.

use crate::matching::Match;

pub const EMAIL_HEADER: &str = "=== EMAIL CORRESPONDENCE ===";

/// Header line introducing one meeting's notes.
pub fn meeting_header(date: chrono::NaiveDate, title: &str) -> String {
    format!("=== MEETING: {} - {} ===", date, title)
}

/// Concatenate everything known about one entity this week.
///
/// Every matched note whose meeting involved `domain` comes first, in match
/// order, each under its meeting header and followed by a blank line. Non-blank
/// correspondence follows under [`EMAIL_HEADER`]. Returns an empty string when
/// there is nothing to say.
pub fn build_entity_context(domain: &str, matches: &[Match<'_>], correspondence: Option<&str>) -> String {
    let domain = domain.trim().to_lowercase();
    let mut parts: Vec<String> = Vec::new();

    for m in matches.iter().filter(|m| m.meeting.domains.contains(&domain)) {
        parts.push(meeting_header(m.meeting.date, &m.meeting.title));
        parts.push(m.note.content.clone());
        parts.push(String::new());
    }

    if let Some(emails) = correspondence.filter(|c| !c.trim().is_empty()) {
        parts.push(EMAIL_HEADER.to_string());
        parts.push(emails.to_string());
    }

    parts.join("\n")
}
