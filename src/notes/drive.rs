//! Shared agenda documents in Google Drive.
//!
//! One running document per company, named like "Acme + MyCo Meeting Agendas",
//! with a date header ("January 30, 2025") above each meeting's notes. Every
//! dated section becomes one [`Note`].

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use regex::Regex;

use super::{cutoff_date, NoteSource};
use crate::error::ReportError;
use crate::google_api::{docs, drive, GoogleSession};
use crate::types::Note;

const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sept|Sep|Oct|Nov|Dec";

/// Document-name suffixes that never belong to the company name.
const DOC_NAME_SUFFIXES: [&str; 4] = ["Meeting Agendas", "Meeting Agenda", "Meeting Notes", "Meetings"];

pub struct DriveNotes {
    session: Option<Arc<GoogleSession>>,
    folder_id: String,
    organization_name: String,
    today: NaiveDate,
}

impl DriveNotes {
    pub fn new(session: Option<Arc<GoogleSession>>, folder_id: String, organization_name: String) -> Self {
        Self {
            session,
            folder_id,
            organization_name,
            today: chrono::Local::now().date_naive(),
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

impl NoteSource for DriveNotes {
    fn name(&self) -> &'static str {
        "drive"
    }

    fn scan(&self, lookback_days: u32) -> Result<Vec<Note>, ReportError> {
        let session = self.session.as_ref().ok_or_else(|| {
            ReportError::NoteSourceUnavailable("Drive notes need Google authorization".to_string())
        })?;

        let cutoff = cutoff_date(self.today, lookback_days);
        let folder = Some(self.folder_id.as_str()).filter(|f| !f.trim().is_empty());
        let documents = drive::list_note_docs(session, folder)?;
        log::debug!("Drive: {} candidate note documents", documents.len());

        let mut notes = Vec::new();
        for doc in documents {
            let company = extract_company_from_doc_name(&doc.name, &self.organization_name);
            if company.is_empty() {
                continue;
            }

            let text = match docs::get_document_text(session, &doc.id) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("Could not read doc '{}': {}", doc.name, e);
                    continue;
                }
            };

            for (date, content) in split_doc_by_dates(&text) {
                if date < cutoff {
                    continue;
                }
                notes.push(Note {
                    source_key: format!("{}#{}", doc.id, date),
                    date,
                    external_id: None,
                    company: Some(company.clone()),
                    topic: None,
                    attendee_names: Vec::new(),
                    content,
                });
            }
        }

        Ok(notes)
    }
}

// ============================================================================
// Document parsing
// ============================================================================

fn suffix_regexes(organization_name: &str) -> Vec<Regex> {
    let org = organization_name.trim();
    let mut suffixes: Vec<String> = DOC_NAME_SUFFIXES.iter().map(|s| s.to_string()).collect();
    if !org.is_empty() {
        suffixes.push(format!("+ {}", org));
        suffixes.push(format!("- {}", org));
    }
    suffixes
        .iter()
        .filter_map(|s| Regex::new(&format!(r"(?i)\s*{}\s*", regex::escape(s))).ok())
        .collect()
}

/// Company name from a document title.
///
/// "Seeq + MyCo Meeting Agendas" → "Seeq" (with `organization_name` "MyCo").
pub fn extract_company_from_doc_name(doc_name: &str, organization_name: &str) -> String {
    let mut name = doc_name.to_string();
    for re in suffix_regexes(organization_name) {
        name = re.replace_all(&name, " ").into_owned();
    }
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| matches!(c, '+' | '-' | ',' | '.' | ' '))
        .to_string()
}

fn inline_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)\b({})\.?\s+(\d{{1,2}}),?\s+(\d{{4}})", MONTHS))
            .expect("valid date regex")
    })
}

fn header_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?im)^[ \t]*((?:{})\.?\s+\d{{1,2}},?\s+\d{{4}})",
            MONTHS
        ))
        .expect("valid date header regex")
    })
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// First "January 30, 2025" / "Jan 30 2025" style date in `text`.
pub fn parse_date_from_text(text: &str) -> Option<NaiveDate> {
    let caps = inline_date_re().captures(text)?;
    let month = month_number(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Split a running document into dated sections.
///
/// A section runs from a date header line to the next one. Text before the
/// first header and empty sections are dropped; a repeated date keeps the
/// later section.
pub fn split_doc_by_dates(text: &str) -> BTreeMap<NaiveDate, String> {
    let headers: Vec<_> = header_date_re().captures_iter(text).collect();
    let mut sections = BTreeMap::new();

    for (i, caps) in headers.iter().enumerate() {
        let (Some(whole), Some(header)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Some(date) = parse_date_from_text(header.as_str()) else {
            continue;
        };
        let end = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());
        let content = text[whole.end()..end].trim();
        if !content.is_empty() {
            sections.insert(date, content.to_string());
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_extract_company_from_doc_name() {
        assert_eq!(extract_company_from_doc_name("Seeq + MyCo Meeting Agendas", "MyCo"), "Seeq");
        assert_eq!(extract_company_from_doc_name("Acme Corp Meeting Notes", "MyCo"), "Acme Corp");
        assert_eq!(extract_company_from_doc_name("Globex - myco meetings", "MyCo"), "Globex");
        assert_eq!(extract_company_from_doc_name("Meeting Agenda", "MyCo"), "");
    }

    #[test]
    fn test_extract_company_without_org_name() {
        assert_eq!(extract_company_from_doc_name("Initech + MyCo Meeting Agenda", ""), "Initech + MyCo");
    }

    #[test]
    fn test_parse_date_from_text() {
        assert_eq!(parse_date_from_text("January 30, 2025"), Some(date(2025, 1, 30)));
        assert_eq!(parse_date_from_text("Notes: jan 3 2025 sync"), Some(date(2025, 1, 3)));
        assert_eq!(parse_date_from_text("Sept. 9, 2024"), Some(date(2024, 9, 9)));
        assert_eq!(parse_date_from_text("February 30, 2025"), None);
        assert_eq!(parse_date_from_text("no date here"), None);
    }

    #[test]
    fn test_split_doc_by_dates() {
        let text = "Acme agenda\nstanding items\n\
                    January 20, 2025\nPricing review.\nNext: legal.\n\
                    Jan 27 2025\n\n\
                    February 3, 2025\nKickoff went well.\n";
        let sections = split_doc_by_dates(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[&date(2025, 1, 20)], "Pricing review.\nNext: legal.");
        assert_eq!(sections[&date(2025, 2, 3)], "Kickoff went well.");
    }

    #[test]
    fn test_split_doc_only_matches_line_start() {
        let text = "March 3, 2025\nWe agreed to revisit on March 10, 2025 with legal.\n";
        let sections = split_doc_by_dates(text);
        assert_eq!(sections.len(), 1);
        assert!(sections[&date(2025, 3, 3)].contains("March 10, 2025"));
    }

    #[test]
    fn test_split_doc_repeated_date_keeps_later() {
        let text = "May 5, 2025\nfirst\nMay 5, 2025\nsecond\n";
        let sections = split_doc_by_dates(text);
        assert_eq!(sections[&date(2025, 5, 5)], "second");
    }

    #[test]
    fn test_scan_without_session_is_unavailable() {
        let source = DriveNotes::new(None, "folder".into(), "MyCo".into());
        assert!(matches!(
            source.scan(7),
            Err(ReportError::NoteSourceUnavailable(_))
        ));
    }
}
