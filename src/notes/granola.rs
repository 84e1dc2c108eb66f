//! Granola's local cache as a note source.
//!
//! `cache-v3.json` is double-encoded: the top-level `cache` field is a JSON
//! string holding `{"state": {"documents": {...}, "transcripts": {...}}}`.
//! Only documents flagged as valid meetings are read.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

use super::{cutoff_date, NoteSource};
use crate::error::ReportError;
use crate::types::Note;
use crate::util::name_from_email;

pub struct GranolaNotes {
    cache_path: PathBuf,
    today: NaiveDate,
}

impl GranolaNotes {
    pub fn new(cache_path: PathBuf) -> Self {
        Self {
            cache_path,
            today: chrono::Local::now().date_naive(),
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

impl NoteSource for GranolaNotes {
    fn name(&self) -> &'static str {
        "granola"
    }

    fn scan(&self, lookback_days: u32) -> Result<Vec<Note>, ReportError> {
        if !self.cache_path.is_file() {
            return Err(ReportError::NoteSourceUnavailable(format!(
                "Granola cache not found at {}",
                self.cache_path.display()
            )));
        }
        let raw = std::fs::read_to_string(&self.cache_path)?;
        let cutoff = cutoff_date(self.today, lookback_days);
        let mut notes: Vec<Note> = parse_cache(&raw)
            .map_err(|message| ReportError::ParseError {
                path: self.cache_path.clone(),
                message,
            })?
            .into_iter()
            .filter(|note| note.date >= cutoff)
            .collect();
        notes.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.source_key.cmp(&b.source_key)));
        Ok(notes)
    }
}

// ============================================================================
// Cache format
// ============================================================================

#[derive(Debug, Deserialize)]
struct CacheFile {
    cache: String,
}

#[derive(Debug, Deserialize)]
struct CacheState {
    state: InnerState,
}

#[derive(Debug, Deserialize)]
struct InnerState {
    #[serde(default)]
    documents: HashMap<String, CachedDocument>,
    #[serde(default)]
    transcripts: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CachedDocument {
    id: Option<String>,
    title: Option<String>,
    created_at: Option<String>,
    #[serde(default)]
    notes_markdown: Option<String>,
    #[serde(rename = "type")]
    doc_type: Option<String>,
    #[serde(default)]
    valid_meeting: Option<bool>,
    google_calendar_event: Option<CalendarEventRef>,
    people: Option<People>,
}

#[derive(Debug, Deserialize)]
struct CalendarEventRef {
    id: Option<String>,
    start: Option<EventStart>,
}

#[derive(Debug, Deserialize)]
struct EventStart {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct People {
    #[serde(default)]
    attendees: Vec<Person>,
}

#[derive(Debug, Deserialize)]
struct Person {
    name: Option<String>,
    email: Option<String>,
}

/// Parse the cache contents into notes (no date filtering).
fn parse_cache(raw: &str) -> Result<Vec<Note>, String> {
    let outer: CacheFile =
        serde_json::from_str(raw).map_err(|e| format!("outer JSON: {}", e))?;
    let inner: CacheState =
        serde_json::from_str(&outer.cache).map_err(|e| format!("inner JSON: {}", e))?;
    let state = inner.state;

    let mut notes = Vec::new();
    for (key, doc) in state.documents {
        if doc.valid_meeting != Some(true) || doc.doc_type.as_deref() != Some("meeting") {
            continue;
        }
        let id = doc.id.clone().unwrap_or(key);

        let Some(date) = document_date(&doc) else {
            log::debug!("Granola: skipping {} without a usable date", id);
            continue;
        };

        let content = state
            .transcripts
            .get(&id)
            .and_then(transcript_text)
            .filter(|t| !t.trim().is_empty())
            .or_else(|| doc.notes_markdown.clone())
            .filter(|c| !c.trim().is_empty());
        let Some(content) = content else {
            continue;
        };

        let external_id = doc
            .google_calendar_event
            .as_ref()
            .and_then(|e| e.id.clone())
            .filter(|e| !e.trim().is_empty());

        notes.push(Note {
            source_key: id,
            date,
            external_id,
            company: None,
            topic: doc.title.filter(|t| !t.trim().is_empty()),
            attendee_names: attendee_names(doc.people.as_ref()),
            content,
        });
    }
    Ok(notes)
}

/// Day of the linked calendar event, else the day the document was created.
fn document_date(doc: &CachedDocument) -> Option<NaiveDate> {
    let from_event = doc
        .google_calendar_event
        .as_ref()
        .and_then(|e| e.start.as_ref())
        .and_then(|s| s.date_time.as_deref());
    [from_event, doc.created_at.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|ts| NaiveDate::parse_from_str(ts.get(..10)?, "%Y-%m-%d").ok())
}

fn attendee_names(people: Option<&People>) -> Vec<String> {
    let Some(people) = people else {
        return Vec::new();
    };
    people
        .attendees
        .iter()
        .filter_map(|p| {
            p.name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .or_else(|| p.email.as_deref().map(name_from_email))
        })
        .filter(|n| !n.is_empty())
        .collect()
}

/// Transcript text: a bare string, an object with `text`/`transcript`, or a
/// list of utterance objects joined line by line.
fn transcript_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(obj) => obj
            .get("text")
            .or_else(|| obj.get("transcript"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        serde_json::Value::Array(items) => {
            let lines: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("text").and_then(|t| t.as_str()))
                .collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_cache(dir: &std::path::Path, state: serde_json::Value) -> PathBuf {
        let path = dir.join("cache-v3.json");
        let outer = json!({ "cache": serde_json::to_string(&state).unwrap() });
        std::fs::write(&path, serde_json::to_string(&outer).unwrap()).unwrap();
        path
    }

    fn sample_state() -> serde_json::Value {
        json!({
            "state": {
                "documents": {
                    "doc-1": {
                        "id": "doc-1",
                        "title": "Acme pricing call",
                        "type": "meeting",
                        "valid_meeting": true,
                        "created_at": "2025-01-19T22:00:00Z",
                        "notes_markdown": "## Notes\nThey want annual billing.",
                        "google_calendar_event": {
                            "id": "cal-123",
                            "start": {"dateTime": "2025-01-20T14:00:00-05:00"}
                        },
                        "people": {"attendees": [
                            {"name": "Jane Doe", "email": "jane@acme.com"},
                            {"email": "bob.stone@acme.com"}
                        ]}
                    },
                    "doc-2": {
                        "id": "doc-2",
                        "title": "Not a meeting",
                        "type": "meeting",
                        "valid_meeting": false,
                        "created_at": "2025-01-20T10:00:00Z",
                        "notes_markdown": "filtered"
                    },
                    "doc-3": {
                        "title": "Globex intro",
                        "type": "meeting",
                        "valid_meeting": true,
                        "created_at": "2025-01-22T10:00:00Z",
                        "notes_markdown": "markdown fallback"
                    },
                    "doc-4": {
                        "id": "doc-4",
                        "title": "Old",
                        "type": "meeting",
                        "valid_meeting": true,
                        "created_at": "2024-11-01T10:00:00Z",
                        "notes_markdown": "too old"
                    },
                    "doc-5": {
                        "id": "doc-5",
                        "title": "Empty",
                        "type": "meeting",
                        "valid_meeting": true,
                        "created_at": "2025-01-21T10:00:00Z",
                        "notes_markdown": "  "
                    }
                },
                "transcripts": {
                    "doc-3": [{"text": "Hello."}, {"text": "Hi there."}]
                }
            }
        })
    }

    #[test]
    fn test_scan_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_cache(dir.path(), sample_state());
        let source = GranolaNotes::new(path)
            .with_today(NaiveDate::from_ymd_opt(2025, 1, 24).unwrap());

        let notes = source.scan(7).unwrap();
        assert_eq!(notes.len(), 2);

        let acme = &notes[0];
        assert_eq!(acme.source_key, "doc-1");
        assert_eq!(acme.date, NaiveDate::from_ymd_opt(2025, 1, 20).unwrap());
        assert_eq!(acme.external_id.as_deref(), Some("cal-123"));
        assert_eq!(acme.topic.as_deref(), Some("Acme pricing call"));
        assert_eq!(acme.attendee_names, vec!["Jane Doe", "Bob Stone"]);
        assert!(acme.content.contains("annual billing"));

        let globex = &notes[1];
        assert_eq!(globex.source_key, "doc-3");
        assert_eq!(globex.content, "Hello.\nHi there.");
        assert_eq!(globex.external_id, None);
    }

    #[test]
    fn test_transcript_preferred_over_markdown() {
        assert_eq!(
            transcript_text(&json!({"transcript": "raw words"})).as_deref(),
            Some("raw words")
        );
        assert_eq!(transcript_text(&json!(42)), None);
        assert_eq!(transcript_text(&json!([])), None);
    }

    #[test]
    fn test_missing_cache_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = GranolaNotes::new(dir.path().join("cache-v3.json"));
        assert!(matches!(
            source.scan(7),
            Err(ReportError::NoteSourceUnavailable(_))
        ));
    }

    #[test]
    fn test_malformed_cache_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache-v3.json");
        std::fs::write(&path, r#"{"cache": "{not json"}"#).unwrap();
        let err = GranolaNotes::new(path).scan(7).unwrap_err();
        assert!(matches!(err, ReportError::ParseError { ref message, .. } if message.contains("inner")));
    }
}
