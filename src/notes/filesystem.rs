//! Local folder of dated note files.
//!
//! File names carry the date and labels:
//! `2025-01-20 Acme Corp - Pricing.md`, `2025-01-20_Acme Corp_Pricing.txt`.
//! An optional header block at the top of the file adds structured fields:
//!
//! ```text
//! Attendees: Jane Doe, Bob Stone
//! Company: Acme Corp
//! Event ID: 7kq1...
//! ```

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use walkdir::WalkDir;

use super::{cutoff_date, NoteSource};
use crate::error::ReportError;
use crate::types::Note;

const NOTE_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Header lines are only looked for in the first few lines of a file.
const HEADER_SCAN_LINES: usize = 10;

pub struct FilesystemNotes {
    root: PathBuf,
    today: NaiveDate,
}

impl FilesystemNotes {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            today: chrono::Local::now().date_naive(),
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }
}

impl NoteSource for FilesystemNotes {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn scan(&self, lookback_days: u32) -> Result<Vec<Note>, ReportError> {
        if !self.root.is_dir() {
            return Err(ReportError::NoteSourceUnavailable(format!(
                "notes folder {} does not exist",
                self.root.display()
            )));
        }

        let cutoff = cutoff_date(self.today, lookback_days);
        let mut notes = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !has_note_extension(path) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(parsed) = parse_note_filename(stem) else {
                log::debug!("Skipping undated note file {}", path.display());
                continue;
            };
            if parsed.date < cutoff {
                continue;
            }

            let content = match std::fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("Could not read note {}: {}", path.display(), e);
                    continue;
                }
            };
            if content.trim().is_empty() {
                continue;
            }

            let header = parse_header(&content);
            notes.push(Note {
                source_key: path.to_string_lossy().to_string(),
                date: parsed.date,
                external_id: header.event_id,
                company: header.company.or(parsed.company),
                topic: header.topic.or(parsed.topic),
                attendee_names: header.attendees,
                content,
            });
        }

        Ok(notes)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn has_note_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| NOTE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Date and labels taken from a note file name.
#[derive(Debug, PartialEq)]
pub struct ParsedFilename {
    pub date: NaiveDate,
    pub company: Option<String>,
    pub topic: Option<String>,
}

fn filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2})[\s_\-]*(.*)$").expect("valid note filename regex")
    })
}

/// Parse `YYYY-MM-DD[ Company[ - Topic]]` from a file stem. Underscores
/// stand for spaces; `__` or `_-_` separates the topic.
pub fn parse_note_filename(stem: &str) -> Option<ParsedFilename> {
    let caps = filename_re().captures(stem.trim())?;
    let date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()?;
    let rest = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");

    // A single `_` is a word gap; only these separate company from topic.
    let (company, topic) = [" - ", "_-_", "__"]
        .iter()
        .find_map(|sep| rest.split_once(sep))
        .unwrap_or((rest, ""));

    Some(ParsedFilename {
        date,
        company: clean_label(company),
        topic: clean_label(topic),
    })
}

fn clean_label(s: &str) -> Option<String> {
    let cleaned = s.replace('_', " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    (!cleaned.is_empty()).then_some(cleaned)
}

#[derive(Debug, Default, PartialEq)]
struct NoteHeader {
    attendees: Vec<String>,
    company: Option<String>,
    topic: Option<String>,
    event_id: Option<String>,
}

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:[-*]\s*)?\**(attendees|participants|company|topic|event id)\**\s*:\s*\**\s*(.+)$")
            .expect("valid note header regex")
    })
}

fn parse_header(content: &str) -> NoteHeader {
    let mut header = NoteHeader::default();
    for line in content.lines().take(HEADER_SCAN_LINES) {
        let Some(caps) = header_re().captures(line) else {
            continue;
        };
        let value = caps[2].trim().trim_end_matches('*').trim();
        if value.is_empty() {
            continue;
        }
        match caps[1].to_lowercase().as_str() {
            "attendees" | "participants" => {
                header.attendees = value
                    .split([',', ';'])
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            "company" => header.company = Some(value.to_string()),
            "topic" => header.topic = Some(value.to_string()),
            "event id" => header.event_id = Some(value.to_string()),
            _ => {}
        }
    }
    header
}
