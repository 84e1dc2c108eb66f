//! Meeting-note backends.
//!
//! Every backend normalizes its notes to [`Note`] before matching:
//! - `filesystem`: dated Markdown/text files in a local folder
//! - `drive`: shared agenda documents in a Google Drive folder, split by date headers
//! - `granola`: Granola's local cache file
//!
//! Which backend runs is decided by `notes.backend` in settings.

pub mod drive;
pub mod filesystem;
pub mod granola;

use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use crate::error::ReportError;
use crate::google_api::GoogleSession;
use crate::state::ConfigPaths;
use crate::types::{Note, NoteBackend, Settings};

/// A source of meeting notes for the lookback window.
pub trait NoteSource {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Notes dated within the last `lookback_days` days.
    fn scan(&self, lookback_days: u32) -> Result<Vec<Note>, ReportError>;
}

/// Build the configured note backend.
///
/// The drive backend needs a Google session; without one it reports itself
/// unavailable at scan time.
pub fn build_note_source(
    settings: &Settings,
    paths: &ConfigPaths,
    google: Option<Arc<GoogleSession>>,
    today: NaiveDate,
) -> Box<dyn NoteSource> {
    let config = &settings.notes;
    match config.backend {
        NoteBackend::Filesystem => Box::new(
            filesystem::FilesystemNotes::new(paths.resolve_relative(&config.path)).with_today(today),
        ),
        NoteBackend::Drive => Box::new(
            drive::DriveNotes::new(
                google,
                config.folder_id.clone(),
                settings.organization_name.clone(),
            )
            .with_today(today),
        ),
        NoteBackend::Granola => Box::new(
            granola::GranolaNotes::new(paths.resolve_relative(&config.cache_path))
                .with_today(today),
        ),
    }
}

/// Scan a source, degrading any failure to an empty list.
pub fn scan_or_empty(source: &dyn NoteSource, lookback_days: u32) -> Vec<Note> {
    match source.scan(lookback_days) {
        Ok(notes) => {
            log::info!("{} notes: {} in the last {} days", source.name(), notes.len(), lookback_days);
            notes
        }
        Err(e) => {
            log::warn!(
                "{} notes unavailable, continuing without notes: {}",
                source.name(),
                e
            );
            Vec::new()
        }
    }
}

/// First day inside the lookback window.
pub(crate) fn cutoff_date(today: NaiveDate, lookback_days: u32) -> NaiveDate {
    today - Duration::days(i64::from(lookback_days))
}
