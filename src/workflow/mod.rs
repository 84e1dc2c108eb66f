//! Weekly report workflow
//!
//! - weekly: collection → matching → synthesis → assembly
//! - deliver: publishing the assembled report (Google Docs, Markdown)
//! - commit: recording the config directory in git after a run
//!
//! The orchestrator only sees the collaborator traits below, so every
//! external system can be swapped for a fake in tests.

pub mod commit;
pub mod deliver;
pub mod weekly;

use crate::error::ReportError;
use crate::types::Meeting;

pub use deliver::{deliver, Delivered, GoogleDocsPublisher, MarkdownPublisher, Publisher};
pub use weekly::{RunStats, WeeklyOutcome, WeeklyRun};

/// External meetings for the lookback window.
pub trait MeetingSource {
    fn fetch_meetings(&self, lookback_days: u32) -> Result<Vec<Meeting>, ReportError>;
}

/// Email correspondence with one domain, formatted as a single text block.
///
/// An empty string means nothing was exchanged in the window.
pub trait CorrespondenceSource {
    fn get_correspondence(&self, domain: &str, lookback_days: u32) -> Result<String, ReportError>;
}

/// Meetings fetched earlier in the run, served again without another API call.
pub struct PrefetchedMeetings(pub Vec<Meeting>);

impl MeetingSource for PrefetchedMeetings {
    fn fetch_meetings(&self, _lookback_days: u32) -> Result<Vec<Meeting>, ReportError> {
        Ok(self.0.clone())
    }
}
