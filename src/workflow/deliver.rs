//! Report delivery.
//!
//! - `GoogleDocsPublisher`: new Google Doc, optionally filed into a Drive folder
//! - `MarkdownPublisher`: `weekly_report_<date>.md` in the reports directory
//!
//! `deliver()` tries the primary publisher and writes Markdown
//! when it fails. Only this step writes report output.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ReportError;
use crate::google_api::{docs, drive, GoogleSession};
use crate::report::{render_document_ops, render_markdown, Report};
use crate::util::atomic_write_str;

/// Writes a finished report somewhere and says where.
pub trait Publisher {
    fn name(&self) -> &'static str;

    /// Publish the report, returning its location (URL or file path).
    fn publish(&self, report: &Report) -> Result<String, ReportError>;
}

// ============================================================================
// Markdown
// ============================================================================

pub struct MarkdownPublisher {
    dir: PathBuf,
}

impl MarkdownPublisher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, report: &Report) -> PathBuf {
        self.dir
            .join(format!("weekly_report_{}.md", report.date.format("%Y-%m-%d")))
    }
}

impl Publisher for MarkdownPublisher {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn publish(&self, report: &Report) -> Result<String, ReportError> {
        let path = self.path_for(report);
        atomic_write_str(&path, &render_markdown(report)).map_err(|e| ReportError::PublishFailed {
            publisher: self.name(),
            message: format!("{}: {}", path.display(), e),
        })?;
        log::info!("Markdown report written to {}", path.display());
        Ok(path.to_string_lossy().to_string())
    }
}

// ============================================================================
// Google Docs
// ============================================================================

pub struct GoogleDocsPublisher {
    session: Arc<GoogleSession>,
    folder_id: Option<String>,
}

impl GoogleDocsPublisher {
    /// A blank `folder_id` leaves the document in the Drive root.
    pub fn new(session: Arc<GoogleSession>, folder_id: &str) -> Self {
        let folder_id = Some(folder_id.trim().to_string()).filter(|f| !f.is_empty());
        Self { session, folder_id }
    }
}

impl Publisher for GoogleDocsPublisher {
    fn name(&self) -> &'static str {
        "google_docs"
    }

    fn publish(&self, report: &Report) -> Result<String, ReportError> {
        let failed = |e: crate::google_api::GoogleApiError| ReportError::PublishFailed {
            publisher: "google_docs",
            message: e.to_string(),
        };

        let document_id = docs::create_document(&self.session, &report.title).map_err(failed)?;
        log::info!("Created document {}", document_id);

        if let Some(folder) = &self.folder_id {
            // A document outside the folder is still a usable report.
            if let Err(e) = drive::move_to_folder(&self.session, &document_id, folder) {
                log::warn!("Could not move report into folder {}: {}", folder, e);
            }
        }

        let requests = render_document_ops(report)
            .iter()
            .map(|op| op.to_request())
            .collect();
        docs::batch_update(&self.session, &document_id, requests).map_err(failed)?;

        Ok(docs::document_url(&document_id))
    }
}

// ============================================================================
// Delivery
// ============================================================================

/// Where a report ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub location: String,
    pub publisher: &'static str,
}

/// Publish with `primary`, falling back to `fallback` on failure.
///
/// An empty report is not published and yields `None`.
pub fn deliver(
    report: &Report,
    primary: &dyn Publisher,
    fallback: Option<&dyn Publisher>,
) -> Result<Option<Delivered>, ReportError> {
    if report.is_empty() {
        log::info!("No activity found for the reporting period. No report generated.");
        return Ok(None);
    }

    let err = match primary.publish(report) {
        Ok(location) => {
            return Ok(Some(Delivered {
                location,
                publisher: primary.name(),
            }))
        }
        Err(e) => e,
    };
    let Some(fallback) = fallback else {
        return Err(err);
    };

    log::error!("{} publish failed: {}", primary.name(), err);
    log::info!("Falling back to {}", fallback.name());
    let location = fallback.publish(report)?;
    Ok(Some(Delivered {
        location,
        publisher: fallback.name(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::assemble_report;
    use chrono::NaiveDate;
    use std::cell::Cell;
    use std::collections::BTreeMap;

    fn report() -> Report {
        let deals = BTreeMap::from([("Acme Corp".to_string(), "Activity: Kickoff".to_string())]);
        assemble_report(
            &deals,
            &BTreeMap::new(),
            &BTreeMap::new(),
            NaiveDate::from_ymd_opt(2025, 1, 27).unwrap(),
        )
    }

    struct FailingPublisher {
        calls: Cell<usize>,
    }

    impl Publisher for FailingPublisher {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn publish(&self, _report: &Report) -> Result<String, ReportError> {
            self.calls.set(self.calls.get() + 1);
            Err(ReportError::PublishFailed {
                publisher: "failing",
                message: "quota exceeded".into(),
            })
        }
    }

    #[test]
    fn test_markdown_publisher_writes_dated_file() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = MarkdownPublisher::new(dir.path().join("reports"));

        let location = publisher.publish(&report()).unwrap();

        let expected = dir.path().join("reports").join("weekly_report_2025-01-27.md");
        assert_eq!(PathBuf::from(&location), expected);
        let written = std::fs::read_to_string(expected).unwrap();
        assert!(written.starts_with("# Weekly Report - 2025-01-27\n"));
        assert!(written.contains("**Activity:** Kickoff"));
    }

    #[test]
    fn test_fallback_used_when_primary_fails() {
        let dir = tempfile::tempdir().unwrap();
        let primary = FailingPublisher { calls: Cell::new(0) };
        let fallback = MarkdownPublisher::new(dir.path());

        let delivered = deliver(&report(), &primary, Some(&fallback)).unwrap().unwrap();

        assert_eq!(primary.calls.get(), 1);
        assert_eq!(delivered.publisher, "markdown");
        assert!(delivered.location.ends_with("weekly_report_2025-01-27.md"));
    }

    #[test]
    fn test_primary_success_skips_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let primary = MarkdownPublisher::new(dir.path().join("primary"));
        let fallback = FailingPublisher { calls: Cell::new(0) };

        let delivered = deliver(&report(), &primary, Some(&fallback)).unwrap().unwrap();

        assert_eq!(delivered.publisher, "markdown");
        assert_eq!(fallback.calls.get(), 0);
    }

    #[test]
    fn test_both_failing_returns_fallback_error() {
        let primary = FailingPublisher { calls: Cell::new(0) };
        let fallback = FailingPublisher { calls: Cell::new(0) };

        let err = deliver(&report(), &primary, Some(&fallback)).unwrap_err();
        assert!(matches!(err, ReportError::PublishFailed { .. }));
        assert_eq!(fallback.calls.get(), 1);
    }

    #[test]
    fn test_failure_without_fallback_is_returned() {
        let primary = FailingPublisher { calls: Cell::new(0) };
        assert!(deliver(&report(), &primary, None).is_err());
    }

    #[test]
    fn test_empty_report_is_not_published() {
        let empty = assemble_report(
            &BTreeMap::new(),
            &BTreeMap::new(),
            &BTreeMap::new(),
            NaiveDate::from_ymd_opt(2025, 1, 27).unwrap(),
        );
        let primary = FailingPublisher { calls: Cell::new(0) };
        let fallback = FailingPublisher { calls: Cell::new(0) };

        assert_eq!(deliver(&empty, &primary, Some(&fallback)).unwrap(), None);
        assert_eq!(primary.calls.get(), 0);
        assert_eq!(fallback.calls.get(), 0);
    }
}
