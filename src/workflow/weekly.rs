//! Weekly report run: collect, match, synthesize, assemble.
//!
//! Publishing and committing are left to the caller so a dry run, a
//! Markdown-only run and a full run share this path.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::entity::EntityStore;
use crate::error::ReportError;
use crate::intelligence::{is_error_summary, Summarizer};
use crate::matching::NoteMatcher;
use crate::notes::{scan_or_empty, NoteSource};
use crate::prepare::build_entity_context;
use crate::report::{assemble_report, Report};
use crate::types::{Entity, EntityClass, Settings};

use super::{CorrespondenceSource, MeetingSource};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub meetings: usize,
    pub notes: usize,
    pub matched: usize,
    /// Entities with neither matched notes nor correspondence.
    pub quiet: usize,
    pub synthesized: usize,
    /// Entities whose synthesis came back as an error.
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct WeeklyOutcome {
    pub report: Report,
    pub stats: RunStats,
}

/// Everything one run needs, borrowed for its duration.
pub struct WeeklyRun<'a> {
    pub settings: &'a Settings,
    pub entities: &'a EntityStore,
    pub meetings: &'a dyn MeetingSource,
    pub notes: &'a dyn NoteSource,
    pub correspondence: &'a dyn CorrespondenceSource,
    pub summarizer: &'a dyn Summarizer,
}

impl WeeklyRun<'_> {
    /// Build the report dated `today`.
    ///
    /// A meeting-source failure aborts the run. Note and correspondence
    /// failures that are degradable count as "nothing found".
    pub fn run(&self, today: NaiveDate) -> Result<WeeklyOutcome, ReportError> {
        let lookback = self.settings.lookback_days;
        let mut stats = RunStats::default();

        log::info!("Collecting data for the past {} days", lookback);
        let meetings = self.meetings.fetch_meetings(lookback)?;
        stats.meetings = meetings.len();
        log::info!("Found {} external meetings", meetings.len());

        let notes = scan_or_empty(self.notes, lookback);
        stats.notes = notes.len();

        let matcher = NoteMatcher::new(&self.settings.matching, &self.settings.internal_domain);
        let domain_map = self.entities.domain_map();
        let matches = matcher.match_notes(&meetings, &notes, &domain_map);
        stats.matched = matches.len();
        log::info!("Matched {} of {} meetings with notes", matches.len(), meetings.len());

        let mut updates: BTreeMap<EntityClass, BTreeMap<String, String>> = BTreeMap::new();
        for class in EntityClass::ALL {
            log::info!("Processing {} entities", class);
            for entity in self.entities.of_class(class) {
                let correspondence = self.correspondence_for(entity, lookback)?;
                let context = build_entity_context(&entity.domain, &matches, correspondence.as_deref());
                if context.trim().is_empty() {
                    log::debug!("{}: no activity", entity.name);
                    stats.quiet += 1;
                    continue;
                }

                log::info!("Synthesizing: {}", entity.name);
                let summary = self.summarizer.synthesize(&context, &entity.name, class);
                if is_error_summary(&summary) {
                    log::warn!("{}: {}", entity.name, summary.trim());
                    stats.failed += 1;
                    continue;
                }
                stats.synthesized += 1;
                updates
                    .entry(class)
                    .or_default()
                    .insert(entity.name.clone(), summary);
            }
        }

        let empty = BTreeMap::new();
        let section = |class: EntityClass| updates.get(&class).unwrap_or(&empty);
        let report = assemble_report(
            section(EntityClass::Deal),
            section(EntityClass::AgencyPartner),
            section(EntityClass::TechPartner),
            today,
        );
        log::info!(
            "Generated updates: {} deals, {} agencies, {} tech",
            report.count(EntityClass::Deal),
            report.count(EntityClass::AgencyPartner),
            report.count(EntityClass::TechPartner)
        );

        Ok(WeeklyOutcome { report, stats })
    }

    fn correspondence_for(&self, entity: &Entity, lookback: u32) -> Result<Option<String>, ReportError> {
        match self.correspondence.get_correspondence(&entity.domain, lookback) {
            Ok(text) if text.trim().is_empty() => {
                log::debug!("{}: no emails", entity.name);
                Ok(None)
            }
            Ok(text) => {
                log::debug!("{}: found emails", entity.name);
                Ok(Some(text))
            }
            Err(e) if e.is_degradable() => {
                log::warn!("{}: emails unavailable: {}", entity.name, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
