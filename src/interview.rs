//! Deal review before a run.
//!
//! 1. External domains seen in recent meetings but not tracked yet are shown
//!    with a few of their meetings; entering a company name adds the domain
//!    as a deal, an empty answer skips it.
//! 2. Existing deals are listed; entering comma-separated numbers removes them.
//!
//! Reads answers from any `BufRead` and writes prompts to any `Write`, so the
//! review can run against stdin/stdout or a scripted buffer.

use std::collections::{BTreeMap, HashSet};
use std::io::{BufRead, Write};
use std::path::Path;

use chrono::NaiveDate;

use crate::entity::EntityStore;
use crate::error::ReportError;
use crate::types::{EntityClass, Meeting};

/// Meetings listed under each new domain.
const MEETINGS_SHOWN: usize = 3;

/// What the review changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterviewOutcome {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl InterviewOutcome {
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Untracked external domains with the meetings they appeared in, by domain.
pub fn new_external_domains<'m>(
    meetings: &'m [Meeting],
    known: &HashSet<String>,
    internal_domain: &str,
) -> BTreeMap<String, Vec<&'m Meeting>> {
    let internal = internal_domain.trim().to_lowercase();
    let mut found: BTreeMap<String, Vec<&Meeting>> = BTreeMap::new();
    for meeting in meetings {
        for domain in &meeting.domains {
            if domain.is_empty() || *domain == internal || known.contains(domain) {
                continue;
            }
            found.entry(domain.clone()).or_default().push(meeting);
        }
    }
    found
}

/// Parse "1, 3" into 0-based positions. Any non-number rejects the whole answer.
pub fn parse_removals(answer: &str) -> Option<HashSet<usize>> {
    answer
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(|n| n - 1)
        })
        .collect()
}

pub struct Interview<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Interview<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Run both review steps and save the deal list if it changed.
    pub fn run(
        &mut self,
        store: &mut EntityStore,
        meetings: &[Meeting],
        internal_domain: &str,
        deals_path: &Path,
        today: NaiveDate,
    ) -> Result<InterviewOutcome, ReportError> {
        writeln!(self.output, "\n{}", "=".repeat(60))?;
        writeln!(self.output, "DEAL & PARTNER REVIEW")?;
        writeln!(self.output, "{}", "=".repeat(60))?;

        let mut outcome = InterviewOutcome {
            added: self.review_new_domains(store, meetings, internal_domain, today)?,
            removed: Vec::new(),
        };
        outcome.removed = self.review_existing_deals(store)?;

        if outcome.changed() {
            store.save_deals(deals_path)?;
            log::info!(
                "Deal list updated: {} added, {} removed",
                outcome.added.len(),
                outcome.removed.len()
            );
        }

        writeln!(self.output, "\nInterview complete.\n")?;
        Ok(outcome)
    }

    fn review_new_domains(
        &mut self,
        store: &mut EntityStore,
        meetings: &[Meeting],
        internal_domain: &str,
        today: NaiveDate,
    ) -> Result<Vec<String>, ReportError> {
        let new_domains = new_external_domains(meetings, &store.known_domains(), internal_domain);
        if new_domains.is_empty() {
            writeln!(self.output, "\nNo new external domains found in recent meetings.")?;
            return Ok(Vec::new());
        }

        writeln!(self.output, "\nFound {} new domain(s):\n", new_domains.len())?;
        let mut added = Vec::new();
        for (domain, seen) in &new_domains {
            writeln!(self.output, "Domain: {}", domain)?;
            writeln!(self.output, "  Meetings: {}", seen.len())?;
            for m in seen.iter().take(MEETINGS_SHOWN) {
                writeln!(self.output, "    - {}: {}", m.date, m.title)?;
            }

            let answer = self.ask("\n  Is this a Deal? Enter company name (or press Enter to skip): ")?;
            if answer.is_empty() {
                writeln!(self.output, "  Skipped.\n")?;
                continue;
            }
            store.add_deal(domain, &answer, Some(today.format("%Y-%m-%d").to_string()));
            writeln!(self.output, "  Added '{}' as a deal.\n", answer)?;
            added.push(answer);
        }
        Ok(added)
    }

    fn review_existing_deals(&mut self, store: &mut EntityStore) -> Result<Vec<String>, ReportError> {
        writeln!(self.output, "\n{}", "-".repeat(40))?;
        writeln!(self.output, "EXISTING DEALS REVIEW")?;
        writeln!(self.output, "{}", "-".repeat(40))?;

        let deal_count = store.count(EntityClass::Deal);
        if deal_count == 0 {
            writeln!(self.output, "No active deals.")?;
            return Ok(Vec::new());
        }

        writeln!(self.output, "\nActive deals ({}):\n", deal_count)?;
        for (i, deal) in store.of_class(EntityClass::Deal).enumerate() {
            writeln!(
                self.output,
                "  {}. {} ({}) - Added: {}",
                i + 1,
                deal.name,
                deal.domain,
                deal.added.as_deref().unwrap_or("unknown")
            )?;
        }

        let answer = self.ask(
            "\nEnter numbers to remove (comma-separated), or press Enter to keep all:\n> ",
        )?;
        if answer.is_empty() {
            writeln!(self.output, "All deals kept.")?;
            return Ok(Vec::new());
        }

        let Some(positions) = parse_removals(&answer) else {
            writeln!(self.output, "Invalid input. No deals removed.")?;
            return Ok(Vec::new());
        };
        let removed: Vec<String> = store
            .remove_deals(&positions)
            .into_iter()
            .map(|e| e.name)
            .collect();
        if removed.is_empty() {
            writeln!(self.output, "\nNo deals removed.")?;
        } else {
            writeln!(self.output, "\nRemoved: {}", removed.join(", "))?;
        }
        Ok(removed)
    }

    /// Prompt and read one trimmed line. End of input counts as an empty answer.
    fn ask(&mut self, prompt: &str) -> Result<String, ReportError> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}
