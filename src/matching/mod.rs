//! Note → meeting matching.
//!
//! Pairs notes from any backend with calendar meetings:
//! 1. Date gate: only notes dated the same calendar day are candidates.
//! 2. Strategy cascade in priority order (default: external ID, attendee
//!    name, company name, title). The first strategy that accepts any note
//!    wins, with its best-scoring note.
//!
//! Matching is greedy per meeting, in meeting order. With `exclusive_notes`
//! (the default) a note claimed by one meeting is not offered to later ones.

pub mod similarity;
pub mod strategies;

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use crate::prepare::entity_resolver::resolve_meeting_entity;
use crate::types::{MatchSettings, Meeting, Note};
use crate::util::{attendee_name_from_email, is_internal_email};

pub use strategies::{strategy_for, MatchStrategy};

/// How a note was matched to its meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMethod {
    /// Exact calendar event ID match.
    ExternalId,
    /// Attendee email name vs note attendee name.
    AttendeeName,
    /// Tracked entity name vs note company label.
    CompanyName,
    /// Meeting title vs note labels.
    Title,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::ExternalId => "external_id",
            MatchMethod::AttendeeName => "attendee_name",
            MatchMethod::CompanyName => "company_name",
            MatchMethod::Title => "title",
        }
    }
}

/// A meeting paired with its note.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    pub meeting: &'a Meeting,
    pub note: &'a Note,
    pub method: MatchMethod,
}

/// Per-meeting values every strategy needs, computed once.
pub struct MeetingProfile<'a> {
    pub meeting: &'a Meeting,
    /// Tracked entity resolved from the meeting's domains.
    pub entity_name: Option<&'a str>,
    /// Lower-cased names derived from external attendee emails.
    pub attendee_names: Vec<String>,
    pub title_lower: String,
}

impl<'a> MeetingProfile<'a> {
    pub fn new(meeting: &'a Meeting, entity_name: Option<&'a str>, internal_domain: &str) -> Self {
        let attendee_names = meeting
            .attendees
            .iter()
            .filter(|email| !is_internal_email(email, internal_domain))
            .map(|email| attendee_name_from_email(email))
            .filter(|name| !name.is_empty())
            .collect();
        Self {
            meeting,
            entity_name,
            attendee_names,
            title_lower: meeting.title.to_lowercase(),
        }
    }
}

/// Greedy, date-gated note matcher over a configurable strategy cascade.
pub struct NoteMatcher {
    strategies: Vec<Box<dyn MatchStrategy>>,
    threshold: u32,
    exclusive_notes: bool,
    internal_domain: String,
}

impl NoteMatcher {
    pub fn new(settings: &MatchSettings, internal_domain: &str) -> Self {
        let strategies = settings
            .strategies
            .iter()
            .map(|kind| strategy_for(*kind))
            .collect();
        Self::with_strategies(strategies, settings.threshold, settings.exclusive_notes)
            .internal_domain(internal_domain)
    }

    pub fn with_strategies(
        strategies: Vec<Box<dyn MatchStrategy>>,
        threshold: u32,
        exclusive_notes: bool,
    ) -> Self {
        Self {
            strategies,
            threshold: threshold.min(100),
            exclusive_notes,
            internal_domain: String::new(),
        }
    }

    /// Attendees from this domain are ignored by name-based strategies.
    pub fn internal_domain(mut self, domain: &str) -> Self {
        self.internal_domain = domain.trim().to_lowercase();
        self
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Match every meeting to at most one same-day note.
    ///
    /// `entities` maps tracked domains to display names. Unmatched meetings
    /// are simply absent from the result, which is in meeting order.
    pub fn match_notes<'a>(
        &self,
        meetings: &'a [Meeting],
        notes: &'a [Note],
        entities: &HashMap<String, String>,
    ) -> Vec<Match<'a>> {
        let buckets = bucket_by_date(notes);
        let mut claimed: HashSet<usize> = HashSet::new();
        let mut matches = Vec::new();

        for meeting in meetings {
            let Some(candidates) = buckets.get(&meeting.date) else {
                continue;
            };

            let entity_name = resolve_meeting_entity(meeting, entities);
            let profile = MeetingProfile::new(meeting, entity_name, &self.internal_domain);

            if let Some((idx, method)) = self.first_accepted(&profile, candidates, &claimed) {
                log::debug!(
                    "Matched meeting '{}' ({}) to note {} via {}",
                    meeting.title,
                    meeting.date,
                    notes[idx].source_key,
                    method.as_str()
                );
                if self.exclusive_notes {
                    claimed.insert(idx);
                }
                matches.push(Match {
                    meeting,
                    note: &notes[idx],
                    method,
                });
            }
        }

        matches
    }

    fn first_accepted(
        &self,
        profile: &MeetingProfile<'_>,
        candidates: &[(usize, &Note)],
        claimed: &HashSet<usize>,
    ) -> Option<(usize, MatchMethod)> {
        for strategy in &self.strategies {
            let mut best: Option<(usize, u32)> = None;
            for (idx, note) in candidates {
                if claimed.contains(idx) {
                    continue;
                }
                let Some(score) = strategy.score(profile, note) else {
                    continue;
                };
                // Ties keep the earlier note in bucket order.
                if score >= self.threshold && best.map_or(true, |(_, top)| score > top) {
                    best = Some((*idx, score));
                }
            }
            if let Some((idx, _)) = best {
                return Some((idx, strategy.method()));
            }
        }
        None
    }
}

/// Group notes by date. Within a day, notes are ordered by source key so
/// results do not depend on backend listing order.
fn bucket_by_date(notes: &[Note]) -> BTreeMap<NaiveDate, Vec<(usize, &Note)>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<(usize, &Note)>> = BTreeMap::new();
    for (idx, note) in notes.iter().enumerate() {
        buckets.entry(note.date).or_default().push((idx, note));
    }
    for bucket in buckets.values_mut() {
        bucket.sort_by(|a, b| a.1.source_key.cmp(&b.1.source_key));
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::similarity::token_sort_ratio;
    use crate::matching::strategies::{CompanyNameStrategy, TitleStrategy};
    use crate::types::StrategyKind;
    use std::collections::BTreeSet;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn meeting(id: &str, day: &str, title: &str, domains: &[&str]) -> Meeting {
        Meeting {
            id: id.to_string(),
            date: date(day),
            title: title.to_string(),
            attendees: domains.iter().map(|d| format!("contact@{}", d)).collect(),
            domains: domains.iter().map(|d| d.to_string()).collect::<BTreeSet<_>>(),
            start_time: format!("{}T15:00:00Z", day),
            end_time: format!("{}T15:30:00Z", day),
        }
    }

    fn note(key: &str, day: &str, company: Option<&str>) -> Note {
        Note {
            source_key: key.to_string(),
            date: date(day),
            external_id: None,
            company: company.map(String::from),
            topic: None,
            attendee_names: vec![],
            content: format!("content of {}", key),
        }
    }

    fn acme_map() -> HashMap<String, String> {
        HashMap::from([("acme.com".to_string(), "Acme Corp".to_string())])
    }

    fn default_matcher() -> NoteMatcher {
        NoteMatcher::new(&MatchSettings::default(), "myco.com")
    }

    #[test]
    fn test_company_name_scenario() {
        let meetings = vec![meeting("evt-1", "2025-01-20", "Acme Sync", &["acme.com"])];
        let notes = vec![note("n1", "2025-01-20", Some("Acme Corp"))];

        let matches = default_matcher().match_notes(&meetings, &notes, &acme_map());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].note.source_key, "n1");
        assert_eq!(matches[0].method, MatchMethod::CompanyName);
    }

    #[test]
    fn test_date_gate_rejects_next_day() {
        let meetings = vec![meeting("evt-1", "2025-01-20", "Acme Sync", &["acme.com"])];
        let notes = vec![note("n1", "2025-01-21", Some("Acme Corp"))];

        let matches = default_matcher().match_notes(&meetings, &notes, &acme_map());
        assert!(matches.is_empty());
    }

    #[test]
    fn test_date_gate_holds_for_identical_text_and_ids() {
        let base = date("2025-01-20");
        let meetings = vec![meeting("evt-1", "2025-01-20", "Acme Corp", &["acme.com"])];
        for offset in [-30i64, -7, -1, 1, 2, 7, 365] {
            let mut n = note("n1", "2025-01-20", Some("Acme Corp"));
            n.date = base + chrono::Duration::days(offset);
            n.external_id = Some("evt-1".into());
            n.topic = Some("Acme Corp".into());
            n.attendee_names = vec!["contact".into()];
            let notes = vec![n];
            let matches = default_matcher().match_notes(&meetings, &notes, &acme_map());
            assert!(matches.is_empty(), "offset {offset} must not match");
        }
    }

    #[test]
    fn test_external_id_short_circuits() {
        let meetings = vec![meeting("evt-42", "2025-01-20", "Board Prep", &["zeta.org"])];
        let mut matching = note("z-last", "2025-01-20", Some("Completely Unrelated"));
        matching.external_id = Some("evt-42".into());
        // Would win the title strategy if it ran first.
        let decoy = note("a-first", "2025-01-20", Some("Board Prep"));
        let notes = vec![decoy, matching];

        let matches = default_matcher().match_notes(&meetings, &notes, &HashMap::new());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].note.source_key, "z-last");
        assert_eq!(matches[0].method, MatchMethod::ExternalId);
    }

    #[test]
    fn test_threshold_boundary() {
        let meetings = vec![meeting("", "2025-01-20", "Sync", &["acme.com"])];
        let notes = vec![note("n1", "2025-01-20", Some("Acme Corporation"))];
        let score = token_sort_ratio("Acme Corp", "Acme Corporation");
        assert!(score > 0 && score < 100);

        let at = NoteMatcher::with_strategies(vec![Box::new(CompanyNameStrategy)], score, true);
        assert_eq!(at.match_notes(&meetings, &notes, &acme_map()).len(), 1);

        let above =
            NoteMatcher::with_strategies(vec![Box::new(CompanyNameStrategy)], score + 1, true);
        assert!(above.match_notes(&meetings, &notes, &acme_map()).is_empty());
    }

    #[test]
    fn test_unmatched_meeting_is_absent() {
        let meetings = vec![
            meeting("", "2025-01-20", "Acme Sync", &["acme.com"]),
            meeting("", "2025-01-20", "Dentist", &["teeth.example"]),
        ];
        let notes = vec![note("n1", "2025-01-20", Some("Acme Corp"))];
        let matches = default_matcher().match_notes(&meetings, &notes, &acme_map());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].meeting.title, "Acme Sync");
    }

    #[test]
    fn test_empty_notes_yield_no_matches() {
        let meetings = vec![meeting("evt-1", "2025-01-20", "Acme Sync", &["acme.com"])];
        let matches = default_matcher().match_notes(&meetings, &[], &acme_map());
        assert!(matches.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let meetings = vec![
            meeting("evt-1", "2025-01-20", "Acme Sync", &["acme.com"]),
            meeting("evt-2", "2025-01-21", "Globex Review", &["globex.io"]),
        ];
        let notes = vec![
            note("n2", "2025-01-21", Some("Globex")),
            note("n1", "2025-01-20", Some("Acme Corp")),
        ];
        let matcher = default_matcher();
        let first = matcher.match_notes(&meetings, &notes, &acme_map());
        let second = matcher.match_notes(&meetings, &notes, &acme_map());
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_exclusive_notes_prevents_double_claim() {
        let meetings = vec![
            meeting("", "2025-01-20", "Acme Sync", &["acme.com"]),
            meeting("", "2025-01-20", "Acme Follow-up", &["acme.com"]),
        ];
        let notes = vec![note("n1", "2025-01-20", Some("Acme Corp"))];

        let exclusive = default_matcher().match_notes(&meetings, &notes, &acme_map());
        assert_eq!(exclusive.len(), 1);
        assert_eq!(exclusive[0].meeting.title, "Acme Sync");

        let settings = MatchSettings {
            exclusive_notes: false,
            ..MatchSettings::default()
        };
        let shared = NoteMatcher::new(&settings, "myco.com").match_notes(&meetings, &notes, &acme_map());
        assert_eq!(shared.len(), 2);
        assert_eq!(shared[0].note, shared[1].note);
    }

    #[test]
    fn test_second_meeting_takes_next_note_when_first_is_claimed() {
        let meetings = vec![
            meeting("", "2025-01-20", "Acme Sync", &["acme.com"]),
            meeting("", "2025-01-20", "Acme Follow-up", &["acme.com"]),
        ];
        let notes = vec![
            note("a", "2025-01-20", Some("Acme Corp")),
            note("b", "2025-01-20", Some("Acme Corp")),
        ];
        let matches = default_matcher().match_notes(&meetings, &notes, &acme_map());
        let keys: Vec<&str> = matches.iter().map(|m| m.note.source_key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_company_name_takes_best_scoring_note() {
        let meetings = vec![
            meeting("", "2025-01-20", "Sync", &["acme.com"]),
            meeting("", "2025-01-20", "Labs Review", &["acme.com"]),
        ];
        // "a" sorts first and clears the threshold, but "b" is the exact label.
        let notes = vec![
            note("a", "2025-01-20", Some("Acme Corp Labs")),
            note("b", "2025-01-20", Some("Acme Corp")),
        ];
        assert!(token_sort_ratio("Acme Corp", "Acme Corp Labs") >= 60);

        let matches = default_matcher().match_notes(&meetings, &notes, &acme_map());
        let keys: Vec<&str> = matches.iter().map(|m| m.note.source_key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert!(matches.iter().all(|m| m.method == MatchMethod::CompanyName));
    }

    #[test]
    fn test_equal_scores_keep_bucket_order() {
        let meetings = vec![meeting("", "2025-01-20", "Sync", &["acme.com"])];
        let notes = vec![
            note("z", "2025-01-20", Some("Acme Corp")),
            note("m", "2025-01-20", Some("Corp Acme")),
        ];
        let matches = default_matcher().match_notes(&meetings, &notes, &acme_map());
        assert_eq!(matches[0].note.source_key, "m");
    }

    #[test]
    fn test_longer_company_label_matches_at_default_threshold() {
        let meetings = vec![meeting("", "2025-01-20", "Sync", &["acme.com"])];
        let notes = vec![note("n1", "2025-01-20", Some("Acme Corporation"))];
        let matches = default_matcher().match_notes(&meetings, &notes, &acme_map());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].method, MatchMethod::CompanyName);
    }

    #[test]
    fn test_attendee_name_strategy_in_cascade() {
        let mut m = meeting("", "2025-01-20", "Intro call", &["initech.com"]);
        m.attendees = vec!["peter.gibbons@initech.com".into(), "me@myco.com".into()];
        let mut n = note("n1", "2025-01-20", None);
        n.attendee_names = vec!["Peter Gibbons".into()];

        let meetings = vec![m];
        let notes = vec![n];
        let matches = default_matcher().match_notes(&meetings, &notes, &HashMap::new());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].method, MatchMethod::AttendeeName);
    }

    #[test]
    fn test_configured_strategy_order() {
        let meetings = vec![meeting("", "2025-01-20", "Acme Corp Sync", &["acme.com"])];
        let notes = vec![note("n1", "2025-01-20", Some("Acme Corp"))];

        let title_first = NoteMatcher::with_strategies(
            vec![Box::new(TitleStrategy), Box::new(CompanyNameStrategy)],
            60,
            true,
        );
        let matches = title_first.match_notes(&meetings, &notes, &acme_map());
        assert_eq!(matches[0].method, MatchMethod::Title);

        let settings = MatchSettings {
            strategies: vec![StrategyKind::ExternalId],
            ..MatchSettings::default()
        };
        let id_only = NoteMatcher::new(&settings, "");
        assert!(id_only.match_notes(&meetings, &notes, &acme_map()).is_empty());
    }
}
