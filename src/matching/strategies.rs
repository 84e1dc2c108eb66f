//! Note-to-meeting identity strategies.
//!
//! Each strategy scores one same-day (meeting, note) pair: "how likely is
//! this note about this meeting?". The matcher tries strategies in priority
//! order; within a strategy the best-scoring note at or above the threshold
//! wins.

use crate::types::{Note, StrategyKind};

use super::similarity::token_sort_ratio;
use super::{MatchMethod, MeetingProfile};

/// A swappable identity test between a meeting and a same-day note.
pub trait MatchStrategy {
    fn method(&self) -> MatchMethod;

    /// Similarity in `0..=100`, or `None` when the strategy has nothing to
    /// compare for this pair. Exact signals score 100.
    fn score(&self, profile: &MeetingProfile<'_>, note: &Note) -> Option<u32>;

    /// True if `note` scores at least `threshold` for the profiled meeting.
    fn accepts(&self, profile: &MeetingProfile<'_>, note: &Note, threshold: u32) -> bool {
        self.score(profile, note).is_some_and(|score| score >= threshold)
    }
}

/// Build the strategy for a configured kind.
pub fn strategy_for(kind: StrategyKind) -> Box<dyn MatchStrategy> {
    match kind {
        StrategyKind::ExternalId => Box::new(ExternalIdStrategy),
        StrategyKind::AttendeeName => Box::new(AttendeeNameStrategy),
        StrategyKind::CompanyName => Box::new(CompanyNameStrategy),
        StrategyKind::Title => Box::new(TitleStrategy),
    }
}

/// Both sides carry the same calendar event ID.
pub struct ExternalIdStrategy;

impl MatchStrategy for ExternalIdStrategy {
    fn method(&self) -> MatchMethod {
        MatchMethod::ExternalId
    }

    fn score(&self, profile: &MeetingProfile<'_>, note: &Note) -> Option<u32> {
        let meeting_id = profile.meeting.external_id()?;
        let note_id = note.external_id.as_deref().map(str::trim)?;
        (!note_id.is_empty() && note_id == meeting_id).then_some(100)
    }
}

/// An external attendee's email-derived name is close to a note attendee name.
pub struct AttendeeNameStrategy;

impl MatchStrategy for AttendeeNameStrategy {
    fn method(&self) -> MatchMethod {
        MatchMethod::AttendeeName
    }

    fn score(&self, profile: &MeetingProfile<'_>, note: &Note) -> Option<u32> {
        profile
            .attendee_names
            .iter()
            .flat_map(|meeting_name| {
                note.attendee_names
                    .iter()
                    .map(move |note_name| token_sort_ratio(meeting_name, note_name))
            })
            .max()
    }
}

/// The meeting's tracked entity name matches the note's company label,
/// or appears inside a note attendee name ("Jane Doe (Acme)").
pub struct CompanyNameStrategy;

impl MatchStrategy for CompanyNameStrategy {
    fn method(&self) -> MatchMethod {
        MatchMethod::CompanyName
    }

    fn score(&self, profile: &MeetingProfile<'_>, note: &Note) -> Option<u32> {
        let entity = profile.entity_name.map(str::trim).filter(|e| !e.is_empty())?;

        let entity_lower = entity.to_lowercase();
        if note
            .attendee_names
            .iter()
            .any(|name| name.to_lowercase().contains(&entity_lower))
        {
            return Some(100);
        }

        note.company
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(|company| token_sort_ratio(entity, company))
    }
}

/// A note label appears in the meeting title, or the title is close to the
/// note's combined descriptor.
pub struct TitleStrategy;

impl MatchStrategy for TitleStrategy {
    fn method(&self) -> MatchMethod {
        MatchMethod::Title
    }

    fn score(&self, profile: &MeetingProfile<'_>, note: &Note) -> Option<u32> {
        let title = profile.title_lower.as_str();
        if title.trim().is_empty() {
            return None;
        }

        let mut labels = note
            .company
            .iter()
            .chain(note.topic.iter())
            .chain(note.attendee_names.iter())
            .map(|label| label.trim().to_lowercase())
            .filter(|label| !label.is_empty());
        if labels.any(|label| title.contains(&label)) {
            return Some(100);
        }

        let descriptor = note.descriptor();
        (!descriptor.is_empty()).then(|| token_sort_ratio(&profile.meeting.title, &descriptor))
    }
}
