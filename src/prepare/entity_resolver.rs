//! Domain → tracked entity resolution for meetings.
//!
//! Exact lookup only: a meeting resolves to the first tracked domain among
//! its attendee domains. Domains are visited in lexical order so the same
//! domain set always resolves to the same entity.

use std::collections::HashMap;

use crate::types::Meeting;

/// Resolve a set of domains to a tracked entity name.
///
/// Returns `None` when none of the domains is tracked.
pub fn resolve_entity_name<'m, I, S>(
    domains: I,
    mapping: &'m HashMap<String, String>,
) -> Option<&'m str>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sorted: Vec<String> = domains
        .into_iter()
        .map(|d| d.as_ref().trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect();
    sorted.sort();
    sorted.dedup();

    sorted
        .iter()
        .find_map(|domain| mapping.get(domain).map(String::as_str))
}

/// Resolve a meeting's domain set to a tracked entity name.
pub fn resolve_meeting_entity<'m>(
    meeting: &Meeting,
    mapping: &'m HashMap<String, String>,
) -> Option<&'m str> {
    resolve_entity_name(&meeting.domains, mapping)
}
