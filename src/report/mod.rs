//! Weekly report model and assembly.
//!
//! A report has one section per entity class (deals, agency partners, tech
//! partners), one entry per entity, and labelled fields parsed from each
//! summary. Renderers turn it into Markdown or Google Docs update requests.

pub mod document;
pub mod markdown;
pub mod parse;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::EntityClass;

pub use document::{render_document_ops, DocOp, NamedStyle};
pub use markdown::render_markdown;
pub use parse::{clean_content, parse_content_sections};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportField {
    pub label: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityReport {
    pub name: String,
    pub fields: Vec<ReportField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub class: EntityClass,
    pub title: String,
    pub entities: Vec<EntityReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub title: String,
    pub date: NaiveDate,
    pub sections: Vec<ReportSection>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.entities.is_empty())
    }

    pub fn entity_count(&self) -> usize {
        self.sections.iter().map(|s| s.entities.len()).sum()
    }

    /// Entities in one class, zero if the section was omitted.
    pub fn count(&self, class: EntityClass) -> usize {
        self.sections
            .iter()
            .find(|s| s.class == class)
            .map(|s| s.entities.len())
            .unwrap_or(0)
    }
}

/// Title used for both the document and its top heading.
pub fn report_title(date: NaiveDate) -> String {
    format!("Weekly Report - {}", date.format("%Y-%m-%d"))
}

/// Build the report from per-class {entity name → summary} maps.
///
/// Sections follow the fixed class order and are omitted when empty.
/// Entities are ordered by name; an entity whose summary yields no fields is
/// dropped.
pub fn assemble_report(
    deals: &BTreeMap<String, String>,
    agency_partners: &BTreeMap<String, String>,
    tech_partners: &BTreeMap<String, String>,
    date: NaiveDate,
) -> Report {
    let inputs = [
        (EntityClass::Deal, deals),
        (EntityClass::AgencyPartner, agency_partners),
        (EntityClass::TechPartner, tech_partners),
    ];

    let sections = inputs
        .into_iter()
        .filter_map(|(class, updates)| {
            let entities: Vec<EntityReport> = updates
                .iter()
                .filter_map(|(name, summary)| {
                    let fields = parse_content_sections(summary);
                    (!fields.is_empty()).then(|| EntityReport {
                        name: name.clone(),
                        fields,
                    })
                })
                .collect();
            (!entities.is_empty()).then(|| ReportSection {
                class,
                title: class.section_title().to_string(),
                entities,
            })
        })
        .collect();

    Report {
        title: report_title(date),
        date,
        sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 27).unwrap()
    }

    #[test]
    fn test_sections_in_class_order_and_empty_omitted() {
        let report = assemble_report(
            &map(&[("Zeta", "Activity: z"), ("Acme Corp", "Activity: a")]),
            &BTreeMap::new(),
            &map(&[("Globex", "Risks: API changes")]),
            date(),
        );

        assert_eq!(report.title, "Weekly Report - 2025-01-27");
        let titles: Vec<_> = report.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Deal Updates", "Tech Alliances"]);

        let deal_names: Vec<_> = report.sections[0].entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(deal_names, vec!["Acme Corp", "Zeta"]);
        assert_eq!(report.entity_count(), 3);
        assert_eq!(report.count(EntityClass::AgencyPartner), 0);
        assert_eq!(report.count(EntityClass::Deal), 2);
    }

    #[test]
    fn test_blank_summary_is_dropped() {
        let report = assemble_report(&map(&[("Acme", "  \n ")]), &BTreeMap::new(), &BTreeMap::new(), date());
        assert!(report.is_empty());
        assert!(report.sections.is_empty());
    }

    #[test]
    fn test_fields_are_parsed() {
        let report = assemble_report(
            &BTreeMap::new(),
            &map(&[("Agency One", "- **Activity:** Quarterly review\n- **Action Items:** Follow up")]),
            &BTreeMap::new(),
            date(),
        );
        let entity = &report.sections[0].entities[0];
        assert_eq!(report.sections[0].class, EntityClass::AgencyPartner);
        assert_eq!(entity.fields.len(), 2);
        assert_eq!(entity.fields[1].label, "Action Items");
        assert_eq!(entity.fields[1].content, "Follow up");
    }
}
