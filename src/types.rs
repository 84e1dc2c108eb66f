use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// Domain records
// =============================================================================

/// An external calendar meeting inside the lookback window.
///
/// `domains` holds the attendee email domains minus the internal domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Meeting {
    /// Calendar event ID. Empty when the source did not provide one.
    pub id: String,
    pub date: NaiveDate,
    pub title: String,
    pub attendees: Vec<String>,
    pub domains: BTreeSet<String>,
    pub start_time: String,
    pub end_time: String,
}

impl Meeting {
    /// External calendar-event identifier, if the meeting carries one.
    pub fn external_id(&self) -> Option<&str> {
        let id = self.id.trim();
        (!id.is_empty()).then_some(id)
    }
}

/// A meeting note normalized from any note backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    /// Where the note came from: file path, `doc_id#date`, or cache document ID.
    pub source_key: String,
    pub date: NaiveDate,
    /// Calendar event ID recorded by the note-taking tool, if any.
    pub external_id: Option<String>,
    pub company: Option<String>,
    pub topic: Option<String>,
    pub attendee_names: Vec<String>,
    pub content: String,
}

impl Note {
    /// Company, topic and attendee names joined into one searchable string.
    pub fn descriptor(&self) -> String {
        self.company
            .iter()
            .chain(self.topic.iter())
            .chain(self.attendee_names.iter())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Class of a tracked company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityClass {
    Deal,
    AgencyPartner,
    TechPartner,
}

impl EntityClass {
    /// Report order.
    pub const ALL: [EntityClass; 3] = [
        EntityClass::Deal,
        EntityClass::AgencyPartner,
        EntityClass::TechPartner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityClass::Deal => "deal",
            EntityClass::AgencyPartner => "agency_partner",
            EntityClass::TechPartner => "tech_partner",
        }
    }

    /// Top-level heading used for this class in the report.
    pub fn section_title(&self) -> &'static str {
        match self {
            EntityClass::Deal => "Deal Updates",
            EntityClass::AgencyPartner => "Agency Partner Updates",
            EntityClass::TechPartner => "Tech Alliances",
        }
    }
}

impl std::fmt::Display for EntityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked company keyed by email domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub domain: String,
    pub name: String,
    pub class: EntityClass,
    pub added: Option<String>,
}

// =============================================================================
// Settings (settings.json)
// =============================================================================

/// Run configuration, loaded once and passed explicitly to every component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_lookback_days", alias = "lookback_days")]
    pub lookback_days: u32,
    /// The organization's own email domain. Meetings with only this domain are skipped.
    #[serde(default, alias = "internal_domain")]
    pub internal_domain: String,
    /// Organization name as it appears in shared note-document titles ("Acme + Org Meeting Agendas").
    #[serde(default, alias = "organization_name")]
    pub organization_name: String,
    #[serde(default, rename = "match")]
    pub matching: MatchSettings,
    #[serde(default)]
    pub notes: NoteSourceConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            internal_domain: String::new(),
            organization_name: String::new(),
            matching: MatchSettings::default(),
            notes: NoteSourceConfig::default(),
            ollama: OllamaConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Settings {
    /// Clamp and normalize values that were read from disk.
    pub fn normalized(mut self) -> Self {
        if self.matching.threshold > 100 {
            log::warn!(
                "match threshold {} out of range, clamping to 100",
                self.matching.threshold
            );
            self.matching.threshold = 100;
        }
        if self.lookback_days == 0 {
            self.lookback_days = default_lookback_days();
        }
        self.internal_domain = self.internal_domain.trim().to_lowercase();
        self
    }
}

fn default_lookback_days() -> u32 {
    7
}

/// A named note-to-meeting strategy. Order in settings is priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    ExternalId,
    AttendeeName,
    CompanyName,
    Title,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSettings {
    /// Minimum token-sort similarity (0–100) for fuzzy strategies.
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    /// Skip notes already claimed by an earlier meeting in the same run.
    #[serde(default = "default_true", alias = "exclusive_notes")]
    pub exclusive_notes: bool,
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategyKind>,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            exclusive_notes: true,
            strategies: default_strategies(),
        }
    }
}

fn default_threshold() -> u32 {
    60
}

fn default_true() -> bool {
    true
}

fn default_strategies() -> Vec<StrategyKind> {
    vec![
        StrategyKind::ExternalId,
        StrategyKind::AttendeeName,
        StrategyKind::CompanyName,
        StrategyKind::Title,
    ]
}

/// Which note backend feeds the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteBackend {
    /// Markdown/text files named `YYYY-MM-DD Company - Topic.md`.
    #[default]
    Filesystem,
    /// Google Drive folder of shared agenda documents with dated sections.
    Drive,
    /// Granola's local `cache-v3.json`.
    Granola,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSourceConfig {
    #[serde(default)]
    pub backend: NoteBackend,
    /// Notes directory for the filesystem backend. Relative to the config dir when not absolute.
    #[serde(default = "default_notes_path")]
    pub path: String,
    /// Drive folder ID for the drive backend. Empty searches all agenda documents.
    #[serde(default, alias = "folder_id")]
    pub folder_id: String,
    #[serde(default = "default_cache_path", alias = "cache_path")]
    pub cache_path: String,
}

impl Default for NoteSourceConfig {
    fn default() -> Self {
        Self {
            backend: NoteBackend::default(),
            path: default_notes_path(),
            folder_id: String::new(),
            cache_path: default_cache_path(),
        }
    }
}

fn default_notes_path() -> String {
    "notes".to_string()
}

fn default_cache_path() -> String {
    dirs::home_dir()
        .unwrap_or_default()
        .join("Library/Application Support/Granola/cache-v3.json")
        .to_string_lossy()
        .to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ollama_endpoint(),
            model: default_ollama_model(),
        }
    }
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434/api/generate".to_string()
}

fn default_ollama_model() -> String {
    "gemma2:27b".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    /// Drive folder that receives the generated Google Doc.
    #[serde(default, alias = "folder_id")]
    pub folder_id: String,
    /// Directory for Markdown reports. Defaults to `<config dir>/reports`.
    #[serde(default, alias = "markdown_dir")]
    pub markdown_dir: Option<String>,
}
