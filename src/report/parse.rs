//! Model output → labelled report fields.

use std::sync::OnceLock;

use regex::Regex;

use super::ReportField;

/// Labels recognized in summaries, in canonical casing.
pub const KNOWN_LABELS: [&str; 13] = [
    "Activity",
    "Deal Status",
    "Status",
    "Risks",
    "Risk",
    "Action Items",
    "Action Item",
    "Next Steps",
    "Summary",
    "Notes",
    "Key Points",
    "Concerns",
    "Blockers",
];

/// Label used when a summary has no recognizable structure.
pub const FALLBACK_LABEL: &str = "Summary";

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-*•]\s+").expect("valid bullet regex"))
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#+\s*").expect("valid heading regex"))
}

fn bold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid bold regex"))
}

fn italic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*([^*]+)\*").expect("valid italic regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Longest labels first so "Action Items" wins over "Action Item" and
/// "Deal Status" over "Status". A dash separator needs trailing whitespace so
/// hyphenated words ("Risk-free") are not split.
fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let mut labels = KNOWN_LABELS.to_vec();
        labels.sort_by_key(|l| std::cmp::Reverse(l.len()));
        let alternation = labels
            .iter()
            .map(|l| regex::escape(l))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i)\b({})\s*(?::|-\s)\s*", alternation)).expect("valid label regex")
    })
}

/// Strip Markdown decoration line by line.
///
/// Blank lines are dropped; leading bullets and heading hashes are removed;
/// `**bold**` then `*italic*` are unwrapped; runs of whitespace collapse.
pub fn clean_content(text: &str) -> String {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let line = bullet_re().replace(line, "");
            let line = heading_re().replace(&line, "");
            let line = bold_re().replace_all(&line, "$1");
            let line = italic_re().replace_all(&line, "$1");
            let line = whitespace_re().replace_all(&line, " ");
            let line = line.trim();
            (!line.is_empty()).then(|| line.to_string())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn canonical_label(matched: &str) -> String {
    KNOWN_LABELS
        .iter()
        .find(|label| label.eq_ignore_ascii_case(matched))
        .map(|label| label.to_string())
        .unwrap_or_else(|| matched.to_string())
}

/// Split a summary into (label, content) fields.
///
/// Text before the first label is discarded and empty spans are dropped. With
/// no label at all, the whole cleaned text becomes one `Summary` field.
pub fn parse_content_sections(text: &str) -> Vec<ReportField> {
    let cleaned = clean_content(text);
    let mut fields = Vec::new();
    let mut current: Option<(String, usize)> = None;

    for caps in label_re().captures_iter(&cleaned) {
        let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if let Some((prev_label, start)) = current.take() {
            push_field(&mut fields, prev_label, &cleaned[start..whole.start()]);
        }
        current = Some((canonical_label(label.as_str()), whole.end()));
    }
    if let Some((label, start)) = current {
        push_field(&mut fields, label, &cleaned[start..]);
    }

    if fields.is_empty() && !cleaned.trim().is_empty() {
        fields.push(ReportField {
            label: FALLBACK_LABEL.to_string(),
            content: cleaned.trim().to_string(),
        });
    }
    fields
}

fn push_field(fields: &mut Vec<ReportField>, label: String, span: &str) {
    let content = span.trim();
    if !content.is_empty() {
        fields.push(ReportField {
            label,
            content: content.to_string(),
        });
    }
}
