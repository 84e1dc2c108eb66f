//! Google Docs rendering of a [`Report`] as `documents.batchUpdate` operations.
//!
//! Text is appended at a running index starting at 1 (the start of the body).
//! Indices count UTF-16 code units, as the Docs API does. Bold ranges are
//! emitted after every insert so earlier ranges are not shifted.

use serde_json::json;

use super::Report;

/// Paragraph styles used by the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedStyle {
    Heading1,
    Heading2,
}

impl NamedStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            NamedStyle::Heading1 => "HEADING_1",
            NamedStyle::Heading2 => "HEADING_2",
        }
    }
}

/// One document edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocOp {
    InsertText { index: usize, text: String },
    ParagraphStyle { start: usize, end: usize, style: NamedStyle },
    Bold { start: usize, end: usize },
}

impl DocOp {
    /// The Docs API request object for this operation.
    pub fn to_request(&self) -> serde_json::Value {
        match self {
            DocOp::InsertText { index, text } => json!({
                "insertText": {
                    "location": {"index": index},
                    "text": text,
                }
            }),
            DocOp::ParagraphStyle { start, end, style } => json!({
                "updateParagraphStyle": {
                    "range": {"startIndex": start, "endIndex": end},
                    "paragraphStyle": {"namedStyleType": style.as_str()},
                    "fields": "namedStyleType",
                }
            }),
            DocOp::Bold { start, end } => json!({
                "updateTextStyle": {
                    "range": {"startIndex": start, "endIndex": end},
                    "textStyle": {"bold": true},
                    "fields": "bold",
                }
            }),
        }
    }
}

struct DocBuilder {
    ops: Vec<DocOp>,
    bold: Vec<DocOp>,
    index: usize,
}

impl DocBuilder {
    fn new() -> Self {
        Self {
            ops: Vec::new(),
            bold: Vec::new(),
            index: 1,
        }
    }

    fn add(&mut self, text: String, style: Option<NamedStyle>, bold: bool) {
        let start = self.index;
        let len = text.encode_utf16().count();
        let end = start + len;
        let ends_with_newline = text.ends_with('\n');

        self.ops.push(DocOp::InsertText { index: start, text });
        if let Some(style) = style {
            self.ops.push(DocOp::ParagraphStyle { start, end, style });
        }
        if bold {
            let bold_end = if ends_with_newline { end - 1 } else { end };
            if bold_end > start {
                self.bold.push(DocOp::Bold { start, end: bold_end });
            }
        }
        self.index = end;
    }

    fn finish(mut self) -> Vec<DocOp> {
        self.ops.append(&mut self.bold);
        self.ops
    }
}

/// Ordered edits that write the whole report into an empty document.
pub fn render_document_ops(report: &Report) -> Vec<DocOp> {
    let mut doc = DocBuilder::new();
    doc.add(format!("{}\n", report.title), Some(NamedStyle::Heading1), false);

    for section in &report.sections {
        doc.add(format!("{}\n", section.title), Some(NamedStyle::Heading1), false);
        for entity in &section.entities {
            doc.add(format!("{}\n", entity.name), Some(NamedStyle::Heading2), false);
            for field in &entity.fields {
                doc.add(format!("{}: ", field.label), None, true);
                doc.add(format!("{}\n\n", field.content), None, false);
            }
        }
    }

    doc.finish()
}
