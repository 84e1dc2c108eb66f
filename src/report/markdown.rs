//! Markdown rendering of a [`Report`].

use super::Report;

/// Render the report as Markdown.
///
/// `#` for the title and each section, `##` per entity, and one
/// `**Label:** content` paragraph per field.
pub fn render_markdown(report: &Report) -> String {
    let mut lines = vec![format!("# {}", report.title), String::new()];

    for section in &report.sections {
        lines.push(format!("# {}", section.title));
        lines.push(String::new());

        for entity in &section.entities {
            lines.push(format!("## {}", entity.name));
            lines.push(String::new());

            for field in &entity.fields {
                lines.push(format!("**{}:** {}", field.label, field.content));
                lines.push(String::new());
            }
        }
    }

    lines.join("\n")
}
