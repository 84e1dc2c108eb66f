//! Synthesis prompt for one entity's weekly activity.

use crate::types::EntityClass;

/// Labels the report assembler knows how to split on. The prompt asks the
/// model to use exactly these.
const STRUCTURE: &str = "\
- Activity: What happened (meetings/emails)
- Deal Status: Pricing, Terms, Start Date if known (only if applicable)
- Risks: Blockers or concerns (only if there are any)
- Action Items: Next steps for upcoming week";

/// Build the executive-summary prompt for one entity.
///
/// The context blob is inserted verbatim; the entity line comes first so the
/// model knows whose activity it is reading.
pub fn build_synthesis_prompt(context: &str, entity_name: &str, class: EntityClass) -> String {
    let mut prompt = String::with_capacity(context.len() + 1024);

    prompt.push_str(&format!("Entity: {} ({})\n\n", entity_name, class.as_str()));
    prompt.push_str(
        "You are summarizing deal/partner activity for an executive weekly report.\n\n\
         Be bulleted, punchy, and executive-level. No fluff. No emojis.\n\n",
    );
    prompt.push_str("Structure your response as:\n");
    prompt.push_str(STRUCTURE);
    prompt.push_str("\n\nContext:\n");
    prompt.push_str(context);
    prompt.push_str(
        "\n\nProvide a concise summary following the structure above. \
         If certain sections don't apply (e.g., no known deal status for partners), omit them.",
    );

    prompt
}
