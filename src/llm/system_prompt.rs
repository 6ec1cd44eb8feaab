//! Prompt used to refine raw ideas.

use crate::models::Idea;

/// Characters of each existing idea's content included as context.
pub const CONTEXT_EXCERPT_CHARS: usize = 200;

/// Fixed instruction describing the structured output.
pub const REFINEMENT_PROMPT: &str = r#"You refine raw ideas into clear, structured notes.

Rewrite the idea below as well-organised markdown. If the text contains several
distinct ideas, split them into separate items. For every item, list the titles
of existing ideas it relates to under "connections" (use the exact titles shown
in the context when they apply; you may also name ideas that do not exist yet).

Respond with a JSON object only, in this exact shape:
{
  "ideas": [
    {
      "title": "short descriptive title",
      "refined": "the refined idea as markdown",
      "tags": ["tag1", "tag2"],
      "connections": ["Title of a related idea"]
    }
  ]
}"#;

/// Builds the full refinement prompt.
///
/// Each context idea is rendered on one line with its title, tags and the
/// first [`CONTEXT_EXCERPT_CHARS`] characters of its content.
#[must_use]
pub fn build_refinement_prompt(raw_text: &str, context: &[Idea]) -> String {
    let mut prompt = String::with_capacity(
        REFINEMENT_PROMPT.len() + raw_text.len() + context.len() * (CONTEXT_EXCERPT_CHARS + 64),
    );
    prompt.push_str(REFINEMENT_PROMPT);
    prompt.push_str("\n\nExisting ideas:\n");

    if context.is_empty() {
        prompt.push_str("No existing ideas yet.\n");
    }
    for idea in context {
        let excerpt: String = idea
            .content
            .chars()
            .take(CONTEXT_EXCERPT_CHARS)
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();
        prompt.push_str(&format!(
            "- {} [{}]: {}\n",
            idea.title,
            idea.tags.join(", "),
            excerpt.trim()
        ));
    }

    prompt.push_str("\nNew idea:\n");
    prompt.push_str(raw_text.trim());
    prompt.push('\n');
    prompt
}
