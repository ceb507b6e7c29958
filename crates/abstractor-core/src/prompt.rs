//! Prompt composition.

use crate::schema::{Extent, SCHEMA};

/// Developer-role instruction sent ahead of every prompt.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant.";

/// Review topic used when the configuration does not name one.
pub const DEFAULT_TOPIC: &str = "the impact of \"hope\" on chronic illness";

/// Build the instruction part of the prompt for `topic`.
///
/// Line-valued fields are requested as one comma-separated list; the
/// sentinel-terminated field (the summary) gets its own sentence. The literal
/// `- Label:` template follows, in schema order.
pub fn instructions(topic: &str) -> String {
    let requests: Vec<&str> = SCHEMA
        .iter()
        .filter(|s| s.extent != Extent::UntilSentinel)
        .map(|s| s.request)
        .collect();

    let mut out = format!(
        "I am writing a literature review about {topic}. Please review the article text \
         provided and pull out the following information with no fluff: {}.",
        requests.join(", ")
    );

    for spec in SCHEMA.iter().filter(|s| s.extent == Extent::UntilSentinel) {
        out.push_str(&format!(" Additionally, write {}.", spec.request));
    }

    out.push_str(
        " DO NOT use any markdown around any words in the response. \
         Leave it as plain text ONLY. The results should be in the template as follows:",
    );
    for spec in &SCHEMA {
        out.push_str(&format!(" - {}:", spec.label));
    }
    out.push_str(" \n Here is the article text: ");
    out
}

/// Compose the full user prompt: instructions followed by the whole article
/// text, never truncated.
pub fn compose_prompt(topic: &str, article_text: &str) -> String {
    let mut prompt = instructions(topic);
    prompt.push_str(article_text);
    prompt
}
