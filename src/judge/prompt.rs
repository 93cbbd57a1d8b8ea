use chrono::SecondsFormat;

use super::JudgePrompt;
use crate::models::Pick;

const SYSTEM_INSTRUCTION: &str = "You are the resolution judge for a binary prediction market. \
Use web and X search to find what actually happened. \
Answer with strict JSON only, no prose, in exactly this shape:\n\
{\"result\": \"yes\" | \"no\", \"confidence\": <number between 0 and 1>, \"reason\": \"<one or two sentences citing sources>\"}\n\
The result MUST be the lowercase string \"yes\" or \"no\". \
Never answer \"void\", \"unknown\", \"more\", \"less\" or anything else: \
if the evidence is incomplete, pick the more likely side and lower the confidence.";

/// Build the judge prompt for a pick: fixed system instruction plus the
/// market's metadata and time window.
pub fn build_prompt(pick: &Pick) -> JudgePrompt {
    let mut user = format!("Market: {}\n", pick.name.trim());

    if let Some(line) = pick.line {
        user.push_str(&format!("Line: {line}\n"));
    }
    if let Some(category) = pick.category.as_deref().filter(|c| !c.trim().is_empty()) {
        user.push_str(&format!("Category: {}\n", category.trim()));
    }
    if let Some(description) = pick.description.as_deref().filter(|d| !d.trim().is_empty()) {
        user.push_str(&format!("Details: {}\n", description.trim()));
    }

    user.push_str(&format!(
        "Window: from {} to {} (UTC)\n",
        pick.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        pick.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    ));
    user.push_str("Did this happen within the window? Reply with the JSON verdict.");

    JudgePrompt {
        system: SYSTEM_INSTRUCTION.to_string(),
        user,
    }
}
