//! Prompt assembly shared by every hosted backend.
//!
//! All backends send the same instruction pair so that switching
//! providers never changes the response contract the extraction and
//! normalization layers depend on.

use super::ClassifyRequest;

/// System instruction: JSON-only response contract, with the intent
/// bucket requested only when intent context was supplied.
pub(crate) fn system_instruction(request: &ClassifyRequest) -> String {
    let mut instruction = String::from(
        "You review planned infrastructure changes for deployment safety. \
         Classify each change with a confidence level (high, medium, low, noise) \
         indicating whether it is a genuine effect or tool-generated noise, and \
         assess risk in independent buckets rated low, medium, or high. \
         Respond with ONLY a JSON object: {\"resources\": [{\"resource_name\", \
         \"resource_type\", \"action\", \"summary\", \"confidence\", \
         \"confidence_reason\", \"risk_level\", \"risk_reason\"}], \
         \"overall_summary\", \"risk_assessment\": {\"drift\": {\"risk_level\", \
         \"concerns\", \"reasoning\"}, \"operations\": {...}",
    );
    if request.has_intent() {
        instruction.push_str(", \"intent\": {...}");
    }
    instruction.push_str("}}.");
    if request.has_intent() {
        instruction.push_str(" Evaluate the intent bucket against the stated pull request intent.");
    } else {
        instruction.push_str(" Omit the intent bucket entirely.");
    }
    instruction
}

/// User message: the change payload plus optional tagged context blocks.
pub(crate) fn user_message(request: &ClassifyRequest) -> String {
    let mut message = String::from("Review this deployment for safety.\n");
    if let Some(intent) = request.intent.as_ref().filter(|i| i.is_present()) {
        message.push_str(&format!(
            "\n<pull_request_intent>\nTitle: {}\nDescription: {}\n</pull_request_intent>\n",
            intent.title.as_deref().unwrap_or("Not provided"),
            intent.description.as_deref().unwrap_or("Not provided"),
        ));
    }
    message.push_str(&format!(
        "\n<planned_changes>\n{}\n</planned_changes>\n",
        request.change_text
    ));
    if let Some(diff) = &request.diff {
        message.push_str(&format!("\n<code_diff>\n{diff}\n</code_diff>\n"));
    }
    if let Some(context) = &request.source_context {
        message.push_str(&format!(
            "\n<source_context>\n{context}\n</source_context>\n"
        ));
    }
    message
}
