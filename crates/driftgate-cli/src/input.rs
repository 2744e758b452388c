//! Stdin ingestion for what-if output.

use std::io::{IsTerminal, Read};

/// Maximum characters accepted before truncation.
pub const MAX_INPUT_CHARS: usize = 100_000;

/// Markers that suggest the input really is what-if output. Their absence
/// is a soft warning, never a failure.
const WHATIF_MARKERS: [&str; 6] = [
    "Resource changes:",
    "+ Create",
    "~ Modify",
    "- Delete",
    "Resource and property changes",
    "Scope:",
];

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error(
        "no input detected; pipe what-if output to this command:\n  az deployment group what-if ... | driftgate"
    )]
    NoInput,

    #[error("no what-if output received; input is empty")]
    Empty,

    #[error("failed to read stdin: {0}")]
    Io(#[from] std::io::Error),
}

/// Read and validate what-if output from stdin.
///
/// Refuses an interactive terminal, rejects empty input, truncates overly
/// large input with a warning, and soft-checks for what-if markers.
pub fn read_stdin() -> Result<String, InputError> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Err(InputError::NoInput);
    }

    let mut content = String::new();
    stdin.lock().read_to_string(&mut content)?;
    read_from_text(content)
}

/// Validation and truncation, separated from the stdin handle for testing.
pub fn read_from_text(mut content: String) -> Result<String, InputError> {
    if content.trim().is_empty() {
        return Err(InputError::Empty);
    }

    if content.chars().count() > MAX_INPUT_CHARS {
        tracing::warn!(
            limit = MAX_INPUT_CHARS,
            "input truncated; original was larger"
        );
        content = content.chars().take(MAX_INPUT_CHARS).collect();
    }

    if !has_whatif_marker(&content) {
        tracing::warn!(
            "input may not be what-if output; expected markers like 'Resource changes:' or '+ Create'"
        );
    }

    Ok(content)
}

/// Whether the content carries any recognizable what-if marker.
pub fn has_whatif_marker(content: &str) -> bool {
    WHATIF_MARKERS.iter().any(|marker| content.contains(marker))
}
