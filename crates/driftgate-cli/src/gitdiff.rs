//! Git diff collection for classification context.

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::warn;

/// Collect diff content from a file or by running `git diff <ref>`.
///
/// A named-but-missing diff file is fatal. A failing `git diff` (not a
/// repo, unknown ref) degrades to an empty diff with a warning so the
/// evaluation can still proceed without code context.
pub fn collect_diff(diff_path: Option<&Path>, diff_ref: &str) -> Result<String> {
    if let Some(path) = diff_path {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read diff file: {}", path.display()));
    }

    let output = Command::new("git")
        .args(["diff", diff_ref])
        .output()
        .context("failed to run git; install git or provide --diff")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(
            diff_ref = %diff_ref,
            "git diff failed ({}); proceeding without diff context",
            stderr.trim()
        );
        return Ok(String::new());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Resolve the diff reference, preferring a detected PR base branch over
/// the default.
pub fn resolve_diff_ref(explicit: &str, base_branch: Option<&str>) -> String {
    if explicit != "HEAD~1" {
        return explicit.to_string();
    }
    match base_branch {
        Some(branch) => {
            let branch = branch.strip_prefix("refs/heads/").unwrap_or(branch);
            format!("origin/{branch}")
        }
        None => explicit.to_string(),
    }
}
