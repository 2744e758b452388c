//! Source-context collection: Bicep templates handed to the classifier
//! alongside the what-if text.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Cap on files sent as context; what-if output already carries the
/// bulk of the signal.
const MAX_CONTEXT_FILES: usize = 5;

/// Gather up to [`MAX_CONTEXT_FILES`] `.bicep` files under `dir`,
/// concatenated with per-file headers. Returns `None` when the
/// directory is unusable or holds no matching files; never fatal.
pub fn collect_source_context(dir: &Path) -> Option<String> {
    let base = match dir.canonicalize() {
        Ok(base) => base,
        Err(e) => {
            warn!(dir = %dir.display(), "could not resolve source directory: {e}");
            return None;
        }
    };
    if !base.is_dir() {
        warn!(dir = %dir.display(), "source directory is not a directory");
        return None;
    }

    let mut files = Vec::new();
    scan_bicep_files(&base, &base, &mut files);
    files.sort();

    let mut sections = Vec::new();
    for path in files.into_iter().take(MAX_CONTEXT_FILES) {
        match fs::read_to_string(&path) {
            Ok(content) => {
                let rel = path.strip_prefix(&base).unwrap_or(&path);
                sections.push(format!("// File: {}\n{content}", rel.display()));
            }
            Err(e) => warn!(path = %path.display(), "could not read context file: {e}"),
        }
    }

    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    }
}

fn scan_bicep_files(base: &Path, dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), "could not scan directory: {e}");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        // Symlinks are skipped so context cannot reach outside the tree.
        if path.is_symlink() {
            warn!(path = %path.display(), "skipping symbolic link");
            continue;
        }
        if path.is_dir() {
            scan_bicep_files(base, &path, out);
            continue;
        }
        if path.extension().is_some_and(|ext| ext == "bicep") {
            match path.canonicalize() {
                Ok(resolved) if resolved.starts_with(base) => out.push(path),
                Ok(_) => warn!(path = %path.display(), "skipping file outside base directory"),
                Err(e) => warn!(path = %path.display(), "could not resolve path: {e}"),
            }
        }
    }
}
