//! Input discovery.
//!
//! Turns the caller's input specifications into an ordered, de-duplicated
//! list of files. Each specification may be a file, a directory (scanned
//! non-recursively for `.mts` files, case-insensitive) or a shell-style glob
//! pattern. Entries are de-duplicated by canonical absolute path, keeping the
//! first occurrence.

use crate::error::{CoreError, CoreResult};
use crate::utils::{has_source_extension, is_valid_source_file};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Finds source files in the top level of `input_dir`, sorted by name.
/// Hidden files and subdirectories are skipped.
pub fn find_processable_files(input_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(CoreError::PathError(format!(
            "{} is not a directory",
            input_dir.display()
        )));
    }

    let read_dir = std::fs::read_dir(input_dir).map_err(|e| {
        CoreError::PathError(format!(
            "Cannot read directory {}: {e}",
            input_dir.display()
        ))
    })?;

    let mut files = Vec::new();
    let mut skipped = 0usize;
    for entry in read_dir {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                log::warn!(
                    "Failed to read directory entry in {}: {e}",
                    input_dir.display()
                );
                continue;
            }
        };
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        if hidden || path.is_dir() {
            continue;
        }
        if is_valid_source_file(&path) {
            files.push(path);
        } else {
            skipped += 1;
        }
    }

    files.sort();
    log::debug!(
        "Found {} source file(s) in {} ({skipped} other file(s) skipped)",
        files.len(),
        input_dir.display()
    );
    Ok(files)
}

fn is_glob_pattern(spec: &str) -> bool {
    spec.contains(['*', '?', '['])
}

fn expand_glob(pattern: &str) -> CoreResult<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|e| CoreError::Glob(format!("{pattern}: {e}")))?;
    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if is_valid_source_file(&path) => files.push(path),
            Ok(_) => {}
            Err(e) => log::warn!("Skipping unreadable match for {pattern}: {e}"),
        }
    }
    files.sort();
    Ok(files)
}

/// Canonical form used for de-duplication. Paths that do not exist yet are
/// made absolute without resolving links.
fn canonical_key(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Resolves input specifications into the ordered list of files to convert.
///
/// An explicit file is kept whatever its extension. A path that does not
/// exist and is not a glob pattern is kept too, so that it surfaces as a
/// failed item rather than disappearing silently.
pub fn resolve_inputs<I, S>(specs: I) -> CoreResult<Vec<PathBuf>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    for spec in specs {
        let spec = spec.as_ref();
        let path = Path::new(spec);
        let candidates = if path.is_dir() {
            find_processable_files(path)?
        } else if path.exists() {
            if !has_source_extension(path) {
                log::debug!("Explicit input {} is not a .mts file", path.display());
            }
            vec![path.to_path_buf()]
        } else if is_glob_pattern(spec) {
            let matches = expand_glob(spec)?;
            if matches.is_empty() {
                log::warn!("Pattern '{spec}' matched no source files");
            }
            matches
        } else {
            log::warn!("Input not found: {spec}");
            vec![path.to_path_buf()]
        };

        for candidate in candidates {
            let key = canonical_key(&candidate);
            if seen.insert(key.clone()) {
                resolved.push(key);
            } else {
                log::debug!("Skipping duplicate input {}", candidate.display());
            }
        }
    }

    Ok(resolved)
}
