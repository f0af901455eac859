//! Collision-free output path allocation.
//!
//! The candidate is `{dir}/{stem}.mp4`; if taken, `{stem}_1.mp4`,
//! `{stem}_2.mp4` and so on are tried until a free name is found. The check
//! is not atomic, which is acceptable because batch items run one at a time.

use crate::config::OUTPUT_EXTENSION;
use crate::error::{CoreError, CoreResult};
use crate::utils::get_stem_safe;
use std::path::{Path, PathBuf};

/// Returns a path for the converted form of `input` that does not exist yet.
///
/// The file is placed in `output_dir` when given, otherwise next to the
/// input. The suffix counter is unbounded.
pub fn allocate_output_path(input: &Path, output_dir: Option<&Path>) -> CoreResult<PathBuf> {
    let stem = get_stem_safe(input)?;
    let target_dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                CoreError::PathError(format!("{} has no parent directory", input.display()))
            })?,
    };

    let candidate = target_dir.join(format!("{stem}.{OUTPUT_EXTENSION}"));
    if !candidate.exists() {
        return Ok(candidate);
    }

    let mut n: u64 = 1;
    loop {
        let candidate = target_dir.join(format!("{stem}_{n}.{OUTPUT_EXTENSION}"));
        if !candidate.exists() {
            log::debug!(
                "{}.{OUTPUT_EXTENSION} exists in {}, using {}",
                stem,
                target_dir.display(),
                candidate.display()
            );
            return Ok(candidate);
        }
        n += 1;
    }
}
