//! Collision-free output path selection.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::media::Container;

/// Picks `{dir}/{stem}.{ext}`, or a timestamped sibling if that exists.
///
/// Returns the path and whether an alternate was chosen. Existing files are
/// never reused.
pub fn output_path_for(
    input: &Path,
    dir: &Path,
    container: Container,
    now: DateTime<Local>,
) -> (PathBuf, bool) {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = container.extension();

    let preferred = dir.join(format!("{}.{}", stem, ext));
    if !preferred.exists() {
        return (preferred, false);
    }

    let stamped = format!("{}_{}", stem, now.format("%Y%m%d%H%M%S"));
    let mut candidate = dir.join(format!("{}.{}", stamped, ext));
    let mut n = 1u32;
    while candidate.exists() {
        candidate = dir.join(format!("{}_{}.{}", stamped, n, ext));
        n += 1;
    }

    (candidate, true)
}
