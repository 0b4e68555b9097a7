//! Finding what the tool actually wrote.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

use crate::media::{extension_of, Container};

/// Files modified this long before the job started still count as its output.
const MTIME_SLACK: Duration = Duration::from_secs(1);

/// Locates the produced file.
///
/// Tries, in order: the planned path, the path the tool reported (only when
/// it lies inside the planned directory), and the newest file with a known media extension in the planned directory that
/// was modified after `started` (less [`MTIME_SLACK`]). Only sound while a
/// single job writes to the directory at a time.
pub async fn locate_artifact(
    expected: &Path,
    reported: Option<&Path>,
    started: SystemTime,
) -> Option<PathBuf> {
    if is_file(expected).await {
        return Some(expected.to_path_buf());
    }

    let dir = expected.parent()?;

    if let Some(reported) = reported {
        if !reported.starts_with(dir) {
            warn!(
                path = %reported.display(),
                dir = %dir.display(),
                "Ignoring tool-reported path outside the output directory"
            );
        } else if is_file(reported).await {
            debug!(path = %reported.display(), "Output found at tool-reported path");
            return Some(reported.to_path_buf());
        }
    }

    let not_before = started.checked_sub(MTIME_SLACK).unwrap_or(started);
    let newest = newest_media_file(dir, not_before).await;
    if let Some(path) = &newest {
        debug!(path = %path.display(), "Output found by directory scan");
    }
    newest
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

async fn newest_media_file(dir: &Path, not_before: SystemTime) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    let mut newest: Option<(SystemTime, PathBuf)> = None;

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let ext = extension_of(&path);
        if !Container::known_extensions().any(|known| known == ext) {
            continue;
        }

        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        let Ok(modified) = meta.modified() else {
            continue;
        };
        if !meta.is_file() || modified < not_before {
            continue;
        }

        if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }

    newest.map(|(_, path)| path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exact_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let expected = dir.path().join("out.mkv");
        std::fs::write(&expected, b"x").unwrap();
        std::fs::write(dir.path().join("other.mp4"), b"x").unwrap();

        let found = locate_artifact(&expected, None, SystemTime::now()).await;
        assert_eq!(found, Some(expected));
    }

    #[tokio::test]
    async fn test_reported_path_used() {
        let dir = tempfile::tempdir().unwrap();
        let expected = dir.path().join("out.mkv");
        let reported = dir.path().join("out.webm");
        std::fs::write(&reported, b"x").unwrap();

        let found = locate_artifact(&expected, Some(&reported), SystemTime::now()).await;
        assert_eq!(found, Some(reported));
    }

    #[tokio::test]
    async fn test_reported_path_outside_output_dir_rejected() {
        let out = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        let reported = elsewhere.path().join("out.webm");
        std::fs::write(&reported, b"x").unwrap();
        let started = SystemTime::now() + Duration::from_secs(30);

        let found = locate_artifact(&out.path().join("out.mkv"), Some(&reported), started).await;
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_directory_scan_finds_fresh_media() {
        let dir = tempfile::tempdir().unwrap();
        let started = SystemTime::now();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("renamed.mp4"), b"x").unwrap();

        let found = locate_artifact(&dir.path().join("out.mkv"), None, started).await;
        assert_eq!(found, Some(dir.path().join("renamed.mp4")));
    }

    #[tokio::test]
    async fn test_stale_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.mp4"), b"x").unwrap();
        let started = SystemTime::now() + Duration::from_secs(30);

        let found = locate_artifact(&dir.path().join("out.mkv"), None, started).await;
        assert_eq!(found, None);
    }
}
