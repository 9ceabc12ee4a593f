//! Sequential folder processing with per-file failure isolation.

use crate::media::extract;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome counts for one folder run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Video files directly under `dir`, sorted for a stable processing order.
///
/// # Errors
/// Returns error when the directory cannot be read.
pub fn collect_video_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && extract::is_video(path))
        .collect();
    files.sort();
    Ok(files)
}

/// Process every video file in `dir` through `process`, one at a time.
///
/// A failing file is logged and skipped; the batch continues. The stop flag
/// is honored between files.
///
/// # Errors
/// Returns error only when the directory listing itself fails.
pub fn process_folder<F>(
    dir: &Path,
    stop: &Arc<AtomicBool>,
    mut process: F,
) -> Result<BatchSummary>
where
    F: FnMut(&Path) -> Result<()>,
{
    let files = collect_video_files(dir)?;
    let mut summary = BatchSummary {
        total: files.len(),
        ..BatchSummary::default()
    };

    info!(dir = %dir.display(), files = summary.total, "batch started");

    for file in &files {
        if stop.load(Ordering::SeqCst) {
            warn!(
                remaining = summary.total - summary.completed - summary.failed,
                "batch stopped"
            );
            break;
        }

        match process(file) {
            Ok(()) => summary.completed += 1,
            Err(err) => {
                error!(file = %file.display(), error = %format!("{err:#}"), "file failed, continuing");
                summary.failed += 1;
            }
        }
    }

    info!(
        completed = summary.completed,
        failed = summary.failed,
        "batch finished"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn create_test_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .subsec_nanos();
        let dir = std::env::temp_dir().join(format!("whisper-local-batch-{label}-{nanos}"));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_collect_filters_and_sorts() {
        let dir = create_test_dir("collect");
        for name in ["b.mp4", "a.MKV", "notes.txt", "c.wav"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let files = collect_video_files(&dir).unwrap();
        assert_eq!(files, vec![dir.join("a.MKV"), dir.join("b.mp4")]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_collect_missing_dir_errors() {
        assert!(collect_video_files(Path::new("/nonexistent/batch")).is_err());
    }

    #[test]
    fn test_failure_isolation() {
        let dir = create_test_dir("isolation");
        for name in ["one.mp4", "two.mp4", "three.mp4"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let stop = Arc::new(AtomicBool::new(false));
        let summary = process_folder(&dir, &stop, |file| {
            if file.ends_with("two.mp4") {
                anyhow::bail!("forced failure");
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                total: 3,
                completed: 2,
                failed: 1,
            }
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_stop_flag_halts_between_files() {
        let dir = create_test_dir("stop");
        for name in ["one.mp4", "two.mp4", "three.mp4"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let stop = Arc::new(AtomicBool::new(false));
        let stop_inside = Arc::clone(&stop);
        let summary = process_folder(&dir, &stop, move |_| {
            // First file requests a stop, the rest must not run
            stop_inside.store(true, Ordering::SeqCst);
            Ok(())
        })
        .unwrap();

        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.total, 3);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_folder() {
        let dir = create_test_dir("empty");
        let stop = Arc::new(AtomicBool::new(false));
        let summary = process_folder(&dir, &stop, |_| Ok(())).unwrap();
        assert_eq!(summary, BatchSummary::default());
        std::fs::remove_dir_all(&dir).ok();
    }
}
