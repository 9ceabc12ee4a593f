//! Converts video containers and compressed audio to decoder-ready WAV.
//!
//! Extraction shells out to ffmpeg with a fixed argument set that produces
//! 16 kHz mono 16-bit PCM, the only input format the decoder accepts. The
//! subprocess is time-boxed; a hung ffmpeg is killed rather than waited on
//! forever.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Container extensions that require audio extraction.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm"];

/// Compressed audio extensions converted through the same ffmpeg path.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "flac", "ogg"];

/// Errors from the ffmpeg extraction subprocess
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to spawn ffmpeg ({command}): {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("ffmpeg exited with status {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },

    #[error("ffmpeg timed out after {0} seconds")]
    TimedOut(u64),

    #[error("extraction io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether a path needs conversion before decoding.
///
/// Matches extensions case-insensitively; a bare `.wav` is handed to the
/// decoder as-is.
#[must_use]
pub fn needs_extraction(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    let ext = ext.to_lowercase();
    VIDEO_EXTENSIONS.contains(&ext.as_str()) || AUDIO_EXTENSIONS.contains(&ext.as_str())
}

/// Whether a path looks like a video container.
#[must_use]
pub fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Extract the audio track of `input` into a temporary 16 kHz mono WAV.
///
/// Returns the path of the extracted file. The caller owns cleanup.
///
/// # Errors
/// Returns `ExtractionError` when ffmpeg cannot be spawned, exits non-zero,
/// or exceeds `timeout_secs`.
pub fn extract_audio(
    ffmpeg: &str,
    input: &Path,
    temp_dir: &Path,
    timeout_secs: u64,
) -> Result<PathBuf, ExtractionError> {
    let unix_ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let output = temp_dir.join(format!("extracted_audio_{unix_ts}.wav"));

    info!(
        input = %input.display(),
        output = %output.display(),
        "extracting audio track"
    );

    let mut child = Command::new(ffmpeg)
        .args(ffmpeg_args(input, &output))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ExtractionError::Spawn {
            command: ffmpeg.to_owned(),
            source,
        })?;

    // Drain stderr on a separate thread so a chatty ffmpeg cannot fill the
    // pipe and deadlock against our wait loop.
    let stderr_handle = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = String::new();
            pipe.read_to_string(&mut buf).ok();
            buf
        })
    });

    let status = wait_with_timeout(&mut child, Duration::from_secs(timeout_secs))?;

    let stderr = stderr_handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    match status {
        Some(status) if status.success() => {
            debug!(output = %output.display(), "extraction complete");
            Ok(output)
        }
        Some(status) => {
            std::fs::remove_file(&output).ok();
            Err(ExtractionError::CommandFailed {
                status: status.code().unwrap_or(-1),
                stderr: stderr.trim().to_owned(),
            })
        }
        None => {
            warn!(timeout_secs, "ffmpeg timed out, killed");
            std::fs::remove_file(&output).ok();
            Err(ExtractionError::TimedOut(timeout_secs))
        }
    }
}

fn ffmpeg_args(input: &Path, output: &Path) -> Vec<std::ffi::OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        input.as_os_str().to_owned(),
        "-vn".into(),
        "-ac".into(),
        "1".into(),
        "-ar".into(),
        "16000".into(),
        "-f".into(),
        "wav".into(),
        output.as_os_str().to_owned(),
    ]
}

/// Poll the child until exit or deadline. Returns `None` on timeout after
/// killing the process.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> Result<Option<std::process::ExitStatus>, ExtractionError> {
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            child.kill().ok();
            child.wait().ok();
            return Ok(None);
        }
        std::thread::sleep(Duration::from_millis(100));
    }
}
