//! SRT rendering and writing.

use crate::transcription::types::Segment;
use std::fmt::Write as _;
use std::path::Path;

/// Format seconds as an SRT timestamp, `HH:MM:SS,mmm`.
///
/// Milliseconds are truncated, not rounded. The epsilon guards against f64
/// representations like 3661.2339999 landing one millisecond short.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_timestamp(seconds: f64) -> String {
    let total_millis = ((seconds.max(0.0) * 1000.0) + 1e-6).floor() as u64;
    let millis = total_millis % 1000;
    let total_secs = total_millis / 1000;
    let secs = total_secs % 60;
    let minutes = (total_secs / 60) % 60;
    let hours = total_secs / 3600;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

/// Render segments as SRT text: numbered blocks separated by blank lines.
#[must_use]
pub fn render(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (index, segment) in segments.iter().enumerate() {
        let _ = writeln!(out, "{}", index + 1);
        let _ = writeln!(
            out,
            "{} --> {}",
            format_timestamp(segment.start),
            format_timestamp(segment.end)
        );
        let _ = writeln!(out, "{}", segment.text);
        let _ = writeln!(out);
    }
    out
}

/// Write segments as an SRT file.
///
/// # Errors
/// Returns error when the file cannot be written.
pub fn write_srt(path: &Path, segments: &[Segment]) -> std::io::Result<()> {
    std::fs::write(path, render(segments))
}
