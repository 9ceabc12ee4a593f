//! WAV probing and PCM sample loading.

use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Sample rate the decoder expects.
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Errors from WAV reading
#[derive(Debug, Error)]
pub enum WavError {
    #[error("failed to open wav {path}: {source}")]
    Open {
        path: String,
        source: hound::Error,
    },

    #[error("unsupported wav format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to read samples: {0}")]
    Read(#[from] hound::Error),
}

/// Duration of a WAV file in seconds, best-effort.
///
/// Returns `None` when the file cannot be opened or carries a zero sample
/// rate; callers fall back to a fixed progress estimate.
#[must_use]
pub fn duration_secs(path: &Path) -> Option<f64> {
    let reader = hound::WavReader::open(path).ok()?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return None;
    }
    let frames = f64::from(reader.duration());
    let secs = frames / f64::from(spec.sample_rate);
    debug!(path = %path.display(), secs, "probed wav duration");
    Some(secs)
}

/// Load a 16 kHz mono 16-bit WAV as f32 samples in [-1, 1].
///
/// # Errors
/// Returns `WavError::UnsupportedFormat` when the file is not the 16 kHz
/// mono 16-bit PCM layout extraction produces.
pub fn read_mono_f32(path: &Path) -> Result<Vec<f32>, WavError> {
    let mut reader = hound::WavReader::open(path).map_err(|source| WavError::Open {
        path: path.display().to_string(),
        source,
    })?;

    let spec = reader.spec();
    if spec.channels != 1
        || spec.sample_rate != WHISPER_SAMPLE_RATE
        || spec.bits_per_sample != 16
        || spec.sample_format != hound::SampleFormat::Int
    {
        return Err(WavError::UnsupportedFormat(format!(
            "{} ch, {} Hz, {} bit",
            spec.channels, spec.sample_rate, spec.bits_per_sample
        )));
    }

    let samples: Result<Vec<f32>, hound::Error> = reader
        .samples::<i16>()
        .map(|sample| sample.map(|value| f32::from(value) / 32768.0))
        .collect();

    Ok(samples?)
}
