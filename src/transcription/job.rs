//! Orchestrates a single transcription run from input file to written outputs.
//!
//! The pipeline is validate, extract, probe, decode, write. Preconditions are
//! checked before the model is touched so a bad input never pays the model
//! load cost.

use crate::config::Config;
use crate::media::{extract, wav};
use crate::model::{available_models, ModelSnapshot};
use crate::subtitle::{json, srt};
use crate::transcription::batch;
use crate::transcription::engine::{ProgressFn, Transcribe, TranscriptionEngine};
use crate::transcription::types::{DecodeOptions, Device, Task};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};

/// Precondition failures caught before the model loads
#[derive(Debug, Error)]
pub enum InputError {
    #[error("input file not found: {0}")]
    NotFound(PathBuf),

    #[error("input file is empty: {0}")]
    Empty(PathBuf),

    #[error("failed to stat input {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One requested run, file or folder.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub model: String,
    pub input: PathBuf,
    pub tag: String,
    pub device: Device,
    pub task: Task,
    pub language: String,
    pub source_language: Option<String>,
}

/// Outcome counts for a completed run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub completed: usize,
    pub failed: usize,
}

/// Reject inputs the pipeline cannot use before any expensive work.
///
/// # Errors
/// Returns `InputError::NotFound` or `InputError::Empty`.
pub fn validate_input(path: &Path) -> Result<(), InputError> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }
    let metadata = std::fs::metadata(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.is_file() && metadata.len() == 0 {
        return Err(InputError::Empty(path.to_path_buf()));
    }
    Ok(())
}

/// Run one file through extract, probe, decode, write.
///
/// Returns the path of the written SRT file. The enriched JSON lands under
/// `temp_dir` keyed by `tag`.
///
/// # Errors
/// Returns error on precondition, extraction, decode, or write failure.
#[allow(clippy::too_many_arguments)]
pub fn process_file(
    engine: &dyn Transcribe,
    input: &Path,
    tag: &str,
    options: &DecodeOptions,
    config: &Config,
    temp_dir: &Path,
    stop: &Arc<AtomicBool>,
    on_progress: ProgressFn,
) -> Result<PathBuf> {
    let progress = Arc::new(Mutex::new(on_progress));
    let report = |value: f64| {
        if let Ok(mut callback) = progress.lock() {
            callback(value);
        }
    };

    validate_input(input)?;
    report(5.0);

    let extracted = if extract::needs_extraction(input) {
        Some(extract::extract_audio(
            &config.extraction.ffmpeg_path,
            input,
            temp_dir,
            config.extraction.timeout_secs,
        )?)
    } else {
        None
    };
    let audio_path = extracted.as_deref().unwrap_or(input);

    let result = decode_and_write(
        engine, input, audio_path, tag, options, temp_dir, stop, &progress,
    );

    // Extracted temp audio is removed best-effort in all paths
    if let Some(temp_wav) = extracted {
        if std::fs::remove_file(&temp_wav).is_err() {
            warn!(path = %temp_wav.display(), "failed to remove temp audio");
        }
    }

    result
}

#[allow(clippy::too_many_arguments)]
fn decode_and_write(
    engine: &dyn Transcribe,
    input: &Path,
    audio_path: &Path,
    tag: &str,
    options: &DecodeOptions,
    temp_dir: &Path,
    stop: &Arc<AtomicBool>,
    progress: &Arc<Mutex<ProgressFn>>,
) -> Result<PathBuf> {
    let report = |value: f64| {
        if let Ok(mut callback) = progress.lock() {
            callback(value);
        }
    };

    let duration = wav::duration_secs(audio_path);
    let samples = wav::read_mono_f32(audio_path)
        .with_context(|| format!("failed to load audio from {}", audio_path.display()))?;
    report(10.0);

    let streaming = Arc::clone(progress);
    let streaming_fn: ProgressFn = Box::new(move |value| {
        if let Ok(mut callback) = streaming.lock() {
            callback(value);
        }
    });

    let output = engine.transcribe(&samples, options, duration, streaming_fn, Arc::clone(stop))?;
    report(90.0);

    let srt_path = input.with_extension("srt");
    srt::write_srt(&srt_path, &output.segments)
        .with_context(|| format!("failed to write {}", srt_path.display()))?;

    let json_path = temp_dir.join(format!("{tag}.json"));
    json::write_result(&json_path, &output)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    report(100.0);
    info!(
        input = %input.display(),
        srt = %srt_path.display(),
        json = %json_path.display(),
        segments = output.segments.len(),
        "file processed"
    );

    Ok(srt_path)
}

/// Run a full request: locate the model, load the engine, process the input.
///
/// A directory input runs in batch mode with per-file failure isolation; a
/// file input is a single run.
///
/// # Errors
/// Returns error when the model cannot be located or loaded, or when a
/// single-file run fails.
pub fn run(config: &Config, request: &JobRequest, stop: &Arc<AtomicBool>) -> Result<RunReport> {
    if request.task == Task::Translate && request.language != "en" {
        // The runtime only translates to English, the flag is informational
        warn!(
            target = request.language,
            "translation target ignored, runtime produces English"
        );
    }

    let models_root = Config::expand_path(&config.models.dir)?;

    let snapshot = ModelSnapshot::locate(&request.model, &models_root).map_err(|err| {
        let available = available_models(&models_root);
        anyhow::Error::new(err).context(format!("locally available models: {available:?}"))
    })?;

    let engine = TranscriptionEngine::new(
        &snapshot,
        request.device,
        config.transcription.threads,
        config.transcription.beam_size,
    )?;

    let options = DecodeOptions {
        task: request.task,
        source_language: request.source_language.clone(),
    };
    let temp_dir = Config::expand_path(&config.output.temp_dir)?;

    if request.input.is_dir() {
        let summary = batch::process_folder(&request.input, stop, |file| {
            let stem = file
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "file".to_owned());
            let tag = format!("{}-{stem}", request.tag);
            process_file(
                &engine,
                file,
                &tag,
                &options,
                config,
                &temp_dir,
                stop,
                Box::new(progress_logger(file)),
            )
            .map(|_| ())
        })?;

        Ok(RunReport {
            completed: summary.completed,
            failed: summary.failed,
        })
    } else {
        process_file(
            &engine,
            &request.input,
            &request.tag,
            &options,
            config,
            &temp_dir,
            stop,
            Box::new(progress_logger(&request.input)),
        )?;
        Ok(RunReport {
            completed: 1,
            failed: 0,
        })
    }
}

fn progress_logger(input: &Path) -> impl FnMut(f64) + Send {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let mut last_reported = -1.0;
    move |value| {
        // Milestones only, the per-segment stream is too chatty for logs
        if value - last_reported >= 5.0 || (value - 100.0).abs() < f64::EPSILON {
            info!(file = %name, progress = format!("{value:.0}%"), "transcribing");
            last_reported = value;
        }
    }
}
