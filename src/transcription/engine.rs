use crate::model::ModelSnapshot;
use crate::transcription::types::{DecodeOptions, Device, Segment, Task, TranscriptionOutput};
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Progress callback invoked after each decoded segment
pub type ProgressFn = Box<dyn FnMut(f64) + Send>;

/// Trait for decode operations (enables testing via mocking)
///
/// This trait abstracts the decode step to enable dependency injection and
/// mock-based testing in the job orchestrator and batch runner.
///
/// Production code should use the concrete [`TranscriptionEngine`] type
/// directly. Use this trait for testing with `MockTranscribe` (via `mockall`).
#[cfg_attr(test, mockall::automock)]
pub trait Transcribe: Send + Sync {
    /// Decode 16 kHz mono f32 samples into timestamped segments
    ///
    /// # Errors
    /// Returns error if Whisper inference fails
    fn transcribe(
        &self,
        samples: &[f32],
        options: &DecodeOptions,
        duration_secs: Option<f64>,
        on_progress: ProgressFn,
        stop: Arc<AtomicBool>,
    ) -> Result<TranscriptionOutput, TranscriptionError>;
}

/// Errors that can occur during transcription
#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// Failed to load Whisper model
    #[error("failed to load whisper model from {path}: {source}")]
    ModelLoad {
        /// Path to model weights
        path: String,
        /// Underlying error
        source: anyhow::Error,
    },

    /// Failed to create Whisper inference state
    #[error("failed to create whisper state")]
    StateCreation,

    /// Transcription inference failed
    #[error("failed to transcribe audio")]
    Transcription(#[from] anyhow::Error),
}

/// Segment-count based progress estimate.
///
/// Progress starts at 10 (preprocessing done) and approaches 90 as decoded
/// segments accumulate; the final jump to 100 belongs to the caller once
/// outputs are written.
#[derive(Debug)]
pub struct ProgressEstimate {
    estimated_segments: usize,
    seen: usize,
}

impl ProgressEstimate {
    const FALLBACK_SEGMENTS: usize = 100;
    const SECONDS_PER_SEGMENT: f64 = 30.0;

    /// Build an estimate from the probed media duration, if any.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(duration_secs: Option<f64>) -> Self {
        let estimated_segments = duration_secs.map_or(Self::FALLBACK_SEGMENTS, |secs| {
            ((secs / Self::SECONDS_PER_SEGMENT) as usize).max(1)
        });
        Self {
            estimated_segments,
            seen: 0,
        }
    }

    /// Record one more decoded segment and return the progress value.
    ///
    /// Monotonically non-decreasing, capped at 90.
    #[allow(clippy::cast_precision_loss)]
    pub fn advance(&mut self) -> f64 {
        self.seen += 1;
        let fraction = self.seen as f64 / self.estimated_segments as f64;
        (10.0 + fraction * 80.0).min(90.0)
    }
}

/// Whisper transcription engine bound to a validated model snapshot
pub struct TranscriptionEngine {
    /// Whisper context (thread-safe)
    ctx: Arc<Mutex<WhisperContext>>,
    /// Number of CPU threads for inference
    threads: i32,
    /// Beam search width
    beam_size: i32,
}

impl TranscriptionEngine {
    /// Determines sampling strategy based on beam size (pure, testable)
    const fn sampling_strategy(beam_size: i32) -> SamplingStrategy {
        if beam_size > 1 {
            SamplingStrategy::BeamSearch {
                beam_size,
                patience: -1.0,
            }
        } else {
            SamplingStrategy::Greedy { best_of: 1 }
        }
    }

    /// Creates a new `TranscriptionEngine` from a located snapshot
    ///
    /// # Errors
    /// Returns error if the weight file is missing or invalid, or if
    /// `threads`/`beam_size` are not positive
    pub fn new(
        snapshot: &ModelSnapshot,
        device: Device,
        threads: i32,
        beam_size: i32,
    ) -> Result<Self, TranscriptionError> {
        let weights = snapshot.weights_path();

        if threads <= 0 {
            return Err(TranscriptionError::ModelLoad {
                path: weights.display().to_string(),
                source: anyhow::anyhow!("threads must be > 0"),
            });
        }
        if beam_size <= 0 {
            return Err(TranscriptionError::ModelLoad {
                path: weights.display().to_string(),
                source: anyhow::anyhow!("beam_size must be > 0"),
            });
        }

        tracing::info!(
            model = snapshot.name,
            path = %weights.display(),
            device = ?device,
            threads,
            beam_size,
            "loading whisper model"
        );

        let path_str = weights.to_str().ok_or_else(|| TranscriptionError::ModelLoad {
            path: weights.display().to_string(),
            source: anyhow::anyhow!("model path contains invalid UTF-8"),
        })?;

        let mut params = WhisperContextParameters::default();
        params.use_gpu(device.is_gpu());

        let ctx = WhisperContext::new_with_params(path_str, params).map_err(|e| {
            TranscriptionError::ModelLoad {
                path: weights.display().to_string(),
                source: anyhow::anyhow!("{e:?}"),
            }
        })?;

        tracing::info!("whisper model loaded successfully");

        Ok(Self {
            ctx: Arc::new(Mutex::new(ctx)),
            threads,
            beam_size,
        })
    }

    /// Decodes audio samples (16kHz mono f32) into timestamped segments
    ///
    /// # Errors
    /// Returns error if Whisper inference fails or mutex is poisoned
    #[allow(clippy::cast_precision_loss)]
    fn transcribe_impl(
        &self,
        samples: &[f32],
        options: &DecodeOptions,
        duration_secs: Option<f64>,
        mut on_progress: ProgressFn,
        stop: Arc<AtomicBool>,
    ) -> Result<TranscriptionOutput, TranscriptionError> {
        let _span = tracing::debug_span!("transcription", samples = samples.len()).entered();
        tracing::debug!(task = ?options.task, hint = ?options.source_language, "starting decode");

        // Create state for this transcription
        let mut state = self
            .ctx
            .lock()
            .map_err(|e| anyhow::anyhow!("mutex poisoned: {e}"))?
            .create_state()
            .map_err(|_| TranscriptionError::StateCreation)?;

        let strategy = Self::sampling_strategy(self.beam_size);
        let mut params = FullParams::new(strategy);
        params.set_n_threads(self.threads);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_language(options.source_language.as_deref()); // None = auto-detect
        params.set_translate(matches!(options.task, Task::Translate));

        // Stream per-segment progress while the decode runs
        let mut tracker = ProgressEstimate::new(duration_secs);
        let progress_stop = Arc::clone(&stop);
        params.set_segment_callback_safe(move |_data: whisper_rs::SegmentCallbackData| {
            if progress_stop.load(Ordering::SeqCst) {
                return;
            }
            on_progress(tracker.advance());
        });

        // The abort callback is polled between decode steps, never mid-step
        let abort_stop = Arc::clone(&stop);
        params.set_abort_callback_safe(move || abort_stop.load(Ordering::SeqCst));

        // Run transcription
        let start = std::time::Instant::now();
        let decode_result = state.full(params, samples);
        let inference_duration = start.elapsed();

        if let Err(err) = decode_result {
            if stop.load(Ordering::SeqCst) {
                tracing::info!("decode stopped early, keeping partial segments");
            } else {
                return Err(TranscriptionError::Transcription(anyhow::anyhow!(
                    "whisper inference failed: {err}"
                )));
            }
        }

        // Extract segments in decode order
        let mut segments = Vec::new();
        for i in 0..state.full_n_segments() {
            if let Some(segment) = state.get_segment(i) {
                let text = segment
                    .to_str_lossy()
                    .map_err(|e| anyhow::anyhow!("segment text: {e}"))?;
                segments.push(Segment {
                    text: text.trim().to_owned(),
                    start: segment.start_timestamp() as f64 / 100.0,
                    end: segment.end_timestamp() as f64 / 100.0,
                });
            }
        }

        let language = match &options.source_language {
            Some(lang) => Some(lang.clone()),
            None => whisper_rs::get_lang_str(state.full_lang_id_from_state())
                .map(std::borrow::ToOwned::to_owned),
        };

        tracing::info!(
            segments = segments.len(),
            language = ?language,
            inference_ms = inference_duration.as_millis(),
            "transcription completed"
        );

        Ok(TranscriptionOutput {
            segments,
            language,
            // whisper.cpp does not surface the auto-detect probability
            language_probability: None,
        })
    }
}

impl Transcribe for TranscriptionEngine {
    fn transcribe(
        &self,
        samples: &[f32],
        options: &DecodeOptions,
        duration_secs: Option<f64>,
        on_progress: ProgressFn,
        stop: Arc<AtomicBool>,
    ) -> Result<TranscriptionOutput, TranscriptionError> {
        self.transcribe_impl(samples, options, duration_secs, on_progress, stop)
    }
}

// SAFETY: TranscriptionEngine is thread-safe because:
// 1. WhisperContext is wrapped in Arc<Mutex<>>, ensuring exclusive access
// 2. All methods require acquiring the mutex lock before accessing the context
// 3. No shared mutable state exists outside the mutex
// 4. whisper-rs WhisperContext is documented as thread-safe when properly synchronized
#[allow(unsafe_code)]
unsafe impl Send for TranscriptionEngine {}
#[allow(unsafe_code)]
unsafe impl Sync for TranscriptionEngine {}

#[cfg(test)]
#[allow(clippy::print_stderr)] // Test diagnostics
mod tests {
    use super::*;
    use crate::model::locator::REQUIRED_MODEL_FILES;
    use std::path::PathBuf;

    fn get_test_snapshot() -> Option<ModelSnapshot> {
        let home = std::env::var("HOME").ok()?;
        let root = PathBuf::from(home).join(".whisper-local").join("models");
        ModelSnapshot::locate("tiny", &root).ok()
    }

    fn fake_snapshot(dir: &std::path::Path) -> ModelSnapshot {
        std::fs::create_dir_all(dir).unwrap();
        for file in REQUIRED_MODEL_FILES {
            std::fs::write(dir.join(file), b"not a real model").unwrap();
        }
        ModelSnapshot {
            name: "tiny".to_owned(),
            path: dir.to_path_buf(),
        }
    }

    #[test]
    fn test_new_with_zero_threads() {
        let dir = std::env::temp_dir().join("whisper-local-engine-zero-threads");
        let snapshot = fake_snapshot(&dir);

        let result = TranscriptionEngine::new(&snapshot, Device::Cpu, 0, 5);
        assert!(matches!(result, Err(TranscriptionError::ModelLoad { .. })));
        if let Err(TranscriptionError::ModelLoad { source, .. }) = result {
            assert!(source.to_string().contains("threads must be > 0"));
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_new_with_zero_beam_size() {
        let dir = std::env::temp_dir().join("whisper-local-engine-zero-beam");
        let snapshot = fake_snapshot(&dir);

        let result = TranscriptionEngine::new(&snapshot, Device::Cpu, 4, 0);
        assert!(matches!(result, Err(TranscriptionError::ModelLoad { .. })));
        if let Err(TranscriptionError::ModelLoad { source, .. }) = result {
            assert!(source.to_string().contains("beam_size must be > 0"));
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_model_load_invalid_weights() {
        let dir = std::env::temp_dir().join("whisper-local-engine-bad-weights");
        let snapshot = fake_snapshot(&dir);

        // Stub bytes are not a valid model, load must fail with the path
        let result = TranscriptionEngine::new(&snapshot, Device::Cpu, 4, 5);
        assert!(matches!(result, Err(TranscriptionError::ModelLoad { .. })));
        if let Err(TranscriptionError::ModelLoad { path, .. }) = result {
            assert!(path.contains("model.bin"));
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<TranscriptionEngine>();
        assert_sync::<TranscriptionEngine>();
    }

    #[test]
    fn test_sampling_strategy_greedy() {
        let strategy = TranscriptionEngine::sampling_strategy(1);
        assert!(matches!(strategy, SamplingStrategy::Greedy { best_of: 1 }));
    }

    #[test]
    fn test_sampling_strategy_beam_search() {
        let strategy = TranscriptionEngine::sampling_strategy(5);
        assert!(
            matches!(
                strategy,
                SamplingStrategy::BeamSearch {
                    beam_size: 5,
                    patience: -1.0
                }
            ),
            "Expected BeamSearch with beam_size=5, patience=-1.0"
        );
    }

    #[test]
    fn test_sampling_strategy_boundary() {
        // beam_size = 1 is Greedy, beam_size = 2 is BeamSearch
        assert!(matches!(
            TranscriptionEngine::sampling_strategy(1),
            SamplingStrategy::Greedy { .. }
        ));
        assert!(matches!(
            TranscriptionEngine::sampling_strategy(2),
            SamplingStrategy::BeamSearch { .. }
        ));
    }

    #[test]
    fn test_progress_estimate_from_duration() {
        // 90 seconds -> 3 estimated segments
        let mut tracker = ProgressEstimate::new(Some(90.0));
        assert!((tracker.advance() - (10.0 + 80.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_progress_estimate_short_media_floors_at_one() {
        // 5 seconds still estimates one segment
        let mut tracker = ProgressEstimate::new(Some(5.0));
        assert!((tracker.advance() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_progress_estimate_fallback() {
        let mut tracker = ProgressEstimate::new(None);
        // 100 estimated segments: first advance is 10.8
        assert!((tracker.advance() - 10.8).abs() < 1e-9);
    }

    #[test]
    fn test_progress_monotonic_and_capped() {
        let mut tracker = ProgressEstimate::new(Some(60.0));
        let mut last = 0.0;
        for _ in 0..20 {
            let value = tracker.advance();
            assert!(value >= last, "progress regressed: {value} < {last}");
            assert!(value <= 90.0, "progress exceeded cap: {value}");
            last = value;
        }
        assert!((last - 90.0).abs() < 1e-9);
    }

    #[test]
    #[ignore = "requires actual model file"]
    fn test_model_load_success() {
        let Some(snapshot) = get_test_snapshot() else {
            eprintln!("Skipping test: no model under ~/.whisper-local/models");
            return;
        };

        let engine = TranscriptionEngine::new(&snapshot, Device::Cpu, 4, 5);
        assert!(engine.is_ok(), "Failed to load model: {:?}", engine.err());
    }

    #[test]
    #[ignore = "requires actual model file"]
    fn test_transcribe_silence() {
        let Some(snapshot) = get_test_snapshot() else {
            eprintln!("Skipping test: no model found");
            return;
        };

        let engine = TranscriptionEngine::new(&snapshot, Device::Cpu, 4, 5).unwrap();

        // 1 second of silence (16kHz)
        let silence: Vec<f32> = vec![0.0; 16000];

        let result = engine.transcribe(
            &silence,
            &DecodeOptions::default(),
            Some(1.0),
            Box::new(|_| {}),
            Arc::new(AtomicBool::new(false)),
        );
        assert!(result.is_ok());

        // Silence should produce no or minimal segments
        let output = result.unwrap();
        let text_len: usize = output.segments.iter().map(|s| s.text.len()).sum();
        assert!(
            text_len < 50,
            "Expected minimal output for silence, got {text_len} chars"
        );
    }

    #[test]
    #[ignore = "requires actual model file"]
    fn test_transcribe_reports_progress() {
        let Some(snapshot) = get_test_snapshot() else {
            eprintln!("Skipping test: no model found");
            return;
        };

        let engine = TranscriptionEngine::new(&snapshot, Device::Cpu, 4, 5).unwrap();

        let audio: Vec<f32> = vec![0.0; 16000 * 5];
        let reported = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reported);

        let result = engine.transcribe(
            &audio,
            &DecodeOptions::default(),
            Some(5.0),
            Box::new(move |value| sink.lock().unwrap().push(value)),
            Arc::new(AtomicBool::new(false)),
        );
        assert!(result.is_ok());

        let values = reported.lock().unwrap();
        for pair in values.windows(2) {
            assert!(pair[1] >= pair[0], "progress must not regress");
        }
        assert!(values.iter().all(|v| *v <= 90.0));
    }
}
