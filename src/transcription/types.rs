//! Shared result and option types for transcription.

use serde::{Deserialize, Serialize};

/// One decoded segment with timestamps in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment text, trimmed
    pub text: String,
    /// Start offset in seconds
    pub start: f64,
    /// End offset in seconds
    pub end: f64,
}

/// Full result of one decode run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionOutput {
    /// Ordered segments as the runtime produced them
    pub segments: Vec<Segment>,
    /// Detected or caller-pinned language code
    pub language: Option<String>,
    /// Detection confidence when the runtime surfaces one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_probability: Option<f32>,
}

/// Inference device selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Device {
    /// CPU inference
    #[default]
    Cpu,
    /// GPU inference via CUDA
    Cuda,
}

impl Device {
    /// Whether the runtime should offload to the GPU.
    #[must_use]
    pub const fn is_gpu(self) -> bool {
        matches!(self, Self::Cuda)
    }
}

/// What the decoder should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Task {
    /// Transcribe in the spoken language
    #[default]
    Transcribe,
    /// Translate to English
    Translate,
}

/// Per-run decode options.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Transcribe or translate
    pub task: Task,
    /// Source-language hint; `None` auto-detects
    pub source_language: Option<String>,
}
