//! Command-line argument parsing.

use crate::transcription::job::JobRequest;
use crate::transcription::types::{Device, Task};
use clap::Parser;
use std::path::PathBuf;

/// Offline audio/video transcription with locally cached Whisper models
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Transcribe audio and video files offline, using locally cached Whisper models.",
    long_about = "Transcribe or translate an audio/video file (or every video in a folder) using a locally cached Whisper model. Subtitles land beside each input as .srt; the full result is written as {tag}.json under the configured temp directory. No network access is performed."
)]
pub struct Args {
    /// Model name from the local catalog (e.g. tiny, small, large-v3)
    pub model: String,

    /// Audio/video file, or a folder of videos for batch mode
    pub input: PathBuf,

    /// Identifying token for the JSON result file
    pub tag: String,

    /// Inference device
    #[arg(long, value_enum, default_value_t = Device::Cpu)]
    pub device: Device,

    /// Transcribe in the spoken language or translate to English
    #[arg(long, value_enum, default_value_t = Task::Transcribe)]
    pub task: Task,

    /// Target language for translation (the runtime supports only en)
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Source-language hint (e.g. en, pl). Auto-detects by default.
    #[arg(long)]
    pub source_language: Option<String>,
}

impl Args {
    /// Convert parsed arguments into a job request.
    #[must_use]
    pub fn into_request(self) -> JobRequest {
        JobRequest {
            model: self.model,
            input: self.input,
            tag: self.tag,
            device: self.device,
            task: self.task,
            language: self.language,
            source_language: self.source_language,
        }
    }
}
