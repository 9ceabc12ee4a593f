/// Sequential folder processing
pub mod batch;
/// Whisper model inference engine
pub mod engine;
/// Single-run orchestration
pub mod job;
/// Shared result and option types
pub mod types;

pub use engine::{Transcribe, TranscriptionEngine};
pub use types::{DecodeOptions, Device, Segment, Task, TranscriptionOutput};
