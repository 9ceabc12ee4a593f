//! Audio extraction and WAV probing.

pub mod extract;
pub mod wav;

pub use extract::{needs_extraction, ExtractionError};
