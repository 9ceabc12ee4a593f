//! Whisper Local - offline audio/video transcription utility
//!
//! This library exports core modules for testing and potential future reuse.

/// Command-line argument parsing
pub mod cli;
/// Configuration management
pub mod config;
/// Audio extraction and WAV probing
pub mod media;
/// Model catalog and local snapshot discovery
pub mod model;
/// Offline-mode enforcement for the model runtime
pub mod offline;
/// Subtitle and JSON output writers
pub mod subtitle;
/// Telemetry and crash logging
pub mod telemetry;
/// Whisper transcription engine and job orchestration
pub mod transcription;
