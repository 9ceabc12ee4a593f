use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub models: ModelsConfig,
    pub transcription: TranscriptionConfig,
    pub extraction: ExtractionConfig,
    pub output: OutputConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelsConfig {
    pub dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranscriptionConfig {
    pub threads: i32,
    pub beam_size: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    pub ffmpeg_path: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub temp_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub log_path: String,
}

impl Config {
    /// Load config from ~/.whisper-local.toml
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default(&config_path)
                .context("failed to create default config")?;
        }

        let contents = fs::read_to_string(&config_path)
            .context("failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("failed to parse config TOML")?;

        Ok(config)
    }

    fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .context("HOME environment variable not set")?;
        Ok(PathBuf::from(home).join(".whisper-local.toml"))
    }

    fn create_default(path: &PathBuf) -> Result<()> {
        let default_config = r#"[models]
dir = "~/.whisper-local/models"

[transcription]
threads = 4
beam_size = 5

[extraction]
ffmpeg_path = "ffmpeg"
timeout_secs = 300

[output]
temp_dir = "/tmp"

[telemetry]
enabled = true
log_path = "~/.whisper-local/crash.log"
"#;
        fs::write(path, default_config)
            .context("failed to write default config")?;
        Ok(())
    }

    /// Expand ~ in paths to home directory
    pub fn expand_path(path: &str) -> Result<PathBuf> {
        if path.starts_with("~/") {
            let home = std::env::var("HOME")
                .context("HOME environment variable not set")?;
            Ok(PathBuf::from(home).join(&path[2..]))
        } else {
            Ok(PathBuf::from(path))
        }
    }
}
