//! Discovers and validates locally cached model snapshots.
//!
//! The cache layout mirrors the Hugging Face hub cache:
//! `{models_root}/models--{org}--{name}/snapshots/{revision}/`. Discovery is
//! strictly read-only; a model that is missing or incomplete is reported,
//! never fetched.

use crate::model::catalog;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Files a snapshot must contain to be usable.
pub const REQUIRED_MODEL_FILES: &[&str] = &["config.json", "tokenizer.json", "model.bin"];

/// Errors from model discovery and validation
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown model name: {0}")]
    UnknownModel(String),

    #[error("model {name} is not installed under {root}")]
    NotInstalled { name: String, root: PathBuf },

    #[error("model {name} snapshot is incomplete, missing: {missing:?}")]
    Incomplete { name: String, missing: Vec<String> },

    #[error("failed to read model cache: {0}")]
    Io(#[from] std::io::Error),
}

/// A located, validated model snapshot directory.
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    pub name: String,
    pub path: PathBuf,
}

impl ModelSnapshot {
    /// Locate and validate a model snapshot under `models_root`.
    ///
    /// # Errors
    /// Returns `ModelError::UnknownModel` for names outside the catalog,
    /// `ModelError::NotInstalled` when no snapshot directory exists, and
    /// `ModelError::Incomplete` when required files are missing.
    pub fn locate(name: &str, models_root: &Path) -> Result<Self, ModelError> {
        let repo =
            catalog::repo_id(name).ok_or_else(|| ModelError::UnknownModel(name.to_owned()))?;

        let snapshot_path = find_snapshot_dir(models_root, repo).ok_or_else(|| {
            ModelError::NotInstalled {
                name: name.to_owned(),
                root: models_root.to_path_buf(),
            }
        })?;

        let missing = missing_files(&snapshot_path);
        if !missing.is_empty() {
            return Err(ModelError::Incomplete {
                name: name.to_owned(),
                missing,
            });
        }

        debug!(model = name, path = %snapshot_path.display(), "model snapshot located");

        Ok(Self {
            name: name.to_owned(),
            path: snapshot_path,
        })
    }

    /// Path to the weight file inside the snapshot.
    #[must_use]
    pub fn weights_path(&self) -> PathBuf {
        self.path.join("model.bin")
    }
}

/// First entry under `{models_root}/{cache_dir}/snapshots/`, if any.
fn find_snapshot_dir(models_root: &Path, repo: &str) -> Option<PathBuf> {
    let snapshots = models_root
        .join(catalog::cache_dir_name(repo))
        .join("snapshots");

    let mut entries: Vec<PathBuf> = fs::read_dir(&snapshots)
        .ok()?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();

    entries.sort();
    entries.into_iter().next()
}

/// Required files absent from a snapshot directory.
#[must_use]
pub fn missing_files(snapshot: &Path) -> Vec<String> {
    REQUIRED_MODEL_FILES
        .iter()
        .filter(|file| !snapshot.join(file).exists())
        .map(|file| (*file).to_owned())
        .collect()
}

/// Catalog names whose snapshots locate and validate under `models_root`.
#[must_use]
pub fn available_models(models_root: &Path) -> Vec<String> {
    catalog::model_names()
        .into_iter()
        .filter(|name| ModelSnapshot::locate(name, models_root).is_ok())
        .map(std::borrow::ToOwned::to_owned)
        .collect()
}
