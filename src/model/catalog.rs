//! Fixed mapping from short model names to Hugging Face repository ids.

/// Known model names and the repositories their snapshots come from.
pub const MODEL_REPOS: &[(&str, &str)] = &[
    ("tiny.en", "Systran/faster-whisper-tiny.en"),
    ("tiny", "Systran/faster-whisper-tiny"),
    ("base.en", "Systran/faster-whisper-base.en"),
    ("base", "Systran/faster-whisper-base"),
    ("small.en", "Systran/faster-whisper-small.en"),
    ("small", "Systran/faster-whisper-small"),
    ("medium.en", "Systran/faster-whisper-medium.en"),
    ("medium", "Systran/faster-whisper-medium"),
    ("large-v1", "Systran/faster-whisper-large-v1"),
    ("large-v2", "Systran/faster-whisper-large-v2"),
    ("large-v3", "Systran/faster-whisper-large-v3"),
    ("large", "Systran/faster-whisper-large-v3"),
    ("distil-large-v2", "Systran/faster-distil-whisper-large-v2"),
    ("distil-medium.en", "Systran/faster-distil-whisper-medium.en"),
    ("distil-small.en", "Systran/faster-distil-whisper-small.en"),
    ("distil-large-v3", "Systran/faster-distil-whisper-large-v3"),
    (
        "large-v3-turbo",
        "mobiuslabsgmbh/faster-whisper-large-v3-turbo",
    ),
    ("turbo", "mobiuslabsgmbh/faster-whisper-large-v3-turbo"),
];

/// Look up the repository id for a model name.
#[must_use]
pub fn repo_id(name: &str) -> Option<&'static str> {
    MODEL_REPOS
        .iter()
        .find(|(model, _)| *model == name)
        .map(|(_, repo)| *repo)
}

/// Directory name the snapshot cache uses for a repository.
///
/// `Systran/faster-whisper-small` becomes
/// `models--Systran--faster-whisper-small`.
#[must_use]
pub fn cache_dir_name(repo: &str) -> String {
    format!("models--{}", repo.replace('/', "--"))
}

/// All model names in catalog order.
#[must_use]
pub fn model_names() -> Vec<&'static str> {
    MODEL_REPOS.iter().map(|(name, _)| *name).collect()
}
