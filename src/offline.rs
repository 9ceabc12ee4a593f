//! Forces the model runtime into offline mode.
//!
//! The Hugging Face tooling that produced the local snapshot cache will
//! happily reach for the network when a file is missing. Setting these
//! variables before anything touches the cache guarantees every lookup
//! resolves locally or fails fast.

use tracing::debug;

/// Set the environment variables that keep every model lookup local.
///
/// Must run before the model runtime or any cache inspection code.
pub fn enforce() {
    std::env::set_var("HF_HUB_OFFLINE", "1");
    std::env::set_var("HF_ENDPOINT", "");
    std::env::set_var("HF_HUB_DISABLE_SYMLINKS_WARNING", "1");
    std::env::set_var("TRANSFORMERS_OFFLINE", "1");
    std::env::set_var("HF_DATASETS_OFFLINE", "1");

    debug!("offline mode enforced");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enforce_sets_offline_vars() {
        enforce();
        assert_eq!(std::env::var("HF_HUB_OFFLINE").unwrap(), "1");
        assert_eq!(std::env::var("TRANSFORMERS_OFFLINE").unwrap(), "1");
        assert_eq!(std::env::var("HF_ENDPOINT").unwrap(), "");
    }
}
