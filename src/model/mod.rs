//! Model catalog and local snapshot discovery.

pub mod catalog;
pub mod locator;

pub use locator::{available_models, ModelError, ModelSnapshot};
