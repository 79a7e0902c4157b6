//! # Error Handling
//!
//! Error types shared by the processing pipeline, the provider and the
//! watcher. Store-level failures live in [`crate::secrets::SecretsError`] and
//! are mapped into [`ProviderError`] by the fetcher.

pub mod types;

pub use types::{ProviderError, Result};
