//! Shared error types for the services crate.

use thiserror::Error;

use drill_core::model::CardError;

/// Errors from the generative backend (word batches and speech).
///
/// Batch-load failures surface to the caller and drop the session back to
/// `Idle`; audio failures are logged and swallowed by `AudioService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("content provider is not configured")]
    Disabled,
    #[error("provider request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("provider returned an empty batch")]
    EmptyBatch,
    #[error("provider returned a malformed payload: {0}")]
    Malformed(String),
    #[error(transparent)]
    Card(#[from] CardError),
    #[error("background fetch failed: {0}")]
    TaskFailed(String),
}
