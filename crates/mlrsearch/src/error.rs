//! Error types for a search run.

use std::time::Duration;

use mlrsearch_core::CoreError;

/// Error that aborts a search run.
///
/// Every variant is fatal. Phases that end early because the bounds are
/// narrow enough or hit a load limit are not errors.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Search configuration or call arguments are invalid.
    ///
    /// Reported before any trial is measured.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The deadline passed between two trials.
    #[error("Search timed out after {elapsed:?} (timeout {timeout:?})")]
    Timeout { elapsed: Duration, timeout: Duration },

    /// The measurement provider failed; the search does not retry.
    #[error("Measurement provider failed: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// Internal logic error in the search itself.
    #[error(transparent)]
    Internal(#[from] CoreError),
}

impl SearchError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
