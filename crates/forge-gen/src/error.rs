//! Generator errors
//!
//! The split matters to callers: [`ValidationError`] is a caller bug and
//! never worth retrying, [`PersistenceError`] is an environment fault and
//! the whole generation is safe to retry.

use forge_artifact::{PersistenceError, TargetPath, ValidationError};

/// Errors from [`ArtifactGenerator::generate`](crate::ArtifactGenerator::generate)
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Request shape is invalid (caller fault, not retried)
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Durable write failed (environment fault, retryable)
    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    /// Source rendering failed
    #[error("render failed: {0}")]
    Render(#[from] serde_json::Error),

    /// Another generation for the same target path is in flight
    /// (overlap policy `Reject`)
    #[error("generation already in flight for {0}")]
    PathInFlight(TargetPath),
}

impl GenerationError {
    /// Whether the caller may retry the whole generation
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Persistence(_) | Self::PathInFlight(_)
        )
    }
}
