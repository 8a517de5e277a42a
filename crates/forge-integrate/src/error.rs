//! Integration error taxonomy
//!
//! Every failure carries enough structure for the `integration:failed`
//! event: which stage it belongs to and a coarse kind. Load failures may
//! be transient (publish/persist race); classification and registration
//! failures are fatal for the artifact.

use forge_artifact::{
    ArtifactKind, ContentHash, HttpMethod, IntegrationErrorKind, IntegrationStage, TargetPath,
};
use std::path::PathBuf;

/// Failure to obtain an executable handle for an artifact
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Source not visible at the expected storage location; possibly a
    /// persistence/publish race, worth a bounded retry
    #[error("artifact source unresolved at {location}: {source}")]
    Unresolved {
        /// Expected storage location
        location: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Source text failed to parse as a unit manifest
    #[error("artifact source failed to parse: {0}")]
    Parse(#[from] serde_json::Error),

    /// On-disk bytes do not hash to the artifact's content hash
    #[error("content hash mismatch: expected {expected}, got {actual}")]
    IntegrityMismatch {
        /// Hash recorded on the artifact
        expected: ContentHash,
        /// Hash of the resolved bytes
        actual: ContentHash,
    },

    /// Manifest declares a different kind than the artifact
    #[error("manifest kind {manifest} does not match artifact kind {artifact}")]
    KindMismatch {
        /// Kind in the parsed manifest
        manifest: ArtifactKind,
        /// Kind on the artifact
        artifact: ArtifactKind,
    },

    /// Manifest declares a different target path than the artifact
    #[error("manifest target {manifest} does not match artifact target {artifact}")]
    TargetMismatch {
        /// Target in the parsed manifest
        manifest: TargetPath,
        /// Target on the artifact
        artifact: TargetPath,
    },

    /// Manifest parsed but violates a kind-specific invariant
    #[error("invalid unit: {0}")]
    InvalidUnit(String),

    /// Load attempt exceeded the configured timeout
    #[error("load timed out after {elapsed_ms}ms")]
    Timeout {
        /// Configured timeout that elapsed
        elapsed_ms: u64,
    },
}

impl LoadError {
    /// Whether a bounded retry is worthwhile
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unresolved { .. })
    }
}

/// No integration target exists for an artifact kind
///
/// This is a programming/configuration defect (a dispatch table missing an
/// entry) and is never retried.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    /// The dispatch table has no loader for the kind
    #[error("no loader registered for artifact kind {0}")]
    NoLoader(ArtifactKind),
}

/// Target subsystem rejected a registration
///
/// Fatal for the artifact being integrated; other artifacts are
/// unaffected.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// Route is malformed
    #[error("invalid route {route:?}: {reason}")]
    InvalidRoute {
        /// The rejected route
        route: String,
        /// Why it was rejected
        reason: String,
    },

    /// Route is already bound by a different target path
    #[error("route {method} {route} already bound by {existing}")]
    RouteConflict {
        /// Method of the conflicting binding
        method: HttpMethod,
        /// Route of the conflicting binding
        route: String,
        /// Target path holding the existing binding
        existing: TargetPath,
    },

    /// Unit exports nothing to register
    #[error("unit {name:?} exports nothing to register")]
    EmptyExports {
        /// Name of the offending unit
        name: String,
    },
}

/// Any failure during integration of one artifact
///
/// Caught at the service boundary and turned into an `integration:failed`
/// event; never allowed to crash the integrating process.
#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    /// Loading failed
    #[error("load failed: {0}")]
    Load(#[from] LoadError),

    /// Classification failed
    #[error("classification failed: {0}")]
    Classification(#[from] ClassificationError),

    /// Registration failed
    #[error("registration failed: {0}")]
    Registration(#[from] RegistrationError),
}

impl IntegrationError {
    /// Coarse kind as carried in failure events
    #[inline]
    #[must_use]
    pub fn error_kind(&self) -> IntegrationErrorKind {
        match self {
            Self::Load(_) => IntegrationErrorKind::Load,
            Self::Classification(_) => IntegrationErrorKind::Classification,
            Self::Registration(_) => IntegrationErrorKind::Registration,
        }
    }

    /// Stage in which this failure arises
    #[inline]
    #[must_use]
    pub fn stage(&self) -> IntegrationStage {
        self.error_kind().stage()
    }
}
