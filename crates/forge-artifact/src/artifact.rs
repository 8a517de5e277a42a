//! Generated artifacts
//!
//! An [`Artifact`] is the output of generation: source text plus metadata,
//! identified by its target path. It is immutable once published; the
//! content hash is fixed at construction and lets loaders verify that the
//! bytes they resolve are the bytes that were generated.

use crate::hash::ContentHash;
use crate::kind::ArtifactKind;
use crate::path::TargetPath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A generated source unit plus metadata
///
/// # Invariants
/// - `content_hash` is always the hash of `source_text`
/// - Immutable after construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    target_path: TargetPath,
    kind: ArtifactKind,
    source_text: String,
    generated_at: DateTime<Utc>,
    persisted: bool,
    content_hash: ContentHash,
}

impl Artifact {
    /// Create a new artifact, stamping the generation time and content hash
    #[must_use]
    pub fn new(
        target_path: TargetPath,
        kind: ArtifactKind,
        source_text: String,
        persisted: bool,
    ) -> Self {
        let content_hash = ContentHash::compute(source_text.as_bytes());
        Self {
            target_path,
            kind,
            source_text,
            generated_at: Utc::now(),
            persisted,
            content_hash,
        }
    }

    /// Logical identity of the artifact
    #[inline]
    #[must_use]
    pub fn target_path(&self) -> &TargetPath {
        &self.target_path
    }

    /// Artifact kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Generated source text
    #[inline]
    #[must_use]
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// When the artifact was generated
    #[inline]
    #[must_use]
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Whether the durable write succeeded before publication
    #[inline]
    #[must_use]
    pub fn persisted(&self) -> bool {
        self.persisted
    }

    /// Content hash of the source text
    #[inline]
    #[must_use]
    pub fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    /// Verify integrity (useful after deserialization)
    #[inline]
    #[must_use]
    pub fn verify(&self) -> bool {
        self.content_hash == ContentHash::compute(self.source_text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Artifact {
        Artifact::new(
            "/gen/strUtils".parse().unwrap(),
            ArtifactKind::Module,
            "{ \"name\": \"strUtils\" }".to_string(),
            false,
        )
    }

    #[test]
    fn artifact_hash_matches_source() {
        let artifact = sample();
        assert_eq!(
            artifact.content_hash(),
            &ContentHash::compute(artifact.source_text().as_bytes())
        );
        assert!(artifact.verify());
    }

    #[test]
    fn artifact_clone_preserves_hash() {
        let artifact = sample();
        let cloned = artifact.clone();
        assert_eq!(artifact.content_hash(), cloned.content_hash());
    }

    #[test]
    fn artifact_serde_round_trip() {
        let artifact = sample();
        let json = serde_json::to_string(&artifact).unwrap();
        let back: Artifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, artifact);
        assert!(back.verify());
    }

    #[test]
    fn tampered_artifact_fails_verify() {
        let artifact = sample();
        let mut json = serde_json::to_string(&artifact).unwrap();
        json = json.replace("strUtils", "strutils");
        let tampered: Artifact = serde_json::from_str(&json).unwrap();
        assert!(!tampered.verify());
    }
}
