//! Durable artifact storage
//!
//! [`ArtifactStore`] maps target paths onto a filesystem root and performs
//! the async reads and writes. The generator writes through it before
//! publishing; loaders read through it when an artifact is persisted.

use crate::path::TargetPath;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File extension of persisted unit sources
pub const SOURCE_EXTENSION: &str = "unit.json";

/// Filesystem-backed artifact storage rooted at one directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `root`; the directory is created lazily on
    /// first write
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Storage location derived from a target path
    ///
    /// `/gen/strUtils` maps to `<root>/gen/strUtils.unit.json`. Target path
    /// validation guarantees segments are traversal-free.
    #[must_use]
    pub fn location_of(&self, target: &TargetPath) -> PathBuf {
        let mut path = self.root.clone();
        let segments = target.segments();
        for segment in &segments[..segments.len() - 1] {
            path.push(segment);
        }
        path.push(format!("{}.{SOURCE_EXTENSION}", target.name()));
        path
    }

    /// Write source text for a target, creating parent directories
    ///
    /// Returns the storage location on success. The returned future
    /// resolves only after the write is acknowledged by the OS, which is
    /// what the publish-after-persist ordering of the generator relies on.
    ///
    /// # Errors
    /// Returns [`PersistenceError::Io`] on any filesystem failure.
    pub async fn write(
        &self,
        target: &TargetPath,
        source: &str,
    ) -> Result<PathBuf, PersistenceError> {
        let location = self.location_of(target);
        if let Some(parent) = location.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PersistenceError::Io {
                    location: parent.to_path_buf(),
                    source: e,
                })?;
        }
        fs::write(&location, source.as_bytes())
            .await
            .map_err(|e| PersistenceError::Io {
                location: location.clone(),
                source: e,
            })?;
        tracing::debug!(target = %target, location = %location.display(), "artifact persisted");
        Ok(location)
    }

    /// Read source text for a target
    ///
    /// # Errors
    /// Returns the underlying I/O error; callers decide whether a missing
    /// file is retryable (publish/persist race) or fatal.
    pub async fn read(&self, target: &TargetPath) -> Result<String, std::io::Error> {
        fs::read_to_string(self.location_of(target)).await
    }

    /// Remove a persisted source, ignoring files that are already gone
    ///
    /// # Errors
    /// Returns [`PersistenceError::Io`] on filesystem failures other than
    /// `NotFound`.
    pub async fn remove(&self, target: &TargetPath) -> Result<(), PersistenceError> {
        let location = self.location_of(target);
        match fs::remove_file(&location).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistenceError::Io { location, source }),
        }
    }
}

/// Durable-write failure: an environment fault, safe for the caller to
/// retry the whole generation
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Filesystem operation failed
    #[error("persistence failed at {location}: {source}")]
    Io {
        /// The path being written or removed
        location: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Durable write exceeded the configured timeout
    #[error("persistence timed out after {elapsed_ms}ms at {location}")]
    Timeout {
        /// The path being written
        location: PathBuf,
        /// Configured timeout that elapsed
        elapsed_ms: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> TargetPath {
        s.parse().unwrap()
    }

    #[test]
    fn location_nests_segments_under_root() {
        let store = ArtifactStore::new("/srv/artifacts");
        let location = store.location_of(&path("/gen/strUtils"));
        assert_eq!(
            location,
            PathBuf::from("/srv/artifacts/gen/strUtils.unit.json")
        );
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let target = path("/gen/mathUtils");

        let location = store.write(&target, "{\"name\":\"mathUtils\"}").await.unwrap();
        assert!(location.exists());

        let text = store.read(&target).await.unwrap();
        assert_eq!(text, "{\"name\":\"mathUtils\"}");
    }

    #[tokio::test]
    async fn read_missing_target_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let err = store.read(&path("/gen/ghost")).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let target = path("/gen/tmp");

        store.write(&target, "x").await.unwrap();
        store.remove(&target).await.unwrap();
        // Second remove of a missing file succeeds.
        store.remove(&target).await.unwrap();
    }
}
