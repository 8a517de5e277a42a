//! Target paths: the logical identity of a generation request / artifact
//!
//! Provides [`TargetPath`], a slash-separated hierarchical identity such as
//! `/gen/strUtils`. A request, the artifact generated from it, and the
//! integration record tracking it all share one target path.

use serde::de::Error as _;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Logical identity of an artifact
///
/// Canonical form is a leading slash followed by slash-separated segments
/// (`/gen/strUtils`). Segments are validated at parse time: no empty
/// segments, no whitespace, no `.`/`..` path tricks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetPath(Vec<String>);

impl TargetPath {
    /// Create a path from pre-validated segments
    ///
    /// # Errors
    /// Returns error if any segment is invalid or the list is empty
    pub fn new(segments: Vec<String>) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self(segments))
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: an empty target path is unconstructible
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Last segment: the unit name an artifact registers under
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        // Invariant: segments are non-empty after construction.
        self.0.last().map(String::as_str).unwrap_or_default()
    }
}

fn validate_segment(segment: &str) -> Result<(), PathError> {
    if segment.is_empty() {
        return Err(PathError::EmptySegment);
    }
    if segment == "." || segment == ".." {
        return Err(PathError::InvalidSegment(segment.to_string()));
    }
    if segment.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(PathError::InvalidSegment(segment.to_string()));
    }
    Ok(())
}

impl Display for TargetPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for TargetPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix('/').unwrap_or(s);
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }
        let segments = trimmed.split('/').map(str::to_string).collect();
        Self::new(segments)
    }
}

impl serde::Serialize for TargetPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for TargetPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

/// Errors from target path construction
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathError {
    /// Path has no segments
    #[error("target path is empty")]
    Empty,

    /// A segment between slashes is empty
    #[error("target path contains an empty segment")]
    EmptySegment,

    /// Segment contains whitespace or reserved characters
    #[error("invalid target path segment: {0:?}")]
    InvalidSegment(String),
}
