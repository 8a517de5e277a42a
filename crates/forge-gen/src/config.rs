//! Generator configuration

use std::path::PathBuf;
use std::time::Duration;

/// Resolution of concurrent requests sharing one target path
///
/// Two in-flight generations must never race to publish under the same
/// identity; the policy decides what happens to the second caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Reject the second request with
    /// [`GenerationError::PathInFlight`](crate::GenerationError::PathInFlight).
    /// This is the default.
    #[default]
    Reject,
    /// Queue the second request behind the first and run it afterwards
    Queue,
}

/// Generator configuration
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Root directory for persisted artifact sources
    pub root_dir: PathBuf,
    /// What to do with overlapping requests for one target path
    pub overlap: OverlapPolicy,
    /// Bound on each durable write; `None` disables the bound
    pub write_timeout: Option<Duration>,
}

impl GeneratorConfig {
    /// Create configuration with a persistence root and defaults otherwise
    #[must_use]
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            overlap: OverlapPolicy::default(),
            write_timeout: Some(Duration::from_secs(10)),
        }
    }

    /// With overlap policy
    #[inline]
    #[must_use]
    pub fn with_overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    /// With durable-write timeout
    #[inline]
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }
}
