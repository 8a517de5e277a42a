//! The module registry and the failure log
//!
//! The registry is the authoritative record of what is currently loaded.
//! Reads hand out snapshots, never live references, and never wait on an
//! in-flight integration. The failure log is the optional retained view
//! of failed attempts; the event stream remains the primary surface.

use chrono::{DateTime, Utc};
use forge_artifact::{IntegrationErrorKind, IntegrationRecord, IntegrationStage, TargetPath};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};

/// Authoritative map of currently-integrated artifacts
///
/// # Invariant
/// At most one record per target path; [`insert`](ModuleRegistry::insert)
/// replaces atomically.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    inner: RwLock<HashMap<TargetPath, IntegrationRecord>>,
}

impl ModuleRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the replaced prior record if any
    pub fn insert(&self, record: IntegrationRecord) -> Option<IntegrationRecord> {
        self.inner
            .write()
            .insert(record.target_path.clone(), record)
    }

    /// Remove the record of a target path
    pub fn remove(&self, target: &TargetPath) -> Option<IntegrationRecord> {
        self.inner.write().remove(target)
    }

    /// Look up a record by target path
    #[must_use]
    pub fn get(&self, target: &TargetPath) -> Option<IntegrationRecord> {
        self.inner.read().get(target).cloned()
    }

    /// Snapshot of all records, ordered by target path
    ///
    /// A copy: callers cannot mutate the registry through it.
    #[must_use]
    pub fn snapshot(&self) -> Vec<IntegrationRecord> {
        let mut records: Vec<_> = self.inner.read().values().cloned().collect();
        records.sort_by(|a, b| a.target_path.cmp(&b.target_path));
        records
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// One retained integration failure
#[derive(Debug, Clone)]
pub struct FailureEntry {
    /// Identity of the failed artifact
    pub target_path: TargetPath,
    /// Stage in which the failure occurred
    pub stage: IntegrationStage,
    /// Coarse error classification
    pub error_kind: IntegrationErrorKind,
    /// Rendered error message
    pub message: String,
    /// When the failure was recorded
    pub failed_at: DateTime<Utc>,
}

/// Bounded, newest-last log of integration failures
#[derive(Debug)]
pub struct FailureLog {
    entries: Mutex<VecDeque<FailureEntry>>,
    capacity: usize,
}

impl FailureLog {
    /// Create a log retaining at most `capacity` entries
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest beyond capacity
    pub fn push(&self, entry: FailureEntry) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Snapshot of retained entries, oldest first
    #[must_use]
    pub fn entries(&self) -> Vec<FailureEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Number of retained entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
