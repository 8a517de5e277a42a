//! Loaded handles and integration records
//!
//! A [`LoadedHandle`] is the opaque, introspectable reference to loaded
//! code produced by the integration service's loaders. One
//! [`IntegrationRecord`] exists per successfully integrated artifact and
//! lives in the module registry until replaced or unloaded.

use crate::hash::ContentHash;
use crate::kind::{ArtifactKind, HttpMethod};
use crate::manifest::UnitManifest;
use crate::path::TargetPath;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use ulid::Ulid;

/// Unique identifier of a loaded handle (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandleId(pub Ulid);

impl HandleId {
    /// Generate a new handle ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to loaded code
///
/// Cheap to clone; the backing manifest is shared. Callers introspect via
/// [`exports`](LoadedHandle::exports) and
/// [`route_binding`](LoadedHandle::route_binding) but cannot mutate the
/// loaded unit.
#[derive(Debug, Clone)]
pub struct LoadedHandle {
    id: HandleId,
    kind: ArtifactKind,
    manifest: Arc<UnitManifest>,
}

impl LoadedHandle {
    /// Wrap a parsed manifest into a handle with a fresh ID
    #[must_use]
    pub fn new(manifest: UnitManifest) -> Self {
        Self {
            id: HandleId::new(),
            kind: manifest.kind(),
            manifest: Arc::new(manifest),
        }
    }

    /// Handle identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Kind of the loaded unit
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Name the unit registers under
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    /// The backing manifest
    #[inline]
    #[must_use]
    pub fn manifest(&self) -> &UnitManifest {
        &self.manifest
    }

    /// Names the unit exports (operations or capabilities)
    #[inline]
    #[must_use]
    pub fn exports(&self) -> &[String] {
        self.manifest.exports()
    }

    /// Endpoint binding for api handles
    #[inline]
    #[must_use]
    pub fn route_binding(&self) -> Option<(HttpMethod, &str)> {
        self.manifest.route_binding()
    }
}

/// Registry entry for a currently-integrated artifact
#[derive(Debug, Clone)]
pub struct IntegrationRecord {
    /// Logical identity, matches the artifact
    pub target_path: TargetPath,
    /// Kind of the integrated artifact
    pub kind: ArtifactKind,
    /// When integration completed
    pub integrated_at: DateTime<Utc>,
    /// Opaque reference to the loaded code
    pub handle: LoadedHandle,
    /// Content hash of the integrated source
    pub content_hash: ContentHash,
}

impl IntegrationRecord {
    /// Create a record for a freshly loaded handle, stamping the time
    #[must_use]
    pub fn new(target_path: TargetPath, handle: LoadedHandle, content_hash: ContentHash) -> Self {
        Self {
            kind: handle.kind(),
            target_path,
            integrated_at: Utc::now(),
            handle,
            content_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestBody;

    fn module_manifest() -> UnitManifest {
        UnitManifest::new(
            "/gen/strUtils".parse().unwrap(),
            "string helpers",
            ManifestBody::Module {
                operations: vec!["camelCase".into(), "snakeCase".into()],
            },
        )
    }

    #[test]
    fn handle_ids_are_unique() {
        let h1 = LoadedHandle::new(module_manifest());
        let h2 = LoadedHandle::new(module_manifest());
        assert_ne!(h1.id(), h2.id());
    }

    #[test]
    fn handle_introspection() {
        let handle = LoadedHandle::new(module_manifest());
        assert_eq!(handle.kind(), ArtifactKind::Module);
        assert_eq!(handle.name(), "strUtils");
        assert_eq!(handle.exports(), ["camelCase", "snakeCase"]);
        assert!(handle.route_binding().is_none());
    }

    #[test]
    fn api_handle_exposes_route_binding() {
        let manifest = UnitManifest::new(
            "/gen/statusEndpoint".parse().unwrap(),
            "",
            ManifestBody::Api {
                method: HttpMethod::Get,
                route: "/api/system/status".into(),
            },
        );
        let handle = LoadedHandle::new(manifest);
        let (method, route) = handle.route_binding().unwrap();
        assert_eq!(method, HttpMethod::Get);
        assert_eq!(route, "/api/system/status");
    }

    #[test]
    fn record_inherits_handle_kind() {
        let handle = LoadedHandle::new(module_manifest());
        let hash = ContentHash::compute(b"source");
        let record =
            IntegrationRecord::new("/gen/strUtils".parse().unwrap(), handle, hash);
        assert_eq!(record.kind, ArtifactKind::Module);
        assert_eq!(record.content_hash, hash);
    }
}
