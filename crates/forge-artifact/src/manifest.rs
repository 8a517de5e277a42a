//! Unit manifests: the parseable form of generated source
//!
//! Generated source text is a JSON unit manifest. Loading an artifact means
//! parsing its source into a [`UnitManifest`] and validating it against the
//! artifact's metadata; the manifest then backs the invocable handle.

use crate::kind::{ArtifactKind, HttpMethod};
use crate::path::TargetPath;
use crate::request::RequestPayload;
use serde::{Deserialize, Serialize};

/// Kind-specific body of a unit manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ManifestBody {
    /// Module body: the operations the unit exports
    Module {
        /// Exported operation names
        operations: Vec<String>,
    },
    /// Api body: the endpoint binding
    Api {
        /// HTTP method of the endpoint
        method: HttpMethod,
        /// Route path
        route: String,
    },
    /// Behavioral unit body: the capability set
    BehavioralUnit {
        /// Capability names
        capabilities: Vec<String>,
    },
}

impl ManifestBody {
    /// Artifact kind implied by this body
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        match self {
            ManifestBody::Module { .. } => ArtifactKind::Module,
            ManifestBody::Api { .. } => ArtifactKind::Api,
            ManifestBody::BehavioralUnit { .. } => ArtifactKind::BehavioralUnit,
        }
    }
}

impl From<&RequestPayload> for ManifestBody {
    fn from(payload: &RequestPayload) -> Self {
        match payload {
            RequestPayload::Module { exposed_operations } => ManifestBody::Module {
                operations: exposed_operations.clone(),
            },
            RequestPayload::Api { method, route } => ManifestBody::Api {
                method: *method,
                route: route.clone(),
            },
            RequestPayload::BehavioralUnit { capabilities } => ManifestBody::BehavioralUnit {
                capabilities: capabilities.clone(),
            },
        }
    }
}

/// Parsed form of a generated unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitManifest {
    /// Unit name, derived from the target path's last segment
    pub name: String,
    /// Target path the unit was generated for
    pub target_path: TargetPath,
    /// Human-readable description
    pub description: String,
    /// Kind-specific body
    pub body: ManifestBody,
}

impl UnitManifest {
    /// Build a manifest for a target path
    #[must_use]
    pub fn new(target_path: TargetPath, description: impl Into<String>, body: ManifestBody) -> Self {
        Self {
            name: target_path.name().to_string(),
            target_path,
            description: description.into(),
            body,
        }
    }

    /// Artifact kind implied by the body
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        self.body.kind()
    }

    /// Names the unit exports: operations for modules, capabilities for
    /// behavioral units, empty for api units
    #[must_use]
    pub fn exports(&self) -> &[String] {
        match &self.body {
            ManifestBody::Module { operations } => operations,
            ManifestBody::BehavioralUnit { capabilities } => capabilities,
            ManifestBody::Api { .. } => &[],
        }
    }

    /// Endpoint binding for api units
    #[must_use]
    pub fn route_binding(&self) -> Option<(HttpMethod, &str)> {
        match &self.body {
            ManifestBody::Api { method, route } => Some((*method, route.as_str())),
            _ => None,
        }
    }
}
