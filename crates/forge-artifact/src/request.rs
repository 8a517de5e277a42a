//! Generation requests and their validation
//!
//! A [`GenerationRequest`] is the immutable input to the artifact generator:
//! a target path, a free-form purpose tag, and a kind-specific payload.
//! Validation failures are caller bugs ([`ValidationError`]) and are never
//! retried.

use crate::kind::{ArtifactKind, HttpMethod};
use crate::path::TargetPath;
use serde::{Deserialize, Serialize};

/// Kind-specific payload of a generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RequestPayload {
    /// Library-style module exposing named operations
    Module {
        /// Operations the generated module must export
        exposed_operations: Vec<String>,
    },
    /// HTTP endpoint bound to a method and route
    Api {
        /// HTTP method of the endpoint
        method: HttpMethod,
        /// Route path, must start with `/`
        route: String,
    },
    /// Unit declaring a capability set
    BehavioralUnit {
        /// Capability names the unit provides
        capabilities: Vec<String>,
    },
}

impl RequestPayload {
    /// Artifact kind implied by this payload
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        match self {
            RequestPayload::Module { .. } => ArtifactKind::Module,
            RequestPayload::Api { .. } => ArtifactKind::Api,
            RequestPayload::BehavioralUnit { .. } => ArtifactKind::BehavioralUnit,
        }
    }
}

/// Immutable input to the artifact generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Free-form tag describing why the artifact is being generated
    pub purpose: String,
    /// Logical identity of the artifact; unique per in-flight request
    pub target_path: TargetPath,
    /// Human-readable description carried into the generated unit
    pub description: String,
    /// Whether the generated source is written to durable storage
    pub persist: bool,
    /// Kind-specific payload
    pub payload: RequestPayload,
}

impl GenerationRequest {
    /// Create a new request; `persist` defaults to false
    #[must_use]
    pub fn new(
        purpose: impl Into<String>,
        target_path: TargetPath,
        description: impl Into<String>,
        payload: RequestPayload,
    ) -> Self {
        Self {
            purpose: purpose.into(),
            target_path,
            description: description.into(),
            persist: false,
            payload,
        }
    }

    /// Request durable persistence of the generated source
    #[inline]
    #[must_use]
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Artifact kind implied by the payload
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        self.payload.kind()
    }

    /// Check that the kind-specific payload is complete
    ///
    /// # Errors
    /// Returns [`ValidationError`] when the payload is incomplete:
    /// a module without operations, an api without a well-formed route,
    /// or a behavioral unit without capabilities.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.payload {
            RequestPayload::Module { exposed_operations } => {
                if exposed_operations.is_empty() {
                    return Err(ValidationError::NoOperations {
                        target_path: self.target_path.clone(),
                    });
                }
                validate_names(exposed_operations)
            }
            RequestPayload::Api { route, .. } => validate_route(route),
            RequestPayload::BehavioralUnit { capabilities } => {
                if capabilities.is_empty() {
                    return Err(ValidationError::NoCapabilities {
                        target_path: self.target_path.clone(),
                    });
                }
                validate_names(capabilities)
            }
        }
    }
}

fn validate_names(names: &[String]) -> Result<(), ValidationError> {
    match names.iter().find(|n| n.trim().is_empty()) {
        Some(_) => Err(ValidationError::BlankName),
        None => Ok(()),
    }
}

fn validate_route(route: &str) -> Result<(), ValidationError> {
    if route.is_empty() {
        return Err(ValidationError::MissingRoute);
    }
    if !route.starts_with('/') || route.chars().any(char::is_whitespace) {
        return Err(ValidationError::MalformedRoute {
            route: route.to_string(),
        });
    }
    Ok(())
}

/// Request-shape errors: caller fault, surfaced immediately, never retried
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Module request exposes no operations
    #[error("module request exposes no operations: {target_path}")]
    NoOperations {
        /// Offending request's target path
        target_path: TargetPath,
    },

    /// Api request has an empty route
    #[error("api request is missing a route")]
    MissingRoute,

    /// Api route does not start with `/` or contains whitespace
    #[error("malformed api route: {route:?}")]
    MalformedRoute {
        /// The rejected route
        route: String,
    },

    /// Behavioral unit declares no capabilities
    #[error("behavioral unit declares no capabilities: {target_path}")]
    NoCapabilities {
        /// Offending request's target path
        target_path: TargetPath,
    },

    /// An operation or capability name is blank
    #[error("blank operation or capability name")]
    BlankName,
}
