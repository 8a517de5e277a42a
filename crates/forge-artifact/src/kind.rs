//! Artifact kinds and the HTTP method vocabulary
//!
//! [`ArtifactKind`] decides which integration target an artifact is wired
//! into; [`HttpMethod`] is the method vocabulary for api-kind artifacts.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Kind of a generated artifact
///
/// The kind is fixed at request time and travels with the artifact through
/// generation, loading, and registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// A library-style unit exposing named operations
    Module,
    /// An HTTP endpoint bound to a method and route
    Api,
    /// A unit declaring a capability set
    BehavioralUnit,
}

impl ArtifactKind {
    /// Canonical kebab-case name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Module => "module",
            ArtifactKind::Api => "api",
            ArtifactKind::BehavioralUnit => "behavioral-unit",
        }
    }
}

impl Display for ArtifactKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = KindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "module" => Ok(ArtifactKind::Module),
            "api" => Ok(ArtifactKind::Api),
            "behavioral-unit" => Ok(ArtifactKind::BehavioralUnit),
            other => Err(KindError::Unknown(other.to_string())),
        }
    }
}

/// HTTP method for api-kind artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    /// Canonical uppercase name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = KindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            other => Err(KindError::UnknownMethod(other.to_string())),
        }
    }
}

/// Errors from kind/method parsing
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KindError {
    /// Not one of the enumerated artifact kinds
    #[error("unknown artifact kind: {0:?}")]
    Unknown(String),

    /// Not a supported HTTP method
    #[error("unknown http method: {0:?}")]
    UnknownMethod(String),
}
