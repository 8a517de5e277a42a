//! Forge Artifact Data Model
//!
//! Shared vocabulary of the generation-to-integration pipeline.
//!
//! # Core Concepts
//!
//! - [`TargetPath`]: logical identity of a request / artifact / record
//! - [`GenerationRequest`]: immutable input with a kind-specific payload
//! - [`Artifact`]: generated source text plus metadata, content-addressed
//! - [`UnitManifest`]: the parseable form generated source takes
//! - [`LoadedHandle`] / [`IntegrationRecord`]: what integration produces
//! - [`IntegrationStage`]: the per-artifact lifecycle state machine
//! - [`ArtifactStore`]: durable storage keyed by target path

#![warn(unreachable_pub)]

mod artifact;
mod hash;
mod kind;
mod manifest;
mod path;
mod record;
mod request;
pub mod stage;
mod store;

pub use artifact::Artifact;
pub use hash::{ContentHash, HashError};
pub use kind::{ArtifactKind, HttpMethod, KindError};
pub use manifest::{ManifestBody, UnitManifest};
pub use path::{PathError, TargetPath};
pub use record::{HandleId, IntegrationRecord, LoadedHandle};
pub use request::{GenerationRequest, RequestPayload, ValidationError};
pub use stage::{IntegrationErrorKind, IntegrationStage, StageError};
pub use store::{ArtifactStore, PersistenceError, SOURCE_EXTENSION};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
