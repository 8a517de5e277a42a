//! Forge Auto-Integration Service
//!
//! Consumes `code:generated` events, loads each artifact at runtime,
//! classifies its integration target, performs the registration side
//! effect, and tracks the canonical list of currently-loaded artifacts.
//!
//! # Stage machine
//!
//! `received → loading → classifying → registering → completed`, with a
//! terminal `failed` reachable from the three active stages. Failures are
//! caught at the service boundary and published as `integration:failed`
//! events; they never crash the host.
//!
//! # Targets
//!
//! - module → [`ModuleTable`] (generic registry)
//! - api → [`RouteTable`] (HTTP route table)
//! - behavioral-unit → [`CapabilityIndex`]
//!
//! The [`ModuleRegistry`] holds one [`IntegrationRecord`](forge_artifact::IntegrationRecord)
//! per integrated artifact; re-integration of a target path replaces its
//! record atomically.

#![warn(unreachable_pub)]

mod config;
mod error;
mod loader;
mod registry;
mod service;
mod targets;

pub use config::IntegrationConfig;
pub use error::{ClassificationError, IntegrationError, LoadError, RegistrationError};
pub use loader::{
    ApiLoader, ArtifactLoader, BehavioralUnitLoader, LoaderRegistry, ModuleLoader,
};
pub use registry::{FailureEntry, FailureLog, ModuleRegistry};
pub use service::{classify, AutoIntegrationService, IntegrationTarget};
pub use targets::{
    CapabilityEntry, CapabilityIndex, ModuleEntry, ModuleTable, RouteBinding, RouteTable,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
