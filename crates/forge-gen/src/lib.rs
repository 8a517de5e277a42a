//! Forge Artifact Generator
//!
//! Accepts [`GenerationRequest`](forge_artifact::GenerationRequest)s,
//! renders source text, optionally persists it, and publishes
//! `code:generated` events on the shared channel.
//!
//! # Ordering guarantee
//!
//! When a request asks for persistence the durable write is acknowledged
//! before the event goes out; subscribers that immediately load from
//! storage see consistent content.
//!
//! # Overlap
//!
//! Requests for the same target path are serialized. By default a second
//! in-flight request is rejected ([`OverlapPolicy::Reject`]);
//! [`OverlapPolicy::Queue`] queues it instead.

#![warn(unreachable_pub)]

mod config;
mod error;
mod generator;
pub mod render;

pub use config::{GeneratorConfig, OverlapPolicy};
pub use error::GenerationError;
pub use generator::ArtifactGenerator;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
