//! Forge Event Channel
//!
//! Process-wide publish/subscribe for the generation-to-integration
//! pipeline. The channel is an explicitly constructed object passed by
//! `Arc` reference, never an ambient singleton, so lifecycle and test
//! isolation stay controllable.
//!
//! # Guarantees
//!
//! - Synchronous-in-order delivery: `publish` awaits every subscriber of
//!   the topic, in subscription order, before returning
//! - One propagation at a time: nested publishes from handlers join the
//!   active propagation; concurrent publishers are serialized
//! - At-most-once: no buffering, no replay, late subscribers miss events
//! - Bounded subscriber lists: exceeding the per-topic maximum fails
//!   loudly

#![warn(unreachable_pub)]

mod channel;
mod error;
mod event;

pub use channel::{ChannelConfig, EventChannel, SubscriptionId};
pub use error::ChannelError;
pub use event::{PipelineEvent, Topic};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
