//! Event channel errors

use crate::event::Topic;

/// Errors from channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Topic is at its configured subscriber capacity
    #[error("subscriber limit reached for topic {topic} (max: {max})")]
    SubscriberLimit {
        /// Topic that is full
        topic: Topic,
        /// Configured per-topic maximum
        max: usize,
    },
}
