//! The event channel
//!
//! An explicitly constructed publish/subscribe object, passed by `Arc`
//! reference. Delivery is synchronous-in-order: `publish` awaits every
//! subscriber of the topic, in subscription order, before returning.
//! There is no buffering and no replay; subscribers present at publish
//! time are the only ones that see the event.

use crate::error::ChannelError;
use crate::event::{PipelineEvent, Topic};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use ulid::Ulid;

/// Handle returned by [`EventChannel::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Ulid);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Handler = Arc<dyn Fn(PipelineEvent) -> BoxFuture<'static, ()> + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    handler: Handler,
}

/// Channel configuration
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Maximum subscribers per topic; exceeding it fails the subscribe
    /// call loudly instead of silently dropping
    pub max_subscribers_per_topic: usize,
}

impl ChannelConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With maximum subscribers per topic
    #[inline]
    #[must_use]
    pub fn with_max_subscribers(mut self, max: usize) -> Self {
        self.max_subscribers_per_topic = max;
        self
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_subscribers_per_topic: 64,
        }
    }
}

tokio::task_local! {
    // Present while the current task is inside a delivery; nested
    // publishes from handlers join the active propagation instead of
    // re-acquiring the delivery lock.
    static IN_DELIVERY: ();
}

/// Process-wide publish/subscribe bus for pipeline events
///
/// # Ordering
/// One event propagation runs at a time: handlers of an event run to
/// completion before the next queued publish is dispatched, so two
/// `code:generated` events for different target paths are integrated in
/// publish order, never interleaved at the sub-step level. Handlers may
/// publish further events; those are delivered inline as part of the same
/// propagation.
pub struct EventChannel {
    config: ChannelConfig,
    topics: Mutex<HashMap<Topic, Vec<Subscription>>>,
    delivery: tokio::sync::Mutex<()>,
}

impl EventChannel {
    /// Create a channel with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ChannelConfig::default())
    }

    /// Create a channel with custom configuration
    #[must_use]
    pub fn with_config(config: ChannelConfig) -> Self {
        Self {
            config,
            topics: Mutex::new(HashMap::new()),
            delivery: tokio::sync::Mutex::new(()),
        }
    }

    /// Subscribe an async handler to a topic
    ///
    /// Handlers run in subscription order at each publish.
    ///
    /// # Errors
    /// Returns [`ChannelError::SubscriberLimit`] when the topic already
    /// has the configured maximum of subscribers.
    pub fn subscribe<F, Fut>(&self, topic: Topic, handler: F) -> Result<SubscriptionId, ChannelError>
    where
        F: Fn(PipelineEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut topics = self.topics.lock();
        let subscriptions = topics.entry(topic).or_default();
        if subscriptions.len() >= self.config.max_subscribers_per_topic {
            return Err(ChannelError::SubscriberLimit {
                topic,
                max: self.config.max_subscribers_per_topic,
            });
        }

        let id = SubscriptionId(Ulid::new());
        let handler: Handler = Arc::new(move |event| Box::pin(handler(event)));
        subscriptions.push(Subscription { id, handler });
        tracing::debug!(%topic, subscription = %id, "subscribed");
        Ok(id)
    }

    /// Remove a subscription; returns whether it existed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut topics = self.topics.lock();
        for subscriptions in topics.values_mut() {
            if let Some(idx) = subscriptions.iter().position(|s| s.id == id) {
                subscriptions.remove(idx);
                tracing::debug!(subscription = %id, "unsubscribed");
                return true;
            }
        }
        false
    }

    /// Current subscriber count for a topic
    #[must_use]
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topics.lock().get(&topic).map_or(0, Vec::len)
    }

    /// Publish an event to all current subscribers of its topic
    ///
    /// Delivers in subscription order, awaiting each handler before the
    /// next, and returns the number of handlers that ran. At-most-once:
    /// late subscribers miss the event.
    pub async fn publish(&self, event: PipelineEvent) -> usize {
        if IN_DELIVERY.try_with(|_| ()).is_ok() {
            // Already inside a propagation on this task; deliver inline.
            return self.dispatch(event).await;
        }
        let _serial = self.delivery.lock().await;
        IN_DELIVERY.scope((), self.dispatch(event)).await
    }

    async fn dispatch(&self, event: PipelineEvent) -> usize {
        let topic = event.topic();
        // Snapshot so handlers can subscribe/unsubscribe/publish without
        // holding the registry lock across awaits.
        let handlers: Vec<Handler> = {
            let topics = self.topics.lock();
            topics
                .get(&topic)
                .map(|subs| subs.iter().map(|s| Arc::clone(&s.handler)).collect())
                .unwrap_or_default()
        };
        tracing::debug!(%topic, subscribers = handlers.len(), "publishing");
        let delivered = handlers.len();
        for handler in handlers {
            handler(event.clone()).await;
        }
        delivered
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}
