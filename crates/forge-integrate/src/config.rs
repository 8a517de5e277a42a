//! Integration service configuration

use std::time::Duration;

/// Auto-integration service configuration
#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    /// Retries after an unresolved-source load failure (persistence race)
    pub load_retries: u32,
    /// Delay between load retries
    pub retry_delay: Duration,
    /// Bound on each load attempt; `None` disables the bound
    pub load_timeout: Option<Duration>,
    /// Failure log capacity; oldest entries are evicted beyond it
    pub max_failures_retained: usize,
}

impl IntegrationConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With load retry count
    #[inline]
    #[must_use]
    pub fn with_load_retries(mut self, retries: u32) -> Self {
        self.load_retries = retries;
        self
    }

    /// With retry delay
    #[inline]
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// With load timeout
    #[inline]
    #[must_use]
    pub fn with_load_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// With failure log capacity
    #[inline]
    #[must_use]
    pub fn with_max_failures_retained(mut self, max: usize) -> Self {
        self.max_failures_retained = max;
        self
    }
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            load_retries: 2,
            retry_delay: Duration::from_millis(25),
            load_timeout: Some(Duration::from_secs(10)),
            max_failures_retained: 128,
        }
    }
}
