//! Configuration for the recalculation engine.

use std::time::Duration;

/// Configuration parameters for the planner.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// How long a single route lookup may take before it counts as failed.
    pub lookup_timeout: Duration,

    /// Maximum number of degraded segments re-requested at once by
    /// `retry_degraded`.
    pub retry_batch_size: usize,
}

impl PlannerConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(lookup_timeout: Duration, retry_batch_size: usize) -> Self {
        Self {
            lookup_timeout,
            retry_batch_size,
        }
    }

    /// Set the lookup timeout.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Set the retry batch size. Zero is treated as one.
    pub fn with_retry_batch_size(mut self, n: usize) -> Self {
        self.retry_batch_size = n;
        self
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(10),
            retry_batch_size: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlannerConfig::default();

        assert_eq!(config.lookup_timeout, Duration::from_secs(10));
        assert_eq!(config.retry_batch_size, 4);
    }

    #[test]
    fn custom_config() {
        let config = PlannerConfig::new(Duration::from_secs(3), 2);
        assert_eq!(config.lookup_timeout, Duration::from_secs(3));
        assert_eq!(config.retry_batch_size, 2);

        let config = PlannerConfig::default()
            .with_lookup_timeout(Duration::from_millis(500))
            .with_retry_batch_size(8);
        assert_eq!(config.lookup_timeout, Duration::from_millis(500));
        assert_eq!(config.retry_batch_size, 8);
    }
}
