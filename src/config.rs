//! Timing configuration for the driver.

use std::time::Duration;

use crate::commands::RetryPolicy;

/// Pause after each command batch so the firmware can process it.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(2000);

/// Inquiry wait: 100 polls, 500 ms apart.
pub const DEFAULT_DISCOVERY_POLICY: RetryPolicy = RetryPolicy::new(Duration::from_millis(500), 100);

/// Connect wait: 50 polls, 250 ms apart.
pub const DEFAULT_CONNECT_POLICY: RetryPolicy = RetryPolicy::new(Duration::from_millis(250), 50);

/// Status and PIN-request wait: 50 polls, 250 ms apart.
pub const DEFAULT_STATUS_POLICY: RetryPolicy = RetryPolicy::new(Duration::from_millis(250), 50);

/// Pause between polls while receiving raw data.
pub const DEFAULT_RECEIVE_INTERVAL: Duration = Duration::from_millis(50);

/// Timing configuration for a [`BtModule`](crate::BtModule).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleConfig {
    /// Delay after each command batch.
    pub settle_delay: Duration,
    /// Retry policy while waiting for an inquiry result.
    pub discovery: RetryPolicy,
    /// Retry policy while waiting for a connect result.
    pub connect: RetryPolicy,
    /// Retry policy while waiting for a status report or PIN request.
    pub status: RetryPolicy,
    /// Poll interval for raw receives.
    pub receive_interval: Duration,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            discovery: DEFAULT_DISCOVERY_POLICY,
            connect: DEFAULT_CONNECT_POLICY,
            status: DEFAULT_STATUS_POLICY,
            receive_interval: DEFAULT_RECEIVE_INTERVAL,
        }
    }
}

impl ModuleConfig {
    /// Creates a configuration with default timings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the settle delay.
    #[must_use]
    pub const fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the discovery retry policy.
    #[must_use]
    pub const fn discovery(mut self, policy: RetryPolicy) -> Self {
        self.discovery = policy;
        self
    }

    /// Sets the connect retry policy.
    #[must_use]
    pub const fn connect(mut self, policy: RetryPolicy) -> Self {
        self.connect = policy;
        self
    }

    /// Sets the status retry policy.
    #[must_use]
    pub const fn status(mut self, policy: RetryPolicy) -> Self {
        self.status = policy;
        self
    }

    /// Sets the raw receive poll interval.
    #[must_use]
    pub const fn receive_interval(mut self, interval: Duration) -> Self {
        self.receive_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_config_defaults() {
        let config = ModuleConfig::new();
        assert_eq!(config.settle_delay, Duration::from_secs(2));
        assert_eq!(config.discovery.max_attempts, 100);
        assert_eq!(config.discovery.interval, Duration::from_millis(500));
        assert_eq!(config.connect.max_attempts, 50);
        assert_eq!(config.status.interval, Duration::from_millis(250));
        assert_eq!(config.receive_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_module_config_builder() {
        let config = ModuleConfig::new()
            .settle_delay(Duration::ZERO)
            .connect(RetryPolicy::new(Duration::from_millis(10), 3));
        assert_eq!(config.settle_delay, Duration::ZERO);
        assert_eq!(config.connect.max_attempts, 3);
        assert_eq!(config.discovery, DEFAULT_DISCOVERY_POLICY);
    }
}
