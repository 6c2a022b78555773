//! Poller configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing for the StatusPoller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Delay before the first status query, in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Fixed interval between status queries, in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_initial_delay_ms() -> u64 {
    2_000
}

fn default_interval_ms() -> u64 {
    10_000
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl PollerConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PollerConfig::default();
        assert_eq!(config.initial_delay(), Duration::from_secs(2));
        assert_eq!(config.interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: PollerConfig = serde_yaml::from_str("interval_ms: 250").unwrap();
        assert_eq!(config.interval(), Duration::from_millis(250));
        assert_eq!(config.initial_delay_ms, 2_000);
    }
}
