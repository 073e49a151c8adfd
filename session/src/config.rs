//! Tunables a host may override when creating a session.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default cap on a single tick, in milliseconds.
pub const DEFAULT_MAX_TICK_MS: u64 = 100;

/// Session configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Longest simulated step applied by a single tick.
    pub max_tick_ms: u64,
    /// Automatic wave cadence; waves only start on request when absent.
    pub auto_waves: Option<AutoWaves>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_tick_ms: DEFAULT_MAX_TICK_MS,
            auto_waves: None,
        }
    }
}

impl SessionConfig {
    /// Longest simulated step applied by a single tick. Never zero.
    #[must_use]
    pub fn max_tick(&self) -> Duration {
        Duration::from_millis(self.max_tick_ms.max(1))
    }
}

/// Cadence used to start waves without player input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoWaves {
    /// Session time before the first wave starts.
    pub start_delay_ms: u64,
    /// Idle time between a wave completing and the next one starting.
    pub interval_ms: u64,
}

impl Default for AutoWaves {
    fn default() -> Self {
        Self {
            start_delay_ms: 5_000,
            interval_ms: 3_000,
        }
    }
}

impl AutoWaves {
    /// Session time before the first wave starts.
    #[must_use]
    pub const fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    /// Idle time between waves.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{ "auto_waves": { "interval_ms": 1000 } }"#).expect("parses");

        assert_eq!(config.max_tick(), Duration::from_millis(100));
        assert_eq!(
            config.auto_waves,
            Some(AutoWaves {
                start_delay_ms: 5_000,
                interval_ms: 1_000,
            })
        );
    }

    #[test]
    fn zero_tick_cap_is_raised() {
        let config = SessionConfig {
            max_tick_ms: 0,
            auto_waves: None,
        };
        assert_eq!(config.max_tick(), Duration::from_millis(1));
    }
}
