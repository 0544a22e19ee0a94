//! Configuration for the ledger.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Ledger configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Failed PIN attempts before a wallet auto-locks
    pub max_pin_attempts: u32,
    /// Rules the circle aggregate enforces
    pub circle: CirclePolicy,
    /// Topic wallet events are published to
    pub wallet_topic: String,
    /// Topic circle events are published to
    pub circle_topic: String,
    /// Optimistic-concurrency retry settings
    pub retry: RetryConfig,
}

/// The slice of configuration the circle aggregate consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CirclePolicy {
    /// Active members required before a circle can start
    pub min_members: u32,
    /// Late fee is `contribution_amount / late_fee_divisor` (20 = 5%)
    pub late_fee_divisor: u64,
}

impl Default for CirclePolicy {
    fn default() -> Self {
        Self {
            min_members: 2,
            late_fee_divisor: 20,
        }
    }
}

/// Retry settings for reload-and-retry on concurrent modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds
    pub initial_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds
    pub max_delay_ms: u64,
}

impl RetryConfig {
    /// Initial delay as a `Duration`.
    #[must_use]
    pub const fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Maximum delay as a `Duration`.
    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 10,
            max_delay_ms: 1000,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_pin_attempts: 3,
            circle: CirclePolicy::default(),
            wallet_topic: "wallet-events".to_string(),
            circle_topic: "circle-events".to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// Load configuration from environment variables.
    ///
    /// Missing or unparseable variables fall back to their defaults, as does a
    /// zero PIN attempt limit or late fee divisor.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            max_pin_attempts: nonzero(&lookup, "LEDGER_MAX_PIN_ATTEMPTS")
                .unwrap_or(defaults.max_pin_attempts),
            circle: CirclePolicy {
                min_members: lookup("LEDGER_MIN_CIRCLE_MEMBERS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.circle.min_members),
                late_fee_divisor: nonzero(&lookup, "LEDGER_LATE_FEE_DIVISOR")
                    .unwrap_or(defaults.circle.late_fee_divisor),
            },
            wallet_topic: lookup("LEDGER_WALLET_TOPIC").unwrap_or(defaults.wallet_topic),
            circle_topic: lookup("LEDGER_CIRCLE_TOPIC").unwrap_or(defaults.circle_topic),
            retry: RetryConfig {
                max_retries: lookup("LEDGER_RETRY_MAX")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.retry.max_retries),
                initial_delay_ms: lookup("LEDGER_RETRY_INITIAL_DELAY_MS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.retry.initial_delay_ms),
                max_delay_ms: lookup("LEDGER_RETRY_MAX_DELAY_MS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.retry.max_delay_ms),
            },
        }
    }
}

/// Parse `key`, treating zero like a missing value.
fn nonzero<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Default + PartialEq,
{
    let value: T = lookup(key)?.parse().ok()?;
    if value == T::default() {
        tracing::warn!(key, "Zero is not allowed here, using the default");
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_environment_yields_defaults() {
        let config = LedgerConfig::from_lookup(|_| None);
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.circle.late_fee_divisor, 20);
        assert_eq!(config.wallet_topic, "wallet-events");
    }

    #[test]
    fn values_override_and_garbage_falls_back() {
        let vars: HashMap<&str, &str> = [
            ("LEDGER_MAX_PIN_ATTEMPTS", "5"),
            ("LEDGER_MIN_CIRCLE_MEMBERS", "not-a-number"),
            ("LEDGER_CIRCLE_TOPIC", "ajo-events"),
            ("LEDGER_RETRY_MAX_DELAY_MS", "250"),
        ]
        .into_iter()
        .collect();

        let config = LedgerConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.max_pin_attempts, 5);
        assert_eq!(config.circle.min_members, 2);
        assert_eq!(config.circle_topic, "ajo-events");
        assert_eq!(config.retry.max_delay(), Duration::from_millis(250));
    }

    #[test]
    fn zero_limits_fall_back_to_defaults() {
        let vars: HashMap<&str, &str> = [
            ("LEDGER_MAX_PIN_ATTEMPTS", "0"),
            ("LEDGER_LATE_FEE_DIVISOR", "0"),
        ]
        .into_iter()
        .collect();

        let config = LedgerConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.max_pin_attempts, 3);
        assert_eq!(config.circle.late_fee_divisor, 20);
    }

    #[test]
    fn nonzero_limits_are_kept() {
        let vars: HashMap<&str, &str> = [
            ("LEDGER_MAX_PIN_ATTEMPTS", "1"),
            ("LEDGER_LATE_FEE_DIVISOR", "10"),
        ]
        .into_iter()
        .collect();

        let config = LedgerConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.max_pin_attempts, 1);
        assert_eq!(config.circle.late_fee_divisor, 10);
    }
}
