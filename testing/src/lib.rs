//! # HustleX Testing
//!
//! Testing utilities for the HustleX ledger.
//!
//! This crate provides:
//! - Deterministic clocks ([`FixedClock`], [`ManualClock`])
//! - In-memory [`EventStore`](hustlex_core::event_store::EventStore) and
//!   [`EventBus`](hustlex_core::event_bus::EventBus) implementations
//! - A Given-When-Then harness for aggregates ([`AggregateTest`])
//! - proptest strategies for domain values
//!
//! ## Example
//!
//! ```ignore
//! use hustlex_testing::{AggregateTest, test_clock};
//!
//! AggregateTest::given(wallet)
//!     .when(|w| w.credit(amount, "bank_transfer", "ref-1", "top up"))
//!     .then_ok()
//!     .then_state(|w| assert_eq!(w.balance().amount(), 1_000))
//!     .then_event_types(&["WalletCredited.v1"])
//!     .run();
//! ```

use chrono::{DateTime, Duration, Utc};
use hustlex_core::environment::Clock;

pub mod event_bus;
pub mod event_store;

/// Mock implementations of environment traits and infrastructure.
pub mod mocks {
    use super::{Clock, DateTime, Duration, Utc};
    use std::sync::RwLock;

    pub use crate::event_bus::InMemoryEventBus;
    pub use crate::event_store::InMemoryEventStore;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use hustlex_testing::mocks::FixedClock;
    /// use hustlex_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to.
    ///
    /// Used for scenarios that span several due dates, such as contributing
    /// late or sweeping overdue contributions.
    #[derive(Debug)]
    pub struct ManualClock {
        time: RwLock<DateTime<Utc>>,
    }

    impl ManualClock {
        /// Create a clock frozen at `time`.
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: RwLock::new(time),
            }
        }

        /// Move the clock forward.
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned.
        #[allow(clippy::unwrap_used)] // Test infrastructure
        pub fn advance(&self, by: Duration) {
            let mut time = self.time.write().unwrap();
            *time += by;
        }

        /// Jump to an absolute time.
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned.
        #[allow(clippy::unwrap_used)] // Test infrastructure
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.write().unwrap() = to;
        }
    }

    impl Clock for ManualClock {
        #[allow(clippy::unwrap_used)] // Test infrastructure
        fn now(&self) -> DateTime<Utc> {
            *self.time.read().unwrap()
        }
    }

    /// The instant every default test clock starts at (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_epoch() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc)
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(test_epoch())
    }

    /// Create a manual clock starting at 2025-01-01 00:00:00 UTC
    #[must_use]
    pub fn manual_clock() -> ManualClock {
        ManualClock::new(test_epoch())
    }
}

/// Test helpers and utilities.
pub mod helpers {
    /// Install a `tracing` subscriber that writes through the test harness.
    ///
    /// Respects `RUST_LOG`; calling it more than once is harmless.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing strategies for domain values.
pub mod properties {
    use hustlex_core::money::{Currency, Money};
    use proptest::prelude::*;

    /// Any supported currency.
    pub fn arb_currency() -> impl Strategy<Value = Currency> {
        prop_oneof![Just(Currency::Ngn), Just(Currency::Usd), Just(Currency::Ghs)]
    }

    /// A positive amount in `currency`, at most `max` minor units.
    pub fn positive_money(currency: Currency, max: u64) -> impl Strategy<Value = Money> {
        (1..=max.max(1)).prop_map(move |amount| Money::new(amount, currency))
    }
}

// Re-export commonly used items
pub use aggregate_test::AggregateTest;
pub use helpers::init_test_tracing;
pub use mocks::{
    FixedClock, InMemoryEventBus, InMemoryEventStore, ManualClock, manual_clock, test_clock,
    test_epoch,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now(), test_epoch());
    }

    #[test]
    fn manual_clock_advances_and_sets() {
        let clock = manual_clock();
        clock.advance(Duration::days(3));
        assert_eq!(clock.now(), test_epoch() + Duration::days(3));

        clock.set(test_epoch());
        assert_eq!(clock.now(), test_epoch());
    }
}
