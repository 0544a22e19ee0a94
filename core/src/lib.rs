//! # HustleX Core
//!
//! Shared building blocks for the HustleX ledger aggregates.
//!
//! The ledger is built from plain in-process aggregates that validate a command,
//! mutate their own state and record an immutable event describing what happened.
//! A repository later persists the aggregate snapshot together with its pending
//! events, then hands the events to the event bus.
//!
//! ## Core Concepts
//!
//! - **Money**: exact minor-unit amounts tagged with a [`money::Currency`]
//! - **Event**: an immutable fact, serialized with `bincode` for storage
//! - **Aggregate root**: owns its state and an ordered buffer of pending events
//! - **Stream / Version**: identity and optimistic-concurrency stamp of an aggregate
//! - **Environment**: injected dependencies such as the [`environment::Clock`]
//!
//! ## Control Flow
//!
//! ```text
//! load aggregate ─► invoke ONE business method ─► save snapshot + events ─► publish
//!                    (validate, then apply)        (version compare-and-swap)
//! ```
//!
//! Aggregates never perform I/O and never read the wall clock themselves, which
//! keeps every transition deterministic and testable.

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod aggregate;
pub mod event;
pub mod event_bus;
pub mod event_store;
pub mod money;
pub mod stream;

/// Environment module - injected dependencies.
///
/// Aggregates receive their dependencies as arguments instead of reaching for
/// globals, so tests can substitute deterministic implementations.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use hustlex_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let now = clock.now();
    /// assert!(now.timestamp() > 0);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::environment::{Clock, SystemClock};

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
