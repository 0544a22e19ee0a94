//! Aggregate stream identification and versioning types.
//!
//! Every aggregate instance owns one event stream, named `"<aggregate-type>-<id>"`,
//! and carries a [`Version`] that the persistence layer compares on write
//! (`UPDATE ... WHERE version = :expected`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for `StreamId` parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid stream ID: {0}")]
pub struct ParseStreamIdError(String);

/// Unique identifier for an aggregate's event stream.
///
/// # Validation
///
/// - `FromStr::from_str()`: rejects empty strings (external input)
/// - `new()` / `From`: no validation (application-controlled input)
///
/// # Examples
///
/// ```
/// use hustlex_core::stream::StreamId;
///
/// let stream_id = StreamId::for_aggregate("wallet", "0b6f");
/// assert_eq!(stream_id.as_str(), "wallet-0b6f");
///
/// let parsed: StreamId = "circle-abc".parse().unwrap();
/// assert_eq!(parsed, StreamId::new("circle-abc"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamId(String);

impl StreamId {
    /// Create a new `StreamId` from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Stream name for an aggregate instance: `"<aggregate_type>-<id>"`.
    #[must_use]
    pub fn for_aggregate(aggregate_type: &str, id: impl fmt::Display) -> Self {
        Self(format!("{aggregate_type}-{id}"))
    }

    /// Get the stream ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert the `StreamId` into its inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StreamId {
    type Err = ParseStreamIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseStreamIdError("Stream ID cannot be empty".to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for StreamId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StreamId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for StreamId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Version stamp for optimistic concurrency control.
///
/// Aggregates bump their version once per successful business method. A
/// repository accepts a write only if the stored version still equals the
/// version the aggregate was loaded at; otherwise another writer won the race
/// and the caller must reload and retry.
///
/// # Examples
///
/// ```
/// use hustlex_core::stream::Version;
///
/// let v1 = Version::new(1);
/// assert_eq!(v1.next(), Version::new(2));
/// assert_eq!(v1.value(), 1);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(u64);

impl Version {
    /// The initial version (0) for a new event stream.
    pub const INITIAL: Self = Self(0);

    /// Create a new `Version` with the given value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the version number.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Get the next version (current + 1), saturating at `u64::MAX`.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Version after appending `count` events, saturating at `u64::MAX`.
    #[must_use]
    pub const fn advance(self, count: u64) -> Self {
        Self(self.0.saturating_add(count))
    }

    /// Check if this is the initial version (0).
    #[must_use]
    pub const fn is_initial(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Version> for u64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod stream_id_tests {
        use super::*;

        #[test]
        fn for_aggregate_joins_type_and_id() {
            let id = StreamId::for_aggregate("circle", 42);
            assert_eq!(id.as_str(), "circle-42");
        }

        #[test]
        #[allow(clippy::expect_used)] // Panics: Test will fail if parse fails
        fn parse_from_str() {
            let id: StreamId = "wallet-123".parse().expect("parse should succeed");
            assert_eq!(id, StreamId::new("wallet-123"));
        }

        #[test]
        fn parse_empty_string_fails() {
            assert!("".parse::<StreamId>().is_err());
        }

        #[test]
        fn into_inner() {
            assert_eq!(StreamId::new("wallet-1").into_inner(), "wallet-1");
        }
    }

    mod version_tests {
        use super::*;

        #[test]
        fn initial_version() {
            assert_eq!(Version::INITIAL, Version::new(0));
            assert!(Version::INITIAL.is_initial());
            assert!(!Version::new(1).is_initial());
        }

        #[test]
        fn next_and_advance() {
            assert_eq!(Version::new(0).next(), Version::new(1));
            assert_eq!(Version::new(5).advance(3), Version::new(8));
            assert_eq!(Version::new(u64::MAX).next(), Version::new(u64::MAX));
        }

        #[test]
        fn version_from_u64() {
            let version = Version::from(42_u64);
            let num: u64 = version.into();
            assert_eq!(num, 42);
            assert_eq!(format!("{version}"), "42");
        }
    }
}
