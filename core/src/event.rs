//! Event trait and related types.
//!
//! Events are immutable facts recorded by an aggregate on every successful state
//! transition. They form the audit trail of the ledger and the integration point
//! for other bounded contexts (notifications, credit scoring).
//!
//! Events are serialized with `bincode`; envelope metadata (aggregate id, type,
//! version, correlation ids) travels alongside as JSON.
//!
//! # Example
//!
//! ```
//! use hustlex_core::event::Event;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! enum PotEvent {
//!     PotOpened { pot_id: String },
//!     PotClosed { pot_id: String },
//! }
//!
//! impl Event for PotEvent {
//!     fn event_type(&self) -> &'static str {
//!         match self {
//!             PotEvent::PotOpened { .. } => "PotOpened.v1",
//!             PotEvent::PotClosed { .. } => "PotClosed.v1",
//!         }
//!     }
//! }
//! ```

use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error;

/// Error types for event operations.
#[derive(Error, Debug)]
pub enum EventError {
    /// Failed to serialize event to bytes.
    #[error("Failed to serialize event: {0}")]
    SerializationError(String),

    /// Failed to deserialize event from bytes.
    #[error("Failed to deserialize event: {0}")]
    DeserializationError(String),
}

/// An immutable domain event.
///
/// `event_type()` returns a stable, versioned name (`"WalletCredited.v1"`) used
/// to route the bytes back to the right deserializer after schema changes.
pub trait Event: Send + Sync + 'static {
    /// Returns the event type identifier for this event.
    fn event_type(&self) -> &'static str;

    /// Serialize this event to bincode bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be serialized.
    fn to_bytes(&self) -> Result<Vec<u8>, EventError>
    where
        Self: Serialize,
    {
        bincode::serialize(self).map_err(|e| EventError::SerializationError(e.to_string()))
    }

    /// Deserialize an event from bincode bytes.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` if the bytes are corrupted or
    /// describe a different event schema.
    fn from_bytes(bytes: &[u8]) -> Result<Self, EventError>
    where
        Self: DeserializeOwned + Sized,
    {
        bincode::deserialize(bytes).map_err(|e| EventError::DeserializationError(e.to_string()))
    }
}

/// A serialized event ready for storage or publication.
#[derive(Clone, Debug, PartialEq)]
pub struct SerializedEvent {
    /// The event type identifier (e.g., "WalletCredited.v1").
    pub event_type: String,

    /// The bincode-serialized event data.
    pub data: Vec<u8>,

    /// Optional JSON metadata.
    ///
    /// The ledger repositories always set `aggregate_id`, `aggregate_type` and
    /// `aggregate_version`; callers may add `correlation_id` / `causation_id`.
    pub metadata: Option<serde_json::Value>,
}

impl SerializedEvent {
    /// Create a new serialized event.
    #[must_use]
    pub const fn new(
        event_type: String,
        data: Vec<u8>,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            event_type,
            data,
            metadata,
        }
    }

    /// Create a serialized event from an `Event`.
    ///
    /// # Errors
    ///
    /// Returns `EventError::SerializationError` if the event cannot be serialized.
    pub fn from_event<E: Event + Serialize>(
        event: &E,
        metadata: Option<serde_json::Value>,
    ) -> Result<Self, EventError> {
        Ok(Self {
            event_type: event.event_type().to_string(),
            data: event.to_bytes()?,
            metadata,
        })
    }

    /// Decode the payload back into a typed event.
    ///
    /// # Errors
    ///
    /// Returns `EventError::DeserializationError` if the bytes do not decode as `E`.
    pub fn decode<E: Event + DeserializeOwned>(&self) -> Result<E, EventError> {
        E::from_bytes(&self.data)
    }

    /// Look up a string metadata field.
    #[must_use]
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.as_ref()?.get(key)?.as_str()
    }
}

impl fmt::Display for SerializedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SerializedEvent {{ type: {}, size: {} bytes }}",
            self.event_type,
            self.data.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    enum TestEvent {
        Opened { id: String, amount: u64 },
        Closed { id: String },
    }

    impl Event for TestEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TestEvent::Opened { .. } => "TestEvent.Opened.v1",
                TestEvent::Closed { .. } => "TestEvent.Closed.v1",
            }
        }
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail if serialization fails
    fn serialized_event_decodes_back() {
        let event = TestEvent::Opened {
            id: "pot-1".to_string(),
            amount: 42,
        };

        let serialized = SerializedEvent::from_event(&event, None).expect("serialize");
        assert_eq!(serialized.event_type, "TestEvent.Opened.v1");

        let decoded: TestEvent = serialized.decode().expect("decode");
        assert_eq!(decoded, event);
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn metadata_lookup() {
        let event = TestEvent::Closed {
            id: "pot-1".to_string(),
        };
        let metadata = serde_json::json!({ "aggregate_id": "pot-1", "aggregate_version": 3 });

        let serialized = SerializedEvent::from_event(&event, Some(metadata)).expect("serialize");

        assert_eq!(serialized.metadata_str("aggregate_id"), Some("pot-1"));
        assert_eq!(serialized.metadata_str("aggregate_version"), None);
        assert_eq!(serialized.metadata_str("missing"), None);
    }

    #[test]
    fn decode_garbage_fails() {
        let serialized = SerializedEvent::new("TestEvent.Opened.v1".to_string(), vec![255], None);
        assert!(serialized.decode::<TestEvent>().is_err());
    }

    #[test]
    fn serialized_event_display() {
        let serialized = SerializedEvent::new("TestEvent.v1".to_string(), vec![1, 2, 3], None);
        let display = format!("{serialized}");
        assert!(display.contains("TestEvent.v1"));
        assert!(display.contains("3 bytes"));
    }
}
