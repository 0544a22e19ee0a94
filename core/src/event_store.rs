//! Event store trait and related types.
//!
//! The event store is the append-only log behind the ledger repositories. Each
//! aggregate has one stream. The repository appends the events an aggregate
//! recorded during a call and stores a snapshot of the resulting state next to
//! them, tagged with the aggregate [`Version`]. Both land in a single
//! [`EventStore::append_with_snapshot`] call so the audit trail never runs
//! ahead of the stored state.
//!
//! # Implementations
//!
//! - `InMemoryEventStore` (in `hustlex-testing`): fast, deterministic testing
//!
//! # Example
//!
//! ```no_run
//! use hustlex_core::event_store::{EventStore, EventStoreError};
//! use hustlex_core::stream::{StreamId, Version};
//!
//! async fn latest<S: EventStore>(store: &S) -> Result<Option<Version>, EventStoreError> {
//!     let snapshot = store.load_snapshot(StreamId::new("wallet-123")).await?;
//!     Ok(snapshot.map(|(version, _)| version))
//! }
//! ```

use crate::event::SerializedEvent;
use crate::stream::{StreamId, Version};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Snapshot data: `(Version, Vec<u8>)`
pub type SnapshotData = (Version, Vec<u8>);

/// Errors that can occur during event store operations.
#[derive(Error, Debug)]
pub enum EventStoreError {
    /// Optimistic concurrency conflict: expected version doesn't match current version.
    #[error("Concurrency conflict on {stream_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The stream ID where the conflict occurred.
        stream_id: StreamId,
        /// The version we expected the stream to be at.
        expected: Version,
        /// The actual current version of the stream.
        actual: Version,
    },

    /// Stream not found in the event store.
    #[error("Stream not found: {0}")]
    StreamNotFound(StreamId),

    /// Database connection error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Event store abstraction for storing and retrieving event streams.
///
/// # Dyn Compatibility
///
/// Methods return `Pin<Box<dyn Future>>` instead of using `async fn` so the
/// repositories can hold an `Arc<dyn EventStore>`.
pub trait EventStore: Send + Sync {
    /// Append events to a stream.
    ///
    /// - `Some(version)`: assert the stream currently holds exactly `version` events
    /// - `None`: append unconditionally
    ///
    /// Returns the stream length after appending.
    ///
    /// # Errors
    ///
    /// - `ConcurrencyConflict`: the stream length didn't match `expected_version`
    /// - `DatabaseError`: the backend failed
    fn append_events(
        &self,
        stream_id: StreamId,
        expected_version: Option<Version>,
        events: Vec<SerializedEvent>,
    ) -> Pin<Box<dyn Future<Output = Result<Version, EventStoreError>> + Send + '_>>;

    /// Load events from a stream, oldest first.
    ///
    /// `from_version` skips the first `from_version` events. An unknown stream
    /// yields an empty vector.
    ///
    /// # Errors
    ///
    /// - `DatabaseError`: the backend failed
    fn load_events(
        &self,
        stream_id: StreamId,
        from_version: Option<Version>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SerializedEvent>, EventStoreError>> + Send + '_>>;

    /// Save a snapshot of aggregate state at `version`, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// - `DatabaseError`: the backend failed
    fn save_snapshot(
        &self,
        stream_id: StreamId,
        version: Version,
        state: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventStoreError>> + Send + '_>>;

    /// Append events and replace the snapshot in one atomic write.
    ///
    /// `expected_snapshot` is the snapshot version the caller loaded; `None`
    /// asserts the stream has no snapshot yet. On any error neither the events
    /// nor the snapshot are written.
    ///
    /// Returns the stream length after appending.
    ///
    /// # Errors
    ///
    /// - `ConcurrencyConflict`: the stored snapshot version didn't match
    ///   `expected_snapshot` (a missing snapshot reports version 0)
    /// - `DatabaseError`: the backend failed
    fn append_with_snapshot(
        &self,
        stream_id: StreamId,
        expected_snapshot: Option<Version>,
        events: Vec<SerializedEvent>,
        version: Version,
        state: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<Version, EventStoreError>> + Send + '_>>;

    /// Load the latest snapshot for a stream, if any.
    ///
    /// # Errors
    ///
    /// - `DatabaseError`: the backend failed
    fn load_snapshot(
        &self,
        stream_id: StreamId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SnapshotData>, EventStoreError>> + Send + '_>>;
}
