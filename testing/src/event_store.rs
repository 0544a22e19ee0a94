//! In-memory event store for fast, deterministic tests.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use hustlex_core::event::SerializedEvent;
use hustlex_core::event_store::{EventStore, EventStoreError, SnapshotData};
use hustlex_core::stream::{StreamId, Version};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct Inner {
    streams: HashMap<StreamId, Vec<SerializedEvent>>,
    snapshots: HashMap<StreamId, SnapshotData>,
    fail_writes: bool,
    fail_snapshots: bool,
}

/// `HashMap`-backed [`EventStore`].
///
/// Clones share the same storage.
///
/// # Example
///
/// ```
/// use hustlex_testing::InMemoryEventStore;
/// use hustlex_core::event_store::EventStore;
/// use hustlex_core::stream::{StreamId, Version};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryEventStore::new();
/// store.save_snapshot(StreamId::new("wallet-1"), Version::new(1), vec![1]).await?;
/// assert_eq!(store.snapshot_version(&StreamId::new("wallet-1")), Some(Version::new(1)));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryEventStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryEventStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with `DatabaseError`.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.write().unwrap().fail_writes = fail;
    }

    /// Make every subsequent snapshot write fail with `DatabaseError`.
    ///
    /// Event-only appends still succeed; an atomic append with snapshot writes
    /// nothing.
    pub fn fail_snapshot_writes(&self, fail: bool) {
        self.inner.write().unwrap().fail_snapshots = fail;
    }

    /// All events in a stream, oldest first.
    #[must_use]
    pub fn events(&self, stream_id: &StreamId) -> Vec<SerializedEvent> {
        self.inner
            .read()
            .unwrap()
            .streams
            .get(stream_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Event type names in a stream, oldest first.
    #[must_use]
    pub fn event_types(&self, stream_id: &StreamId) -> Vec<String> {
        self.events(stream_id)
            .into_iter()
            .map(|event| event.event_type)
            .collect()
    }

    /// Version of the latest snapshot for a stream.
    #[must_use]
    pub fn snapshot_version(&self, stream_id: &StreamId) -> Option<Version> {
        self.inner
            .read()
            .unwrap()
            .snapshots
            .get(stream_id)
            .map(|(version, _)| *version)
    }
}

impl EventStore for InMemoryEventStore {
    fn append_events(
        &self,
        stream_id: StreamId,
        expected_version: Option<Version>,
        events: Vec<SerializedEvent>,
    ) -> Pin<Box<dyn Future<Output = Result<Version, EventStoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut inner = self.inner.write().unwrap();
            if inner.fail_writes {
                return Err(EventStoreError::DatabaseError(
                    "simulated write failure".to_string(),
                ));
            }

            let stream = inner.streams.entry(stream_id.clone()).or_default();
            let actual = Version::new(stream.len() as u64);
            if let Some(expected) = expected_version {
                if expected != actual {
                    return Err(EventStoreError::ConcurrencyConflict {
                        stream_id,
                        expected,
                        actual,
                    });
                }
            }

            stream.extend(events);
            Ok(Version::new(stream.len() as u64))
        })
    }

    fn load_events(
        &self,
        stream_id: StreamId,
        from_version: Option<Version>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SerializedEvent>, EventStoreError>> + Send + '_>>
    {
        Box::pin(async move {
            let skip = from_version.map_or(0, |v| usize::try_from(v.value()).unwrap_or(usize::MAX));
            Ok(self
                .events(&stream_id)
                .into_iter()
                .skip(skip)
                .collect())
        })
    }

    fn save_snapshot(
        &self,
        stream_id: StreamId,
        version: Version,
        state: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventStoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut inner = self.inner.write().unwrap();
            if inner.fail_writes || inner.fail_snapshots {
                return Err(EventStoreError::DatabaseError(
                    "simulated write failure".to_string(),
                ));
            }
            inner.snapshots.insert(stream_id, (version, state));
            Ok(())
        })
    }

    fn append_with_snapshot(
        &self,
        stream_id: StreamId,
        expected_snapshot: Option<Version>,
        events: Vec<SerializedEvent>,
        version: Version,
        state: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<Version, EventStoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut inner = self.inner.write().unwrap();
            if inner.fail_writes {
                return Err(EventStoreError::DatabaseError(
                    "simulated write failure".to_string(),
                ));
            }

            let stored = inner.snapshots.get(&stream_id).map(|(v, _)| *v);
            if stored != expected_snapshot {
                return Err(EventStoreError::ConcurrencyConflict {
                    stream_id,
                    expected: expected_snapshot.unwrap_or(Version::INITIAL),
                    actual: stored.unwrap_or(Version::INITIAL),
                });
            }

            // Both writes are checked before either is applied.
            if inner.fail_snapshots {
                return Err(EventStoreError::DatabaseError(
                    "simulated snapshot write failure".to_string(),
                ));
            }

            inner.snapshots.insert(stream_id.clone(), (version, state));
            if events.is_empty() {
                let len = inner.streams.get(&stream_id).map_or(0, Vec::len);
                return Ok(Version::new(len as u64));
            }
            let stream = inner.streams.entry(stream_id).or_default();
            stream.extend(events);
            Ok(Version::new(stream.len() as u64))
        })
    }

    fn load_snapshot(
        &self,
        stream_id: StreamId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<SnapshotData>, EventStoreError>> + Send + '_>>
    {
        Box::pin(async move { Ok(self.inner.read().unwrap().snapshots.get(&stream_id).cloned()) })
    }
}
