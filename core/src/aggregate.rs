//! Aggregate roots and their pending-event buffer.
//!
//! An aggregate records one immutable event per successful transition into an
//! owned [`PendingEvents`] buffer. The persistence boundary drains that buffer
//! in the same step that writes the snapshot, so events are only published for
//! state that was actually committed.
//!
//! Two construction paths exist for every aggregate and they are never unified:
//!
//! - a business constructor (`open`, `create`) that validates input and records
//!   the creation event
//! - a `reconstitute` state setter used when loading from storage, which records
//!   nothing (re-hydration must never re-emit history)

use crate::event::Event;
use crate::stream::{StreamId, Version};
use serde::{Deserialize, Serialize};

/// Ordered, in-memory buffer of events awaiting persistence.
///
/// # Example
///
/// ```
/// use hustlex_core::aggregate::PendingEvents;
///
/// let mut pending = PendingEvents::new();
/// pending.record("opened");
/// pending.record("credited");
/// assert_eq!(pending.len(), 2);
///
/// let drained = pending.drain();
/// assert_eq!(drained, vec!["opened", "credited"]);
/// assert!(pending.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEvents<E> {
    events: Vec<E>,
}

impl<E> PendingEvents<E> {
    /// Create an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append an event.
    pub fn record(&mut self, event: E) {
        self.events.push(event);
    }

    /// Pending events, oldest first.
    #[must_use]
    pub fn as_slice(&self) -> &[E] {
        &self.events
    }

    /// Remove and return all pending events, oldest first.
    pub fn drain(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<E> Default for PendingEvents<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Behaviour shared by every event-recording aggregate.
///
/// Repositories depend only on this trait to implement the optimistic write:
/// compare `persisted_version()` with the stored stamp, store the snapshot at
/// `version()`, hand off `take_events()`, then `mark_persisted()`.
pub trait AggregateRoot {
    /// The aggregate's event type.
    type Event: Event + Serialize + Clone;

    /// Aggregate type name used for stream naming and event metadata.
    const AGGREGATE_TYPE: &'static str;

    /// Identity of this aggregate instance, rendered as a string.
    fn aggregate_id(&self) -> String;

    /// Stream that holds this aggregate's events.
    fn stream_id(&self) -> StreamId {
        StreamId::for_aggregate(Self::AGGREGATE_TYPE, self.aggregate_id())
    }

    /// Current version, bumped once per successful business method.
    fn version(&self) -> Version;

    /// Version the aggregate had when it was loaded or last saved.
    ///
    /// `None` means the aggregate has never been persisted.
    fn persisted_version(&self) -> Option<Version>;

    /// Record that the current version is now the stored one.
    fn mark_persisted(&mut self);

    /// Events recorded since the last save.
    fn pending_events(&self) -> &[Self::Event];

    /// Drain the events recorded since the last save.
    fn take_events(&mut self) -> Vec<Self::Event>;

    /// `true` if the aggregate changed since it was loaded.
    fn has_changes(&self) -> bool {
        self.persisted_version() != Some(self.version())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_order_and_empties() {
        let mut pending = PendingEvents::new();
        pending.record(1);
        pending.record(2);
        pending.record(3);

        assert_eq!(pending.as_slice(), &[1, 2, 3]);
        assert_eq!(pending.drain(), vec![1, 2, 3]);
        assert!(pending.is_empty());
        assert!(pending.drain().is_empty());
    }

    #[test]
    fn default_is_empty() {
        let pending: PendingEvents<String> = PendingEvents::default();
        assert_eq!(pending.len(), 0);
    }
}
