//! Repositories backed by an [`EventStore`] and an [`EventBus`].
//!
//! Each aggregate lives in its own stream (`wallet-<id>`, `circle-<id>`). The
//! stream's snapshot holds the bincode-encoded aggregate state stamped with its
//! version, and the stream's events are the audit trail.
//!
//! Secondary lookups live in the store too, so every repository over the same
//! store sees them. A lookup key (`wallet-owner-<user>`, `circle-invite-<code>`)
//! is a stream of claim records; its last claim names the owning aggregate. A
//! claim is appended with an expected stream length, which makes it the
//! uniqueness check.

use super::{CircleRepository, RepositoryError, RepositoryFuture, WalletRepository};
use crate::circle::{Circle, CircleSnapshot};
use crate::types::{CircleId, UserId, WalletId};
use crate::wallet::{Wallet, WalletSnapshot};
use hustlex_core::aggregate::AggregateRoot;
use hustlex_core::event::SerializedEvent;
use hustlex_core::event_bus::EventBus;
use hustlex_core::event_store::{EventStore, EventStoreError};
use hustlex_core::stream::{StreamId, Version};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

const LOOKUP_CLAIMED: &str = "LookupClaimed.v1";

/// Snapshot, event and lookup plumbing shared by both repositories.
struct AggregateStorage {
    store: Arc<dyn EventStore>,
    bus: Arc<dyn EventBus>,
    topic: String,
}

impl AggregateStorage {
    async fn load_state<S: DeserializeOwned>(
        &self,
        stream_id: StreamId,
    ) -> Result<Option<S>, RepositoryError> {
        match self.store.load_snapshot(stream_id).await? {
            Some((_, bytes)) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn has_state(&self, stream_id: StreamId) -> Result<bool, RepositoryError> {
        Ok(self.store.load_snapshot(stream_id).await?.is_some())
    }

    /// Compare-and-swap the aggregate's snapshot and append its pending events
    /// in one store write.
    ///
    /// Returns the committed events for publication; the aggregate is only
    /// touched once the write succeeds.
    async fn commit<A>(
        &self,
        aggregate: &mut A,
        state: Vec<u8>,
    ) -> Result<Vec<SerializedEvent>, RepositoryError>
    where
        A: AggregateRoot + Send,
    {
        let stream_id = aggregate.stream_id();
        let expected = aggregate.persisted_version();
        let stored = self
            .store
            .load_snapshot(stream_id.clone())
            .await?
            .map(|(version, _)| version);

        match (expected, stored) {
            (None, Some(_)) => return Err(RepositoryError::AlreadyExists(stream_id.into_inner())),
            (Some(_), None) => return Err(RepositoryError::NotFound(stream_id.into_inner())),
            _ => {}
        }

        let version = aggregate.version();
        let metadata = serde_json::json!({
            "aggregate_id": aggregate.aggregate_id(),
            "aggregate_type": A::AGGREGATE_TYPE,
            "aggregate_version": version.value(),
        });
        let events = aggregate
            .pending_events()
            .iter()
            .map(|event| SerializedEvent::from_event(event, Some(metadata.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        self.store
            .append_with_snapshot(stream_id.clone(), expected, events.clone(), version, state)
            .await
            .map_err(|error| match error {
                EventStoreError::ConcurrencyConflict {
                    expected, actual, ..
                } => {
                    tracing::debug!(
                        stream_id = %stream_id,
                        expected = %expected,
                        actual = %actual,
                        "Version check failed"
                    );
                    RepositoryError::ConcurrentModification { expected, actual }
                }
                other => RepositoryError::EventStore(other),
            })?;

        aggregate.take_events();
        aggregate.mark_persisted();

        tracing::debug!(
            stream_id = %stream_id,
            version = %version,
            events = events.len(),
            "Aggregate saved"
        );
        Ok(events)
    }

    /// Owner named by the last claim on `key`, with the key stream's length.
    async fn lookup<I: DeserializeOwned>(
        &self,
        key: StreamId,
    ) -> Result<(Option<I>, Version), RepositoryError> {
        let claims = self.store.load_events(key, None).await?;
        let length = Version::new(claims.len() as u64);
        let owner = claims
            .last()
            .map(|claim| bincode::deserialize(&claim.data))
            .transpose()?;
        Ok((owner, length))
    }

    /// Reserve `key` for `owner`.
    ///
    /// A key held by another aggregate is only taken over when that aggregate
    /// was never stored (its first save failed after claiming).
    async fn claim<I>(
        &self,
        key: StreamId,
        owner: I,
        stream_of: impl Fn(&I) -> StreamId,
    ) -> Result<(), RepositoryError>
    where
        I: Serialize + DeserializeOwned + PartialEq + fmt::Display,
    {
        let (held_by, length) = self.lookup::<I>(key.clone()).await?;
        if let Some(holder) = held_by {
            if holder == owner {
                return Ok(());
            }
            if self.has_state(stream_of(&holder)).await? {
                return Err(RepositoryError::AlreadyExists(format!("{key} held by {holder}")));
            }
        }

        let record = SerializedEvent::new(LOOKUP_CLAIMED.to_string(), bincode::serialize(&owner)?, None);
        match self.store.append_events(key.clone(), Some(length), vec![record]).await {
            Ok(_) => Ok(()),
            Err(EventStoreError::ConcurrencyConflict { .. }) => {
                match self.lookup::<I>(key.clone()).await? {
                    (Some(holder), _) if holder == owner => Ok(()),
                    _ => Err(RepositoryError::AlreadyExists(key.into_inner())),
                }
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Publish committed events. Failures are logged; the events stay in the store.
    async fn publish(&self, events: &[SerializedEvent]) {
        for event in events {
            if let Err(error) = self.bus.publish(&self.topic, event).await {
                metrics::counter!("ledger.events.publish_failures", "topic" => self.topic.clone())
                    .increment(1);
                tracing::error!(
                    topic = %self.topic,
                    event_type = %event.event_type,
                    error = %error,
                    "Failed to publish committed event"
                );
            }
        }
    }
}

fn wallet_stream(id: WalletId) -> StreamId {
    StreamId::for_aggregate(Wallet::AGGREGATE_TYPE, id)
}

fn circle_stream(id: CircleId) -> StreamId {
    StreamId::for_aggregate(Circle::AGGREGATE_TYPE, id)
}

fn owner_key(user_id: UserId) -> StreamId {
    StreamId::new(format!("wallet-owner-{user_id}"))
}

fn invite_key(code: &str) -> StreamId {
    StreamId::new(format!("circle-invite-{code}"))
}

/// Wallet repository over an event store and event bus.
///
/// # Example
///
/// ```ignore
/// let repo = InMemoryWalletRepository::new(store, bus, "wallet-events");
/// let mut wallet = Wallet::open(user_id, Currency::Ngn, &SystemClock);
/// repo.save(&mut wallet).await?;
/// ```
pub struct InMemoryWalletRepository {
    storage: AggregateStorage,
}

impl InMemoryWalletRepository {
    /// Create a repository publishing to `topic`.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, bus: Arc<dyn EventBus>, topic: impl Into<String>) -> Self {
        Self {
            storage: AggregateStorage {
                store,
                bus,
                topic: topic.into(),
            },
        }
    }

    async fn load(&self, id: WalletId) -> Result<Wallet, RepositoryError> {
        self.storage
            .load_state::<WalletSnapshot>(wallet_stream(id))
            .await?
            .map(Wallet::reconstitute)
            .ok_or_else(|| RepositoryError::NotFound(format!("wallet {id}")))
    }
}

impl WalletRepository for InMemoryWalletRepository {
    fn find_by_id(&self, id: WalletId) -> RepositoryFuture<'_, Wallet> {
        Box::pin(self.load(id))
    }

    fn find_by_user_id(&self, user_id: UserId) -> RepositoryFuture<'_, Wallet> {
        Box::pin(async move {
            match self.storage.lookup::<WalletId>(owner_key(user_id)).await? {
                (Some(id), _) => self.load(id).await,
                (None, _) => Err(RepositoryError::NotFound(format!("wallet of user {user_id}"))),
            }
        })
    }

    fn exists_for_user(&self, user_id: UserId) -> RepositoryFuture<'_, bool> {
        Box::pin(async move {
            match self.storage.lookup::<WalletId>(owner_key(user_id)).await? {
                (Some(id), _) => self.storage.has_state(wallet_stream(id)).await,
                (None, _) => Ok(false),
            }
        })
    }

    fn save<'a>(&'a self, wallet: &'a mut Wallet) -> RepositoryFuture<'a, ()> {
        Box::pin(async move {
            if !wallet.has_changes() {
                return Ok(());
            }

            if wallet.persisted_version().is_none() {
                self.storage
                    .claim(owner_key(wallet.user_id()), wallet.id(), |id| wallet_stream(*id))
                    .await?;
            }

            let state = bincode::serialize(&wallet.snapshot())?;
            let committed = self.storage.commit(wallet, state).await?;

            self.storage.publish(&committed).await;
            Ok(())
        })
    }
}

/// Circle repository over an event store and event bus.
pub struct InMemoryCircleRepository {
    storage: AggregateStorage,
}

impl InMemoryCircleRepository {
    /// Create a repository publishing to `topic`.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, bus: Arc<dyn EventBus>, topic: impl Into<String>) -> Self {
        Self {
            storage: AggregateStorage {
                store,
                bus,
                topic: topic.into(),
            },
        }
    }

    async fn load(&self, id: CircleId) -> Result<Circle, RepositoryError> {
        self.storage
            .load_state::<CircleSnapshot>(circle_stream(id))
            .await?
            .map(Circle::reconstitute)
            .ok_or_else(|| RepositoryError::NotFound(format!("circle {id}")))
    }
}

impl CircleRepository for InMemoryCircleRepository {
    fn find_by_id(&self, id: CircleId) -> RepositoryFuture<'_, Circle> {
        Box::pin(self.load(id))
    }

    fn find_by_invite_code(&self, code: &str) -> RepositoryFuture<'_, Circle> {
        let code = code.to_string();
        Box::pin(async move {
            match self.storage.lookup::<CircleId>(invite_key(&code)).await? {
                (Some(id), _) => self.load(id).await,
                (None, _) => Err(RepositoryError::NotFound(format!("invite code {code}"))),
            }
        })
    }

    fn save<'a>(&'a self, circle: &'a mut Circle) -> RepositoryFuture<'a, ()> {
        Box::pin(async move {
            if !circle.has_changes() {
                return Ok(());
            }

            let new_code = circle
                .invite_code()
                .filter(|_| circle.persisted_version().is_none())
                .map(str::to_string);
            if let Some(code) = new_code {
                self.storage
                    .claim(invite_key(&code), circle.id(), |id| circle_stream(*id))
                    .await?;
            }

            let state = bincode::serialize(&circle.snapshot())?;
            let committed = self.storage.commit(circle, state).await?;

            self.storage.publish(&committed).await;
            Ok(())
        })
    }
}
