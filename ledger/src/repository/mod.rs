//! Persistence contracts for the ledger aggregates.
//!
//! A repository stores an aggregate's snapshot and its pending events in one
//! step. Writes are guarded by the aggregate's version: a save succeeds only if
//! the stored version still equals the version the aggregate was loaded at.
//! Losing writers get [`RepositoryError::ConcurrentModification`] and must
//! reload and retry (see [`crate::service::LedgerService`]).

mod in_memory;

pub use in_memory::{InMemoryCircleRepository, InMemoryWalletRepository};

use crate::circle::Circle;
use crate::types::{CircleId, UserId, WalletId};
use crate::wallet::Wallet;
use hustlex_core::event::EventError;
use hustlex_core::event_store::EventStoreError;
use hustlex_core::stream::Version;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// No aggregate with the requested identity.
    #[error("Aggregate not found: {0}")]
    NotFound(String),

    /// Another writer saved the aggregate since it was loaded.
    #[error("Concurrent modification: expected version {expected}, found {actual}")]
    ConcurrentModification {
        /// Version the aggregate was loaded at
        expected: Version,
        /// Version currently stored
        actual: Version,
    },

    /// A new aggregate collides with a stored one.
    #[error("Aggregate already exists: {0}")]
    AlreadyExists(String),

    /// The event store failed.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// Snapshot or event encoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepositoryError {
    /// `true` for the optimistic-concurrency conflict that callers should retry.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrentModification { .. })
    }
}

impl From<EventError> for RepositoryError {
    fn from(error: EventError) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<bincode::Error> for RepositoryError {
    fn from(error: bincode::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Boxed future returned by repository methods.
pub type RepositoryFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, RepositoryError>> + Send + 'a>>;

/// Storage for wallets.
///
/// # Dyn Compatibility
///
/// Methods return boxed futures so services can hold an `Arc<dyn WalletRepository>`.
pub trait WalletRepository: Send + Sync {
    /// Load a wallet by identity.
    ///
    /// # Errors
    ///
    /// `NotFound` if no such wallet is stored.
    fn find_by_id(&self, id: WalletId) -> RepositoryFuture<'_, Wallet>;

    /// Load the wallet owned by a user.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user has no wallet.
    fn find_by_user_id(&self, user_id: UserId) -> RepositoryFuture<'_, Wallet>;

    /// `true` if the user already owns a wallet.
    ///
    /// # Errors
    ///
    /// Storage failures only.
    fn exists_for_user(&self, user_id: UserId) -> RepositoryFuture<'_, bool>;

    /// Store the wallet and hand off its pending events.
    ///
    /// On success the event buffer is empty and the wallet counts as persisted.
    /// On failure the wallet is left untouched.
    ///
    /// # Errors
    ///
    /// `ConcurrentModification` if another writer saved first, `AlreadyExists`
    /// for a second wallet of the same user.
    fn save<'a>(&'a self, wallet: &'a mut Wallet) -> RepositoryFuture<'a, ()>;
}

/// Storage for savings circles.
pub trait CircleRepository: Send + Sync {
    /// Load a circle by identity.
    ///
    /// # Errors
    ///
    /// `NotFound` if no such circle is stored.
    fn find_by_id(&self, id: CircleId) -> RepositoryFuture<'_, Circle>;

    /// Load a circle by its invite code.
    ///
    /// # Errors
    ///
    /// `NotFound` if no circle uses the code.
    fn find_by_invite_code(&self, code: &str) -> RepositoryFuture<'_, Circle>;

    /// Store the circle and hand off its pending events.
    ///
    /// # Errors
    ///
    /// `ConcurrentModification` if another writer saved first, `AlreadyExists`
    /// if the invite code belongs to another circle.
    fn save<'a>(&'a self, circle: &'a mut Circle) -> RepositoryFuture<'a, ()>;
}
