//! Application service: load, run one business method, save.
//!
//! Every update reloads the aggregate, applies exactly one closure and saves.
//! A save that loses the version race is retried with backoff; domain errors
//! return at once and nothing is written.

use crate::circle::{Circle, CircleError, NewCircle};
use crate::config::LedgerConfig;
use crate::repository::{
    CircleRepository, InMemoryCircleRepository, InMemoryWalletRepository, RepositoryError,
    WalletRepository,
};
use crate::retry::{RetryPolicy, retry_with_predicate};
use crate::types::{CircleId, UserId, WalletId};
use crate::wallet::{Wallet, WalletError};
use hustlex_core::environment::Clock;
use hustlex_core::event_bus::EventBus;
use hustlex_core::event_store::EventStore;
use hustlex_core::money::Currency;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by [`LedgerService`].
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The wallet rejected the operation.
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// The circle rejected the operation.
    #[error(transparent)]
    Circle(#[from] CircleError),

    /// Loading or saving failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The user already owns a wallet.
    #[error("User {0} already has a wallet")]
    WalletExists(UserId),
}

impl ServiceError {
    const fn is_conflict(&self) -> bool {
        matches!(self, Self::Repository(e) if e.is_conflict())
    }
}

/// Orchestrates wallet and circle commands over their repositories.
#[derive(Clone)]
pub struct LedgerService {
    wallets: Arc<dyn WalletRepository>,
    circles: Arc<dyn CircleRepository>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl LedgerService {
    /// Create a service over the given repositories.
    #[must_use]
    pub fn new(
        wallets: Arc<dyn WalletRepository>,
        circles: Arc<dyn CircleRepository>,
        clock: Arc<dyn Clock>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            wallets,
            circles,
            clock,
            config,
        }
    }

    /// Create a service with event-store backed repositories publishing to the
    /// configured topics.
    #[must_use]
    pub fn with_event_store(
        store: Arc<dyn EventStore>,
        bus: Arc<dyn EventBus>,
        clock: Arc<dyn Clock>,
        config: LedgerConfig,
    ) -> Self {
        let wallets = InMemoryWalletRepository::new(
            Arc::clone(&store),
            Arc::clone(&bus),
            config.wallet_topic.clone(),
        );
        let circles = InMemoryCircleRepository::new(store, bus, config.circle_topic.clone());
        Self::new(Arc::new(wallets), Arc::new(circles), clock, config)
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Open and store a wallet for `user_id`.
    ///
    /// # Errors
    ///
    /// `WalletExists` if the user already owns one, or a repository error.
    pub async fn open_wallet(&self, user_id: UserId, currency: Currency) -> Result<Wallet, ServiceError> {
        if self.wallets.exists_for_user(user_id).await? {
            return Err(ServiceError::WalletExists(user_id));
        }

        let mut wallet = Wallet::open(user_id, currency, self.clock.as_ref());
        self.wallets.save(&mut wallet).await.map_err(|e| match e {
            RepositoryError::AlreadyExists(_) => ServiceError::WalletExists(user_id),
            other => ServiceError::Repository(other),
        })?;

        tracing::info!(wallet_id = %wallet.id(), user_id = %user_id, currency = %currency, "Wallet opened");
        Ok(wallet)
    }

    /// Load a wallet.
    ///
    /// # Errors
    ///
    /// `NotFound` if the wallet does not exist.
    pub async fn wallet(&self, id: WalletId) -> Result<Wallet, ServiceError> {
        Ok(self.wallets.find_by_id(id).await?)
    }

    /// Load a user's wallet.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user has no wallet.
    pub async fn wallet_for_user(&self, user_id: UserId) -> Result<Wallet, ServiceError> {
        Ok(self.wallets.find_by_user_id(user_id).await?)
    }

    /// Apply `command` to the stored wallet and save it.
    ///
    /// `command` may run more than once when saves conflict; each run sees a
    /// freshly loaded wallet.
    ///
    /// # Errors
    ///
    /// The command's `WalletError`, or a repository error once retries are
    /// exhausted.
    pub async fn update_wallet<T, F>(&self, id: WalletId, command: F) -> Result<T, ServiceError>
    where
        F: Fn(&mut Wallet, &dyn Clock) -> Result<T, WalletError>,
    {
        let command = &command;
        retry_with_predicate(
            self.retry_policy(),
            || async move {
                let mut wallet = self.wallets.find_by_id(id).await?;
                let output = command(&mut wallet, self.clock.as_ref())?;
                self.wallets
                    .save(&mut wallet)
                    .await
                    .inspect_err(|e| record_conflict(e, "wallet"))?;
                Ok::<T, ServiceError>(output)
            },
            ServiceError::is_conflict,
        )
        .await
    }

    /// Create and store a circle with `creator` as admin.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for unusable parameters, or a repository error.
    pub async fn create_circle(&self, params: NewCircle, creator: UserId) -> Result<Circle, ServiceError> {
        let mut circle = Circle::create(params, creator, self.clock.as_ref(), self.config.circle)?;
        self.circles.save(&mut circle).await?;

        tracing::info!(circle_id = %circle.id(), creator = %creator, "Circle created");
        Ok(circle)
    }

    /// Load a circle.
    ///
    /// # Errors
    ///
    /// `NotFound` if the circle does not exist.
    pub async fn circle(&self, id: CircleId) -> Result<Circle, ServiceError> {
        Ok(self.circles.find_by_id(id).await?)
    }

    /// Load a circle by invite code.
    ///
    /// # Errors
    ///
    /// `NotFound` if no circle uses the code.
    pub async fn circle_by_invite_code(&self, code: &str) -> Result<Circle, ServiceError> {
        Ok(self.circles.find_by_invite_code(code).await?)
    }

    /// Apply `command` to the stored circle and save it.
    ///
    /// # Errors
    ///
    /// The command's `CircleError`, or a repository error once retries are
    /// exhausted.
    pub async fn update_circle<T, F>(&self, id: CircleId, command: F) -> Result<T, ServiceError>
    where
        F: Fn(&mut Circle, &dyn Clock) -> Result<T, CircleError>,
    {
        let command = &command;
        retry_with_predicate(
            self.retry_policy(),
            || async move {
                let mut circle = self.circles.find_by_id(id).await?;
                let output = command(&mut circle, self.clock.as_ref())?;
                self.circles
                    .save(&mut circle)
                    .await
                    .inspect_err(|e| record_conflict(e, "circle"))?;
                Ok::<T, ServiceError>(output)
            },
            ServiceError::is_conflict,
        )
        .await
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(self.config.retry)
    }
}

fn record_conflict(error: &RepositoryError, aggregate: &'static str) {
    if error.is_conflict() {
        metrics::counter!("ledger.save_conflicts", "aggregate" => aggregate).increment(1);
        tracing::debug!(aggregate, error = %error, "Save lost the version race");
    }
}
