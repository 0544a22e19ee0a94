//! Wallet ledger aggregate.
//!
//! A wallet owns one user's funds in a single currency, split across three
//! mutually exclusive pools plus a net-worth figure:
//!
//! | balance     | meaning                                         |
//! |-------------|-------------------------------------------------|
//! | `available` | spendable right now                             |
//! | `escrow`    | earmarked for a pending obligation, still owned |
//! | `savings`   | set aside by the user, still owned              |
//! | `ledger`    | what the wallet actually owns                   |
//!
//! `ledger` mirrors `available + escrow + savings` except after an escrow
//! release to a third party, which is the only operation besides credit and
//! debit that changes it.
//!
//! Every operation validates first and applies second: an error means nothing
//! changed and nothing was recorded.

mod error;
mod events;

pub use error::WalletError;
pub use events::WalletEvent;

use crate::types::{UserId, WalletId};
use chrono::{DateTime, Utc};
use hustlex_core::aggregate::{AggregateRoot, PendingEvents};
use hustlex_core::environment::Clock;
use hustlex_core::money::{Currency, Money};
use hustlex_core::stream::Version;
use serde::{Deserialize, Serialize};

/// Reason recorded when repeated PIN failures lock a wallet.
pub const PIN_LOCKOUT_REASON: &str = "too many failed PIN attempts";

/// Lifecycle status of a wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletStatus {
    /// Accepts every operation
    Active,
    /// Rejects balance mutations until unlocked
    Locked,
    /// Administratively frozen
    Suspended,
}

/// Where escrowed funds go when released.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EscrowRelease {
    /// Back to this wallet's available balance.
    ToWallet,
    /// Paid out to a counterparty outside this wallet.
    ToRecipient(String),
}

/// Persisted state of a wallet, used to store and re-hydrate it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct WalletSnapshot {
    pub id: WalletId,
    pub user_id: UserId,
    pub currency: Currency,
    pub available_balance: Money,
    pub escrow_balance: Money,
    pub savings_balance: Money,
    pub ledger_balance: Money,
    pub status: WalletStatus,
    pub pin_hash: Option<String>,
    pub pin_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
}

/// A user's wallet.
#[derive(Clone, Debug)]
pub struct Wallet {
    id: WalletId,
    user_id: UserId,
    currency: Currency,
    available: Money,
    escrow: Money,
    savings: Money,
    ledger: Money,
    status: WalletStatus,
    pin_hash: Option<String>,
    pin_attempts: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: Version,
    persisted_version: Option<Version>,
    events: PendingEvents<WalletEvent>,
}

impl Wallet {
    /// Open a new, empty, active wallet for `user_id`.
    ///
    /// Records `WalletCreated`.
    #[must_use]
    pub fn open(user_id: UserId, currency: Currency, clock: &dyn Clock) -> Self {
        let now = clock.now();
        let id = WalletId::new();
        let zero = Money::zero(currency);

        let mut events = PendingEvents::new();
        events.record(WalletEvent::WalletCreated {
            wallet_id: id,
            user_id,
            currency,
            created_at: now,
        });

        tracing::debug!(wallet_id = %id, user_id = %user_id, %currency, "Wallet opened");

        Self {
            id,
            user_id,
            currency,
            available: zero,
            escrow: zero,
            savings: zero,
            ledger: zero,
            status: WalletStatus::Active,
            pin_hash: None,
            pin_attempts: 0,
            created_at: now,
            updated_at: now,
            version: Version::new(1),
            persisted_version: None,
            events,
        }
    }

    /// Rebuild a wallet from stored state. Records nothing.
    #[must_use]
    pub fn reconstitute(snapshot: WalletSnapshot) -> Self {
        Self {
            id: snapshot.id,
            user_id: snapshot.user_id,
            currency: snapshot.currency,
            available: snapshot.available_balance,
            escrow: snapshot.escrow_balance,
            savings: snapshot.savings_balance,
            ledger: snapshot.ledger_balance,
            status: snapshot.status,
            pin_hash: snapshot.pin_hash,
            pin_attempts: snapshot.pin_attempts,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            version: snapshot.version,
            persisted_version: Some(snapshot.version),
            events: PendingEvents::new(),
        }
    }

    /// Current state as a storable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> WalletSnapshot {
        WalletSnapshot {
            id: self.id,
            user_id: self.user_id,
            currency: self.currency,
            available_balance: self.available,
            escrow_balance: self.escrow,
            savings_balance: self.savings,
            ledger_balance: self.ledger,
            status: self.status,
            pin_hash: self.pin_hash.clone(),
            pin_attempts: self.pin_attempts,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        }
    }

    /// Add funds to the available and ledger balances.
    ///
    /// # Errors
    ///
    /// `WalletLocked`/`WalletSuspended`, `CurrencyMismatch`, `InvalidAmount`,
    /// or `Money` on overflow.
    pub fn credit(
        &mut self,
        amount: Money,
        source: &str,
        reference: &str,
        description: &str,
        clock: &dyn Clock,
    ) -> Result<(), WalletError> {
        self.ensure_active()?;
        self.ensure_currency(amount)?;
        ensure_positive(amount)?;

        let new_available = self.available.checked_add(amount)?;
        let new_ledger = self.ledger.checked_add(amount)?;

        self.available = new_available;
        self.ledger = new_ledger;
        self.touch(clock);

        tracing::debug!(wallet_id = %self.id, amount = amount.amount(), source, "Wallet credited");

        self.events.record(WalletEvent::WalletCredited {
            wallet_id: self.id,
            user_id: self.user_id,
            amount,
            source: source.to_string(),
            reference: reference.to_string(),
            description: description.to_string(),
            new_available,
            credited_at: self.updated_at,
        });
        Ok(())
    }

    /// Remove `amount + fee` from the available and ledger balances.
    ///
    /// Succeeds when the available balance equals `amount + fee` exactly.
    ///
    /// # Errors
    ///
    /// `WalletLocked`/`WalletSuspended`, `CurrencyMismatch` (amount or fee),
    /// `InvalidAmount`, `InsufficientFunds`, or `Money` on overflow.
    pub fn debit(
        &mut self,
        amount: Money,
        destination: &str,
        reference: &str,
        description: &str,
        fee: Money,
        clock: &dyn Clock,
    ) -> Result<(), WalletError> {
        self.ensure_active()?;
        self.ensure_currency(amount)?;
        self.ensure_currency(fee)?;
        ensure_positive(amount)?;

        let total = amount.checked_add(fee)?;
        if self.available.less_than(&total) {
            return Err(WalletError::InsufficientFunds {
                available: self.available.amount(),
                required: total.amount(),
            });
        }
        let new_available = self.available.checked_sub(total)?;
        let new_ledger = self.ledger.checked_sub(total)?;

        self.available = new_available;
        self.ledger = new_ledger;
        self.touch(clock);

        tracing::debug!(
            wallet_id = %self.id,
            amount = amount.amount(),
            fee = fee.amount(),
            destination,
            "Wallet debited"
        );

        self.events.record(WalletEvent::WalletDebited {
            wallet_id: self.id,
            user_id: self.user_id,
            amount,
            fee,
            destination: destination.to_string(),
            reference: reference.to_string(),
            description: description.to_string(),
            new_available,
            debited_at: self.updated_at,
        });
        Ok(())
    }

    /// Move funds from available into escrow. The ledger balance is unchanged.
    ///
    /// # Errors
    ///
    /// `WalletLocked`/`WalletSuspended`, `CurrencyMismatch`, `InvalidAmount`,
    /// `InsufficientFunds`, or `Money` on overflow.
    pub fn hold_in_escrow(
        &mut self,
        amount: Money,
        reference: &str,
        reason: &str,
        clock: &dyn Clock,
    ) -> Result<(), WalletError> {
        self.ensure_active()?;
        self.ensure_currency(amount)?;
        ensure_positive(amount)?;

        if self.available.less_than(&amount) {
            return Err(WalletError::InsufficientFunds {
                available: self.available.amount(),
                required: amount.amount(),
            });
        }
        let new_available = self.available.checked_sub(amount)?;
        let new_escrow = self.escrow.checked_add(amount)?;

        self.available = new_available;
        self.escrow = new_escrow;
        self.touch(clock);

        tracing::debug!(wallet_id = %self.id, amount = amount.amount(), reason, "Funds held in escrow");

        self.events.record(WalletEvent::FundsHeldInEscrow {
            wallet_id: self.id,
            user_id: self.user_id,
            amount,
            reference: reference.to_string(),
            reason: reason.to_string(),
            new_available,
            new_escrow,
            held_at: self.updated_at,
        });
        Ok(())
    }

    /// Release escrowed funds.
    ///
    /// - [`EscrowRelease::ToWallet`]: escrow → available, ledger unchanged.
    /// - [`EscrowRelease::ToRecipient`]: escrow and ledger shrink, available
    ///   is untouched (the amount already left it when it was held).
    ///
    /// Allowed on locked and suspended wallets so committed settlements can
    /// complete.
    ///
    /// # Errors
    ///
    /// `CurrencyMismatch`, `InvalidAmount`, `InsufficientEscrow`, or `Money`.
    pub fn release_from_escrow(
        &mut self,
        amount: Money,
        reference: &str,
        target: EscrowRelease,
        clock: &dyn Clock,
    ) -> Result<(), WalletError> {
        self.ensure_currency(amount)?;
        ensure_positive(amount)?;

        if self.escrow.less_than(&amount) {
            return Err(WalletError::InsufficientEscrow {
                escrow: self.escrow.amount(),
                requested: amount.amount(),
            });
        }
        let new_escrow = self.escrow.checked_sub(amount)?;
        let (new_available, new_ledger, recipient_id) = match target {
            EscrowRelease::ToWallet => (self.available.checked_add(amount)?, self.ledger, None),
            EscrowRelease::ToRecipient(recipient) => {
                (self.available, self.ledger.checked_sub(amount)?, Some(recipient))
            }
        };
        let to_wallet = recipient_id.is_none();

        self.escrow = new_escrow;
        self.available = new_available;
        self.ledger = new_ledger;
        self.touch(clock);

        tracing::debug!(
            wallet_id = %self.id,
            amount = amount.amount(),
            to_wallet,
            status = ?self.status,
            "Funds released from escrow"
        );

        self.events.record(WalletEvent::FundsReleasedFromEscrow {
            wallet_id: self.id,
            user_id: self.user_id,
            amount,
            reference: reference.to_string(),
            to_wallet,
            recipient_id,
            new_escrow,
            released_at: self.updated_at,
        });
        Ok(())
    }

    /// Move funds from available into savings. Records no event.
    ///
    /// # Errors
    ///
    /// `WalletLocked`/`WalletSuspended`, `CurrencyMismatch`, `InvalidAmount`,
    /// `InsufficientFunds`, or `Money`.
    pub fn move_to_savings(&mut self, amount: Money, clock: &dyn Clock) -> Result<(), WalletError> {
        self.ensure_active()?;
        self.ensure_currency(amount)?;
        ensure_positive(amount)?;

        if self.available.less_than(&amount) {
            return Err(WalletError::InsufficientFunds {
                available: self.available.amount(),
                required: amount.amount(),
            });
        }
        let new_available = self.available.checked_sub(amount)?;
        let new_savings = self.savings.checked_add(amount)?;

        self.available = new_available;
        self.savings = new_savings;
        self.touch(clock);

        tracing::debug!(wallet_id = %self.id, amount = amount.amount(), "Moved to savings");
        Ok(())
    }

    /// Move funds from savings back into available. Records no event.
    ///
    /// # Errors
    ///
    /// `WalletLocked`/`WalletSuspended`, `CurrencyMismatch`, `InvalidAmount`,
    /// `InsufficientSavings`, or `Money`.
    pub fn withdraw_from_savings(
        &mut self,
        amount: Money,
        clock: &dyn Clock,
    ) -> Result<(), WalletError> {
        self.ensure_active()?;
        self.ensure_currency(amount)?;
        ensure_positive(amount)?;

        if self.savings.less_than(&amount) {
            return Err(WalletError::InsufficientSavings {
                savings: self.savings.amount(),
                requested: amount.amount(),
            });
        }
        let new_savings = self.savings.checked_sub(amount)?;
        let new_available = self.available.checked_add(amount)?;

        self.savings = new_savings;
        self.available = new_available;
        self.touch(clock);

        tracing::debug!(wallet_id = %self.id, amount = amount.amount(), "Withdrawn from savings");
        Ok(())
    }

    /// Lock the wallet. Locking a locked wallet records another `WalletLocked`.
    ///
    /// # Errors
    ///
    /// `WalletSuspended` if the wallet is suspended.
    pub fn lock(&mut self, reason: &str, clock: &dyn Clock) -> Result<(), WalletError> {
        if self.status == WalletStatus::Suspended {
            return Err(WalletError::WalletSuspended);
        }
        self.apply_lock(reason, clock);
        Ok(())
    }

    /// Reactivate a locked or suspended wallet and reset the PIN attempt counter.
    ///
    /// On an active wallet only the counter is reset and no event is recorded.
    pub fn unlock(&mut self, clock: &dyn Clock) {
        let was = self.status;
        self.status = WalletStatus::Active;
        self.pin_attempts = 0;
        self.touch(clock);

        if was == WalletStatus::Active {
            return;
        }

        tracing::debug!(wallet_id = %self.id, from = ?was, "Wallet unlocked");

        self.events.record(WalletEvent::WalletUnlocked {
            wallet_id: self.id,
            user_id: self.user_id,
            unlocked_at: self.updated_at,
        });
    }

    /// Suspend an active or locked wallet.
    ///
    /// # Errors
    ///
    /// `WalletSuspended` if the wallet is already suspended.
    pub fn suspend(&mut self, reason: &str, clock: &dyn Clock) -> Result<(), WalletError> {
        if self.status == WalletStatus::Suspended {
            return Err(WalletError::WalletSuspended);
        }

        self.status = WalletStatus::Suspended;
        self.touch(clock);

        tracing::warn!(wallet_id = %self.id, reason, "Wallet suspended");

        self.events.record(WalletEvent::WalletSuspended {
            wallet_id: self.id,
            user_id: self.user_id,
            reason: reason.to_string(),
            suspended_at: self.updated_at,
        });
        Ok(())
    }

    /// Set or replace the transaction PIN hash and reset the attempt counter.
    pub fn set_pin(&mut self, pin_hash: impl Into<String>, clock: &dyn Clock) {
        self.pin_hash = Some(pin_hash.into());
        self.pin_attempts = 0;
        self.touch(clock);

        self.events.record(WalletEvent::TransactionPinSet {
            wallet_id: self.id,
            user_id: self.user_id,
            set_at: self.updated_at,
        });
    }

    /// Count a failed PIN verification.
    ///
    /// Once the counter reaches `max_attempts` an active wallet locks itself.
    /// Returns `true` if this attempt caused the lock.
    pub fn record_failed_pin_attempt(&mut self, max_attempts: u32, clock: &dyn Clock) -> bool {
        self.pin_attempts = self.pin_attempts.saturating_add(1);
        let lockout = self.pin_attempts >= max_attempts && self.status == WalletStatus::Active;

        if lockout {
            tracing::warn!(
                wallet_id = %self.id,
                attempts = self.pin_attempts,
                "PIN attempt limit reached, locking wallet"
            );
            self.apply_lock(PIN_LOCKOUT_REASON, clock);
        } else {
            self.touch(clock);
        }
        lockout
    }

    /// Reset the failed PIN attempt counter.
    pub fn reset_pin_attempts(&mut self, clock: &dyn Clock) {
        self.pin_attempts = 0;
        self.touch(clock);
    }

    /// `available + escrow + savings`, saturating at the largest amount.
    #[must_use]
    pub fn total_balance(&self) -> Money {
        Money::new(
            self.available
                .amount()
                .saturating_add(self.escrow.amount())
                .saturating_add(self.savings.amount()),
            self.currency,
        )
    }

    /// Wallet identity.
    #[must_use]
    pub const fn id(&self) -> WalletId {
        self.id
    }

    /// Owning user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Currency of every balance.
    #[must_use]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// Spendable balance.
    #[must_use]
    pub const fn available_balance(&self) -> Money {
        self.available
    }

    /// Escrowed balance.
    #[must_use]
    pub const fn escrow_balance(&self) -> Money {
        self.escrow
    }

    /// Savings balance.
    #[must_use]
    pub const fn savings_balance(&self) -> Money {
        self.savings
    }

    /// Net-worth balance.
    #[must_use]
    pub const fn ledger_balance(&self) -> Money {
        self.ledger
    }

    /// Lifecycle status.
    #[must_use]
    pub const fn status(&self) -> WalletStatus {
        self.status
    }

    /// Stored PIN hash, if any.
    #[must_use]
    pub fn pin_hash(&self) -> Option<&str> {
        self.pin_hash.as_deref()
    }

    /// `true` once a PIN has been set.
    #[must_use]
    pub const fn has_pin(&self) -> bool {
        self.pin_hash.is_some()
    }

    /// Consecutive failed PIN attempts.
    #[must_use]
    pub const fn pin_attempts(&self) -> u32 {
        self.pin_attempts
    }

    /// Creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time of the last successful mutation.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// `true` if the wallet accepts balance mutations.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == WalletStatus::Active
    }

    /// `true` if the wallet is locked.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.status == WalletStatus::Locked
    }

    /// `true` if the wallet is suspended.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.status == WalletStatus::Suspended
    }

    fn apply_lock(&mut self, reason: &str, clock: &dyn Clock) {
        self.status = WalletStatus::Locked;
        self.touch(clock);

        tracing::debug!(wallet_id = %self.id, reason, "Wallet locked");

        self.events.record(WalletEvent::WalletLocked {
            wallet_id: self.id,
            user_id: self.user_id,
            reason: reason.to_string(),
            locked_at: self.updated_at,
        });
    }

    fn touch(&mut self, clock: &dyn Clock) {
        self.updated_at = clock.now();
        self.version = self.version.next();
    }

    const fn ensure_active(&self) -> Result<(), WalletError> {
        match self.status {
            WalletStatus::Active => Ok(()),
            WalletStatus::Locked => Err(WalletError::WalletLocked),
            WalletStatus::Suspended => Err(WalletError::WalletSuspended),
        }
    }

    fn ensure_currency(&self, amount: Money) -> Result<(), WalletError> {
        if amount.currency() == self.currency {
            Ok(())
        } else {
            Err(WalletError::CurrencyMismatch {
                expected: self.currency,
                actual: amount.currency(),
            })
        }
    }
}

const fn ensure_positive(amount: Money) -> Result<(), WalletError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(WalletError::InvalidAmount)
    }
}

impl AggregateRoot for Wallet {
    type Event = WalletEvent;
    const AGGREGATE_TYPE: &'static str = "wallet";

    fn aggregate_id(&self) -> String {
        self.id.to_string()
    }

    fn version(&self) -> Version {
        self.version
    }

    fn persisted_version(&self) -> Option<Version> {
        self.persisted_version
    }

    fn mark_persisted(&mut self) {
        self.persisted_version = Some(self.version);
    }

    fn pending_events(&self) -> &[WalletEvent] {
        self.events.as_slice()
    }

    fn take_events(&mut self) -> Vec<WalletEvent> {
        self.events.drain()
    }
}
