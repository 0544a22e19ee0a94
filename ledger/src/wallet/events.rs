use crate::types::{UserId, WalletId};
use chrono::{DateTime, Utc};
use hustlex_core::event::Event;
use hustlex_core::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// Facts recorded by the wallet aggregate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletEvent {
    /// A wallet was opened for a user.
    WalletCreated {
        /// Wallet
        wallet_id: WalletId,
        /// Owner
        user_id: UserId,
        /// Fixed currency of every balance
        currency: Currency,
        /// When
        created_at: DateTime<Utc>,
    },

    /// Funds entered the wallet.
    WalletCredited {
        /// Wallet
        wallet_id: WalletId,
        /// Owner
        user_id: UserId,
        /// Amount credited
        amount: Money,
        /// Where the money came from (e.g. `bank_transfer`)
        source: String,
        /// External reference
        reference: String,
        /// Free-form description
        description: String,
        /// Available balance afterwards
        new_available: Money,
        /// When
        credited_at: DateTime<Utc>,
    },

    /// Funds left the wallet.
    WalletDebited {
        /// Wallet
        wallet_id: WalletId,
        /// Owner
        user_id: UserId,
        /// Amount sent, fee excluded
        amount: Money,
        /// Fee charged on top of `amount`
        fee: Money,
        /// Where the money went
        destination: String,
        /// External reference
        reference: String,
        /// Free-form description
        description: String,
        /// Available balance afterwards
        new_available: Money,
        /// When
        debited_at: DateTime<Utc>,
    },

    /// Funds were earmarked for a pending obligation.
    FundsHeldInEscrow {
        /// Wallet
        wallet_id: WalletId,
        /// Owner
        user_id: UserId,
        /// Amount held
        amount: Money,
        /// External reference
        reference: String,
        /// Why the funds are held
        reason: String,
        /// Available balance afterwards
        new_available: Money,
        /// Escrow balance afterwards
        new_escrow: Money,
        /// When
        held_at: DateTime<Utc>,
    },

    /// Escrowed funds were released, either back home or to a counterparty.
    FundsReleasedFromEscrow {
        /// Wallet
        wallet_id: WalletId,
        /// Owner
        user_id: UserId,
        /// Amount released
        amount: Money,
        /// External reference
        reference: String,
        /// `true` if the funds returned to the available balance
        to_wallet: bool,
        /// Counterparty for an external release
        recipient_id: Option<String>,
        /// Escrow balance afterwards
        new_escrow: Money,
        /// When
        released_at: DateTime<Utc>,
    },

    /// The wallet was locked.
    WalletLocked {
        /// Wallet
        wallet_id: WalletId,
        /// Owner
        user_id: UserId,
        /// Why
        reason: String,
        /// When
        locked_at: DateTime<Utc>,
    },

    /// The wallet was unlocked.
    WalletUnlocked {
        /// Wallet
        wallet_id: WalletId,
        /// Owner
        user_id: UserId,
        /// When
        unlocked_at: DateTime<Utc>,
    },

    /// The wallet was administratively suspended.
    WalletSuspended {
        /// Wallet
        wallet_id: WalletId,
        /// Owner
        user_id: UserId,
        /// Why
        reason: String,
        /// When
        suspended_at: DateTime<Utc>,
    },

    /// A transaction PIN was set or replaced.
    TransactionPinSet {
        /// Wallet
        wallet_id: WalletId,
        /// Owner
        user_id: UserId,
        /// When
        set_at: DateTime<Utc>,
    },
}

impl WalletEvent {
    /// Wallet the event belongs to.
    #[must_use]
    pub const fn wallet_id(&self) -> WalletId {
        match self {
            Self::WalletCreated { wallet_id, .. }
            | Self::WalletCredited { wallet_id, .. }
            | Self::WalletDebited { wallet_id, .. }
            | Self::FundsHeldInEscrow { wallet_id, .. }
            | Self::FundsReleasedFromEscrow { wallet_id, .. }
            | Self::WalletLocked { wallet_id, .. }
            | Self::WalletUnlocked { wallet_id, .. }
            | Self::WalletSuspended { wallet_id, .. }
            | Self::TransactionPinSet { wallet_id, .. } => *wallet_id,
        }
    }
}

impl Event for WalletEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::WalletCreated { .. } => "WalletCreated.v1",
            Self::WalletCredited { .. } => "WalletCredited.v1",
            Self::WalletDebited { .. } => "WalletDebited.v1",
            Self::FundsHeldInEscrow { .. } => "FundsHeldInEscrow.v1",
            Self::FundsReleasedFromEscrow { .. } => "FundsReleasedFromEscrow.v1",
            Self::WalletLocked { .. } => "WalletLocked.v1",
            Self::WalletUnlocked { .. } => "WalletUnlocked.v1",
            Self::WalletSuspended { .. } => "WalletSuspended.v1",
            Self::TransactionPinSet { .. } => "TransactionPINSet.v1",
        }
    }
}
