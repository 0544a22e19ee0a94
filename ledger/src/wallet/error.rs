use hustlex_core::money::{Currency, MoneyError};
use thiserror::Error;

/// Errors returned by [`Wallet`](super::Wallet) operations.
///
/// Every error is produced before any state is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Amount was zero.
    #[error("Amount must be positive")]
    InvalidAmount,

    /// Amount is not in the wallet's currency.
    #[error("Currency mismatch: wallet holds {expected}, got {actual}")]
    CurrencyMismatch {
        /// The wallet's currency
        expected: Currency,
        /// The currency supplied
        actual: Currency,
    },

    /// Available balance is below the requested amount (fee included).
    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds {
        /// Available balance in minor units
        available: u64,
        /// Required amount in minor units
        required: u64,
    },

    /// Escrow balance is below the release amount.
    #[error("Insufficient escrow balance: escrow {escrow}, requested {requested}")]
    InsufficientEscrow {
        /// Escrow balance in minor units
        escrow: u64,
        /// Requested amount in minor units
        requested: u64,
    },

    /// Savings balance is below the withdrawal amount.
    #[error("Insufficient savings balance: savings {savings}, requested {requested}")]
    InsufficientSavings {
        /// Savings balance in minor units
        savings: u64,
        /// Requested amount in minor units
        requested: u64,
    },

    /// Wallet is locked.
    #[error("Wallet is locked")]
    WalletLocked,

    /// Wallet is suspended.
    #[error("Wallet is suspended")]
    WalletSuspended,

    /// Balance arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl WalletError {
    /// Stable identifier for API error mapping.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::InsufficientEscrow { .. } => "INSUFFICIENT_ESCROW",
            Self::InsufficientSavings { .. } => "INSUFFICIENT_SAVINGS",
            Self::WalletLocked => "WALLET_LOCKED",
            Self::WalletSuspended => "WALLET_SUSPENDED",
            Self::Money(MoneyError::CurrencyMismatch { .. }) => "CURRENCY_MISMATCH",
            Self::Money(_) => "AMOUNT_OUT_OF_RANGE",
        }
    }
}
