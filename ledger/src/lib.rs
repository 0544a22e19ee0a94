//! # HustleX Ledger
//!
//! The two money-carrying state machines of HustleX:
//!
//! - [`wallet::Wallet`]: per-user balance accounting with escrow and savings
//!   sub-accounts, lock/suspend states and PIN lockout
//! - [`circle::Circle`]: a rotating savings circle (Ajo/Esusu) with scheduled
//!   contributions, late fees and round-based payout rotation
//!
//! Both aggregates are synchronous, perform no I/O and take the current time
//! from an injected [`Clock`]. Each successful business method bumps the
//! aggregate's version once and records its events in a pending buffer.
//! Persistence and publication happen in [`repository`], and
//! [`service::LedgerService`] wraps load → command → save with retry on
//! version conflicts.
//!
//! ## Example
//!
//! ```
//! use hustlex_core::environment::SystemClock;
//! use hustlex_core::money::{Currency, Money};
//! use hustlex_ledger::types::UserId;
//! use hustlex_ledger::wallet::{EscrowRelease, Wallet};
//!
//! let clock = SystemClock;
//! let mut wallet = Wallet::open(UserId::new(), Currency::Ngn, &clock);
//! let ngn = |amount| Money::new(amount, Currency::Ngn);
//!
//! wallet.credit(ngn(10_000), "bank_transfer", "DEP-1", "Top up", &clock)?;
//! wallet.hold_in_escrow(ngn(4_000), "GIG-7", "Gig payment", &clock)?;
//! wallet.release_from_escrow(
//!     ngn(4_000),
//!     "GIG-7",
//!     EscrowRelease::ToRecipient("freelancer".to_string()),
//!     &clock,
//! )?;
//!
//! assert_eq!(wallet.available_balance(), ngn(6_000));
//! assert_eq!(wallet.ledger_balance(), ngn(6_000));
//! # Ok::<(), hustlex_ledger::wallet::WalletError>(())
//! ```

pub mod circle;
pub mod config;
pub mod repository;
pub mod retry;
pub mod service;
pub mod types;
pub mod wallet;

pub use circle::{Circle, CircleError, CircleEvent, CircleStatus, NewCircle};
pub use config::{CirclePolicy, LedgerConfig, RetryConfig};
pub use hustlex_core::aggregate::AggregateRoot;
pub use hustlex_core::environment::Clock;
pub use repository::{CircleRepository, RepositoryError, WalletRepository};
pub use service::{LedgerService, ServiceError};
pub use types::{CircleId, ContributionId, MemberId, TransactionId, UserId, WalletId};
pub use wallet::{Wallet, WalletError, WalletEvent, WalletStatus};
