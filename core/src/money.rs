//! Money value type.
//!
//! Amounts are exact integers in the currency's minor unit (kobo for NGN, cents
//! for USD, pesewas for GHS). Every arithmetic operation is checked: mixing
//! currencies, overflowing, or subtracting below zero yields a [`MoneyError`]
//! instead of a wrong balance.
//!
//! # Example
//!
//! ```
//! use hustlex_core::money::{Currency, Money};
//!
//! let price = Money::new(10_000, Currency::Ngn);
//! let fee = Money::new(50, Currency::Ngn);
//! let total = price.checked_add(fee).unwrap();
//! assert_eq!(total.amount(), 10_050);
//! assert_eq!(total.to_string(), "₦100.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced by money arithmetic.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyError {
    /// The two operands carry different currencies.
    #[error("Currency mismatch: {left} vs {right}")]
    CurrencyMismatch {
        /// Currency of the left operand
        left: Currency,
        /// Currency of the right operand
        right: Currency,
    },

    /// The result does not fit in the amount type.
    #[error("Amount overflow")]
    Overflow,

    /// The subtraction would go below zero.
    #[error("Amount underflow: {available} < {requested}")]
    Underflow {
        /// Minor units available
        available: u64,
        /// Minor units requested
        requested: u64,
    },
}

/// Supported currencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// Nigerian Naira
    #[serde(rename = "NGN")]
    Ngn,
    /// US Dollar
    #[serde(rename = "USD")]
    Usd,
    /// Ghanaian Cedi
    #[serde(rename = "GHS")]
    Ghs,
}

impl Currency {
    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Ngn => "NGN",
            Self::Usd => "USD",
            Self::Ghs => "GHS",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Ngn => "₦",
            Self::Usd => "$",
            Self::Ghs => "GH₵",
        }
    }

    /// Name of the minor unit.
    #[must_use]
    pub const fn minor_unit(self) -> &'static str {
        match self {
            Self::Ngn => "kobo",
            Self::Usd => "cents",
            Self::Ghs => "pesewas",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error type for `Currency` parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported currency: {0}")]
pub struct ParseCurrencyError(String);

impl FromStr for Currency {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NGN" => Ok(Self::Ngn),
            "USD" => Ok(Self::Usd),
            "GHS" => Ok(Self::Ghs),
            other => Err(ParseCurrencyError(other.to_string())),
        }
    }
}

/// An exact amount of money in minor units, tagged with its currency.
///
/// Negative amounts are unrepresentable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: u64,
    currency: Currency,
}

impl Money {
    /// Creates a new amount from minor units.
    #[must_use]
    pub const fn new(amount: u64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Amount in minor units.
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.amount
    }

    /// Currency of this amount.
    #[must_use]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// `true` if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// `true` if the amount is greater than zero.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// Checks that `other` is in the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] if the currencies differ.
    pub fn ensure_same_currency(&self, other: &Self) -> Result<(), MoneyError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            })
        }
    }

    /// Adds two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] or [`MoneyError::Overflow`].
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(&other)?;
        self.amount
            .checked_add(other.amount)
            .map(|amount| Self::new(amount, self.currency))
            .ok_or(MoneyError::Overflow)
    }

    /// Subtracts `other` from `self`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] or [`MoneyError::Underflow`]
    /// when `other` is larger than `self`.
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(&other)?;
        self.amount
            .checked_sub(other.amount)
            .map(|amount| Self::new(amount, self.currency))
            .ok_or(MoneyError::Underflow {
                available: self.amount,
                requested: other.amount,
            })
    }

    /// Integer share `amount / divisor`, rounding toward zero.
    ///
    /// A divisor of zero yields zero.
    #[must_use]
    pub const fn fraction(self, divisor: u64) -> Self {
        match self.amount.checked_div(divisor) {
            Some(amount) => Self::new(amount, self.currency),
            None => Self::zero(self.currency),
        }
    }

    /// `true` if `self < other` in the same currency; `false` on mismatch.
    #[must_use]
    pub fn less_than(&self, other: &Self) -> bool {
        self.currency == other.currency && self.amount < other.amount
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}.{:02}",
            self.currency.symbol(),
            self.amount / 100,
            self.amount % 100
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn display_uses_symbol_and_minor_digits() {
        assert_eq!(Money::new(100, Currency::Ngn).to_string(), "₦1.00");
        assert_eq!(Money::new(1050, Currency::Usd).to_string(), "$10.50");
        assert_eq!(Money::new(7, Currency::Ghs).to_string(), "GH₵0.07");
    }

    #[test]
    fn add_rejects_cross_currency() {
        let naira = Money::new(100, Currency::Ngn);
        let dollars = Money::new(100, Currency::Usd);
        assert_eq!(
            naira.checked_add(dollars),
            Err(MoneyError::CurrencyMismatch {
                left: Currency::Ngn,
                right: Currency::Usd,
            })
        );
    }

    #[test]
    fn sub_below_zero_is_underflow() {
        let small = Money::new(10, Currency::Ngn);
        let large = Money::new(11, Currency::Ngn);
        assert_eq!(
            small.checked_sub(large),
            Err(MoneyError::Underflow {
                available: 10,
                requested: 11,
            })
        );
    }

    #[test]
    fn add_overflow_is_reported() {
        let max = Money::new(u64::MAX, Currency::Usd);
        assert_eq!(
            max.checked_add(Money::new(1, Currency::Usd)),
            Err(MoneyError::Overflow)
        );
    }

    #[test]
    fn fraction_truncates() {
        assert_eq!(Money::new(1000, Currency::Ngn).fraction(20).amount(), 50);
        assert_eq!(Money::new(1019, Currency::Ngn).fraction(20).amount(), 50);
        assert_eq!(Money::new(19, Currency::Ngn).fraction(20).amount(), 0);
        assert_eq!(Money::new(19, Currency::Ngn).fraction(0).amount(), 0);
    }

    #[test]
    fn less_than_is_false_across_currencies() {
        let naira = Money::new(1, Currency::Ngn);
        let dollars = Money::new(100, Currency::Usd);
        assert!(!naira.less_than(&dollars));
        assert!(naira.less_than(&Money::new(2, Currency::Ngn)));
    }

    #[test]
    fn currency_parses_case_insensitively() {
        assert_eq!("ngn".parse::<Currency>(), Ok(Currency::Ngn));
        assert_eq!("GHS".parse::<Currency>(), Ok(Currency::Ghs));
        assert!("EUR".parse::<Currency>().is_err());
    }

    proptest! {
        #[test]
        fn add_then_sub_restores(a in 0_u64..1_000_000_000, b in 0_u64..1_000_000_000) {
            let left = Money::new(a, Currency::Ngn);
            let right = Money::new(b, Currency::Ngn);
            let sum = left.checked_add(right);
            prop_assert!(sum.is_ok());
            if let Ok(sum) = sum {
                prop_assert_eq!(sum.checked_sub(right), Ok(left));
            }
        }
    }
}
