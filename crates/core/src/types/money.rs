//! Type-safe money representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when constructing a [`Money`] value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is negative.
    #[error("money amount cannot be negative: {0}")]
    Negative(Decimal),
}

/// A monetary amount with currency information.
///
/// Amounts are stored in the currency's standard unit (e.g., won, not
/// jeon) and are always non-negative. PAM-TALK prices default to KRW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit.
    amount: Decimal,
    /// ISO 4217 currency code.
    currency_code: CurrencyCode,
}

impl Money {
    /// Create a new money value.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal, currency_code: CurrencyCode) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative(amount));
        }
        Ok(Self {
            amount,
            currency_code,
        })
    }

    /// Create a KRW money value.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] if the amount is below zero.
    pub fn krw(amount: Decimal) -> Result<Self, MoneyError> {
        Self::new(amount, CurrencyCode::KRW)
    }

    /// Create a money value, clamping a negative amount to zero.
    ///
    /// For amounts that are non-negative by construction (e.g. a pricing
    /// total already floored at zero).
    #[must_use]
    pub fn saturating(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount: amount.max(Decimal::ZERO),
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency_code,
        }
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// The currency code.
    #[must_use]
    pub const fn currency_code(&self) -> CurrencyCode {
        self.currency_code
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency_code.code())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    KRW,
    USD,
    EUR,
}

impl CurrencyCode {
    /// The three-letter ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::KRW => "KRW",
            Self::USD => "USD",
            Self::EUR => "EUR",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_negative() {
        let result = Money::new(Decimal::from(-1), CurrencyCode::KRW);
        assert!(matches!(result, Err(MoneyError::Negative(_))));
    }

    #[test]
    fn test_new_accepts_zero() {
        let money = Money::new(Decimal::ZERO, CurrencyCode::KRW).unwrap();
        assert!(money.is_zero());
    }

    #[test]
    fn test_display() {
        let money = Money::krw(Decimal::from(9000)).unwrap();
        assert_eq!(money.to_string(), "9000 KRW");
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!(CurrencyCode::KRW.code(), "KRW");
        assert_eq!(CurrencyCode::default(), CurrencyCode::KRW);
    }
}
