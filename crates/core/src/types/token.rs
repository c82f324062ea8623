//! Reward-token (digital coupon) types.
//!
//! PAM-TALK's "DC" reward currency is a ledger asset. These types wrap the
//! raw integers the ledger deals in, plus the currency-to-token conversion
//! rate applied at checkout.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::money::Money;

/// A ledger asset identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(u64);

impl AssetId {
    /// Create a new asset ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A quantity of DC tokens in base units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TokenAmount(u64);

impl TokenAmount {
    /// Create a new token amount.
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// Get the underlying u64 value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} DC", self.0)
    }
}

/// A ledger transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

impl TxId {
    /// Create a new transaction ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the transaction ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur when applying a [`DcRate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateError {
    /// The rate is zero or negative.
    #[error("conversion rate must be positive: {0}")]
    NonPositive(Decimal),
    /// The converted amount does not fit a token count.
    #[error("amount {0} does not convert to a whole token count")]
    Unrepresentable(Decimal),
}

/// Currency-to-token conversion rate: currency units per DC token.
///
/// The rate is configuration, never a hard-coded constant. Conversion
/// rounds up so a purchase is never underpaid in tokens:
/// `tokens = ceil(amount / rate)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DcRate(Decimal);

impl DcRate {
    /// Create a conversion rate.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::NonPositive`] if the rate is zero or negative.
    pub fn new(currency_per_token: Decimal) -> Result<Self, RateError> {
        if currency_per_token <= Decimal::ZERO {
            return Err(RateError::NonPositive(currency_per_token));
        }
        Ok(Self(currency_per_token))
    }

    /// The underlying rate in currency units per token.
    #[must_use]
    pub const fn currency_per_token(&self) -> Decimal {
        self.0
    }

    /// Convert a monetary amount into the token count owed.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::Unrepresentable`] if the ceiling of
    /// `amount / rate` does not fit in a `u64`.
    pub fn tokens_for(&self, amount: &Money) -> Result<TokenAmount, RateError> {
        let tokens = (amount.amount() / self.0).ceil();
        tokens
            .to_u64()
            .map(TokenAmount::new)
            .ok_or(RateError::Unrepresentable(tokens))
    }
}
