//! Core types for PAM-TALK checkout.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod cart;
pub mod coupon;
pub mod id;
pub mod money;
pub mod status;
pub mod token;

pub use address::{WalletAddress, WalletAddressError};
pub use cart::CartItem;
pub use coupon::Coupon;
pub use id::*;
pub use money::{CurrencyCode, Money};
pub use status::*;
pub use token::{AssetId, DcRate, RateError, TokenAmount, TxId};
