//! PAM-TALK Core - Shared types library.
//!
//! This crate provides common types used across the PAM-TALK checkout
//! components:
//! - `checkout` - Checkout orchestration library (cart, pricing, payment)
//! - `integration-tests` - End-to-end tests over in-memory collaborators
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no ledger
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, wallet addresses,
//!   token amounts, coupons, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
