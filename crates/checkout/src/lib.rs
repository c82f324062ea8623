//! PAM-TALK Checkout - marketplace checkout orchestration.
//!
//! This crate sequences a farm-to-consumer purchase from cart to recorded
//! order: cart snapshot, pricing (with committee-issued coupons), payment
//! through cash or the DC reward-token ledger, and order submission to the
//! remote order service.
//!
//! # Architecture
//!
//! External collaborators sit behind ports so the orchestrator can be tested
//! against in-memory fakes:
//!
//! - [`cart::KeyValueStore`] - cart persistence
//! - [`ledger::LedgerClient`] / [`ledger::TxnSigner`] - token ledger access
//!   and transaction signing
//! - [`orders::OrderRecorder`] - remote order persistence
//! - [`ports::CheckoutPrompt`] / [`ports::CheckoutNotifier`] - user-facing
//!   confirmation and progress feedback
//!
//! The production adapters are [`ledger::AlgodClient`] (algod v2 REST) and
//! [`orders::OrderServiceClient`] (order service REST).
//!
//! # Example
//!
//! ```rust,ignore
//! use pamtalk_checkout::config::CheckoutConfig;
//! use pamtalk_checkout::orchestrator::{CheckoutFlow, CheckoutRequest, PaymentChoice};
//!
//! let config = CheckoutConfig::from_env()?;
//! let ledger = AlgodClient::new(&config)?;
//! let orders = OrderServiceClient::new(&config)?;
//! let flow = CheckoutFlow::new(cart, ledger, orders, prompt, notifier, &config);
//!
//! let receipt = flow
//!     .begin(CheckoutRequest {
//!         customer: CustomerId::new("u-1024"),
//!         coupon: None,
//!         method: PaymentChoice::Token { signer: &wallet, recipient: farm_addr },
//!         cancel: None,
//!     })
//!     .await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod orders;
pub mod payment;
pub mod ports;
pub mod pricing;

pub use error::CheckoutError;
pub use orchestrator::{CheckoutFlow, CheckoutReceipt, CheckoutRequest, PaymentChoice};
