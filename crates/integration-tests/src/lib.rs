//! Integration test support for PAM-TALK checkout.
//!
//! Provides scriptable in-memory implementations of the checkout ports so
//! the orchestrator can be driven end to end without a ledger node or an
//! order service:
//!
//! - [`FakeLedger`] - records every call, scripted balances and failures
//! - [`FakeOrderService`] - scripted success/failure, captures drafts
//! - [`FakeWallet`] - a [`TxnSigner`] over a made-up address
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pamtalk-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use rust_decimal::Decimal;
use secrecy::SecretString;

use pamtalk_checkout::cart::{CartStore, InMemoryStore};
use pamtalk_checkout::config::CheckoutConfig;
use pamtalk_checkout::ledger::{
    LedgerClient, LedgerError, SignError, TransferParams, TxnSigner,
};
use pamtalk_checkout::orders::{OrderDraft, OrderReceipt, OrderRecorder, OrderServiceError};
use pamtalk_core::{AssetId, DcRate, OrderId, OrderStatus, ProductId, TokenAmount, TxId, WalletAddress};

/// Install a test subscriber so `RUST_LOG` controls checkout tracing
/// during test runs. Safe to call from every test; only the first call
/// installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A 58-character ledger address built from one repeated base32 character.
#[must_use]
pub fn test_address(seed: char) -> WalletAddress {
    let raw: String = std::iter::repeat_n(seed, WalletAddress::LENGTH).collect();
    WalletAddress::parse(&raw).unwrap()
}

/// Checkout configuration pointing at nothing in particular; the fakes
/// never touch the network.
#[must_use]
pub fn test_config() -> CheckoutConfig {
    CheckoutConfig {
        algod_url: "http://localhost:4001".parse().unwrap(),
        algod_token: SecretString::from("integration-test-token"),
        order_service_url: "http://localhost:8080".parse().unwrap(),
        dc_asset_id: AssetId::new(31_566_704),
        dc_rate: DcRate::new(Decimal::from(100)).unwrap(),
        confirm_rounds: 4,
    }
}

/// A cart preloaded with one standard line: 2 x 5000 KRW apples.
#[must_use]
pub fn seeded_cart() -> CartStore<InMemoryStore> {
    let mut cart = CartStore::open(InMemoryStore::new()).unwrap();
    cart.add_item(
        ProductId::new("p1"),
        "Organic apples 1kg",
        Decimal::from(5000),
        2,
    )
    .unwrap();
    cart
}

/// A signer over a fixed test address. Produces placeholder signature
/// bytes; the fakes never verify them.
#[derive(Debug)]
pub struct FakeWallet {
    address: WalletAddress,
}

impl FakeWallet {
    #[must_use]
    pub fn new(seed: char) -> Self {
        Self {
            address: test_address(seed),
        }
    }
}

impl TxnSigner for FakeWallet {
    fn address(&self) -> &WalletAddress {
        &self.address
    }

    fn sign_transfer(&self, _params: &TransferParams) -> Result<Vec<u8>, SignError> {
        Ok(vec![0xAB; 64])
    }
}

/// Which ledger step, if any, should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedgerFailure {
    /// Everything succeeds.
    #[default]
    None,
    /// Opt-in submissions fail.
    OptIn,
    /// Confirmation waits time out.
    Confirmation,
}

/// A scripted in-memory ledger that records every call in order.
#[derive(Debug)]
pub struct FakeLedger {
    opted_in: bool,
    balance: AtomicU64,
    failure: LedgerFailure,
    calls: Mutex<Vec<String>>,
    next_tx: AtomicU64,
}

impl FakeLedger {
    #[must_use]
    pub fn new(opted_in: bool, balance: u64) -> Self {
        Self {
            opted_in,
            balance: AtomicU64::new(balance),
            failure: LedgerFailure::None,
            calls: Mutex::new(Vec::new()),
            next_tx: AtomicU64::new(1),
        }
    }

    /// Script a failing step.
    #[must_use]
    pub const fn failing(mut self, failure: LedgerFailure) -> Self {
        self.failure = failure;
        self
    }

    /// The calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

impl LedgerClient for FakeLedger {
    async fn is_opted_in(
        &self,
        address: &WalletAddress,
        _asset_id: AssetId,
    ) -> Result<bool, LedgerError> {
        self.record(format!("is_opted_in:{address}"));
        Ok(self.opted_in)
    }

    async fn opt_in(
        &self,
        signer: &dyn TxnSigner,
        _asset_id: AssetId,
    ) -> Result<TxId, LedgerError> {
        self.record(format!("opt_in:{}", signer.address()));
        if self.failure == LedgerFailure::OptIn {
            return Err(LedgerError::Rejected {
                reason: "opt-in rejected".to_owned(),
            });
        }
        Ok(TxId::new("OPTIN-TX"))
    }

    async fn balance(
        &self,
        address: &WalletAddress,
        _asset_id: AssetId,
    ) -> Result<TokenAmount, LedgerError> {
        self.record(format!("balance:{address}"));
        Ok(TokenAmount::new(self.balance.load(Ordering::SeqCst)))
    }

    async fn transfer(
        &self,
        signer: &dyn TxnSigner,
        to: &WalletAddress,
        amount: TokenAmount,
        _asset_id: AssetId,
        _note: &[u8],
    ) -> Result<TxId, LedgerError> {
        self.record(format!(
            "transfer:{}->{}:{}",
            signer.address(),
            to,
            amount.as_u64()
        ));
        self.balance.fetch_sub(amount.as_u64(), Ordering::SeqCst);
        let n = self.next_tx.fetch_add(1, Ordering::SeqCst);
        Ok(TxId::new(format!("TX{n:03}")))
    }

    async fn wait_for_confirmation(
        &self,
        tx_id: &TxId,
        max_rounds: u32,
    ) -> Result<u64, LedgerError> {
        self.record(format!("wait_for_confirmation:{tx_id}"));
        if self.failure == LedgerFailure::Confirmation {
            return Err(LedgerError::ConfirmationTimeout { rounds: max_rounds });
        }
        Ok(41_000_007)
    }
}

/// A scripted order service that captures every submitted draft.
#[derive(Debug)]
pub struct FakeOrderService {
    fail_with_status: Option<u16>,
    drafts: Mutex<Vec<OrderDraft>>,
    next_order: AtomicU64,
}

impl FakeOrderService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fail_with_status: None,
            drafts: Mutex::new(Vec::new()),
            next_order: AtomicU64::new(1),
        }
    }

    /// Script every submission to fail with the given HTTP status.
    #[must_use]
    pub const fn failing(mut self, status: u16) -> Self {
        self.fail_with_status = Some(status);
        self
    }

    /// Drafts submitted so far.
    #[must_use]
    pub fn drafts(&self) -> Vec<OrderDraft> {
        self.drafts.lock().unwrap().clone()
    }
}

impl Default for FakeOrderService {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderRecorder for FakeOrderService {
    async fn create_order(&self, draft: &OrderDraft) -> Result<OrderReceipt, OrderServiceError> {
        self.drafts.lock().unwrap().push(draft.clone());
        if let Some(status) = self.fail_with_status {
            return Err(OrderServiceError::Api {
                status,
                message: "scripted failure".to_owned(),
            });
        }
        let n = self.next_order.fetch_add(1, Ordering::SeqCst);
        Ok(OrderReceipt {
            order_id: OrderId::new(format!("ord-{n:04}")),
            status: OrderStatus::Pending,
            carbon_saved_kg: Some(Decimal::new(8, 1)),
        })
    }
}
