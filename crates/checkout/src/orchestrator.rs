//! Checkout orchestrator.
//!
//! Sequences one checkout attempt from cart snapshot to recorded order:
//!
//! ```text
//! Idle -> PricingComputed -> PaymentInProgress
//!      -> {PaymentSucceeded | PaymentFailed}
//!      -> {OrderRecorded | OrderRecordFailed}
//! ```
//!
//! The steps are strictly sequential - each external call is awaited before
//! the next begins, and there is no parallel fan-out. One attempt runs at a
//! time per cart: a second `begin` while one is in flight is rejected, so a
//! double-submitting UI cannot spend tokens twice for the same cart.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use pamtalk_core::{CurrencyCode, CustomerId, Money, OrderId, TxId, WalletAddress};
use rust_decimal::Decimal;

use crate::cart::{CartStore, KeyValueStore};
use crate::config::CheckoutConfig;
use crate::error::CheckoutError;
use crate::ledger::{LedgerClient, TxnSigner};
use crate::orders::{OrderDraft, OrderRecorder};
use crate::payment::{PaymentGateway, PaymentIntent};
use crate::ports::{CancelToken, CheckoutNotifier, CheckoutPrompt};
use crate::pricing;

/// Observable progress of the current (or last) checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutPhase {
    /// No attempt in flight.
    Idle,
    /// Cart snapshot taken and priced.
    PricingComputed,
    /// Payment step running.
    PaymentInProgress,
    /// Payment committed (or skipped for cash).
    PaymentSucceeded,
    /// Payment step failed; attempt terminated.
    PaymentFailed,
    /// Order recorded; attempt succeeded.
    OrderRecorded,
    /// Order recording failed; attempt terminated.
    OrderRecordFailed,
}

/// How the order is paid.
#[derive(Debug)]
pub enum PaymentChoice<'a> {
    /// Settled outside the platform on delivery.
    Cash,
    /// Settled by a DC token transfer.
    Token {
        /// Signer holding the payer's wallet credentials.
        signer: &'a dyn TxnSigner,
        /// Raw recipient address as entered; validated before any ledger
        /// call is made.
        recipient: String,
    },
}

/// One checkout attempt.
#[derive(Debug)]
pub struct CheckoutRequest<'a> {
    /// Customer placing the order.
    pub customer: CustomerId,
    /// Coupon selected at checkout, if any.
    pub coupon: Option<pamtalk_core::Coupon>,
    /// Payment method.
    pub method: PaymentChoice<'a>,
    /// Optional cooperative cancellation, honored until the ledger
    /// submission step begins.
    pub cancel: Option<&'a CancelToken>,
}

/// The successful outcome of a checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutReceipt {
    /// Order identifier assigned by the order service.
    pub order_id: OrderId,
    /// Ledger transaction ID for token payments; `None` for cash.
    pub payment_reference: Option<TxId>,
    /// Post-discount total that was paid.
    pub total: Money,
    /// Carbon savings reported by the order service, when available.
    pub carbon_saved_kg: Option<Decimal>,
}

/// Orchestrates checkout attempts over the injected collaborator ports.
#[derive(Debug)]
pub struct CheckoutFlow<S: KeyValueStore, L, R, P, N> {
    cart: Arc<tokio::sync::Mutex<CartStore<S>>>,
    gateway: PaymentGateway<L>,
    recorder: R,
    prompt: P,
    notifier: N,
    dc_rate: pamtalk_core::DcRate,
    /// Single-flight guard: held for the whole of `begin`.
    flight: tokio::sync::Mutex<()>,
    phase: std::sync::Mutex<CheckoutPhase>,
}

impl<S, L, R, P, N> CheckoutFlow<S, L, R, P, N>
where
    S: KeyValueStore,
    L: LedgerClient,
    R: OrderRecorder,
    P: CheckoutPrompt,
    N: CheckoutNotifier,
{
    /// Create a flow over the given collaborators.
    pub fn new(
        cart: CartStore<S>,
        ledger: L,
        recorder: R,
        prompt: P,
        notifier: N,
        config: &CheckoutConfig,
    ) -> Self {
        Self {
            cart: Arc::new(tokio::sync::Mutex::new(cart)),
            gateway: PaymentGateway::new(ledger, config.dc_asset_id, config.confirm_rounds),
            recorder,
            prompt,
            notifier,
            dc_rate: config.dc_rate,
            flight: tokio::sync::Mutex::new(()),
            phase: std::sync::Mutex::new(CheckoutPhase::Idle),
        }
    }

    /// Shared handle to the cart, for mutations outside a checkout attempt.
    #[must_use]
    pub fn cart(&self) -> Arc<tokio::sync::Mutex<CartStore<S>>> {
        Arc::clone(&self.cart)
    }

    /// The current phase, for UI progress display.
    #[must_use]
    pub fn phase(&self) -> CheckoutPhase {
        *self
            .phase
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Run one checkout attempt to a terminal outcome.
    ///
    /// On success the cart is cleared. On failure the cart keeps its items
    /// so the user's session state survives; the specific
    /// [`CheckoutError`] kind tells the caller what, if anything, already
    /// happened externally.
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`] for the taxonomy. Notably,
    /// [`CheckoutError::OrderRecordFailedAfterPayment`] means a token
    /// transfer committed but the order record does not exist yet.
    #[instrument(skip(self, request), fields(customer = %request.customer))]
    pub async fn begin(
        &self,
        request: CheckoutRequest<'_>,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let Ok(_flight) = self.flight.try_lock() else {
            return Err(CheckoutError::AlreadyInProgress);
        };
        self.set_phase(CheckoutPhase::Idle);

        // Snapshot under the cart lock; the cart stays read-only until this
        // attempt reaches a terminal state.
        let snapshot = {
            let mut cart = self.cart.lock().await;
            if cart.is_empty() {
                return Err(CheckoutError::EmptyCart);
            }
            cart.lock_for_checkout();
            cart.snapshot()
        };

        let result = self.run(&snapshot, &request).await;

        // Terminal: release the cart, clearing it only on full success. A
        // clear failure must not discard the receipt - the payment committed
        // and the order exists, so a stale persisted cart is the lesser harm.
        let mut cart = self.cart.lock().await;
        cart.unlock();
        if result.is_ok()
            && let Err(err) = cart.clear()
        {
            tracing::warn!(error = %err, "cart not cleared after successful checkout");
        }
        drop(cart);

        if let Ok(receipt) = &result {
            self.notifier.order_recorded(&receipt.order_id);
        }
        result
    }

    /// The fallible middle of an attempt: pricing through order recording.
    /// Cart lock release is handled by `begin`.
    async fn run(
        &self,
        snapshot: &[pamtalk_core::CartItem],
        request: &CheckoutRequest<'_>,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let quote = pricing::quote(snapshot, request.coupon.as_ref(), Utc::now());
        self.set_phase(CheckoutPhase::PricingComputed);
        let total = Money::saturating(quote.total, CurrencyCode::KRW);

        let intent = self.build_intent(request, total).await?;

        if request.cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(CheckoutError::Cancelled);
        }

        self.set_phase(CheckoutPhase::PaymentInProgress);
        self.notifier.checkout_started(&total);

        let payment_reference = match self.gateway.execute(&intent, request.cancel).await {
            Ok(reference) => reference,
            Err(err) => {
                self.set_phase(CheckoutPhase::PaymentFailed);
                tracing::warn!(error = %err, "payment step failed");
                return Err(err.into());
            }
        };
        self.set_phase(CheckoutPhase::PaymentSucceeded);
        if let Some(tx_id) = &payment_reference {
            self.notifier.payment_submitted(tx_id);
        }

        let draft = OrderDraft {
            customer_id: request.customer.clone(),
            items: snapshot.to_vec(),
            total_amount: quote.total,
            coupon_id: request
                .coupon
                .as_ref()
                .filter(|_| !quote.discount.is_zero())
                .map(|c| c.coupon_id.clone()),
            payment_reference: payment_reference.clone(),
        };

        match self.recorder.create_order(&draft).await {
            Ok(receipt) => {
                self.set_phase(CheckoutPhase::OrderRecorded);
                Ok(CheckoutReceipt {
                    order_id: receipt.order_id,
                    payment_reference,
                    total,
                    carbon_saved_kg: receipt.carbon_saved_kg,
                })
            }
            Err(source) => {
                self.set_phase(CheckoutPhase::OrderRecordFailed);
                match payment_reference {
                    // The transfer is committed on the ledger and cannot be
                    // recalled; surface the reference for reconciliation.
                    Some(payment_reference) => {
                        tracing::error!(
                            %payment_reference,
                            error = %source,
                            "order recording failed after committed payment"
                        );
                        Err(CheckoutError::OrderRecordFailedAfterPayment {
                            payment_reference,
                            source,
                        })
                    }
                    None => Err(CheckoutError::OrderRecordFailed(source)),
                }
            }
        }
    }

    /// Resolve the request's payment choice into an executable intent.
    async fn build_intent<'a>(
        &self,
        request: &'a CheckoutRequest<'a>,
        total: Money,
    ) -> Result<PaymentIntent<'a>, CheckoutError> {
        match &request.method {
            PaymentChoice::Cash => Ok(PaymentIntent::cash(total)),
            PaymentChoice::Token { signer, recipient } => {
                // Validate the recipient before any gateway call
                let recipient = WalletAddress::parse(recipient).map_err(|source| {
                    CheckoutError::InvalidRecipient {
                        address: recipient.clone(),
                        source,
                    }
                })?;

                let memo = format!(
                    "PAM-TALK purchase {} by {}",
                    uuid::Uuid::new_v4(),
                    request.customer
                );
                let intent =
                    PaymentIntent::token(total, self.dc_rate, *signer, recipient, memo)
                        .map_err(|e| CheckoutError::Payment(e.into()))?;

                // The one user decision: approve the token spend
                if let Some(tokens) = intent.token_amount()
                    && !self.prompt.confirm_token_spend(tokens, &total).await
                {
                    return Err(CheckoutError::Declined);
                }
                Ok(intent)
            }
        }
    }

    fn set_phase(&self, phase: CheckoutPhase) {
        *self
            .phase
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = phase;
    }
}
