//! User-facing ports and cooperative cancellation.
//!
//! The web client drove checkout feedback through blocking browser dialogs.
//! Here that surface is split into two injected ports so business
//! sequencing stays decoupled from any particular UI toolkit: a prompt for
//! the one decision the user must make (spending tokens), and a notifier
//! for progress events the UI may render however it likes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pamtalk_core::{Money, TokenAmount, TxId};

/// Asks the user to approve spending tokens before a transfer is submitted.
pub trait CheckoutPrompt: Send + Sync {
    /// Whether the user approves paying `tokens` for an order totalling
    /// `total`. Returning `false` aborts the checkout before anything is
    /// submitted to the ledger.
    async fn confirm_token_spend(&self, tokens: TokenAmount, total: &Money) -> bool;
}

/// Receives checkout progress events.
///
/// All methods default to no-ops; implementations override what they care
/// about.
pub trait CheckoutNotifier: Send + Sync {
    /// The checkout has started with the given post-discount total.
    fn checkout_started(&self, total: &Money) {
        let _ = total;
    }

    /// A token transfer has been submitted to the ledger.
    fn payment_submitted(&self, tx_id: &TxId) {
        let _ = tx_id;
    }

    /// The order was recorded successfully.
    fn order_recorded(&self, order_id: &pamtalk_core::OrderId) {
        let _ = order_id;
    }
}

/// A [`CheckoutPrompt`] that approves every spend. Suitable for headless
/// callers that collect consent before invoking checkout.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl CheckoutPrompt for AutoConfirm {
    async fn confirm_token_spend(&self, _tokens: TokenAmount, _total: &Money) -> bool {
        true
    }
}

/// A [`CheckoutNotifier`] that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl CheckoutNotifier for SilentNotifier {}

/// Cooperative cancellation token for an in-flight checkout.
///
/// Honored only up to the point the ledger transfer is submitted; a
/// submitted transfer cannot be recalled, so later cancellation requests
/// are ignored and the flow runs to a terminal state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_starts_clear() {
        assert!(!CancelToken::new().is_cancelled());
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_auto_confirm_approves() {
        use rust_decimal::Decimal;
        let total = Money::krw(Decimal::from(9000)).unwrap();
        assert!(
            AutoConfirm
                .confirm_token_spend(TokenAmount::new(90), &total)
                .await
        );
    }
}
