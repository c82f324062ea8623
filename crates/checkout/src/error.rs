//! Checkout error taxonomy.
//!
//! All failures are returned as structured values, never panics: the caller
//! owns user-facing presentation and retry decisions. The one severity
//! distinction that matters is [`CheckoutError::OrderRecordFailedAfterPayment`],
//! where a ledger transfer has already committed irreversibly - it carries
//! the payment reference so a human or a reconciliation job can create the
//! missing order record by hand.

use thiserror::Error;

use pamtalk_core::{TxId, WalletAddressError};

use crate::orders::OrderServiceError;
use crate::payment::PaymentError;

/// Errors that can terminate a checkout attempt.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout attempted with no items in the cart.
    #[error("cannot check out an empty cart")]
    EmptyCart,

    /// The token recipient address is malformed. Nothing was submitted.
    #[error("invalid recipient address '{address}': {source}")]
    InvalidRecipient {
        /// The rejected input.
        address: String,
        /// Why parsing failed.
        #[source]
        source: WalletAddressError,
    },

    /// Another checkout for this cart is already in flight.
    #[error("a checkout is already in progress for this cart")]
    AlreadyInProgress,

    /// The user declined the token spend confirmation.
    #[error("token spend declined by user")]
    Declined,

    /// The checkout was cancelled before the transfer was submitted.
    #[error("checkout cancelled")]
    Cancelled,

    /// The payment step failed; the error kind is propagated unchanged.
    #[error("payment failed: {0}")]
    Payment(#[source] PaymentError),

    /// Order recording failed with no external side effect (cash method).
    /// Fully recoverable: the user can retry from scratch.
    #[error("order recording failed: {0}")]
    OrderRecordFailed(#[source] OrderServiceError),

    /// Order recording failed AFTER a committed token payment. The cart is
    /// preserved and the payment reference is carried for manual
    /// reconciliation. Never swallow this.
    #[error("order recording failed after payment {payment_reference} committed: {source}")]
    OrderRecordFailedAfterPayment {
        /// The committed ledger transaction.
        payment_reference: TxId,
        /// The order service failure.
        #[source]
        source: OrderServiceError,
    },
}

impl From<PaymentError> for CheckoutError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Cancelled => Self::Cancelled,
            other => Self::Payment(other),
        }
    }
}
