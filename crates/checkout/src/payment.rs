//! Payment gateway.
//!
//! Executes the chosen payment method. Cash returns immediately with no
//! payment reference - there is no cash-processor integration, settlement
//! happens on delivery. Token payments run four strictly ordered steps
//! against the ledger: opt-in check, balance check, signed transfer,
//! bounded confirmation wait.

use pamtalk_core::{AssetId, DcRate, Money, RateError, TokenAmount, TxId, WalletAddress};
use thiserror::Error;
use tracing::instrument;

use crate::ledger::{LedgerClient, LedgerError, TxnSigner};
use crate::ports::CancelToken;

/// Errors that can occur while executing a payment.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The payer's account could not be opted in to the DC asset.
    #[error("asset opt-in failed: {source}")]
    OptInFailed {
        /// Underlying ledger failure.
        #[source]
        source: LedgerError,
    },

    /// The payer does not hold enough tokens.
    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance {
        /// Tokens required for this purchase.
        required: TokenAmount,
        /// Tokens the payer actually holds.
        available: TokenAmount,
    },

    /// The transfer was submitted but not confirmed, or was rejected.
    #[error("token transfer failed: {source}")]
    TransferFailed {
        /// Transaction ID when the submission itself succeeded.
        tx_id: Option<TxId>,
        /// Underlying ledger failure.
        #[source]
        source: LedgerError,
    },

    /// A ledger read failed before any transfer was attempted.
    #[error("ledger unavailable: {0}")]
    Ledger(#[from] LedgerError),

    /// The amount could not be converted to a token count.
    #[error("token conversion failed: {0}")]
    Conversion(#[from] RateError),

    /// The checkout was cancelled before the transfer was submitted.
    #[error("payment cancelled before submission")]
    Cancelled,
}

/// A resolved intent to pay a specific amount by a specific method.
#[derive(Debug)]
pub struct PaymentIntent<'a> {
    /// Post-discount total being paid.
    pub amount: Money,
    /// How the amount is settled.
    pub method: PaymentMethod<'a>,
}

/// Payment method variants.
#[derive(Debug)]
pub enum PaymentMethod<'a> {
    /// Settled outside the platform on delivery.
    Cash,
    /// Settled by a DC token transfer on the ledger.
    Token {
        /// Signer holding the payer's wallet credentials.
        signer: &'a dyn TxnSigner,
        /// Validated recipient (producer/farm) address.
        recipient: WalletAddress,
        /// Token count owed, derived from the amount via the configured rate.
        token_amount: TokenAmount,
        /// Human-readable purchase memo attached to the transfer.
        memo: String,
    },
}

impl<'a> PaymentIntent<'a> {
    /// Build a cash intent.
    #[must_use]
    pub const fn cash(amount: Money) -> Self {
        Self {
            amount,
            method: PaymentMethod::Cash,
        }
    }

    /// Build a token intent, deriving the token count from `amount` via the
    /// configured conversion rate.
    ///
    /// # Errors
    ///
    /// Returns [`RateError`] if the amount does not convert.
    pub fn token(
        amount: Money,
        rate: DcRate,
        signer: &'a dyn TxnSigner,
        recipient: WalletAddress,
        memo: String,
    ) -> Result<Self, RateError> {
        let token_amount = rate.tokens_for(&amount)?;
        Ok(Self {
            amount,
            method: PaymentMethod::Token {
                signer,
                recipient,
                token_amount,
                memo,
            },
        })
    }

    /// The token count owed, when this is a token intent.
    #[must_use]
    pub const fn token_amount(&self) -> Option<TokenAmount> {
        match &self.method {
            PaymentMethod::Cash => None,
            PaymentMethod::Token { token_amount, .. } => Some(*token_amount),
        }
    }
}

/// Executes payment intents against the token ledger.
#[derive(Debug)]
pub struct PaymentGateway<L> {
    ledger: L,
    asset_id: AssetId,
    confirm_rounds: u32,
}

impl<L: LedgerClient> PaymentGateway<L> {
    /// Create a gateway over the given ledger client.
    #[must_use]
    pub const fn new(ledger: L, asset_id: AssetId, confirm_rounds: u32) -> Self {
        Self {
            ledger,
            asset_id,
            confirm_rounds,
        }
    }

    /// Execute a payment intent.
    ///
    /// Returns the ledger transaction ID for token payments, `None` for
    /// cash. Token steps run strictly in order: the balance is read only
    /// after opt-in is confirmed, and the transfer is submitted only after
    /// the balance is confirmed sufficient.
    ///
    /// Cancellation is honored only before the transfer is submitted; a
    /// submitted transfer cannot be recalled, so from that point the
    /// payment runs to a terminal outcome.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError`] describing the failing step. No step is
    /// retried; the caller re-initiates checkout from scratch.
    #[instrument(skip(self, intent, cancel), fields(amount = %intent.amount))]
    pub async fn execute(
        &self,
        intent: &PaymentIntent<'_>,
        cancel: Option<&CancelToken>,
    ) -> Result<Option<TxId>, PaymentError> {
        match &intent.method {
            PaymentMethod::Cash => Ok(None),
            PaymentMethod::Token {
                signer,
                recipient,
                token_amount,
                memo,
            } => {
                let tx_id = self
                    .execute_token(*signer, recipient, *token_amount, memo, cancel)
                    .await?;
                Ok(Some(tx_id))
            }
        }
    }

    async fn execute_token(
        &self,
        signer: &dyn TxnSigner,
        recipient: &WalletAddress,
        token_amount: TokenAmount,
        memo: &str,
        cancel: Option<&CancelToken>,
    ) -> Result<TxId, PaymentError> {
        let payer = signer.address().clone();

        // Step 1: opt-in check, with an opt-in attempt as a prerequisite step
        if !self.ledger.is_opted_in(&payer, self.asset_id).await? {
            tracing::info!(%payer, "payer not opted in, attempting opt-in");
            let opt_in_tx = self
                .ledger
                .opt_in(signer, self.asset_id)
                .await
                .map_err(|source| PaymentError::OptInFailed { source })?;
            self.ledger
                .wait_for_confirmation(&opt_in_tx, self.confirm_rounds)
                .await
                .map_err(|source| PaymentError::OptInFailed { source })?;
        }

        // Step 2: balance check
        let available = self.ledger.balance(&payer, self.asset_id).await?;
        if available < token_amount {
            return Err(PaymentError::InsufficientBalance {
                required: token_amount,
                available,
            });
        }

        // Last cancellation point: a submitted transfer cannot be recalled
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(PaymentError::Cancelled);
        }

        // Step 3: signed transfer
        let tx_id = self
            .ledger
            .transfer(
                signer,
                recipient,
                token_amount,
                self.asset_id,
                memo.as_bytes(),
            )
            .await
            .map_err(|source| PaymentError::TransferFailed {
                tx_id: None,
                source,
            })?;

        // Step 4: bounded confirmation wait
        self.ledger
            .wait_for_confirmation(&tx_id, self.confirm_rounds)
            .await
            .map_err(|source| PaymentError::TransferFailed {
                tx_id: Some(tx_id.clone()),
                source,
            })?;

        Ok(tx_id)
    }
}
