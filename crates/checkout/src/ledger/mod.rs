//! Ledger client port and transaction signing seam.
//!
//! # Architecture
//!
//! The checkout core never holds private keys and never talks to the ledger
//! directly. [`LedgerClient`] is the contract the payment gateway consumes;
//! [`AlgodClient`] implements it over the algod v2 REST API. Signing is
//! delegated through [`TxnSigner`] so wallet credentials stay with their
//! owner (a hardware wallet, a KMD daemon, a test fake).

mod algod;

pub use algod::AlgodClient;

use pamtalk_core::{AssetId, TokenAmount, TxId, WalletAddress};
use thiserror::Error;

/// Errors that can occur when interacting with the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The ledger node returned an error response.
    #[error("ledger API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error body returned by the node.
        message: String,
    },

    /// A response body could not be parsed.
    #[error("ledger response parse error: {0}")]
    Parse(String),

    /// Transaction signing failed.
    #[error(transparent)]
    Sign(#[from] SignError),

    /// The transaction was not confirmed within the bounded wait.
    #[error("transaction not confirmed after {rounds} rounds")]
    ConfirmationTimeout {
        /// Number of rounds waited.
        rounds: u32,
    },

    /// The ledger rejected the transaction from its pool.
    #[error("transaction rejected by ledger: {reason}")]
    Rejected {
        /// Pool error reported by the node.
        reason: String,
    },
}

/// Error produced by a [`TxnSigner`].
#[derive(Debug, Error, Clone)]
#[error("transaction signing failed: {0}")]
pub struct SignError(pub String);

/// Consensus parameters a signer needs to produce a valid transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedParams {
    /// Fee per byte suggested by the node.
    pub fee: u64,
    /// Minimum flat fee.
    pub min_fee: u64,
    /// First round the transaction is valid in.
    pub first_valid: u64,
    /// Last round the transaction is valid in.
    pub last_valid: u64,
    /// Genesis ID of the network.
    pub genesis_id: String,
    /// Raw genesis hash of the network.
    pub genesis_hash: Vec<u8>,
}

/// An unsigned asset transfer handed to a [`TxnSigner`].
///
/// An opt-in is a zero-amount transfer to the signer's own address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferParams {
    /// Sender address.
    pub from: WalletAddress,
    /// Receiver address.
    pub to: WalletAddress,
    /// Token amount in base units. Zero for opt-ins.
    pub amount: TokenAmount,
    /// Asset being transferred.
    pub asset_id: AssetId,
    /// Human-readable note attached to the transaction.
    pub note: Vec<u8>,
    /// Consensus parameters for the validity window.
    pub suggested: SuggestedParams,
}

/// Signs ledger transactions on behalf of a wallet.
///
/// This is the credentials seam: implementations own the private key and
/// return the encoded signed transaction bytes ready for submission.
/// `Debug` is required so payment types holding a signer can derive it;
/// implementations must not expose key material in their output.
pub trait TxnSigner: Send + Sync + std::fmt::Debug {
    /// The wallet address this signer controls.
    fn address(&self) -> &WalletAddress;

    /// Sign an asset transfer.
    ///
    /// # Errors
    ///
    /// Returns [`SignError`] if the transfer cannot be signed.
    fn sign_transfer(&self, params: &TransferParams) -> Result<Vec<u8>, SignError>;
}

/// Operations the payment gateway needs from the token ledger.
pub trait LedgerClient: Send + Sync {
    /// Whether `address` has opted in to the given asset.
    async fn is_opted_in(
        &self,
        address: &WalletAddress,
        asset_id: AssetId,
    ) -> Result<bool, LedgerError>;

    /// Opt the signer's account in to the given asset and wait for
    /// confirmation.
    async fn opt_in(&self, signer: &dyn TxnSigner, asset_id: AssetId) -> Result<TxId, LedgerError>;

    /// The asset balance held by `address`.
    async fn balance(
        &self,
        address: &WalletAddress,
        asset_id: AssetId,
    ) -> Result<TokenAmount, LedgerError>;

    /// Submit a signed transfer of `amount` from the signer to `to`.
    ///
    /// Returns the transaction ID without waiting for confirmation; callers
    /// follow up with [`LedgerClient::wait_for_confirmation`].
    async fn transfer(
        &self,
        signer: &dyn TxnSigner,
        to: &WalletAddress,
        amount: TokenAmount,
        asset_id: AssetId,
        note: &[u8],
    ) -> Result<TxId, LedgerError>;

    /// Block until the transaction is confirmed, bounded by `max_rounds`.
    ///
    /// Returns the round the transaction was confirmed in.
    async fn wait_for_confirmation(&self, tx_id: &TxId, max_rounds: u32)
    -> Result<u64, LedgerError>;
}

impl<T: LedgerClient + ?Sized> LedgerClient for std::sync::Arc<T> {
    async fn is_opted_in(
        &self,
        address: &WalletAddress,
        asset_id: AssetId,
    ) -> Result<bool, LedgerError> {
        (**self).is_opted_in(address, asset_id).await
    }

    async fn opt_in(&self, signer: &dyn TxnSigner, asset_id: AssetId) -> Result<TxId, LedgerError> {
        (**self).opt_in(signer, asset_id).await
    }

    async fn balance(
        &self,
        address: &WalletAddress,
        asset_id: AssetId,
    ) -> Result<TokenAmount, LedgerError> {
        (**self).balance(address, asset_id).await
    }

    async fn transfer(
        &self,
        signer: &dyn TxnSigner,
        to: &WalletAddress,
        amount: TokenAmount,
        asset_id: AssetId,
        note: &[u8],
    ) -> Result<TxId, LedgerError> {
        (**self).transfer(signer, to, amount, asset_id, note).await
    }

    async fn wait_for_confirmation(
        &self,
        tx_id: &TxId,
        max_rounds: u32,
    ) -> Result<u64, LedgerError> {
        (**self).wait_for_confirmation(tx_id, max_rounds).await
    }
}
