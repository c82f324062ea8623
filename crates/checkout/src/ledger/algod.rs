//! Algod v2 REST implementation of the ledger port.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use pamtalk_core::{AssetId, TokenAmount, TxId, WalletAddress};

use super::{LedgerClient, LedgerError, SuggestedParams, TransferParams, TxnSigner};
use crate::config::CheckoutConfig;

/// Approximate block time; the confirmation poll sleeps this long per round.
const ROUND_WAIT: std::time::Duration = std::time::Duration::from_secs(3);

/// Validity window length for submitted transactions, in rounds.
const VALIDITY_ROUNDS: u64 = 1000;

/// Algod v2 REST client.
#[derive(Debug, Clone)]
pub struct AlgodClient {
    client: reqwest::Client,
    base_url: Url,
}

impl AlgodClient {
    /// Create a new algod client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Parse`] if the API token is not a valid header
    /// value, or [`LedgerError::Http`] if the HTTP client fails to build.
    pub fn new(config: &CheckoutConfig) -> Result<Self, LedgerError> {
        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(config.algod_token.expose_secret())
            .map_err(|e| LedgerError::Parse(format!("invalid algod token: {e}")))?;
        token.set_sensitive(true);
        headers.insert("X-Algo-API-Token", token);

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: config.algod_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, LedgerError> {
        self.base_url
            .join(path)
            .map_err(|e| LedgerError::Parse(format!("invalid endpoint {path}: {e}")))
    }

    /// Fetch the account's holding of an asset. `Ok(None)` means the account
    /// has not opted in.
    async fn asset_holding(
        &self,
        address: &WalletAddress,
        asset_id: AssetId,
    ) -> Result<Option<AssetHolding>, LedgerError> {
        let url = self.endpoint(&format!("v2/accounts/{address}/assets/{asset_id}"))?;
        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;

        let body: AccountAssetResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::Parse(e.to_string()))?;
        Ok(Some(body.asset_holding))
    }

    /// Fetch suggested transaction parameters from the node.
    async fn suggested_params(&self) -> Result<SuggestedParams, LedgerError> {
        let url = self.endpoint("v2/transactions/params")?;
        let response = check_status(self.client.get(url).send().await?).await?;
        let body: TransactionParamsResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::Parse(e.to_string()))?;

        let genesis_hash = BASE64
            .decode(&body.genesis_hash)
            .map_err(|e| LedgerError::Parse(format!("invalid genesis hash: {e}")))?;

        Ok(SuggestedParams {
            fee: body.fee,
            min_fee: body.min_fee,
            first_valid: body.last_round,
            last_valid: body.last_round + VALIDITY_ROUNDS,
            genesis_id: body.genesis_id,
            genesis_hash,
        })
    }

    /// Sign and submit an asset transfer built from fresh suggested params.
    async fn submit_transfer(
        &self,
        signer: &dyn TxnSigner,
        to: &WalletAddress,
        amount: TokenAmount,
        asset_id: AssetId,
        note: &[u8],
    ) -> Result<TxId, LedgerError> {
        let suggested = self.suggested_params().await?;
        let params = TransferParams {
            from: signer.address().clone(),
            to: to.clone(),
            amount,
            asset_id,
            note: note.to_vec(),
            suggested,
        };
        let signed = signer.sign_transfer(&params)?;

        let url = self.endpoint("v2/transactions")?;
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/x-binary")
            .body(signed)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::Parse(e.to_string()))?;
        Ok(TxId::new(body.tx_id))
    }
}

impl LedgerClient for AlgodClient {
    #[instrument(skip(self), fields(asset = %asset_id))]
    async fn is_opted_in(
        &self,
        address: &WalletAddress,
        asset_id: AssetId,
    ) -> Result<bool, LedgerError> {
        Ok(self.asset_holding(address, asset_id).await?.is_some())
    }

    #[instrument(skip(self, signer), fields(asset = %asset_id))]
    async fn opt_in(&self, signer: &dyn TxnSigner, asset_id: AssetId) -> Result<TxId, LedgerError> {
        // Opt-in is a zero-amount transfer to self
        let self_address = signer.address().clone();
        let tx_id = self
            .submit_transfer(signer, &self_address, TokenAmount::new(0), asset_id, b"")
            .await?;
        tracing::info!(%tx_id, "asset opt-in submitted");
        Ok(tx_id)
    }

    #[instrument(skip(self), fields(asset = %asset_id))]
    async fn balance(
        &self,
        address: &WalletAddress,
        asset_id: AssetId,
    ) -> Result<TokenAmount, LedgerError> {
        let holding = self.asset_holding(address, asset_id).await?;
        Ok(holding.map_or_else(|| TokenAmount::new(0), |h| TokenAmount::new(h.amount)))
    }

    #[instrument(skip(self, signer, note), fields(asset = %asset_id, amount = %amount))]
    async fn transfer(
        &self,
        signer: &dyn TxnSigner,
        to: &WalletAddress,
        amount: TokenAmount,
        asset_id: AssetId,
        note: &[u8],
    ) -> Result<TxId, LedgerError> {
        let tx_id = self
            .submit_transfer(signer, to, amount, asset_id, note)
            .await?;
        tracing::info!(%tx_id, "asset transfer submitted");
        Ok(tx_id)
    }

    #[instrument(skip(self))]
    async fn wait_for_confirmation(
        &self,
        tx_id: &TxId,
        max_rounds: u32,
    ) -> Result<u64, LedgerError> {
        let url = self.endpoint(&format!("v2/transactions/pending/{tx_id}"))?;

        for round in 0..max_rounds {
            let response = check_status(self.client.get(url.clone()).send().await?).await?;
            let body: PendingTransactionResponse = response
                .json()
                .await
                .map_err(|e| LedgerError::Parse(e.to_string()))?;

            if let Some(confirmed) = body.confirmed_round.filter(|r| *r > 0) {
                tracing::info!(%tx_id, confirmed, "transaction confirmed");
                return Ok(confirmed);
            }
            if !body.pool_error.is_empty() {
                return Err(LedgerError::Rejected {
                    reason: body.pool_error,
                });
            }

            tracing::debug!(%tx_id, round, "awaiting confirmation");
            tokio::time::sleep(ROUND_WAIT).await;
        }

        Err(LedgerError::ConfirmationTimeout { rounds: max_rounds })
    }
}

/// Convert a non-success response into [`LedgerError::Api`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LedgerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(LedgerError::Api {
        status: status.as_u16(),
        message,
    })
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct AccountAssetResponse {
    #[serde(rename = "asset-holding")]
    asset_holding: AssetHolding,
}

#[derive(Debug, Deserialize)]
struct AssetHolding {
    amount: u64,
}

#[derive(Debug, Deserialize)]
struct TransactionParamsResponse {
    fee: u64,
    #[serde(rename = "min-fee")]
    min_fee: u64,
    #[serde(rename = "last-round")]
    last_round: u64,
    #[serde(rename = "genesis-id")]
    genesis_id: String,
    #[serde(rename = "genesis-hash")]
    genesis_hash: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "txId")]
    tx_id: String,
}

#[derive(Debug, Deserialize)]
struct PendingTransactionResponse {
    #[serde(rename = "confirmed-round", default)]
    confirmed_round: Option<u64>,
    #[serde(rename = "pool-error", default)]
    pool_error: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_asset_response() {
        let body = r#"{"asset-holding":{"amount":150,"asset-id":31566704,"is-frozen":false}}"#;
        let parsed: AccountAssetResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.asset_holding.amount, 150);
    }

    #[test]
    fn test_parse_transaction_params_response() {
        let body = r#"{
            "consensus-version": "future",
            "fee": 0,
            "genesis-hash": "SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=",
            "genesis-id": "testnet-v1.0",
            "last-round": 41000000,
            "min-fee": 1000
        }"#;
        let parsed: TransactionParamsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.min_fee, 1000);
        assert_eq!(parsed.last_round, 41_000_000);
        assert!(BASE64.decode(&parsed.genesis_hash).is_ok());
    }

    #[test]
    fn test_parse_submit_response() {
        let body = r#"{"txId":"TX123ABC"}"#;
        let parsed: SubmitResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.tx_id, "TX123ABC");
    }

    #[test]
    fn test_parse_pending_unconfirmed() {
        let body = r#"{"pool-error":""}"#;
        let parsed: PendingTransactionResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.confirmed_round.is_none());
        assert!(parsed.pool_error.is_empty());
    }

    #[test]
    fn test_parse_pending_confirmed() {
        let body = r#"{"confirmed-round":41000007,"pool-error":""}"#;
        let parsed: PendingTransactionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.confirmed_round, Some(41_000_007));
    }

    #[test]
    fn test_parse_pending_rejected() {
        let body = r#"{"pool-error":"overspend"}"#;
        let parsed: PendingTransactionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.pool_error, "overspend");
    }
}
