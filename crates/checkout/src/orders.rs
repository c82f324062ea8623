//! Order recorder port and order service REST adapter.
//!
//! The order service owns order records and their status lifecycle. The
//! checkout core only submits a finalized draft and reads back the assigned
//! identifier; it never polls or tracks subsequent status transitions.

use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use pamtalk_core::{CartItem, CouponId, CustomerId, OrderId, OrderStatus, TxId};

use crate::config::CheckoutConfig;

/// Errors that can occur when recording an order.
#[derive(Debug, Error)]
pub enum OrderServiceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The order service returned an error response.
    #[error("order service error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the service, when one was provided.
        message: String,
    },

    /// A response body could not be parsed.
    #[error("order service parse error: {0}")]
    Parse(String),
}

/// A finalized order awaiting submission.
///
/// Constructed by the orchestrator immediately before submission and
/// immutable once submitted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    /// Customer placing the order.
    pub customer_id: CustomerId,
    /// Item snapshots taken at checkout time.
    pub items: Vec<CartItem>,
    /// Post-discount total in the currency's standard unit.
    pub total_amount: Decimal,
    /// Coupon redeemed against this order, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_id: Option<CouponId>,
    /// Ledger transaction ID for token payments; absent for cash.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<TxId>,
}

/// The order service's acknowledgement of a recorded order.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    /// Identifier assigned by the order service.
    pub order_id: OrderId,
    /// Initial status of the recorded order.
    #[serde(default)]
    pub status: OrderStatus,
    /// Estimated carbon saved by the farm-direct purchase, when the
    /// service reports ESG metrics.
    #[serde(default)]
    pub carbon_saved_kg: Option<Decimal>,
}

/// Persists finalized orders to a remote service.
pub trait OrderRecorder: Send + Sync {
    /// Submit a draft and return the service's receipt.
    async fn create_order(&self, draft: &OrderDraft) -> Result<OrderReceipt, OrderServiceError>;
}

impl<T: OrderRecorder + ?Sized> OrderRecorder for std::sync::Arc<T> {
    async fn create_order(&self, draft: &OrderDraft) -> Result<OrderReceipt, OrderServiceError> {
        (**self).create_order(draft).await
    }
}

/// Order service REST client.
#[derive(Debug, Clone)]
pub struct OrderServiceClient {
    client: reqwest::Client,
    base_url: Url,
}

/// Error body shape returned by the order service.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl OrderServiceClient {
    /// Create a new order service client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OrderServiceError::Http`] if the HTTP client fails to
    /// build.
    pub fn new(config: &CheckoutConfig) -> Result<Self, OrderServiceError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: config.order_service_url.clone(),
        })
    }
}

impl OrderRecorder for OrderServiceClient {
    #[instrument(skip(self, draft), fields(customer = %draft.customer_id, items = draft.items.len()))]
    async fn create_order(&self, draft: &OrderDraft) -> Result<OrderReceipt, OrderServiceError> {
        let url = self
            .base_url
            .join("api/orders")
            .map_err(|e| OrderServiceError::Parse(format!("invalid endpoint: {e}")))?;

        let response = self.client.post(url).json(draft).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Prefer the structured message field when the service sends one
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map_or(body, |parsed| parsed.message);
            return Err(OrderServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let receipt: OrderReceipt = response
            .json()
            .await
            .map_err(|e| OrderServiceError::Parse(e.to_string()))?;
        tracing::info!(order_id = %receipt.order_id, "order recorded");
        Ok(receipt)
    }
}
