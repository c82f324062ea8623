//! Cart line item type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;

/// A single line in a shopping cart.
///
/// Invariant: `quantity >= 1`. An item driven to zero quantity is removed
/// from the cart rather than retained; the cart store enforces this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Opaque product identifier from the farm catalog.
    pub product_id: ProductId,
    /// Product name carried for order snapshots and receipts.
    pub name: String,
    /// Unit price in the currency's standard unit. Non-negative.
    pub unit_price: Decimal,
    /// Number of units. Always at least one.
    pub quantity: u32,
}

impl CartItem {
    /// The line total: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}
