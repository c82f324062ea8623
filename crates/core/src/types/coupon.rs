//! Discount coupon type.
//!
//! Coupons are issued by the verification committee or platform admins and
//! consumed (usage count incremented) by the order service on a successful
//! order. The checkout core only performs read-only validity checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::CouponId;
use crate::types::status::DiscountType;
use rust_decimal::Decimal;

/// A discount coupon applied at checkout.
///
/// Distinct from the DC reward token: a coupon reduces the order total in
/// currency terms before any token conversion happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Coupon identifier assigned by the issuing authority.
    pub coupon_id: CouponId,
    /// Percentage or fixed-amount discount.
    pub discount_type: DiscountType,
    /// Percentage (0-100) or fixed currency amount, per `discount_type`.
    pub discount_value: Decimal,
    /// Start of the validity window (inclusive).
    pub valid_from: DateTime<Utc>,
    /// End of the validity window (inclusive).
    pub valid_until: DateTime<Utc>,
    /// Maximum number of redemptions.
    pub usage_limit: u32,
    /// Redemptions so far, maintained by the issuing authority.
    pub used_count: u32,
}

impl Coupon {
    /// Whether the coupon can be applied at the given instant.
    ///
    /// A coupon is applicable only when `now` falls inside
    /// `[valid_from, valid_until]` and its usage limit is not exhausted.
    #[must_use]
    pub fn is_applicable_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.valid_from && now <= self.valid_until && self.used_count < self.usage_limit
    }
}
