//! Pricing calculator.
//!
//! A pure function from (items, coupon) to a quote. No caching: the caller
//! re-runs it whenever the cart or coupon selection changes, so a quote can
//! never go stale against the cart it was computed from.

use chrono::{DateTime, Utc};
use pamtalk_core::{CartItem, Coupon, DiscountType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The priced breakdown of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Sum of line totals before any discount.
    pub subtotal: Decimal,
    /// Discount applied, never exceeding the subtotal.
    pub discount: Decimal,
    /// `subtotal - discount`, floored at zero.
    pub total: Decimal,
}

/// Price a cart snapshot against an optional coupon.
///
/// An absent, expired, or exhausted coupon contributes no discount. A
/// percentage discount is `subtotal * value / 100` capped at the subtotal;
/// a fixed discount is `min(value, subtotal)`. The result is deterministic
/// for a fixed `(items, coupon, now)`.
#[must_use]
pub fn quote(items: &[CartItem], coupon: Option<&Coupon>, now: DateTime<Utc>) -> Quote {
    let subtotal: Decimal = items.iter().map(CartItem::line_total).sum();
    let discount = coupon
        .filter(|c| c.is_applicable_at(now))
        .map_or(Decimal::ZERO, |c| discount_for(c, subtotal));
    let total = (subtotal - discount).max(Decimal::ZERO);

    Quote {
        subtotal,
        discount,
        total,
    }
}

fn discount_for(coupon: &Coupon, subtotal: Decimal) -> Decimal {
    let raw = match coupon.discount_type {
        DiscountType::Percentage => subtotal * coupon.discount_value / Decimal::from(100),
        DiscountType::Fixed => coupon.discount_value,
    };
    raw.min(subtotal).max(Decimal::ZERO)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use pamtalk_core::{CouponId, ProductId};

    fn item(id: &str, unit_price: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            unit_price: Decimal::from(unit_price),
            quantity,
        }
    }

    fn coupon(discount_type: DiscountType, value: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            coupon_id: CouponId::new("c1"),
            discount_type,
            discount_value: Decimal::from(value),
            valid_from: now - TimeDelta::days(1),
            valid_until: now + TimeDelta::days(1),
            usage_limit: 10,
            used_count: 0,
        }
    }

    #[test]
    fn test_subtotal_without_coupon() {
        // 2 x 5000, no coupon
        let q = quote(&[item("p1", 5000, 2)], None, Utc::now());
        assert_eq!(q.subtotal, Decimal::from(10000));
        assert_eq!(q.discount, Decimal::ZERO);
        assert_eq!(q.total, Decimal::from(10000));
    }

    #[test]
    fn test_percentage_discount() {
        // 10% off 10000 -> 9000
        let c = coupon(DiscountType::Percentage, 10);
        let q = quote(&[item("p1", 5000, 2)], Some(&c), Utc::now());
        assert_eq!(q.discount, Decimal::from(1000));
        assert_eq!(q.total, Decimal::from(9000));
    }

    #[test]
    fn test_fixed_discount() {
        let c = coupon(DiscountType::Fixed, 3000);
        let q = quote(&[item("p1", 5000, 2)], Some(&c), Utc::now());
        assert_eq!(q.total, Decimal::from(7000));
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let c = coupon(DiscountType::Fixed, 99999);
        let q = quote(&[item("p1", 1000, 1)], Some(&c), Utc::now());
        assert_eq!(q.discount, Decimal::from(1000));
        assert_eq!(q.total, Decimal::ZERO);
    }

    #[test]
    fn test_percentage_over_100_capped_at_subtotal() {
        let c = coupon(DiscountType::Percentage, 150);
        let q = quote(&[item("p1", 1000, 1)], Some(&c), Utc::now());
        assert_eq!(q.discount, Decimal::from(1000));
        assert_eq!(q.total, Decimal::ZERO);
    }

    #[test]
    fn test_expired_coupon_gives_no_discount() {
        let mut c = coupon(DiscountType::Percentage, 10);
        c.valid_until = Utc::now() - TimeDelta::days(1);
        c.valid_from = Utc::now() - TimeDelta::days(2);
        let q = quote(&[item("p1", 5000, 2)], Some(&c), Utc::now());
        assert_eq!(q.discount, Decimal::ZERO);
        assert_eq!(q.total, Decimal::from(10000));
    }

    #[test]
    fn test_exhausted_coupon_gives_no_discount() {
        let mut c = coupon(DiscountType::Percentage, 50);
        c.used_count = c.usage_limit;
        let q = quote(&[item("p1", 5000, 2)], Some(&c), Utc::now());
        assert_eq!(q.discount, Decimal::ZERO);
    }

    #[test]
    fn test_empty_cart_quotes_zero() {
        let q = quote(&[], None, Utc::now());
        assert_eq!(q.subtotal, Decimal::ZERO);
        assert_eq!(q.total, Decimal::ZERO);
    }

    #[test]
    fn test_total_never_negative() {
        let mut c = coupon(DiscountType::Fixed, 50000);
        c.discount_value = Decimal::from(50000);
        let q = quote(&[item("p1", 100, 1)], Some(&c), Utc::now());
        assert!(q.total >= Decimal::ZERO);
    }

    #[test]
    fn test_repeated_invocation_is_identical() {
        let c = coupon(DiscountType::Percentage, 10);
        let items = [item("p1", 5000, 2), item("p2", 1200, 3)];
        let now = Utc::now();
        assert_eq!(quote(&items, Some(&c), now), quote(&items, Some(&c), now));
    }

    #[test]
    fn test_multiple_lines_sum() {
        let q = quote(&[item("p1", 5000, 2), item("p2", 1200, 3)], None, Utc::now());
        assert_eq!(q.subtotal, Decimal::from(13600));
    }
}
