//! Cart behavior across the persistence port: merging, quantity clamps,
//! the checkout lock, and survival across store reopens.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;

use pamtalk_checkout::cart::{CART_STORAGE_KEY, CartError, CartStore, InMemoryStore, KeyValueStore};
use pamtalk_checkout::orchestrator::{CheckoutFlow, CheckoutRequest, PaymentChoice};
use pamtalk_checkout::ports::{AutoConfirm, SilentNotifier};
use pamtalk_core::{CustomerId, ProductId};

use pamtalk_integration_tests::{FakeLedger, FakeOrderService, test_config};

fn apples() -> ProductId {
    ProductId::new("p1")
}

#[test]
fn test_adding_same_product_merges_lines() {
    let mut cart = CartStore::open(InMemoryStore::new()).unwrap();
    cart.add_item(apples(), "Apples", Decimal::from(5000), 2)
        .unwrap();
    cart.add_item(apples(), "Apples", Decimal::from(5000), 3)
        .unwrap();

    let items = cart.snapshot();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 5);
    assert_eq!(cart.item_count(), 5);
}

#[test]
fn test_quantity_delta_below_zero_removes_line() {
    let mut cart = CartStore::open(InMemoryStore::new()).unwrap();
    cart.add_item(apples(), "Apples", Decimal::from(5000), 2)
        .unwrap();

    // A delta that overshoots zero removes the line rather than leaving a
    // zero or negative quantity behind
    cart.update_quantity(&apples(), -5).unwrap();
    assert!(cart.is_empty());
}

#[test]
fn test_updating_absent_product_is_noop() {
    let mut cart = CartStore::open(InMemoryStore::new()).unwrap();
    cart.add_item(apples(), "Apples", Decimal::from(5000), 2)
        .unwrap();
    cart.update_quantity(&ProductId::new("p9"), 1).unwrap();
    cart.remove_item(&ProductId::new("p9")).unwrap();
    assert_eq!(cart.item_count(), 2);
}

#[test]
fn test_cart_survives_store_reopen() {
    let store = Arc::new(InMemoryStore::new());
    {
        let mut cart = CartStore::open(Arc::clone(&store)).unwrap();
        cart.add_item(apples(), "Apples", Decimal::from(5000), 2)
            .unwrap();
        cart.add_item(ProductId::new("p2"), "Rice 10kg", Decimal::from(32000), 1)
            .unwrap();
    }

    let reopened = CartStore::open(Arc::clone(&store)).unwrap();
    assert_eq!(reopened.snapshot().len(), 2);
    assert_eq!(reopened.item_count(), 3);
}

#[test]
fn test_clear_removes_the_persisted_payload() {
    let store = Arc::new(InMemoryStore::new());
    let mut cart = CartStore::open(Arc::clone(&store)).unwrap();
    cart.add_item(apples(), "Apples", Decimal::from(5000), 2)
        .unwrap();
    assert!(store.get(CART_STORAGE_KEY).unwrap().is_some());

    cart.clear().unwrap();
    assert!(store.get(CART_STORAGE_KEY).unwrap().is_none());
}

#[test]
fn test_locked_cart_rejects_every_mutation() {
    let mut cart = CartStore::open(InMemoryStore::new()).unwrap();
    cart.add_item(apples(), "Apples", Decimal::from(5000), 2)
        .unwrap();
    cart.lock_for_checkout();

    assert!(matches!(
        cart.add_item(ProductId::new("p2"), "Rice", Decimal::from(32000), 1),
        Err(CartError::LockedForCheckout)
    ));
    assert!(matches!(
        cart.update_quantity(&apples(), 1),
        Err(CartError::LockedForCheckout)
    ));
    assert!(matches!(
        cart.remove_item(&apples()),
        Err(CartError::LockedForCheckout)
    ));
    assert!(matches!(cart.clear(), Err(CartError::LockedForCheckout)));

    cart.unlock();
    cart.update_quantity(&apples(), 1).unwrap();
    assert_eq!(cart.item_count(), 3);
}

#[tokio::test]
async fn test_successful_checkout_clears_persisted_state() {
    let store = Arc::new(InMemoryStore::new());
    let mut cart = CartStore::open(Arc::clone(&store)).unwrap();
    cart.add_item(apples(), "Apples", Decimal::from(5000), 2)
        .unwrap();

    let flow = CheckoutFlow::new(
        cart,
        Arc::new(FakeLedger::new(true, 0)),
        Arc::new(FakeOrderService::new()),
        AutoConfirm,
        SilentNotifier,
        &test_config(),
    );
    flow.begin(CheckoutRequest {
        customer: CustomerId::new("u-1024"),
        coupon: None,
        method: PaymentChoice::Cash,
        cancel: None,
    })
    .await
    .unwrap();

    // The persisted copy goes with the in-memory one
    assert!(store.get(CART_STORAGE_KEY).unwrap().is_none());
    let reopened = CartStore::open(Arc::clone(&store)).unwrap();
    assert!(reopened.is_empty());
}

#[tokio::test]
async fn test_failed_checkout_leaves_cart_mutable() {
    let store = Arc::new(InMemoryStore::new());
    let mut cart = CartStore::open(Arc::clone(&store)).unwrap();
    cart.add_item(apples(), "Apples", Decimal::from(5000), 2)
        .unwrap();

    let flow = CheckoutFlow::new(
        cart,
        Arc::new(FakeLedger::new(true, 0)),
        Arc::new(FakeOrderService::new().failing(500)),
        AutoConfirm,
        SilentNotifier,
        &test_config(),
    );
    flow.begin(CheckoutRequest {
        customer: CustomerId::new("u-1024"),
        coupon: None,
        method: PaymentChoice::Cash,
        cancel: None,
    })
    .await
    .unwrap_err();

    // The attempt released its lock; the session continues where it was
    let cart = flow.cart();
    let mut cart = cart.lock().await;
    assert!(!cart.is_locked());
    assert_eq!(cart.item_count(), 2);
    cart.add_item(ProductId::new("p2"), "Rice 10kg", Decimal::from(32000), 1)
        .unwrap();
    assert_eq!(cart.item_count(), 3);
}
