//! Cart store with pluggable persistence.
//!
//! The cart for one active session lives in memory and is mirrored to a
//! key-value store under a fixed key after every mutation, so a session
//! survives process restarts the way the web client's cart survives page
//! reloads. The store is injected rather than ambient, which lets the
//! orchestrator be tested against [`InMemoryStore`].

use pamtalk_core::{CartItem, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed storage key for the serialized cart.
pub const CART_STORAGE_KEY: &str = "pamtalk.cart";

/// Errors raised by a [`KeyValueStore`] implementation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store could not be read or written.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Persistence failed.
    #[error("cart storage error: {0}")]
    Storage(#[from] StorageError),

    /// The persisted cart could not be serialized or deserialized.
    #[error("cart serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The cart is locked by an in-flight checkout.
    #[error("cart is locked by an in-flight checkout")]
    LockedForCheckout,
}

/// A minimal key-value persistence port.
///
/// Mirrors the browser `localStorage` contract the web client relies on:
/// string keys, string values, last write wins.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn put(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. No-op when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        (**self).put(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        (**self).put(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// An in-memory [`KeyValueStore`] for tests and demo sessions.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        entries.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Persisted cart payload.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedCart {
    items: Vec<CartItem>,
}

/// The shopping cart for one active session.
///
/// Mutations persist through the injected [`KeyValueStore`]. While a
/// checkout is in flight the cart is locked; mutations fail with
/// [`CartError::LockedForCheckout`] so a concurrent page cannot corrupt the
/// snapshot the orchestrator is working from.
#[derive(Debug)]
pub struct CartStore<S: KeyValueStore> {
    store: S,
    items: Vec<CartItem>,
    locked: bool,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Create a cart backed by `store`, restoring any persisted items.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the persisted cart cannot be read or parsed.
    pub fn open(store: S) -> Result<Self, CartError> {
        let items = match store.get(CART_STORAGE_KEY)? {
            Some(raw) => serde_json::from_str::<PersistedCart>(&raw)?.items,
            None => Vec::new(),
        };
        Ok(Self {
            store,
            items,
            locked: false,
        })
    }

    /// Add `quantity` units of a product.
    ///
    /// If the product is already in the cart its quantity is incremented;
    /// otherwise a new line is appended.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LockedForCheckout`] during an in-flight checkout,
    /// or a persistence error.
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        name: impl Into<String>,
        unit_price: rust_decimal::Decimal,
        quantity: u32,
    ) -> Result<(), CartError> {
        self.ensure_unlocked()?;
        let quantity = quantity.max(1);

        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem {
                product_id,
                name: name.into(),
                unit_price,
                quantity,
            });
        }
        self.persist()
    }

    /// Remove a product from the cart. No-op when absent.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LockedForCheckout`] during an in-flight checkout,
    /// or a persistence error.
    pub fn remove_item(&mut self, product_id: &ProductId) -> Result<(), CartError> {
        self.ensure_unlocked()?;
        self.items.retain(|i| &i.product_id != product_id);
        self.persist()
    }

    /// Adjust a product's quantity by `delta`.
    ///
    /// A line whose quantity would drop to zero or below is removed
    /// entirely; quantities never go negative. No-op when the product is
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LockedForCheckout`] during an in-flight checkout,
    /// or a persistence error.
    pub fn update_quantity(&mut self, product_id: &ProductId, delta: i64) -> Result<(), CartError> {
        self.ensure_unlocked()?;

        let Some(index) = self.items.iter().position(|i| &i.product_id == product_id) else {
            return Ok(());
        };

        if let Some(item) = self.items.get_mut(index) {
            let next = i64::from(item.quantity).saturating_add(delta);
            if next <= 0 {
                self.items.remove(index);
            } else {
                item.quantity = u32::try_from(next).unwrap_or(u32::MAX);
            }
        }
        self.persist()
    }

    /// Empty the cart. Called by the orchestrator after a fully successful
    /// checkout.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LockedForCheckout`] during an in-flight checkout,
    /// or a persistence error.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.ensure_unlocked()?;
        self.items.clear();
        self.store.remove(CART_STORAGE_KEY)?;
        Ok(())
    }

    /// An immutable copy of the current items.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CartItem> {
        self.items.clone()
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Mark the cart read-only for the duration of a checkout attempt.
    pub fn lock_for_checkout(&mut self) {
        self.locked = true;
    }

    /// Release the checkout lock.
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Whether the cart is currently locked by a checkout attempt.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    fn ensure_unlocked(&self) -> Result<(), CartError> {
        if self.locked {
            return Err(CartError::LockedForCheckout);
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), CartError> {
        let raw = serde_json::to_string(&PersistedCart {
            items: self.items.clone(),
        })?;
        self.store.put(CART_STORAGE_KEY, raw)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn cart() -> CartStore<InMemoryStore> {
        CartStore::open(InMemoryStore::new()).unwrap()
    }

    #[test]
    fn test_add_item_appends_new_line() {
        let mut cart = cart();
        cart.add_item(ProductId::new("p1"), "Apples", Decimal::from(5000), 2)
            .unwrap();
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.snapshot().len(), 1);
    }

    #[test]
    fn test_add_item_merges_existing_line() {
        let mut cart = cart();
        cart.add_item(ProductId::new("p1"), "Apples", Decimal::from(5000), 1)
            .unwrap();
        cart.add_item(ProductId::new("p1"), "Apples", Decimal::from(5000), 3)
            .unwrap();
        let items = cart.snapshot();
        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().quantity, 4);
    }

    #[test]
    fn test_remove_item_absent_is_noop() {
        let mut cart = cart();
        cart.add_item(ProductId::new("p1"), "Apples", Decimal::from(5000), 1)
            .unwrap();
        cart.remove_item(&ProductId::new("p9")).unwrap();
        assert_eq!(cart.snapshot().len(), 1);
    }

    #[test]
    fn test_update_quantity_positive_delta() {
        let mut cart = cart();
        cart.add_item(ProductId::new("p1"), "Apples", Decimal::from(5000), 1)
            .unwrap();
        cart.update_quantity(&ProductId::new("p1"), 2).unwrap();
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_update_quantity_to_zero_removes_line() {
        let mut cart = cart();
        cart.add_item(ProductId::new("p1"), "Apples", Decimal::from(5000), 2)
            .unwrap();
        cart.update_quantity(&ProductId::new("p1"), -2).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_below_zero_removes_line() {
        // A -5 delta against quantity 2 removes the line entirely
        let mut cart = cart();
        cart.add_item(ProductId::new("p1"), "Apples", Decimal::from(5000), 2)
            .unwrap();
        cart.update_quantity(&ProductId::new("p1"), -5).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantities_stay_at_least_one() {
        let mut cart = cart();
        cart.add_item(ProductId::new("p1"), "Apples", Decimal::from(5000), 3)
            .unwrap();
        cart.update_quantity(&ProductId::new("p1"), -2).unwrap();
        for item in cart.snapshot() {
            assert!(item.quantity >= 1);
        }
    }

    #[test]
    fn test_locked_cart_rejects_mutation() {
        let mut cart = cart();
        cart.add_item(ProductId::new("p1"), "Apples", Decimal::from(5000), 1)
            .unwrap();
        cart.lock_for_checkout();

        let err = cart
            .add_item(ProductId::new("p2"), "Rice", Decimal::from(32000), 1)
            .unwrap_err();
        assert!(matches!(err, CartError::LockedForCheckout));

        cart.unlock();
        cart.add_item(ProductId::new("p2"), "Rice", Decimal::from(32000), 1)
            .unwrap();
        assert_eq!(cart.snapshot().len(), 2);
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let mut cart = cart();
        cart.add_item(ProductId::new("p1"), "Apples", Decimal::from(5000), 1)
            .unwrap();
        let snapshot = cart.snapshot();
        cart.update_quantity(&ProductId::new("p1"), 5).unwrap();
        assert_eq!(snapshot.first().unwrap().quantity, 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let store = InMemoryStore::new();
        {
            let mut cart = CartStore::open(&store).unwrap();
            cart.add_item(ProductId::new("p1"), "Apples", Decimal::from(5000), 2)
                .unwrap();
        }
        let reopened = CartStore::open(&store).unwrap();
        assert_eq!(reopened.item_count(), 2);
    }

    #[test]
    fn test_clear_removes_persisted_state() {
        let store = InMemoryStore::new();
        {
            let mut cart = CartStore::open(&store).unwrap();
            cart.add_item(ProductId::new("p1"), "Apples", Decimal::from(5000), 2)
                .unwrap();
            cart.clear().unwrap();
        }
        assert!(store.get(CART_STORAGE_KEY).unwrap().is_none());
    }
}
