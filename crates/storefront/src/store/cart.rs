//! Cart state container.
//!
//! Holds the canonical list of cart lines for one browser session, keyed by
//! product id. All mutations run synchronously under the store's lock, and
//! after each one the store notifies subscribers and writes the whole
//! snapshot through the persistence port. Totals are never stored; they are
//! a pure fold over the current line list.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use clementine_core::CartableProduct;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::persist::SnapshotStore;

/// One distinct product in the active cart.
///
/// Invariants: at most one line per product id; `quantity >= 1` (a line
/// that would drop to 0 is removed instead).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub image_ref: String,
    pub quantity: u32,
}

impl CartLine {
    /// Line subtotal: `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The persisted state of a cart: `{ "items": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub items: Vec<CartLine>,
}

impl CartSnapshot {
    /// Recompute the derived aggregates as a pure fold over the lines.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        CartTotals {
            total: self.items.iter().map(CartLine::line_total).sum(),
            item_count: self.items.iter().map(|l| u64::from(l.quantity)).sum(),
        }
    }
}

/// Derived cart aggregates. Never stored, always recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub total: Decimal,
    pub item_count: u64,
}

/// Callback invoked synchronously after every mutation.
pub type CartListener = Box<dyn Fn(&CartSnapshot, CartTotals) + Send + Sync>;

struct CartInner {
    items: Vec<CartLine>,
    listeners: Vec<CartListener>,
}

/// Injectable cart state manager.
///
/// One instance per session snapshot key. Mutations execute to completion
/// under the lock, so notification and persistence order always matches
/// mutation order. Persistence failures are logged and swallowed: the cart
/// must keep working from memory when the snapshot backend is down.
pub struct CartStore {
    inner: Mutex<CartInner>,
    persist: Arc<dyn SnapshotStore>,
    key: String,
}

impl CartStore {
    /// Open the cart stored under `key`, rehydrating from the snapshot
    /// store. A missing or corrupt snapshot falls back to an empty cart.
    #[must_use]
    pub fn open(persist: Arc<dyn SnapshotStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let items = match persist.load(&key) {
            Ok(Some(value)) => match serde_json::from_value::<CartSnapshot>(value) {
                Ok(snapshot) => snapshot.items,
                Err(e) => {
                    tracing::warn!(key, error = %e, "Corrupt cart snapshot, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to load cart snapshot, starting empty");
                Vec::new()
            }
        };

        Self {
            inner: Mutex::new(CartInner {
                items,
                listeners: Vec::new(),
            }),
            persist,
            key,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CartInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a listener notified synchronously after each mutation.
    pub fn subscribe(&self, listener: CartListener) {
        self.lock().listeners.push(listener);
    }

    /// Add `quantity` of `product`, merging into an existing line for the
    /// same product id. Quantity is clamped to at least 1.
    pub fn add_item(&self, product: &CartableProduct, quantity: u32) {
        let quantity = quantity.max(1);
        let mut inner = self.lock();
        if let Some(line) = inner.items.iter_mut().find(|l| l.id == product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            inner.items.push(CartLine {
                id: product.id.clone(),
                name: product.name.clone(),
                unit_price: product.price,
                image_ref: product.image_ref.clone(),
                quantity,
            });
        }
        self.after_mutation(&inner);
    }

    /// Set the quantity of the line for `id` to `max(1, quantity)`.
    ///
    /// Policy: a missing line is a silent no-op, consistently with
    /// [`remove_item`](Self::remove_item); callers must not rely on this
    /// for validation.
    pub fn update_quantity(&self, id: &str, quantity: u32) {
        let mut inner = self.lock();
        let Some(line) = inner.items.iter_mut().find(|l| l.id == id) else {
            return;
        };
        line.quantity = quantity.max(1);
        self.after_mutation(&inner);
    }

    /// Remove the line for `id`. Idempotent; absent ids are a no-op.
    pub fn remove_item(&self, id: &str) {
        let mut inner = self.lock();
        let before = inner.items.len();
        inner.items.retain(|l| l.id != id);
        if inner.items.len() == before {
            return;
        }
        self.after_mutation(&inner);
    }

    /// Empty the cart.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.items.clear();
        self.after_mutation(&inner);
    }

    /// Current state of the cart.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.lock().items.clone(),
        }
    }

    /// Current derived aggregates.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.snapshot().totals()
    }

    /// Notify subscribers and persist, in that order, while still holding
    /// the lock so observers see a total order consistent with mutations.
    fn after_mutation(&self, inner: &MutexGuard<'_, CartInner>) {
        let snapshot = CartSnapshot {
            items: inner.items.clone(),
        };
        let totals = snapshot.totals();
        for listener in &inner.listeners {
            listener(&snapshot, totals);
        }

        match serde_json::to_value(&snapshot) {
            Ok(value) => {
                if let Err(e) = self.persist.save(&self.key, &value) {
                    tracing::warn!(key = %self.key, error = %e, "Failed to persist cart snapshot");
                }
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to serialize cart snapshot");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::persist::MemorySnapshotStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cartable(id: &str, cents: i64) -> CartableProduct {
        CartableProduct {
            id: id.to_string(),
            name: format!("Product {id}"),
            price: Decimal::new(cents, 2),
            image_ref: String::new(),
        }
    }

    fn store() -> CartStore {
        CartStore::open(Arc::new(MemorySnapshotStore::new()), "cart-test")
    }

    #[test]
    fn add_merges_lines_and_recomputes_totals() {
        let cart = store();
        cart.add_item(&cartable("p1", 999), 2);
        cart.add_item(&cartable("p1", 999), 1);

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].quantity, 3);

        let totals = cart.totals();
        assert_eq!(totals.total, Decimal::new(2997, 2));
        assert_eq!(totals.item_count, 3);
    }

    #[test]
    fn totals_match_fold_over_lines_after_arbitrary_mutations() {
        let cart = store();
        cart.add_item(&cartable("p1", 999), 2);
        cart.add_item(&cartable("p2", 1250), 1);
        cart.update_quantity("p1", 5);
        cart.remove_item("p2");
        cart.add_item(&cartable("p3", 100), 4);

        let snapshot = cart.snapshot();
        let expected_total: Decimal = snapshot.items.iter().map(CartLine::line_total).sum();
        let expected_count: u64 = snapshot.items.iter().map(|l| u64::from(l.quantity)).sum();

        let totals = cart.totals();
        assert_eq!(totals.total, expected_total);
        assert_eq!(totals.item_count, expected_count);
    }

    #[test]
    fn update_quantity_clamps_to_one() {
        let cart = store();
        cart.add_item(&cartable("p1", 999), 3);
        cart.update_quantity("p1", 0);
        assert_eq!(cart.snapshot().items[0].quantity, 1);
    }

    #[test]
    fn update_quantity_missing_line_is_silent_noop() {
        let cart = store();
        cart.add_item(&cartable("p1", 999), 1);
        let before = cart.snapshot();
        cart.update_quantity("missing", 5);
        assert_eq!(cart.snapshot(), before);
    }

    #[test]
    fn remove_is_idempotent() {
        let cart = store();
        cart.add_item(&cartable("p1", 999), 1);
        cart.add_item(&cartable("p2", 500), 2);

        cart.remove_item("p1");
        let once = cart.snapshot();
        cart.remove_item("p1");
        assert_eq!(cart.snapshot(), once);
    }

    #[test]
    fn clear_resets_totals_to_zero() {
        let cart = store();
        cart.add_item(&cartable("p1", 999), 4);
        cart.clear();

        let totals = cart.totals();
        assert_eq!(totals.total, Decimal::ZERO);
        assert_eq!(totals.item_count, 0);
        assert!(cart.snapshot().items.is_empty());
    }

    #[test]
    fn listeners_run_synchronously_per_mutation() {
        let cart = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        cart.subscribe(Box::new(move |snapshot, totals| {
            seen.fetch_add(1, Ordering::SeqCst);
            // Listener always observes consistent aggregates.
            assert_eq!(totals, snapshot.totals());
        }));

        cart.add_item(&cartable("p1", 999), 2);
        cart.update_quantity("p1", 3);
        cart.remove_item("p1");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn snapshot_round_trips_through_persistence() {
        let persist = Arc::new(MemorySnapshotStore::new());
        let cart = CartStore::open(Arc::clone(&persist) as Arc<dyn SnapshotStore>, "cart-rt");
        cart.add_item(&cartable("p2", 500), 2);
        cart.add_item(&cartable("p1", 999), 1);
        let mut original = cart.snapshot().items;

        let reopened = CartStore::open(persist, "cart-rt");
        let mut restored = reopened.snapshot().items;

        // Order-insensitive comparison by id.
        original.sort_by(|a, b| a.id.cmp(&b.id));
        restored.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(original, restored);
    }

    #[test]
    fn persistence_failure_degrades_gracefully() {
        let cart = CartStore::open(Arc::new(MemorySnapshotStore::failing()), "cart-fail");
        cart.add_item(&cartable("p1", 999), 2);
        // The mutation itself still applies.
        assert_eq!(cart.totals().item_count, 2);
    }

    #[test]
    fn corrupt_snapshot_falls_back_to_empty() {
        let persist = Arc::new(MemorySnapshotStore::new());
        persist
            .save("cart-bad", &serde_json::json!({ "items": "not-a-list" }))
            .expect("seed");
        let cart = CartStore::open(persist, "cart-bad");
        assert!(cart.snapshot().items.is_empty());
    }
}
