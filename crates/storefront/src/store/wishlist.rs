//! Wishlist state container.
//!
//! Set semantics over full product snapshots: a product id appears at most
//! once. `toggle` is atomic under the store lock, so two views toggling the
//! same product cannot race into a duplicate entry.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use clementine_core::Product;
use serde::{Deserialize, Serialize};

use super::persist::SnapshotStore;

/// The persisted state of a wishlist: `{ "items": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WishlistSnapshot {
    pub items: Vec<Product>,
}

/// Callback invoked synchronously after every mutation.
pub type WishlistListener = Box<dyn Fn(&WishlistSnapshot) + Send + Sync>;

struct WishlistInner {
    items: Vec<Product>,
    listeners: Vec<WishlistListener>,
}

/// Injectable wishlist state manager, one per session snapshot key.
///
/// Same persistence and failure policy as the cart store: rehydrate once at
/// open, write the whole snapshot after every mutation, log and swallow
/// persistence failures.
pub struct WishlistStore {
    inner: Mutex<WishlistInner>,
    persist: Arc<dyn SnapshotStore>,
    key: String,
}

impl WishlistStore {
    /// Open the wishlist stored under `key`. Missing or corrupt snapshots
    /// fall back to an empty list.
    #[must_use]
    pub fn open(persist: Arc<dyn SnapshotStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let items = match persist.load(&key) {
            Ok(Some(value)) => match serde_json::from_value::<WishlistSnapshot>(value) {
                Ok(snapshot) => snapshot.items,
                Err(e) => {
                    tracing::warn!(key, error = %e, "Corrupt wishlist snapshot, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to load wishlist snapshot, starting empty");
                Vec::new()
            }
        };

        Self {
            inner: Mutex::new(WishlistInner {
                items,
                listeners: Vec::new(),
            }),
            persist,
            key,
        }
    }

    fn lock(&self) -> MutexGuard<'_, WishlistInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a listener notified synchronously after each mutation.
    pub fn subscribe(&self, listener: WishlistListener) {
        self.lock().listeners.push(listener);
    }

    /// Toggle membership for `product`: remove when present, otherwise add
    /// the full snapshot. Returns `true` when the product was added.
    ///
    /// The check and the mutation happen under one lock acquisition, so
    /// concurrent toggles serialize instead of double-inserting.
    pub fn toggle(&self, product: &Product) -> bool {
        let mut inner = self.lock();
        let added = if inner.items.iter().any(|p| p.id == product.id) {
            inner.items.retain(|p| p.id != product.id);
            false
        } else {
            inner.items.push(product.clone());
            true
        };
        self.after_mutation(&inner);
        added
    }

    /// Remove the entry for `id`, if present. Idempotent.
    ///
    /// Returns the removed product so callers can move it elsewhere (e.g.
    /// into the cart) without a second lookup.
    pub fn remove(&self, id: &str) -> Option<Product> {
        let mut inner = self.lock();
        let pos = inner.items.iter().position(|p| p.id == id)?;
        let removed = inner.items.remove(pos);
        self.after_mutation(&inner);
        Some(removed)
    }

    /// Empty the wishlist.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.items.clear();
        self.after_mutation(&inner);
    }

    /// Pure membership lookup, no side effects.
    #[must_use]
    pub fn is_wishlisted(&self, id: &str) -> bool {
        self.lock().items.iter().any(|p| p.id == id)
    }

    /// Current state of the wishlist.
    #[must_use]
    pub fn snapshot(&self) -> WishlistSnapshot {
        WishlistSnapshot {
            items: self.lock().items.clone(),
        }
    }

    fn after_mutation(&self, inner: &MutexGuard<'_, WishlistInner>) {
        let snapshot = WishlistSnapshot {
            items: inner.items.clone(),
        };
        for listener in &inner.listeners {
            listener(&snapshot);
        }

        match serde_json::to_value(&snapshot) {
            Ok(value) => {
                if let Err(e) = self.persist.save(&self.key, &value) {
                    tracing::warn!(key = %self.key, error = %e, "Failed to persist wishlist snapshot");
                }
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to serialize wishlist snapshot");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::persist::MemorySnapshotStore;
    use rust_decimal::Decimal;

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            brand: "Clementine".to_string(),
            category: "misc".to_string(),
            description: String::new(),
            price: Decimal::new(500, 2),
            stock: 1,
            rating: 0.0,
            tags: vec![],
            image_urls: String::new(),
            created_at: None,
        }
    }

    fn store() -> WishlistStore {
        WishlistStore::open(Arc::new(MemorySnapshotStore::new()), "wishlist-test")
    }

    #[test]
    fn toggle_twice_is_an_involution() {
        let wishlist = store();
        assert!(!wishlist.is_wishlisted("p1"));

        assert!(wishlist.toggle(&product("p1")));
        assert!(wishlist.is_wishlisted("p1"));

        assert!(!wishlist.toggle(&product("p1")));
        assert!(!wishlist.is_wishlisted("p1"));
        assert!(wishlist.snapshot().items.is_empty());
    }

    #[test]
    fn toggle_never_duplicates() {
        let wishlist = store();
        wishlist.toggle(&product("p1"));
        // A second add attempt via toggle removes instead of duplicating;
        // direct re-toggle-toggle leaves exactly one entry.
        wishlist.toggle(&product("p1"));
        wishlist.toggle(&product("p1"));
        assert_eq!(wishlist.snapshot().items.len(), 1);
    }

    #[test]
    fn remove_returns_the_entry_once() {
        let wishlist = store();
        wishlist.toggle(&product("p1"));

        let removed = wishlist.remove("p1");
        assert_eq!(removed.map(|p| p.id), Some("p1".to_string()));
        assert!(wishlist.remove("p1").is_none());
    }

    #[test]
    fn snapshot_round_trips_through_persistence() {
        let persist = Arc::new(MemorySnapshotStore::new());
        let wishlist =
            WishlistStore::open(Arc::clone(&persist) as Arc<dyn SnapshotStore>, "wl-rt");
        wishlist.toggle(&product("p2"));
        wishlist.toggle(&product("p1"));

        let reopened = WishlistStore::open(persist, "wl-rt");
        assert!(reopened.is_wishlisted("p1"));
        assert!(reopened.is_wishlisted("p2"));
        assert_eq!(reopened.snapshot().items.len(), 2);
    }

    #[test]
    fn persistence_failure_degrades_gracefully() {
        let wishlist = WishlistStore::open(Arc::new(MemorySnapshotStore::failing()), "wl-fail");
        wishlist.toggle(&product("p1"));
        assert!(wishlist.is_wishlisted("p1"));
    }
}
