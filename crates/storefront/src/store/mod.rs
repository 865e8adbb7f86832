//! Cart and wishlist state containers with snapshot persistence.
//!
//! Each browser session owns one cart and one wishlist, addressed by the
//! snapshot key carried in the session cookie. Stores are explicit,
//! injectable instances: handlers open them against the shared
//! [`SnapshotStore`], mutate, and drop them; nothing here is a global.
//!
//! # Consistency
//!
//! Mutations run synchronously under the store lock, so within one session
//! observers always see aggregates consistent with the line items. Across
//! two sessions sharing a snapshot key (e.g. two tabs) there is no cross
//! coordination: the last write wins and may silently overwrite the other
//! tab's cart. That weak-consistency policy is deliberate.

pub mod cart;
pub mod persist;
pub mod wishlist;

pub use cart::{CartLine, CartListener, CartSnapshot, CartStore, CartTotals};
pub use persist::{FileSnapshotStore, MemorySnapshotStore, PersistenceError, SnapshotStore};
pub use wishlist::{WishlistListener, WishlistSnapshot, WishlistStore};
