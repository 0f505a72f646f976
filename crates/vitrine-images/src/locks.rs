//! Per-product serialization of bulk saves
//!
//! Two concurrent saves for one product could both pass the projected
//! count check against the same snapshot and jointly exceed the cap.
//! The engine therefore try-acquires a per-product lock and rejects
//! contention immediately with a retryable error; it never queues.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use vitrine_model::ProductId;

/// Guard held for the duration of one bulk save
pub type ProductGuard = OwnedMutexGuard<()>;

/// Registry of per-product locks
///
/// Lock entries are created on first use and kept for the life of the
/// engine; the per-entry cost is one `Arc<Mutex<()>>`.
#[derive(Debug, Default)]
pub struct ProductLocks {
    inner: DashMap<ProductId, Arc<Mutex<()>>>,
}

impl ProductLocks {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim the product's lock without waiting
    ///
    /// `None` means another save for the same product holds it.
    #[must_use]
    pub fn try_acquire(&self, product_id: ProductId) -> Option<ProductGuard> {
        let lock = self
            .inner
            .entry(product_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.try_lock_owned().ok()
    }

    /// Number of products a lock has been created for
    #[must_use]
    pub fn tracked_products(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_acquire_is_rejected_until_release() {
        let locks = ProductLocks::new();
        let product = ProductId::new();

        let guard = locks.try_acquire(product).unwrap();
        assert!(locks.try_acquire(product).is_none());

        drop(guard);
        assert!(locks.try_acquire(product).is_some());
    }

    #[tokio::test]
    async fn products_lock_independently() {
        let locks = ProductLocks::new();
        let a = ProductId::new();
        let b = ProductId::new();

        let _guard = locks.try_acquire(a).unwrap();
        assert!(locks.try_acquire(b).is_some());
        assert_eq!(locks.tracked_products(), 2);
    }
}
