//! Process-wide order store, shared across session-handler threads.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{FixemError, Result};
use crate::order::OrderRecord;

/// A mutable mapping from current ClOrdID to `OrderRecord`, guarded by a
/// single mutex so every session-handler thread sees a consistent view.
///
/// `spec.md` §4.3/§5 calls for this to be "atomic with respect to other
/// concurrent callers", every public method here takes the lock exactly
/// once, so compound operations like `rekey` never race with a concurrent
/// `insert_if_absent` from another connection.
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: Mutex<HashMap<String, OrderRecord>>,
}

impl OrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: Mutex::new(HashMap::new()),
        }
    }

    /// Insert `order` keyed by `cl_ord_id`, failing if the key is already
    /// present (the duplicate-ClOrdID business reject in `spec.md` §4.6).
    pub fn insert_if_absent(&self, cl_ord_id: &str, order: OrderRecord) -> Result<()> {
        let mut guard = self.orders.lock().expect("order store lock poisoned");
        if guard.contains_key(cl_ord_id) {
            return Err(FixemError::DuplicateClOrdId(cl_ord_id.to_string()));
        }
        guard.insert(cl_ord_id.to_string(), order);
        Ok(())
    }

    /// Look up a clone of the order currently keyed by `cl_ord_id`.
    #[must_use]
    pub fn lookup(&self, cl_ord_id: &str) -> Option<OrderRecord> {
        let guard = self.orders.lock().expect("order store lock poisoned");
        guard.get(cl_ord_id).cloned()
    }

    /// True if `cl_ord_id` currently keys an order.
    #[must_use]
    pub fn contains(&self, cl_ord_id: &str) -> bool {
        let guard = self.orders.lock().expect("order store lock poisoned");
        guard.contains_key(cl_ord_id)
    }

    /// Apply `f` to the order keyed by `cl_ord_id` under the store's lock,
    /// returning whatever `f` returns. Fails with `UnknownOrder` if absent.
    pub fn mutate<F, T>(&self, cl_ord_id: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut OrderRecord) -> T,
    {
        let mut guard = self.orders.lock().expect("order store lock poisoned");
        let order = guard
            .get_mut(cl_ord_id)
            .ok_or_else(|| FixemError::UnknownOrder(cl_ord_id.to_string()))?;
        Ok(f(order))
    }

    /// Atomically remove the order keyed by `old_id`, rekey it onto
    /// `new_id`, and reinsert it: the remove-old/insert-new/history-append
    /// sequence `spec.md` §3/§4.6 requires to happen as one step.
    pub fn rekey(&self, old_id: &str, new_id: &str) -> Result<OrderRecord> {
        let mut guard = self.orders.lock().expect("order store lock poisoned");
        let mut order = guard
            .remove(old_id)
            .ok_or_else(|| FixemError::UnknownOrder(old_id.to_string()))?;
        order.rekey(new_id.to_string());
        guard.insert(new_id.to_string(), order.clone());
        Ok(order)
    }
}
