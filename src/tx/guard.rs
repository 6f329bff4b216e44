//! Per-thread transaction registry
//!
//! Tracks which stores the current thread has a transaction open on, so a
//! nested begin is rejected before it can block on the writer lock.

use std::cell::RefCell;
use std::marker::PhantomData;

use crate::error::{BucketKvError, Result};

thread_local! {
    static ACTIVE_STORES: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// Marks `store_id` as busy on this thread until dropped
///
/// `!Send`: it must be released on the thread that registered it.
#[derive(Debug)]
pub(crate) struct TxGuard {
    store_id: u64,
    _not_send: PhantomData<*const ()>,
}

impl TxGuard {
    pub(crate) fn enter(store_id: u64) -> Result<Self> {
        ACTIVE_STORES.with(|active| {
            let mut active = active.borrow_mut();
            if active.contains(&store_id) {
                return Err(BucketKvError::TransactionReentrancy);
            }
            active.push(store_id);
            Ok(Self {
                store_id,
                _not_send: PhantomData,
            })
        })
    }
}

impl Drop for TxGuard {
    fn drop(&mut self) {
        // try_with: the thread-local may already be gone during thread teardown
        let _ = ACTIVE_STORES.try_with(|active| {
            active.borrow_mut().retain(|&id| id != self.store_id);
        });
    }
}
