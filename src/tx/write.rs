//! Read-write transactions

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::{MutexGuard, RwLock};
use tracing::debug;

use crate::bucket::{Bucket, BucketIndex, BucketMut};
use crate::error::{BucketKvError, Result};
use crate::wal::{Operation, WalWriter};

use super::{Snapshot, TxGuard};

/// A read-write transaction
///
/// Holds the store's writer lock for its whole lifetime. Changes go to a
/// private working copy of the latest snapshot and become visible to new
/// readers only when [`WriteTx::commit`] succeeds. Dropping without
/// committing rolls back.
pub struct WriteTx<'s> {
    /// Where committed snapshots are published
    committed: &'s RwLock<Arc<Snapshot>>,

    /// Commit log; holding this guard is the single-writer lock
    wal: MutexGuard<'s, WalWriter>,

    /// Working copy, starts as the latest committed snapshot
    working: Snapshot,

    /// Operations performed so far, in order
    ops: Vec<Operation>,

    _guard: TxGuard,
}

impl<'s> WriteTx<'s> {
    pub(crate) fn new(
        committed: &'s RwLock<Arc<Snapshot>>,
        wal: MutexGuard<'s, WalWriter>,
        guard: TxGuard,
    ) -> Self {
        // O(buckets): each index clone shares its nodes with the committed one
        let working = Snapshot::clone(&**committed.read());

        Self {
            committed,
            wal,
            working,
            ops: Vec::new(),
            _guard: guard,
        }
    }

    /// Generation this transaction started from
    pub fn generation(&self) -> u64 {
        self.working.generation
    }

    /// Read handle on a bucket, seeing this transaction's own writes
    pub fn bucket(&self, name: &[u8]) -> Result<Bucket<'_>> {
        self.working.bucket(name)
    }

    /// Write handle on an existing bucket
    pub fn bucket_mut(&mut self, name: &[u8]) -> Result<BucketMut<'_>> {
        let index = self
            .working
            .buckets
            .get_mut(name)
            .ok_or_else(|| BucketKvError::bucket_not_found(name))?;

        Ok(BucketMut::new(Bytes::copy_from_slice(name), index, &mut self.ops))
    }

    /// Write handle on a bucket, creating it empty if absent
    pub fn create_bucket_if_absent(&mut self, name: &[u8]) -> Result<BucketMut<'_>> {
        if name.is_empty() {
            return Err(BucketKvError::invalid("bucket name must not be empty"));
        }

        let name = Bytes::copy_from_slice(name);
        if !self.working.buckets.contains_key(&name) {
            self.working
                .buckets
                .insert(name.clone(), BucketIndex::new());
            self.ops.push(Operation::CreateBucket { name: name.to_vec() });
        }

        let index = self
            .working
            .buckets
            .get_mut(&name)
            .ok_or_else(|| BucketKvError::bucket_not_found(&name))?;
        Ok(BucketMut::new(name, index, &mut self.ops))
    }

    /// Drop a bucket and all of its keys
    pub fn delete_bucket(&mut self, name: &[u8]) -> Result<()> {
        if self.working.buckets.remove(name).is_none() {
            return Err(BucketKvError::bucket_not_found(name));
        }
        self.ops.push(Operation::DeleteBucket { name: name.to_vec() });
        Ok(())
    }

    pub fn has_bucket(&self, name: &[u8]) -> bool {
        self.working.buckets.contains_key(name)
    }

    pub fn bucket_names(&self) -> Vec<Vec<u8>> {
        self.working.bucket_names()
    }

    /// Number of operations recorded so far
    pub fn pending_operations(&self) -> usize {
        self.ops.len()
    }

    /// Commit all changes atomically; returns the resulting generation
    ///
    /// Steps:
    /// 1. Append the batch to the commit log (one entry)
    /// 2. Publish the working copy as the new committed snapshot
    ///
    /// A transaction that changed nothing commits without logging and
    /// leaves the generation unchanged. If logging fails nothing is
    /// published.
    pub fn commit(mut self) -> Result<u64> {
        if self.ops.is_empty() {
            debug!(generation = self.working.generation, "empty write transaction");
            return Ok(self.working.generation);
        }

        let op_count = self.ops.len();
        let ops = std::mem::take(&mut self.ops);
        let lsn = self.wal.append(ops)?;

        let mut working = std::mem::take(&mut self.working);
        working.generation = lsn;
        *self.committed.write() = Arc::new(working);

        debug!(generation = lsn, operations = op_count, "write transaction committed");
        Ok(lsn)
    }

    /// Discard all changes
    pub fn rollback(self) {
        debug!(
            generation = self.working.generation,
            operations = self.ops.len(),
            "write transaction rolled back"
        );
    }
}
