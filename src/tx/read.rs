//! Read-only transactions

use std::sync::Arc;

use crate::bucket::Bucket;
use crate::error::Result;

use super::{Snapshot, TxGuard};

/// A read-only transaction pinned to one committed snapshot
///
/// Released when dropped. Exposes no mutation API.
pub struct ReadTx {
    snapshot: Arc<Snapshot>,
    _guard: TxGuard,
}

impl ReadTx {
    pub(crate) fn new(snapshot: Arc<Snapshot>, guard: TxGuard) -> Self {
        Self {
            snapshot,
            _guard: guard,
        }
    }

    /// Generation of the snapshot this transaction reads
    pub fn generation(&self) -> u64 {
        self.snapshot.generation
    }

    /// Look up a bucket by name
    ///
    /// Returns `BucketNotFound` if it does not exist in this snapshot.
    pub fn bucket(&self, name: &[u8]) -> Result<Bucket<'_>> {
        self.snapshot.bucket(name)
    }

    pub fn has_bucket(&self, name: &[u8]) -> bool {
        self.snapshot.buckets.contains_key(name)
    }

    /// Names of all buckets, in ascending order
    pub fn bucket_names(&self) -> Vec<Vec<u8>> {
        self.snapshot.bucket_names()
    }
}
