//! Transaction Module
//!
//! Read-only and read-write views over the store's buckets.
//!
//! ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
//!
//! - **Read transactions** clone the `Arc` of the committed [`Snapshot`] and
//!   never touch the writer lock. They see that snapshot for their whole
//!   lifetime, whatever the writer does afterwards.
//! - **Write transactions** hold the writer lock from begin to
//!   commit/rollback and work on a private copy of the latest snapshot.
//!   Bucket indexes are persistent maps, so that copy shares every node
//!   with the committed state until the writer touches it.
//!   Commit logs the batch, then swaps the new snapshot in with one pointer
//!   store.
//! - **Nesting** of transactions on one store within one thread is refused
//!   with `TransactionReentrancy` instead of deadlocking on the writer lock.

mod guard;
mod read;
mod write;

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::bucket::{Bucket, BucketIndex};
use crate::error::{BucketKvError, Result};
use crate::wal::Operation;

pub(crate) use guard::TxGuard;
pub use read::ReadTx;
pub use write::WriteTx;

/// A committed, immutable state of the store
#[derive(Debug, Clone, Default)]
pub(crate) struct Snapshot {
    /// Number of write transactions committed to reach this state
    pub(crate) generation: u64,

    /// Bucket namespace
    pub(crate) buckets: BTreeMap<Bytes, BucketIndex>,
}

impl Snapshot {
    /// Read handle on a bucket, or `BucketNotFound`
    pub(crate) fn bucket(&self, name: &[u8]) -> Result<Bucket<'_>> {
        self.buckets
            .get_key_value(name)
            .map(|(name, index)| Bucket::new(name, index))
            .ok_or_else(|| BucketKvError::bucket_not_found(name))
    }

    pub(crate) fn bucket_names(&self) -> Vec<Vec<u8>> {
        self.buckets.keys().map(|k| k.to_vec()).collect()
    }

    /// Replay one logged operation (recovery path)
    pub(crate) fn apply(&mut self, op: Operation) -> Result<()> {
        match op {
            Operation::CreateBucket { name } => {
                self.buckets.entry(Bytes::from(name)).or_default();
            }
            Operation::DeleteBucket { name } => {
                self.buckets.remove(name.as_slice());
            }
            Operation::Put { bucket, key, value } => {
                let index = self.replay_target(&bucket)?;
                index.put(Bytes::from(key), Bytes::from(value));
            }
            Operation::Delete { bucket, key } => {
                let index = self.replay_target(&bucket)?;
                index.delete(&key);
            }
        }
        Ok(())
    }

    /// Whole-state operation list, used to compact the commit log
    pub(crate) fn to_operations(&self) -> Vec<Operation> {
        let mut ops = Vec::new();
        for (name, index) in &self.buckets {
            ops.push(Operation::CreateBucket { name: name.to_vec() });
            for (key, value) in index.iter() {
                ops.push(Operation::Put {
                    bucket: name.to_vec(),
                    key: key.to_vec(),
                    value: value.to_vec(),
                });
            }
        }
        ops
    }

    fn replay_target(&mut self, bucket: &[u8]) -> Result<&mut BucketIndex> {
        self.buckets.get_mut(bucket).ok_or_else(|| {
            BucketKvError::WalCorruption(format!(
                "logged write to missing bucket {}",
                String::from_utf8_lossy(bucket)
            ))
        })
    }
}
