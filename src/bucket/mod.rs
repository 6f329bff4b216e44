//! Bucket Module
//!
//! Named, ordered key-value namespaces.
//!
//! ## Responsibilities
//! - O(log n) point lookup, insert and seek
//! - O(1) cardinality
//! - Ordered and prefix iteration through cursors
//! - Structural sharing between snapshots
//!
//! ## Data Structure Choice
//! Persistent `OrdMap<Bytes, Bytes>`:
//! - Ordered keys give range and prefix scans for free
//! - A write transaction starts from an O(1) clone of the committed index;
//!   each write copies only the path to the key, so readers never see it
//!   and a write costs O(log n) whatever the bucket size

mod cursor;
mod index;

use bytes::Bytes;

use crate::error::{BucketKvError, Result};
use crate::wal::Operation;

pub use cursor::{Cursor, Prefix};
pub use index::{BucketIndex, Entries};

/// Read handle on a bucket inside a transaction
#[derive(Clone, Copy)]
pub struct Bucket<'a> {
    name: &'a [u8],
    index: &'a BucketIndex,
}

impl<'a> Bucket<'a> {
    pub(crate) fn new(name: &'a [u8], index: &'a BucketIndex) -> Self {
        Self { name, index }
    }

    /// The bucket's name
    pub fn name(&self) -> &'a [u8] {
        self.name
    }

    /// Copy of the value stored under `key`
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.index.get(key).map(|v| v.to_vec())
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.index.contains_key(key)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// A cursor positioned before the first key
    pub fn cursor(&self) -> Cursor<'a> {
        Cursor::new(&*self.index)
    }

    /// All entries in ascending key order
    pub fn iter(&self) -> Cursor<'a> {
        Cursor::new(&*self.index)
    }

    /// Entries whose key starts with `prefix`
    pub fn prefix<'p>(&self, prefix: &'p [u8]) -> Prefix<'a, 'p> {
        Prefix::new(&*self.index, prefix)
    }

    /// Number of keys starting with `prefix` (scans the matching range)
    pub fn count_prefix(&self, prefix: &[u8]) -> usize {
        self.prefix(prefix).count()
    }
}

/// Write handle on a bucket inside a write transaction
///
/// Every mutation is applied to the transaction's private copy of the
/// bucket and recorded for the commit log.
pub struct BucketMut<'a> {
    name: Bytes,
    index: &'a mut BucketIndex,
    ops: &'a mut Vec<Operation>,
}

impl<'a> BucketMut<'a> {
    pub(crate) fn new(
        name: Bytes,
        index: &'a mut BucketIndex,
        ops: &'a mut Vec<Operation>,
    ) -> Self {
        Self { name, index, ops }
    }

    /// Read view of the bucket's current (uncommitted) state
    pub fn as_bucket(&self) -> Bucket<'_> {
        Bucket::new(&self.name, &*self.index)
    }

    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.index.get(key).map(|v| v.to_vec())
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(&*self.index)
    }

    pub fn prefix<'p>(&self, prefix: &'p [u8]) -> Prefix<'_, 'p> {
        Prefix::new(&*self.index, prefix)
    }

    /// Insert or replace `key`. Keys must be non-empty.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(BucketKvError::invalid("key must not be empty"));
        }

        self.index.put(Bytes::copy_from_slice(key), Bytes::copy_from_slice(value));
        self.ops.push(Operation::Put {
            bucket: self.name.to_vec(),
            key: key.to_vec(),
            value: value.to_vec(),
        });
        Ok(())
    }

    /// Remove `key`; returns whether it was present
    pub fn delete(&mut self, key: &[u8]) -> bool {
        if self.index.delete(key).is_none() {
            return false;
        }

        self.ops.push(Operation::Delete {
            bucket: self.name.to_vec(),
            key: key.to_vec(),
        });
        true
    }

    /// Snapshot of the entries under `prefix` that outlives this borrow
    pub(crate) fn prefix_entries(&self, prefix: &[u8]) -> Vec<(Bytes, Bytes)> {
        Prefix::new(&*self.index, prefix).into_owned()
    }
}
