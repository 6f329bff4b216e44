//! Bucket index implementation
//!
//! Persistent ordered map (`im::OrdMap`). Cloning an index is O(1) and a
//! write to a clone copies only the O(log n) nodes on the path to the key,
//! so a write transaction never pays for the size of the bucket it touches.
//! Keys and values are `Bytes`, so copied nodes only bump reference counts
//! on the payloads.

use std::ops::{Bound, RangeBounds};

use bytes::Bytes;
use im::ordmap::{Iter, OrdMap};

/// Iterator over index entries in ascending key order
pub type Entries<'a> = Iter<'a, Bytes, Bytes>;

/// Ordered key-value index backing one bucket
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketIndex {
    entries: OrdMap<Bytes, Bytes>,
}

impl BucketIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key
    pub fn get(&self, key: &[u8]) -> Option<&Bytes> {
        self.entries.get(key)
    }

    /// Whether the key is present
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace; returns the previous value
    pub fn put(&mut self, key: Bytes, value: Bytes) -> Option<Bytes> {
        self.entries.insert(key, value)
    }

    /// Remove a key; returns the removed value
    pub fn delete(&mut self, key: &[u8]) -> Option<Bytes> {
        self.entries.remove(key)
    }

    /// Number of keys (maintained by the map, O(1))
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in ascending key order
    pub fn iter(&self) -> Entries<'_> {
        self.range(..)
    }

    /// Entries with key >= `start`, in ascending order
    pub fn range_from(&self, start: &[u8]) -> Entries<'_> {
        self.range((Bound::Included(start), Bound::Unbounded))
    }

    fn range<R: RangeBounds<[u8]>>(&self, bounds: R) -> Entries<'_> {
        self.entries.range::<R, [u8]>(bounds)
    }
}
