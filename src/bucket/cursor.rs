//! Cursors over a bucket
//!
//! Forward-only iteration positioned by seek-to-first or seek-to-key.

use std::iter::FusedIterator;

use bytes::Bytes;

use super::index::Entries;
use super::BucketIndex;

/// A forward-only cursor over one bucket
///
/// Created positioned before the first key. `first` and `seek` reposition it
/// and return the entry they land on; iteration continues from there.
pub struct Cursor<'a> {
    index: &'a BucketIndex,
    range: Entries<'a>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(index: &'a BucketIndex) -> Self {
        Self {
            index,
            range: index.iter(),
        }
    }

    /// Move to the first key in the bucket
    pub fn first(&mut self) -> Option<(&'a [u8], &'a [u8])> {
        self.range = self.index.iter();
        self.next()
    }

    /// Move to the first key >= `key`
    pub fn seek(&mut self, key: &[u8]) -> Option<(&'a [u8], &'a [u8])> {
        self.range = self.index.range_from(key);
        self.next()
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        self.range.next().map(|(k, v)| (k.as_ref(), v.as_ref()))
    }
}

impl FusedIterator for Cursor<'_> {}

/// Entries whose key starts with a prefix, in ascending order
///
/// Seeks to the first key >= prefix and stops at the first key that no
/// longer matches; matching keys are contiguous in byte order.
pub struct Prefix<'a, 'p> {
    range: Entries<'a>,
    prefix: &'p [u8],
    done: bool,
}

impl<'a, 'p> Prefix<'a, 'p> {
    pub(crate) fn new(index: &'a BucketIndex, prefix: &'p [u8]) -> Self {
        Self {
            range: index.range_from(prefix),
            prefix,
            done: false,
        }
    }

    /// Raw `Bytes` handles for the matching entries
    pub(crate) fn into_owned(self) -> Vec<(Bytes, Bytes)> {
        let prefix = self.prefix;
        self.range
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<'a> Iterator for Prefix<'a, '_> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.range.next() {
            Some((k, v)) if k.starts_with(self.prefix) => Some((k.as_ref(), v.as_ref())),
            _ => {
                self.done = true;
                None
            }
        }
    }
}

impl FusedIterator for Prefix<'_, '_> {}
