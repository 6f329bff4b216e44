//! Convenience operations on a [`Store`]
//!
//! Each helper validates its arguments, then runs exactly one transaction.
//! Validation failures return `InvalidArgument` before any transaction is
//! opened.
//!
//! ## Error policy
//! Every helper reports failures explicitly, with one exception:
//! [`Store::get_or_none`] folds `InvalidArgument`, `BucketNotFound` and
//! `KeyNotFound` into `None` for callers that only care about presence.
//! Calling it from inside a transaction is a bug: debug builds panic, release
//! builds log a warning and return `None`.
//!
//! Callbacks may return their own error type `E` as long as it can absorb
//! [`BucketKvError`]; their errors come back unchanged and roll back any write
//! transaction they ran in.

use tracing::warn;

use crate::bucket::{Bucket, BucketMut};
use crate::error::{BucketKvError, Result};
use crate::store::Store;

type CallbackResult<T, E> = std::result::Result<T, E>;

/// Reject empty names, keys and prefixes up front
fn require(what: &str, bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(BucketKvError::invalid(format!("{} must not be empty", what)));
    }
    Ok(())
}

impl Store {
    // =========================================================================
    // Point Operations
    // =========================================================================

    /// Copy of the value under `key` in `bucket`
    ///
    /// Returns `BucketNotFound` or `KeyNotFound` when absent.
    pub fn get(&self, bucket: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        require("bucket", bucket)?;
        require("key", key)?;

        self.view(|tx| tx.bucket(bucket)?.get(key).ok_or(BucketKvError::KeyNotFound))
    }

    /// Like [`Store::get`], but a missing bucket or key, or an empty
    /// argument, reads as `None`
    pub fn get_or_none(&self, bucket: &[u8], key: &[u8]) -> Option<Vec<u8>> {
        match self.get(bucket, key) {
            Ok(value) => Some(value),
            Err(
                BucketKvError::InvalidArgument(_)
                | BucketKvError::BucketNotFound(_)
                | BucketKvError::KeyNotFound,
            ) => None,
            Err(e) => {
                debug_assert!(
                    !matches!(e, BucketKvError::TransactionReentrancy),
                    "get_or_none called inside a transaction"
                );
                warn!(error = %e, "get_or_none failed");
                None
            }
        }
    }

    /// Insert or replace `key` in `bucket`. Key and value must be non-empty.
    pub fn put(&self, bucket: &[u8], key: &[u8], value: &[u8]) -> Result<()> {
        require("bucket", bucket)?;
        require("key", key)?;
        require("value", value)?;

        self.update(|tx| tx.bucket_mut(bucket)?.put(key, value))
    }

    /// Run `f` on the stored value of `key` inside a read transaction
    pub fn query<F, T, E>(&self, bucket: &[u8], key: &[u8], f: F) -> CallbackResult<T, E>
    where
        F: FnOnce(&[u8]) -> CallbackResult<T, E>,
        E: From<BucketKvError>,
    {
        require("bucket", bucket)?;
        require("key", key)?;

        self.view(|tx| {
            let bucket = tx.bucket(bucket)?;
            let value = bucket.get(key).ok_or(BucketKvError::KeyNotFound)?;
            f(&value)
        })
    }

    // =========================================================================
    // Read-Modify-Write
    // =========================================================================

    /// Read `key`, pass its value to `f`, and store what `f` returns
    ///
    /// - `Ok(Some(v))` replaces the value with `v` (must be non-empty)
    /// - `Ok(None)` leaves it untouched; the transaction still commits
    /// - `Err(e)` rolls back and returns `e`
    ///
    /// A missing key aborts with `KeyNotFound` before `f` runs.
    pub fn query_and_update<F, E>(&self, bucket: &[u8], key: &[u8], f: F) -> CallbackResult<(), E>
    where
        F: FnOnce(&[u8]) -> CallbackResult<Option<Vec<u8>>, E>,
        E: From<BucketKvError>,
    {
        require("bucket", bucket)?;
        require("key", key)?;

        self.update(|tx| {
            let mut bucket = tx.bucket_mut(bucket)?;
            let current = bucket.get(key).ok_or(BucketKvError::KeyNotFound)?;
            if let Some(replacement) = f(&current)? {
                require("value", &replacement)?;
                bucket.put(key, &replacement)?;
            }
            Ok(())
        })
    }

    /// Read-modify-write every key starting with `prefix`, in ascending order
    ///
    /// `f` receives each key and its value, with the same return contract as
    /// [`Store::query_and_update`]. The whole batch runs in one transaction:
    /// the first error rolls back every replacement made before it.
    /// Returns the number of keys that were replaced.
    pub fn query_and_update_prefix<F, E>(
        &self,
        bucket: &[u8],
        prefix: &[u8],
        mut f: F,
    ) -> CallbackResult<usize, E>
    where
        F: FnMut(&[u8], &[u8]) -> CallbackResult<Option<Vec<u8>>, E>,
        E: From<BucketKvError>,
    {
        require("bucket", bucket)?;
        require("prefix", prefix)?;

        self.update(|tx| {
            let mut bucket = tx.bucket_mut(bucket)?;
            let mut replaced = 0;
            for (key, value) in bucket.prefix_entries(prefix) {
                if let Some(replacement) = f(&key[..], &value[..])? {
                    require("value", &replacement)?;
                    bucket.put(&key, &replacement)?;
                    replaced += 1;
                }
            }
            Ok(replaced)
        })
    }

    // =========================================================================
    // Whole-Bucket Scopes
    // =========================================================================

    /// Run `f` against `bucket` in a read transaction
    pub fn with_bucket<F, T, E>(&self, bucket: &[u8], f: F) -> CallbackResult<T, E>
    where
        F: FnOnce(Bucket<'_>) -> CallbackResult<T, E>,
        E: From<BucketKvError>,
    {
        require("bucket", bucket)?;

        self.view(|tx| f(tx.bucket(bucket)?))
    }

    /// Run `f` against `bucket` in a write transaction
    pub fn update_bucket<F, T, E>(&self, bucket: &[u8], f: F) -> CallbackResult<T, E>
    where
        F: FnOnce(&mut BucketMut<'_>) -> CallbackResult<T, E>,
        E: From<BucketKvError>,
    {
        require("bucket", bucket)?;

        self.update(|tx| f(&mut tx.bucket_mut(bucket)?))
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Call `f` for every entry in ascending key order; stops at the first error
    pub fn each<F, E>(&self, bucket: &[u8], mut f: F) -> CallbackResult<(), E>
    where
        F: FnMut(&[u8], &[u8]) -> CallbackResult<(), E>,
        E: From<BucketKvError>,
    {
        require("bucket", bucket)?;

        self.view(|tx| {
            for (key, value) in tx.bucket(bucket)?.iter() {
                f(key, value)?;
            }
            Ok(())
        })
    }

    /// Call `f` for every entry whose key starts with `prefix`
    pub fn each_prefix<F, E>(&self, bucket: &[u8], prefix: &[u8], mut f: F) -> CallbackResult<(), E>
    where
        F: FnMut(&[u8], &[u8]) -> CallbackResult<(), E>,
        E: From<BucketKvError>,
    {
        require("bucket", bucket)?;
        require("prefix", prefix)?;

        self.view(|tx| {
            for (key, value) in tx.bucket(bucket)?.prefix(prefix) {
                f(key, value)?;
            }
            Ok(())
        })
    }

    /// Number of keys in `bucket`, O(1)
    pub fn count(&self, bucket: &[u8]) -> Result<usize> {
        require("bucket", bucket)?;

        self.view(|tx| Ok(tx.bucket(bucket)?.len()))
    }

    /// Number of keys in `bucket` starting with `prefix`, O(matches)
    pub fn count_prefix(&self, bucket: &[u8], prefix: &[u8]) -> Result<usize> {
        require("bucket", bucket)?;
        require("prefix", prefix)?;

        self.view(|tx| Ok(tx.bucket(bucket)?.count_prefix(prefix)))
    }
}
