//! Store Module
//!
//! The store handle that coordinates all components.
//!
//! ## Responsibilities
//! - Open/create the backing file and take its lock
//! - Recover committed state from the commit log
//! - Hand out read and write transactions
//! - Scoped `view`/`update` with guaranteed commit-or-rollback
//! - Sync and compact on close

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{BucketKvError, Result};
use crate::tx::{ReadTx, Snapshot, TxGuard, WriteTx};
use crate::wal::{WalRecovery, WalWriter};

/// Source of process-unique store ids for reentrancy tracking
static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// An open key-value store
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes**: serialized by the `wal` mutex, held by a [`WriteTx`] from
///   begin to commit/rollback. A blocked writer waits on the OS.
/// - **Reads**: take the `committed` read lock only long enough to clone an
///   `Arc`, then run on that snapshot without further locking.
///
/// `Store` is `Send + Sync`; share it between threads with `Arc<Store>`.
pub struct Store {
    /// Process-unique id for reentrancy tracking
    id: u64,

    /// Store configuration
    config: Config,

    /// Latest committed snapshot
    committed: RwLock<Arc<Snapshot>>,

    /// Commit log; its mutex is the single-writer lock
    wal: Mutex<WalWriter>,

    /// Exclusive advisory lock, released when dropped
    _lock_file: Option<File>,
}

impl Store {
    /// Open or create a store at `path` and ensure `buckets` exist
    ///
    /// Missing buckets are created empty in a single write transaction;
    /// empty names are skipped.
    pub fn open<P, I>(path: P, buckets: I) -> Result<Self>
    where
        P: AsRef<Path>,
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let config = Config::builder().path(path.as_ref()).build();
        Self::open_with_config(config, buckets)
    }

    /// Open or create a store with an explicit config
    ///
    /// On startup:
    /// 1. Validate the path
    /// 2. Take the file lock
    /// 3. Recover committed state from the commit log
    /// 4. Create the declared buckets
    pub fn open_with_config<I>(config: Config, buckets: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        // Step 1: Fail fast before touching the filesystem
        if config.path.as_os_str().is_empty() {
            return Err(BucketKvError::invalid("path must not be empty"));
        }

        // Step 2: One handle per file
        let lock_file = if config.lock_file {
            Some(Self::acquire_lock(&config.path)?)
        } else {
            None
        };

        // Step 3: A leftover compaction file means a crash before rename;
        // the existing log is still authoritative.
        let compact_path = WalWriter::compact_path(&config.path);
        if compact_path.exists() {
            warn!(path = %compact_path.display(), "removing stale compaction file");
            fs::remove_file(&compact_path)?;
        }

        // Step 4: Replay the commit log
        let (entries, recovery) = WalRecovery::recover(&config.path)?;
        if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
            info!(
                entries_recovered = recovery.entries_recovered,
                entries_corrupted = recovery.entries_corrupted,
                last_lsn = recovery.last_lsn,
                was_truncated = recovery.was_truncated,
                "commit log recovery"
            );
        }

        let mut snapshot = Snapshot::default();
        for entry in entries {
            for op in entry.operations {
                snapshot.apply(op)?;
            }
        }
        snapshot.generation = recovery.last_lsn;

        let wal = WalWriter::open(&config.path, config.sync_strategy, recovery.last_lsn)?;

        let store = Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            config,
            committed: RwLock::new(Arc::new(snapshot)),
            wal: Mutex::new(wal),
            _lock_file: lock_file,
        };

        // Step 5: Declared buckets, all in one transaction
        store.update(|tx| {
            for name in buckets {
                let name = name.as_ref();
                if !name.is_empty() {
                    tx.create_bucket_if_absent(name)?;
                }
            }
            Ok::<_, BucketKvError>(())
        })?;

        info!(
            path = %store.config.path.display(),
            generation = store.generation(),
            buckets = store.committed.read().buckets.len(),
            "store opened"
        );
        Ok(store)
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Begin a read-only transaction on the latest committed snapshot
    pub fn begin_read(&self) -> Result<ReadTx> {
        let guard = TxGuard::enter(self.id)?;
        let snapshot = Arc::clone(&*self.committed.read());
        Ok(ReadTx::new(snapshot, guard))
    }

    /// Begin a read-write transaction
    ///
    /// Blocks until no other write transaction is active.
    pub fn begin_write(&self) -> Result<WriteTx<'_>> {
        // Reentrancy check first so a nested begin never blocks on the lock
        let guard = TxGuard::enter(self.id)?;
        let wal = self.wal.lock();
        Ok(WriteTx::new(&self.committed, wal, guard))
    }

    /// Run `f` in a read-only transaction
    ///
    /// `f`'s error is returned as-is.
    pub fn view<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&ReadTx) -> std::result::Result<T, E>,
        E: From<BucketKvError>,
    {
        let tx = self.begin_read()?;
        f(&tx)
    }

    /// Run `f` in a read-write transaction
    ///
    /// Commits if `f` returns `Ok`, rolls back if it returns `Err`. A panic
    /// inside `f` drops the transaction, which also rolls back.
    pub fn update<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut WriteTx<'_>) -> std::result::Result<T, E>,
        E: From<BucketKvError>,
    {
        let mut tx = self.begin_write()?;
        match f(&mut tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        }
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Rewrite the commit log as a single entry holding the current state
    ///
    /// Waits for the writer lock like a write transaction.
    pub fn compact(&self) -> Result<()> {
        let _guard = TxGuard::enter(self.id)?;
        let mut wal = self.wal.lock();
        let snapshot = Arc::clone(&*self.committed.read());
        wal.rewrite(snapshot.to_operations())?;

        info!(
            path = %self.config.path.display(),
            generation = snapshot.generation,
            "commit log compacted"
        );
        Ok(())
    }

    /// Force the commit log to disk
    pub fn sync(&self) -> Result<()> {
        self.wal.lock().sync()
    }

    /// Close the store gracefully
    ///
    /// Syncs the commit log, compacts it if configured, and releases the
    /// file lock.
    pub fn close(self) -> Result<()> {
        self.sync()?;
        if self.config.compact_on_close {
            self.compact()?;
        }

        info!(path = %self.config.path.display(), "store closed");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Generation of the latest committed snapshot
    pub fn generation(&self) -> u64 {
        self.committed.read().generation
    }

    /// Names of all buckets in the latest committed snapshot
    pub fn bucket_names(&self) -> Vec<Vec<u8>> {
        self.committed.read().bucket_names()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Path of the lock file guarding `path`
    fn lock_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(Self::lock_path(path))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(BucketKvError::DatabaseLocked);
        }
        Ok(lock_file)
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if let Err(e) = self.wal.get_mut().sync() {
            warn!(error = %e, "failed to sync commit log on drop");
        } else {
            debug!(path = %self.config.path.display(), "store dropped");
        }
    }
}
