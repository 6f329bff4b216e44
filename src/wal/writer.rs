//! WAL Writer
//!
//! Handles appending entries to the commit log and rewriting it on compaction.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::SyncStrategy;
use crate::error::Result;

use super::{Operation, WalEntry};

/// Writes entries to the commit log file
pub struct WalWriter {
    /// Path of the log file
    path: PathBuf,

    /// Buffered append handle
    writer: BufWriter<File>,

    /// LSN of the last entry written
    current_lsn: u64,

    /// When to fsync
    sync_strategy: SyncStrategy,

    /// Entries appended since the last fsync
    unsynced: usize,

    /// File length covered by complete entries
    valid_len: u64,

    /// Makes the next `sync` fail (fault injection for tests)
    #[cfg(test)]
    fail_next_sync: bool,
}

impl WalWriter {
    /// Open or create a log file for appending
    ///
    /// `last_lsn` is the LSN of the last valid entry already in the file
    /// (0 for a new file); the next append gets `last_lsn + 1`.
    pub fn open(path: &Path, sync_strategy: SyncStrategy, last_lsn: u64) -> Result<Self> {
        let file = Self::open_append(path)?;
        let valid_len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            current_lsn: last_lsn,
            sync_strategy,
            unsynced: 0,
            valid_len,
            #[cfg(test)]
            fail_next_sync: false,
        })
    }

    /// Append one entry holding `operations`; returns its LSN
    ///
    /// The entry is flushed to the OS before returning and fsynced according
    /// to the sync strategy. On any failure the frame is cut off the file and
    /// the LSN is not consumed, so a failed commit is never replayed.
    pub fn append(&mut self, operations: Vec<Operation>) -> Result<u64> {
        let lsn = self.current_lsn + 1;
        let entry = WalEntry::new(lsn, operations);
        let frame = entry.serialize()?;

        if let Err(e) = self.write_frame(&frame) {
            self.discard_partial_frame();
            return Err(e);
        }

        let should_sync = match self.sync_strategy {
            SyncStrategy::EveryCommit => true,
            SyncStrategy::EveryNCommits { count } => self.unsynced + 1 >= count.max(1),
        };
        if should_sync {
            if let Err(e) = self.sync() {
                warn!(lsn, error = %e, "commit log sync failed, discarding entry");
                self.discard_partial_frame();
                return Err(e);
            }
        } else {
            self.unsynced += 1;
        }

        self.current_lsn = lsn;
        self.valid_len += frame.len() as u64;
        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        #[cfg(test)]
        if std::mem::take(&mut self.fail_next_sync) {
            let e = std::io::Error::new(std::io::ErrorKind::Other, "injected sync failure");
            return Err(e.into());
        }

        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Replace the whole log with a single entry at the current LSN
    ///
    /// The new log is written to a sibling file, fsynced, then renamed over
    /// the old one so a crash leaves either the old or the new log intact.
    pub fn rewrite(&mut self, operations: Vec<Operation>) -> Result<()> {
        self.writer.flush()?;

        let tmp_path = Self::compact_path(&self.path);
        {
            let mut tmp = File::create(&tmp_path)?;
            if self.current_lsn > 0 {
                let frame = WalEntry::new(self.current_lsn, operations).serialize()?;
                tmp.write_all(&frame)?;
            }
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        let file = Self::open_append(&self.path)?;
        self.valid_len = file.metadata()?.len();
        self.writer = BufWriter::new(file);
        self.unsynced = 0;

        debug!(path = %self.path.display(), lsn = self.current_lsn, "commit log rewritten");
        Ok(())
    }

    /// Get the LSN of the last appended entry
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the temporary file used during compaction
    pub fn compact_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".compact");
        PathBuf::from(name)
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.writer.write_all(frame)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Cut everything past `valid_len` off the file so the next append does
    /// not land behind a half-written or unsynced frame.
    fn discard_partial_frame(&mut self) {
        match Self::open_append(&self.path) {
            Ok(file) => {
                let stale = std::mem::replace(&mut self.writer, BufWriter::new(file));
                // Drop buffered bytes without flushing them.
                let _ = stale.into_parts();
                if let Err(e) = self.writer.get_ref().set_len(self.valid_len) {
                    warn!(error = %e, "failed to discard partial commit log frame");
                }
            }
            Err(e) => warn!(error = %e, "failed to reopen commit log"),
        }
    }

    fn open_append(path: &Path) -> Result<File> {
        Ok(OpenOptions::new().create(true).append(true).open(path)?)
    }
}
