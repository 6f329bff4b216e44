//! WAL Recovery
//!
//! Handles crash recovery by replaying the commit log.

use std::fs::{self, OpenOptions};
use std::path::Path;

use tracing::warn;

use crate::error::{BucketKvError, Result};

use super::{WalEntry, WalReader};

/// Handles commit log recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries encountered (replay stops at the first)
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the log was truncated (partial or corrupt tail removed)
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Recover entries from a log file
    ///
    /// This will:
    /// 1. Read all valid entries in order
    /// 2. Stop at the first torn, corrupted or out-of-order entry
    /// 3. Truncate the file to the end of the last valid entry
    /// 4. Return all valid entries in order
    ///
    /// A missing file recovers as empty.
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        if !path.exists() {
            return Ok((Vec::new(), RecoveryResult::default()));
        }

        let (entries, mut result, valid_len) = Self::scan(path)?;

        let file_len = fs::metadata(path)?.len();
        if valid_len < file_len {
            warn!(
                path = %path.display(),
                valid_len,
                file_len,
                "truncating commit log after last valid entry"
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(valid_len)?;
            file.sync_all()?;
            result.was_truncated = true;
        }

        Ok((entries, result))
    }

    /// Verify integrity of a log file without modifying it
    ///
    /// `was_truncated` reports whether [`WalRecovery::recover`] would truncate.
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        if !path.exists() {
            return Ok(RecoveryResult::default());
        }

        let (_, mut result, valid_len) = Self::scan(path)?;
        result.was_truncated = valid_len < fs::metadata(path)?.len();
        Ok(result)
    }

    /// Read every valid entry; returns the entries, stats and valid length
    fn scan(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult, u64)> {
        let mut reader = WalReader::open(path)?;
        let mut entries = Vec::new();
        let mut result = RecoveryResult::default();

        loop {
            let entry_start = reader.position();
            match reader.next_entry() {
                Ok(Some(entry)) => {
                    if entry.lsn <= result.last_lsn {
                        warn!(
                            lsn = entry.lsn,
                            last_lsn = result.last_lsn,
                            "out-of-order entry in commit log"
                        );
                        result.entries_corrupted += 1;
                        return Ok((entries, result, entry_start));
                    }
                    result.last_lsn = entry.lsn;
                    result.entries_recovered += 1;
                    entries.push(entry);
                }
                Ok(None) => break,
                Err(BucketKvError::WalCorruption(reason)) => {
                    warn!(offset = reader.position(), %reason, "corrupted commit log entry");
                    result.entries_corrupted += 1;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok((entries, result, reader.position()))
    }
}
