//! WAL Reader
//!
//! Handles reading entries from the commit log file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{BucketKvError, Result};

use super::{WalEntry, HEADER_SIZE, MAX_ENTRY_SIZE};

/// Reads entries from the commit log file
pub struct WalReader {
    reader: BufReader<File>,

    /// Offset just past the last fully read entry
    position: u64,

    /// Set when the file ends in the middle of a frame
    torn_tail: bool,
}

impl WalReader {
    /// Open a log file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            torn_tail: false,
        })
    }

    /// Read the next entry from the log
    ///
    /// Returns `Ok(None)` at end of file. A frame cut short by the end of the
    /// file also yields `Ok(None)` and marks the reader as having a torn tail.
    /// Checksum or decoding failures yield `WalCorruption`.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        let mut header = [0u8; HEADER_SIZE];
        match self.read_full(&mut header)? {
            0 => return Ok(None),
            n if n < HEADER_SIZE => {
                self.torn_tail = true;
                return Ok(None);
            }
            _ => {}
        }

        let (lsn, crc, len) = WalEntry::parse_header(&header);
        if len > MAX_ENTRY_SIZE {
            return Err(BucketKvError::WalCorruption(format!(
                "entry length {} at offset {} exceeds maximum",
                len, self.position
            )));
        }

        let mut payload = vec![0u8; len as usize];
        if self.read_full(&mut payload)? < payload.len() {
            self.torn_tail = true;
            return Ok(None);
        }

        let entry = WalEntry::decode_payload(lsn, crc, &payload)?;
        self.position += (HEADER_SIZE + payload.len()) as u64;
        Ok(Some(entry))
    }

    /// Offset just past the last valid entry read so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether the file ended partway through a frame
    pub fn has_torn_tail(&self) -> bool {
        self.torn_tail
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    /// Read until `buf` is full or EOF; returns bytes read
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

/// Iterator over log entries; stops after the first error
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
