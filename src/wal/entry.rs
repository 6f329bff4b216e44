//! WAL Entry definitions
//!
//! Defines the structure of individual commit log entries and their framing.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{BucketKvError, Result};

/// Frame header size: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// Upper bound on a single entry payload (guards against garbage lengths)
pub const MAX_ENTRY_SIZE: u32 = 1024 * 1024 * 1024;

/// A single entry in the commit log: the full batch of one write transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - the generation this entry commits
    pub lsn: u64,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,

    /// Operations in the order they were applied inside the transaction
    pub operations: Vec<Operation>,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Create an empty bucket (no-op on replay if it exists)
    CreateBucket { name: Vec<u8> },

    /// Drop a bucket and everything in it
    DeleteBucket { name: Vec<u8> },

    /// Insert or replace a key-value pair
    Put {
        bucket: Vec<u8>,
        key: Vec<u8>,
        value: Vec<u8>,
    },

    /// Remove a key
    Delete { bucket: Vec<u8>, key: Vec<u8> },
}

impl WalEntry {
    /// Create a new entry stamped with the current time
    pub fn new(lsn: u64, operations: Vec<Operation>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            timestamp,
            operations,
        }
    }

    /// Serialize into a complete frame: header + payload
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)?;
        if payload.len() as u64 > MAX_ENTRY_SIZE as u64 {
            return Err(BucketKvError::Serialization(format!(
                "entry of {} bytes exceeds maximum of {}",
                payload.len(),
                MAX_ENTRY_SIZE
            )));
        }

        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&self.lsn.to_le_bytes());
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&payload);

        Ok(frame)
    }

    /// Deserialize a complete frame produced by [`WalEntry::serialize`]
    ///
    /// Rejects short buffers, CRC mismatches and header/payload LSN disagreement.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(BucketKvError::WalCorruption(format!(
                "frame of {} bytes is shorter than header",
                bytes.len()
            )));
        }

        let (lsn, crc, len) = Self::parse_header(&bytes[..HEADER_SIZE]);
        let payload = &bytes[HEADER_SIZE..];
        if payload.len() != len as usize {
            return Err(BucketKvError::WalCorruption(format!(
                "payload length mismatch: header says {}, found {}",
                len,
                payload.len()
            )));
        }

        Self::decode_payload(lsn, crc, payload)
    }

    /// Compute the CRC of this entry's encoded payload
    pub fn compute_crc(&self) -> Result<u32> {
        let payload = bincode::serialize(self)?;
        Ok(crc32fast::hash(&payload))
    }

    /// Split a raw header into (lsn, crc, payload_len)
    pub(crate) fn parse_header(header: &[u8]) -> (u64, u32, u32) {
        let mut lsn = [0u8; 8];
        let mut crc = [0u8; 4];
        let mut len = [0u8; 4];
        lsn.copy_from_slice(&header[0..8]);
        crc.copy_from_slice(&header[8..12]);
        len.copy_from_slice(&header[12..16]);

        (
            u64::from_le_bytes(lsn),
            u32::from_le_bytes(crc),
            u32::from_le_bytes(len),
        )
    }

    /// Verify and decode a payload whose header has already been parsed
    pub(crate) fn decode_payload(lsn: u64, crc: u32, payload: &[u8]) -> Result<Self> {
        let actual = crc32fast::hash(payload);
        if actual != crc {
            return Err(BucketKvError::WalCorruption(format!(
                "CRC mismatch at lsn {}: expected {:#010x}, got {:#010x}",
                lsn, crc, actual
            )));
        }

        let entry: WalEntry = bincode::deserialize(payload)
            .map_err(|e| BucketKvError::WalCorruption(format!("undecodable entry at lsn {}: {}", lsn, e)))?;

        if entry.lsn != lsn {
            return Err(BucketKvError::WalCorruption(format!(
                "LSN mismatch: header {} vs payload {}",
                lsn, entry.lsn
            )));
        }

        Ok(entry)
    }
}
