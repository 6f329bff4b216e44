//! # bucketkv
//!
//! An embedded, transactional key-value store organised into named buckets:
//! - Ordered buckets with point lookup, prefix scans and O(1) counts
//! - Single-writer / multi-reader transactions with snapshot isolation
//! - Append-only commit log with CRC checks and crash recovery
//! - Scoped `view`/`update` helpers with guaranteed commit-or-rollback
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Helpers (get/put/each/count/RMW)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Store                                 │
//! │           view() ──► ReadTx      update() ──► WriteTx        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │ Commit Log  │          │   Snapshot   │
//!   │  (Append)   │          │ (Arc, COW)   │
//!   └─────────────┘          └──────┬───────┘
//!                                   │
//!                                   ▼
//!                           ┌──────────────┐
//!                           │   Buckets    │
//!                           │   (OrdMap)   │
//!                           └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use bucketkv::Store;
//!
//! # fn main() -> bucketkv::Result<()> {
//! let store = Store::open("app.db", ["users"])?;
//! store.put(b"users", b"alice", b"admin")?;
//! assert_eq!(store.get(b"users", b"alice")?, b"admin");
//! store.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod bucket;
pub mod tx;
pub mod store;
mod helpers;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BucketKvError, Result};
pub use config::{Config, SyncStrategy};
pub use bucket::{Bucket, BucketMut, Cursor, Prefix};
pub use tx::{ReadTx, WriteTx};
pub use store::Store;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of bucketkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
