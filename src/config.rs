//! Configuration for bucketkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a Store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the commit log file backing the store.
    /// Compaction writes a `{path}.compact` sibling and renames it over this file.
    pub path: PathBuf,

    /// Take an exclusive advisory lock on the file while the store is open
    pub lock_file: bool,

    // -------------------------------------------------------------------------
    // Commit Log Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the commit log
    pub sync_strategy: SyncStrategy,

    /// Rewrite the commit log as a single entry when the store is closed
    pub compact_on_close: bool,
}

/// Commit log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every committed write transaction (safest, slowest)
    EveryCommit,

    /// fsync after N committed write transactions
    EveryNCommits { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./bucketkv.db"),
            lock_file: true,
            sync_strategy: SyncStrategy::EveryCommit,
            compact_on_close: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the path of the store file
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Enable or disable the exclusive file lock
    pub fn lock_file(mut self, enabled: bool) -> Self {
        self.config.lock_file = enabled;
        self
    }

    /// Set the commit log sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Enable or disable compaction on close
    pub fn compact_on_close(mut self, enabled: bool) -> Self {
        self.config.compact_on_close = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
