// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Store backends for the events cache
//!
//! A store persists, per cache key, the covered block intervals and the
//! cached events. Two backends ship with the crate:
//!
//! - [`MemoryStore`]: in-process, lost on drop (tests, short-lived tools)
//! - [`DiskStore`]: versioned JSON file with file locking, shared safely by
//!   several processes
//!
//! # Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use semiocache::{DiskStore, EventsCache, MemoryStore};
//! use alloy_chains::NamedChain;
//!
//! let store = DiskStore::new("cache/events.json").validate()?;
//! let cache = EventsCache::new(Arc::new(store), NamedChain::Arbitrum);
//!
//! let cache = EventsCache::new(Arc::new(MemoryStore::new()), NamedChain::Base);
//! ```

use std::fmt;

use alloy_primitives::BlockNumber;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::KeyState;
use crate::errors::StoreError;
use crate::key::CacheKey;
use crate::types::{BlockInterval, CachedEvent};

mod disk;
mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

/// Size of what a store currently holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of cache keys with any state
    pub keys: usize,
    /// Number of stored intervals across all keys
    pub intervals: usize,
    /// Number of stored events across all keys
    pub events: usize,
    /// Number of covered blocks across all keys
    pub covered_blocks: u64,
}

impl StoreStats {
    pub(crate) fn record(&mut self, state: &KeyState) {
        self.keys += 1;
        self.intervals += state.intervals.len();
        self.events += state.events.len();
        self.covered_blocks = self
            .covered_blocks
            .saturating_add(state.intervals.covered_blocks());
    }
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "keys={}, intervals={}, events={}, covered_blocks={}",
            self.keys, self.intervals, self.events, self.covered_blocks
        )
    }
}

/// Trait for events cache store backends
///
/// # Atomicity
///
/// [`commit_save`](CacheStore::commit_save) is the unit of atomicity: the
/// event upsert, the read of overlapping intervals and their replacement by
/// the union must all happen in one transaction. Readers observe either the
/// state before the save or the state after it, never a mix, and two
/// concurrent saves on overlapping ranges never lose each other's coverage.
///
/// # Error Handling
///
/// Unlike a best-effort lookup cache, failures are reported, not swallowed:
/// a failed read must not be mistaken for "nothing cached" by a caller that
/// then trusts a partial result.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Stored intervals of `key` that end at or after `from`, sorted by start
    async fn intervals_reaching(
        &self,
        key: &CacheKey,
        from: BlockNumber,
    ) -> Result<Vec<BlockInterval>, StoreError>;

    /// Stored events of `key` with `from <= block_number <= to`, in chain order
    async fn events_between(
        &self,
        key: &CacheKey,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<Vec<CachedEvent>, StoreError>;

    /// Atomically upserts `events` and merges `[from, to]` for `key`
    ///
    /// Returns the merged interval now covering `[from, to]`.
    async fn commit_save(
        &self,
        key: &CacheKey,
        from: BlockNumber,
        to: BlockNumber,
        events: Vec<CachedEvent>,
    ) -> Result<BlockInterval, StoreError>;

    /// Removes every key starting with `prefix`, returning how many were removed
    async fn clear_prefix(&self, prefix: &str) -> Result<usize, StoreError>;

    /// Current contents summary
    async fn stats(&self) -> Result<StoreStats, StoreError>;

    /// Returns a human-readable name for this store backend
    ///
    /// Used for logging and debugging.
    fn name(&self) -> &'static str;
}
