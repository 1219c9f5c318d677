// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory store

use std::collections::HashMap;

use alloy_primitives::BlockNumber;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{CacheStore, StoreStats};
use crate::cache::KeyState;
use crate::errors::StoreError;
use crate::key::CacheKey;
use crate::types::{BlockInterval, CachedEvent};

/// In-memory store backed by a `HashMap` per process
///
/// Saves run under the write lock, which makes every `commit_save` one
/// transaction. Reads share the read lock and never block each other.
///
/// # Examples
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use semiocache::{EventsCache, MemoryStore};
/// use alloy_chains::NamedChain;
///
/// let cache = EventsCache::new(Arc::new(MemoryStore::new()), NamedChain::Mainnet);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    keys: RwLock<HashMap<CacheKey, KeyState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn intervals_reaching(
        &self,
        key: &CacheKey,
        from: BlockNumber,
    ) -> Result<Vec<BlockInterval>, StoreError> {
        let keys = self.keys.read().await;
        Ok(keys
            .get(key)
            .map(|state| state.intervals.reaching(from))
            .unwrap_or_default())
    }

    async fn events_between(
        &self,
        key: &CacheKey,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<Vec<CachedEvent>, StoreError> {
        let keys = self.keys.read().await;
        Ok(keys
            .get(key)
            .map(|state| state.events.range(from, to))
            .unwrap_or_default())
    }

    async fn commit_save(
        &self,
        key: &CacheKey,
        from: BlockNumber,
        to: BlockNumber,
        events: Vec<CachedEvent>,
    ) -> Result<BlockInterval, StoreError> {
        let mut keys = self.keys.write().await;
        let union = keys
            .entry(key.clone())
            .or_default()
            .apply_save(from, to, events);
        debug!(key = %key, union = %union, "Committed save (memory)");
        Ok(union)
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let mut keys = self.keys.write().await;
        let before = keys.len();
        keys.retain(|key, _| !key.has_prefix(prefix));
        Ok(before - keys.len())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let keys = self.keys.read().await;
        let mut stats = StoreStats::default();
        for state in keys.values() {
            stats.record(state);
        }
        Ok(stats)
    }

    fn name(&self) -> &'static str {
        "MemoryStore"
    }
}
