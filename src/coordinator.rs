// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! The events cache: coverage queries, validated saves and scoped clears

use std::fmt;
use std::sync::Arc;

use alloy_chains::Chain;
use alloy_primitives::BlockNumber;
use tracing::{debug, info, Instrument};

use crate::cache::coverage;
use crate::config::{ClearScope, EventsCacheConfig};
use crate::errors::EventsCacheError;
use crate::key::{derive_key, namespace_prefix, CacheKey, EventFilter};
use crate::spans;
use crate::store::{CacheStore, StoreStats};
use crate::types::{CachedEvent, QueryResult};

/// Cache of chain events per `(network, filter)`, tracking which block ranges
/// were already fetched
///
/// A typical fetch loop asks the cache what is missing, fetches only that
/// from the RPC node, and saves each fetched range back:
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use alloy_chains::NamedChain;
/// use semiocache::{CachedEvent, EventFilter, EventsCache, MemoryStore};
///
/// let cache = EventsCache::new(Arc::new(MemoryStore::new()), NamedChain::Mainnet);
/// let filter = EventFilter::at(token).topic(transfer_topic);
///
/// let result = cache.query(&filter, from_block, to_block).await?;
/// for gap in &result.intervals.non_cached {
///     let logs = provider.get_logs(&rpc_filter.from_block(gap.from).to_block(gap.to)).await?;
///     let events = logs.iter().map(CachedEvent::from_log).collect::<Result<Vec<_>, _>>()?;
///     cache.save(&filter, gap.from, gap.to, events).await?;
/// }
/// ```
///
/// The cache holds no state of its own besides its configuration: clones
/// share the store, and concurrent callers are safe as long as the store
/// honours the [`CacheStore`] atomicity contract.
#[derive(Clone)]
pub struct EventsCache {
    store: Arc<dyn CacheStore>,
    chain: Chain,
    config: EventsCacheConfig,
}

impl fmt::Debug for EventsCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventsCache")
            .field("store", &self.store.name())
            .field("chain", &self.chain)
            .field("config", &self.config)
            .finish()
    }
}

impl EventsCache {
    /// Creates a cache for `chain` on top of `store` with the default configuration
    pub fn new(store: Arc<dyn CacheStore>, chain: impl Into<Chain>) -> Self {
        Self {
            store,
            chain: chain.into(),
            config: EventsCacheConfig::default(),
        }
    }

    /// Replaces the configuration
    pub fn with_config(mut self, config: EventsCacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn config(&self) -> &EventsCacheConfig {
        &self.config
    }

    /// Cache key of `filter` on this cache's network
    pub fn key_for(&self, filter: &EventFilter) -> CacheKey {
        derive_key(&self.config.namespace, self.chain, filter)
    }

    /// Returns cached events of `filter` in `[from_block, to_block]` and which
    /// parts of that range are cached
    ///
    /// The two store reads are not a snapshot: a save committing in between
    /// can make the result conservatively stale, never inconsistent. See
    /// [`QueryResult`] for which events can be trusted.
    ///
    /// # Errors
    ///
    /// - [`EventsCacheError::InvalidRange`] if `from_block > to_block`
    /// - [`EventsCacheError::Store`] if the store fails
    pub async fn query(
        &self,
        filter: &EventFilter,
        from_block: BlockNumber,
        to_block: BlockNumber,
    ) -> Result<QueryResult, EventsCacheError> {
        EventsCacheError::check_range(from_block, to_block)?;

        let key = self.key_for(filter);
        let span = spans::query(&key, from_block, to_block);

        async {
            let (candidates, events) = futures::future::try_join(
                self.store.intervals_reaching(&key, from_block),
                self.store.events_between(&key, from_block, to_block),
            )
            .await?;

            let intervals = coverage(&candidates, from_block, to_block);

            debug!(
                cached = intervals.cached.len(),
                missing_blocks = intervals.missing_blocks(),
                events = events.len(),
                "Served events cache query"
            );

            Ok::<_, EventsCacheError>(QueryResult { events, intervals })
        }
        .instrument(span)
        .await
    }

    /// Records that every event of `filter` in `[from_block, to_block]` was
    /// fetched, storing `events`
    ///
    /// The events are upserted by identity and the range is merged into the
    /// key's coverage in one atomic store commit.
    ///
    /// # Errors
    ///
    /// - [`EventsCacheError::InvalidRange`] if `from_block > to_block`
    /// - [`EventsCacheError::RangeViolation`] for the first event outside the
    ///   range; nothing is written
    /// - [`EventsCacheError::Store`] if the commit fails; nothing is written
    pub async fn save(
        &self,
        filter: &EventFilter,
        from_block: BlockNumber,
        to_block: BlockNumber,
        events: Vec<CachedEvent>,
    ) -> Result<(), EventsCacheError> {
        EventsCacheError::check_range(from_block, to_block)?;

        if let Some(outside) = events
            .iter()
            .find(|event| event.block_number < from_block || event.block_number > to_block)
        {
            return Err(EventsCacheError::RangeViolation {
                block_number: outside.block_number,
                from_block,
                to_block,
            });
        }

        let key = self.key_for(filter);
        let span = spans::save(&key, from_block, to_block, events.len());

        async {
            let union = self
                .store
                .commit_save(&key, from_block, to_block, events)
                .await?;
            info!(union = %union, store = self.store.name(), "Saved block range");
            Ok::<_, EventsCacheError>(())
        }
        .instrument(span)
        .await
    }

    /// Removes cached state according to the configured [`ClearScope`]
    ///
    /// # Errors
    ///
    /// Returns [`EventsCacheError::Store`] if the store fails; in that case
    /// the store is left as it was.
    pub async fn clear(&self) -> Result<(), EventsCacheError> {
        let scope = self.config.clear_scope;
        let prefix = match scope {
            ClearScope::Network => namespace_prefix(&self.config.namespace, Some(self.chain)),
            ClearScope::All => namespace_prefix(&self.config.namespace, None),
        };

        async {
            let removed = self.store.clear_prefix(&prefix).await?;
            info!(removed_keys = removed, "Cleared events cache");
            Ok::<_, EventsCacheError>(())
        }
        .instrument(spans::clear(self.chain, scope))
        .await
    }

    /// Summary of everything the underlying store holds, across namespaces
    pub async fn stats(&self) -> Result<StoreStats, EventsCacheError> {
        Ok(self.store.stats().await?)
    }
}
