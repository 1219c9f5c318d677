// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Block-range coverage cache for EVM event logs.
//!
//! Fetching logs from an RPC node is slow and rate limited. `semiocache`
//! remembers, per network and event filter, which block ranges were already
//! fetched completely, together with the events found there, so a tool never
//! fetches the same range twice:
//!
//! - [`EventsCache::query`] splits a block range into `cached` and
//!   `non_cached` sub-ranges and returns the stored events
//! - [`EventsCache::save`] validates and stores the events of a fetched range
//!   and merges the range into the filter's coverage, atomically
//! - [`EventsCache::clear`] drops cached state for the network, or for every
//!   network sharing the store
//!
//! Storage is pluggable through [`CacheStore`]; [`MemoryStore`] and
//! [`DiskStore`] ship with the crate.
//!
//! ```rust
//! use std::sync::Arc;
//! use alloy_chains::NamedChain;
//! use alloy_primitives::Address;
//! use semiocache::{BlockInterval, CachedEvent, EventFilter, EventsCache, MemoryStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), semiocache::EventsCacheError> {
//! let cache = EventsCache::new(Arc::new(MemoryStore::new()), NamedChain::Mainnet);
//! let filter = EventFilter::at(Address::ZERO);
//!
//! cache.save(&filter, 10, 20, vec![CachedEvent::new(16, 1, 1)]).await?;
//!
//! let result = cache.query(&filter, 15, 25).await?;
//! assert_eq!(result.intervals.cached, vec![BlockInterval::new(15, 20)]);
//! assert_eq!(result.intervals.non_cached, vec![BlockInterval::new(21, 25)]);
//! assert_eq!(result.events.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
mod coordinator;
pub mod errors;
pub mod key;
mod spans;
pub mod store;
pub mod types;

pub use config::{ClearScope, EventsCacheConfig, EventsCacheConfigBuilder};
pub use coordinator::EventsCache;
pub use errors::{EventsCacheError, StoreError};
pub use key::{derive_key, CacheKey, EventFilter, TopicSlot};
pub use store::{CacheStore, DiskStore, MemoryStore, StoreStats};
pub use types::{BlockInterval, CachedEvent, EventId, QueryIntervals, QueryResult};
