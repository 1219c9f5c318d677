// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for semiocache integration tests
//!
//! Builds caches over both store backends so every scenario runs against
//! memory and disk alike.

use std::sync::Arc;

use alloy_chains::NamedChain;
use alloy_primitives::{address, b256, Address, B256};
use semiocache::{CachedEvent, DiskStore, EventFilter, EventsCache, MemoryStore};
use tempfile::TempDir;

pub const TOKEN: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
pub const TRANSFER: B256 =
    b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");
#[allow(dead_code)]
pub const APPROVAL: B256 =
    b256!("8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925");

/// Installs a test subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Store backend a test runs against
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    Memory,
    Disk,
}

pub const BACKENDS: [Backend; 2] = [Backend::Memory, Backend::Disk];

/// A cache plus whatever must outlive it (the temp dir of a disk store)
pub struct TestCache {
    pub cache: EventsCache,
    _dir: Option<TempDir>,
}

impl std::ops::Deref for TestCache {
    type Target = EventsCache;

    fn deref(&self) -> &Self::Target {
        &self.cache
    }
}

/// Creates a fresh mainnet cache on `backend`
pub fn test_cache(backend: Backend) -> TestCache {
    init_tracing();
    match backend {
        Backend::Memory => TestCache {
            cache: EventsCache::new(Arc::new(MemoryStore::new()), NamedChain::Mainnet),
            _dir: None,
        },
        Backend::Disk => {
            let dir = TempDir::new().unwrap();
            let store = DiskStore::new(dir.path().join("events.json"))
                .validate()
                .unwrap();
            TestCache {
                cache: EventsCache::new(Arc::new(store), NamedChain::Mainnet),
                _dir: Some(dir),
            }
        }
    }
}

/// USDC Transfer filter
pub fn transfer_filter() -> EventFilter {
    EventFilter::at(TOKEN).topic(TRANSFER)
}

/// Event with identity `(block, tx, log)` and a small payload
pub fn event(block: u64, tx: u64, log: u64) -> CachedEvent {
    CachedEvent::new(block, tx, log)
        .with_field("data", serde_json::json!(format!("0x{block:x}")))
}

/// Identity triples of `events`, for compact assertions
#[allow(dead_code)]
pub fn ids(events: &[CachedEvent]) -> Vec<(u64, u64, u64)> {
    events
        .iter()
        .map(|e| (e.block_number, e.transaction_index, e.log_index))
        .collect()
}
