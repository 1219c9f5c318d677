// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests for query, save and clear
//!
//! Every scenario runs against both the memory and the disk store.

mod helpers;

use std::sync::Arc;

use alloy_chains::NamedChain;
use alloy_primitives::Address;
use helpers::*;
use semiocache::{
    BlockInterval, ClearScope, DiskStore, EventFilter, EventsCache, EventsCacheConfigBuilder,
    EventsCacheError, MemoryStore, QueryIntervals,
};

fn intervals(pairs: &[(u64, u64)]) -> Vec<BlockInterval> {
    pairs
        .iter()
        .map(|(from, to)| BlockInterval::new(*from, *to))
        .collect()
}

#[tokio::test]
async fn test_empty_cache_reports_whole_range_missing() {
    for backend in BACKENDS {
        let cache = test_cache(backend);

        let result = cache.query(&transfer_filter(), 10, 20).await.unwrap();

        assert!(result.events.is_empty(), "{backend:?}");
        assert_eq!(
            result.intervals,
            QueryIntervals {
                cached: vec![],
                non_cached: intervals(&[(10, 20)]),
            },
            "{backend:?}"
        );
    }
}

#[tokio::test]
async fn test_save_then_overlapping_query() {
    for backend in BACKENDS {
        let cache = test_cache(backend);
        let filter = transfer_filter();

        cache
            .save(&filter, 10, 20, vec![event(16, 1, 1), event(16, 1, 2)])
            .await
            .unwrap();

        let result = cache.query(&filter, 15, 25).await.unwrap();
        assert_eq!(result.intervals.cached, intervals(&[(15, 20)]), "{backend:?}");
        assert_eq!(result.intervals.non_cached, intervals(&[(21, 25)]), "{backend:?}");
        assert_eq!(ids(&result.events), vec![(16, 1, 1), (16, 1, 2)], "{backend:?}");
        assert_eq!(result.events[0], event(16, 1, 1), "{backend:?}");
    }
}

#[tokio::test]
async fn test_two_disjoint_saves_leave_gap() {
    for backend in BACKENDS {
        let cache = test_cache(backend);
        let filter = transfer_filter();

        cache
            .save(&filter, 10, 20, vec![event(12, 0, 0), event(18, 0, 0)])
            .await
            .unwrap();
        cache
            .save(&filter, 30, 40, vec![event(33, 0, 0), event(39, 0, 0)])
            .await
            .unwrap();

        let result = cache.query(&filter, 15, 35).await.unwrap();
        assert_eq!(
            result.intervals.cached,
            intervals(&[(15, 20), (30, 35)]),
            "{backend:?}"
        );
        assert_eq!(result.intervals.non_cached, intervals(&[(21, 29)]), "{backend:?}");
        assert_eq!(ids(&result.events), vec![(18, 0, 0), (33, 0, 0)], "{backend:?}");
    }
}

#[tokio::test]
async fn test_range_violation_leaves_cache_untouched() {
    for backend in BACKENDS {
        let cache = test_cache(backend);
        let filter = transfer_filter();

        let err = cache
            .save(&filter, 10, 20, vec![event(15, 0, 0), event(1, 0, 0)])
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                EventsCacheError::RangeViolation {
                    block_number: 1,
                    from_block: 10,
                    to_block: 20
                }
            ),
            "{backend:?}: {err}"
        );

        let result = cache.query(&filter, 10, 20).await.unwrap();
        assert!(result.events.is_empty(), "{backend:?}");
        assert_eq!(result.intervals.non_cached, intervals(&[(10, 20)]), "{backend:?}");
    }
}

#[tokio::test]
async fn test_clear_resets_every_key() {
    for backend in BACKENDS {
        let cache = test_cache(backend);
        let transfers = transfer_filter();
        let approvals = EventFilter::at(TOKEN).topic(APPROVAL);

        cache.save(&transfers, 0, 20, vec![event(5, 0, 0)]).await.unwrap();
        cache.save(&approvals, 10, 40, vec![event(30, 0, 0)]).await.unwrap();

        cache.clear().await.unwrap();

        for filter in [&transfers, &approvals] {
            let result = cache.query(filter, 0, 40).await.unwrap();
            assert!(result.events.is_empty(), "{backend:?}");
            assert!(result.intervals.cached.is_empty(), "{backend:?}");
            assert_eq!(result.intervals.non_cached, intervals(&[(0, 40)]), "{backend:?}");
        }
        assert_eq!(cache.stats().await.unwrap().keys, 0, "{backend:?}");
    }
}

#[tokio::test]
async fn test_filters_do_not_share_coverage() {
    for backend in BACKENDS {
        let cache = test_cache(backend);
        let transfers = transfer_filter();
        let other_token = EventFilter::at(Address::ZERO).topic(TRANSFER);
        let any_token = EventFilter::new().topic(TRANSFER);

        cache.save(&transfers, 10, 20, vec![event(15, 0, 0)]).await.unwrap();

        for filter in [&other_token, &any_token] {
            let result = cache.query(filter, 10, 20).await.unwrap();
            assert!(result.events.is_empty(), "{backend:?}");
            assert_eq!(result.intervals.non_cached, intervals(&[(10, 20)]), "{backend:?}");
        }
    }
}

#[tokio::test]
async fn test_saving_twice_is_idempotent() {
    for backend in BACKENDS {
        let cache = test_cache(backend);
        let filter = transfer_filter();
        let events = vec![event(11, 0, 0), event(19, 2, 3)];

        cache.save(&filter, 10, 20, events.clone()).await.unwrap();
        let once = cache.query(&filter, 0, 30).await.unwrap();
        let stats_once = cache.stats().await.unwrap();

        cache.save(&filter, 10, 20, events).await.unwrap();
        let twice = cache.query(&filter, 0, 30).await.unwrap();

        assert_eq!(once, twice, "{backend:?}");
        assert_eq!(stats_once, cache.stats().await.unwrap(), "{backend:?}");
    }
}

#[tokio::test]
async fn test_adjacent_saves_merge_into_one_interval() {
    for backend in BACKENDS {
        let cache = test_cache(backend);
        let filter = transfer_filter();

        cache.save(&filter, 10, 20, vec![]).await.unwrap();
        cache.save(&filter, 21, 30, vec![]).await.unwrap();
        cache.save(&filter, 40, 50, vec![]).await.unwrap();
        cache.save(&filter, 25, 45, vec![]).await.unwrap();

        let result = cache.query(&filter, 0, 60).await.unwrap();
        assert_eq!(result.intervals.cached, intervals(&[(10, 50)]), "{backend:?}");
        assert_eq!(
            result.intervals.non_cached,
            intervals(&[(0, 9), (51, 60)]),
            "{backend:?}"
        );
        assert_eq!(cache.stats().await.unwrap().intervals, 1, "{backend:?}");
    }
}

#[tokio::test]
async fn test_resave_replaces_payload() {
    for backend in BACKENDS {
        let cache = test_cache(backend);
        let filter = transfer_filter();

        cache.save(&filter, 10, 20, vec![event(16, 1, 1)]).await.unwrap();
        let updated = event(16, 1, 1).with_field("data", serde_json::json!("0xfeed"));
        cache.save(&filter, 15, 17, vec![updated.clone()]).await.unwrap();

        let result = cache.query(&filter, 10, 20).await.unwrap();
        assert_eq!(result.events, vec![updated], "{backend:?}");
    }
}

#[tokio::test]
async fn test_untrusted_events_outside_cached_intervals() {
    for backend in BACKENDS {
        let cache = test_cache(backend);
        let narrow = transfer_filter();

        cache.save(&narrow, 10, 20, vec![event(12, 0, 0)]).await.unwrap();

        // Events come back for the whole numeric range, coverage only where saved
        let result = cache.query(&narrow, 12, 30).await.unwrap();
        assert_eq!(result.events.len(), 1, "{backend:?}");
        assert_eq!(result.trusted_events().count(), 1, "{backend:?}");
        assert!(!result.is_fully_cached(), "{backend:?}");
    }
}

#[tokio::test]
async fn test_clear_network_scope_keeps_other_networks() {
    let store = Arc::new(MemoryStore::new());
    let mainnet = EventsCache::new(store.clone(), NamedChain::Mainnet);
    let arbitrum = EventsCache::new(store.clone(), NamedChain::Arbitrum);
    let filter = transfer_filter();

    mainnet.save(&filter, 10, 20, vec![event(11, 0, 0)]).await.unwrap();
    arbitrum.save(&filter, 10, 20, vec![event(11, 0, 0)]).await.unwrap();

    mainnet.clear().await.unwrap();

    assert!(mainnet.query(&filter, 10, 20).await.unwrap().events.is_empty());
    let kept = arbitrum.query(&filter, 10, 20).await.unwrap();
    assert!(kept.is_fully_cached());
    assert_eq!(kept.events.len(), 1);
}

#[tokio::test]
async fn test_clear_all_scope_wipes_every_network_in_namespace() {
    let store = Arc::new(MemoryStore::new());
    let wipe_all = EventsCacheConfigBuilder::new()
        .clear_scope(ClearScope::All)
        .build();
    let mainnet = EventsCache::new(store.clone(), NamedChain::Mainnet).with_config(wipe_all);
    let arbitrum = EventsCache::new(store.clone(), NamedChain::Arbitrum);
    let foreign = EventsCache::new(store.clone(), NamedChain::Arbitrum).with_config(
        EventsCacheConfigBuilder::new().namespace("other-tool").build(),
    );
    let filter = transfer_filter();

    mainnet.save(&filter, 10, 20, vec![]).await.unwrap();
    arbitrum.save(&filter, 10, 20, vec![]).await.unwrap();
    foreign.save(&filter, 10, 20, vec![]).await.unwrap();

    mainnet.clear().await.unwrap();

    assert!(!arbitrum.query(&filter, 10, 20).await.unwrap().is_fully_cached());
    assert!(foreign.query(&filter, 10, 20).await.unwrap().is_fully_cached());
}

#[tokio::test]
async fn test_clear_leaves_namespaces_sharing_a_prefix() {
    let store = Arc::new(MemoryStore::new());
    let namespaced = |namespace: &str, scope: ClearScope| {
        EventsCache::new(store.clone(), NamedChain::Mainnet).with_config(
            EventsCacheConfigBuilder::new()
                .namespace(namespace)
                .clear_scope(scope)
                .build(),
        )
    };
    let nested = namespaced("tool:1", ClearScope::Network);
    let deeper = namespaced("tool:b", ClearScope::Network);
    let filter = transfer_filter();

    nested.save(&filter, 10, 20, vec![event(15, 0, 0)]).await.unwrap();
    deeper.save(&filter, 10, 20, vec![]).await.unwrap();

    namespaced("tool", ClearScope::Network).clear().await.unwrap();
    namespaced("tool", ClearScope::All).clear().await.unwrap();

    let kept = nested.query(&filter, 10, 20).await.unwrap();
    assert!(kept.is_fully_cached());
    assert_eq!(kept.events.len(), 1);
    assert!(deeper.query(&filter, 10, 20).await.unwrap().is_fully_cached());

    nested.clear().await.unwrap();
    assert!(!nested.query(&filter, 10, 20).await.unwrap().is_fully_cached());
    assert!(deeper.query(&filter, 10, 20).await.unwrap().is_fully_cached());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overlapping_saves_lose_no_coverage() {
    for backend in BACKENDS {
        let cache = test_cache(backend);
        let filter = transfer_filter();

        // 0-9, 10-19, ... saved out of order and concurrently; adjacent
        // ranges must end up as one interval covering 0-399
        let mut handles = Vec::new();
        for chunk in (0..40u64).rev() {
            let cache = cache.cache.clone();
            let filter = filter.clone();
            handles.push(tokio::spawn(async move {
                let from = chunk * 10;
                cache
                    .save(&filter, from, from + 9, vec![event(from + 5, 0, 0)])
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let result = cache.query(&filter, 0, 399).await.unwrap();
        assert_eq!(result.intervals.cached, intervals(&[(0, 399)]), "{backend:?}");
        assert!(result.is_fully_cached(), "{backend:?}");
        assert_eq!(result.events.len(), 40, "{backend:?}");
        assert_eq!(cache.stats().await.unwrap().intervals, 1, "{backend:?}");
    }
}

#[tokio::test]
async fn test_disk_store_shared_by_two_caches() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("events.json");
    let filter = transfer_filter();

    let writer = EventsCache::new(
        Arc::new(DiskStore::new(&path).validate()?),
        NamedChain::Mainnet,
    );
    writer.save(&filter, 100, 200, vec![event(150, 0, 0)]).await?;

    let reader = EventsCache::new(
        Arc::new(DiskStore::new(&path).validate()?),
        NamedChain::Mainnet,
    );
    let result = reader.query(&filter, 100, 250).await?;
    assert_eq!(result.intervals.cached, intervals(&[(100, 200)]));
    assert_eq!(result.intervals.non_cached, intervals(&[(201, 250)]));
    assert_eq!(ids(&result.events), vec![(150, 0, 0)]);
    Ok(())
}

#[tokio::test]
async fn test_failed_commit_surfaces_and_keeps_previous_state() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("events.json");
    let filter = transfer_filter();
    let store = DiskStore::new(&path).validate()?;
    let cache = EventsCache::new(Arc::new(store), NamedChain::Mainnet);

    cache.save(&filter, 10, 20, vec![event(15, 0, 0)]).await?;

    // A directory where the temp file goes makes every write fail
    std::fs::create_dir(dir.path().join("events.json.tmp"))?;

    let err = cache
        .save(&filter, 21, 30, vec![event(25, 0, 0)])
        .await
        .unwrap_err();
    assert!(matches!(err, EventsCacheError::Store(_)), "{err}");

    let result = cache.query(&filter, 10, 30).await?;
    assert_eq!(result.intervals.cached, intervals(&[(10, 20)]));
    assert_eq!(result.intervals.non_cached, intervals(&[(21, 30)]));
    assert_eq!(ids(&result.events), vec![(15, 0, 0)]);

    let err = cache.clear().await.unwrap_err();
    assert!(matches!(err, EventsCacheError::Store(_)), "{err}");
    assert!(cache.query(&filter, 10, 20).await?.is_fully_cached());
    Ok(())
}
