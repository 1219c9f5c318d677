// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Query results

use serde::{Deserialize, Serialize};

use super::{CachedEvent, QueryIntervals};

/// Result of [`EventsCache::query`](crate::EventsCache::query)
///
/// `events` holds every stored event in the requested block range, including
/// events that sit inside a `non_cached` interval (left over from a save
/// over an overlapping filter window, for example). Those are NOT
/// exhaustive for their blocks. Only `intervals.cached` guarantees that the
/// events returned for its blocks are complete; use [`trusted_events`] to
/// keep just those.
///
/// [`trusted_events`]: QueryResult::trusted_events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub events: Vec<CachedEvent>,
    pub intervals: QueryIntervals,
}

impl QueryResult {
    /// True when the whole requested range is covered
    pub fn is_fully_cached(&self) -> bool {
        self.intervals.is_fully_cached()
    }

    /// Events whose block lies inside a cached interval
    pub fn trusted_events(&self) -> impl Iterator<Item = &CachedEvent> {
        self.events
            .iter()
            .filter(|event| self.intervals.is_cached(event.block_number))
    }
}
