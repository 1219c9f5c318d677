// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Per-key event records, unique by identity

use std::collections::BTreeMap;

use alloy_primitives::BlockNumber;
use serde::{Deserialize, Serialize};

use crate::types::{CachedEvent, EventId};

/// Events of one cache key, unique by `(block, transaction index, log index)`
///
/// Kept in chain order, so range reads come back sorted without extra work.
/// Persisted as a plain list of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CachedEvent>", into = "Vec<CachedEvent>")]
pub struct EventSet {
    events: BTreeMap<EventId, CachedEvent>,
}

impl EventSet {
    /// Inserts or replaces each event by identity, in input order
    ///
    /// When the same identity appears several times the last occurrence wins.
    /// Returns how many identities were new to the set.
    pub fn upsert_many(&mut self, events: impl IntoIterator<Item = CachedEvent>) -> usize {
        let mut inserted = 0;
        for event in events {
            if self.events.insert(event.id(), event).is_none() {
                inserted += 1;
            }
        }
        inserted
    }

    /// Events with `from <= block_number <= to`, in chain order
    pub fn range(&self, from: BlockNumber, to: BlockNumber) -> Vec<CachedEvent> {
        if from > to {
            return Vec::new();
        }
        self.events
            .range(EventId::first_in(from)..=EventId::last_in(to))
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn get(&self, id: &EventId) -> Option<&CachedEvent> {
        self.events.get(id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl From<Vec<CachedEvent>> for EventSet {
    fn from(events: Vec<CachedEvent>) -> Self {
        let mut set = EventSet::default();
        set.upsert_many(events);
        set
    }
}

impl From<EventSet> for Vec<CachedEvent> {
    fn from(set: EventSet) -> Self {
        set.events.into_values().collect()
    }
}
