// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Pure per-key cache state.
//!
//! These types hold no locks and do no I/O. Store backends keep one
//! [`KeyState`] per cache key and mutate it inside their own transactions:
//! - [`IntervalSet`] answers coverage queries and merges new ranges
//! - [`EventSet`] upserts events and serves block-range reads

mod event_set;
mod interval_set;

pub use event_set::EventSet;
pub use interval_set::{coverage, IntervalSet};

use alloy_primitives::BlockNumber;
use serde::{Deserialize, Serialize};

use crate::types::{BlockInterval, CachedEvent};

/// Everything cached for one key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyState {
    pub intervals: IntervalSet,
    pub events: EventSet,
}

impl KeyState {
    /// Applies one save: upserts `events` and merges `[from, to]`
    ///
    /// Both halves are infallible, so a store that runs this under its write
    /// transaction makes them visible together.
    pub fn apply_save(
        &mut self,
        from: BlockNumber,
        to: BlockNumber,
        events: Vec<CachedEvent>,
    ) -> BlockInterval {
        self.events.upsert_many(events);
        self.intervals.merge(from, to)
    }
}
