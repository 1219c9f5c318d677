// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Closed block intervals

use std::cmp::{max, min};
use std::fmt;

use alloy_primitives::BlockNumber;
use serde::{Deserialize, Serialize};

/// A closed range of blocks `[from, to]`, both ends inclusive
///
/// In a key's interval set, every `BlockInterval` marks a contiguous span of
/// blocks whose events were fully fetched and saved.
///
/// # Examples
///
/// ```
/// use semiocache::BlockInterval;
///
/// let interval = BlockInterval::new(10, 20);
/// assert_eq!(interval.len(), 11);
/// assert!(interval.contains(20));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockInterval {
    pub from: BlockNumber,
    pub to: BlockNumber,
}

impl BlockInterval {
    /// Creates an interval; callers must ensure `from <= to`
    pub const fn new(from: BlockNumber, to: BlockNumber) -> Self {
        debug_assert!(from <= to, "reversed block interval");
        Self { from, to }
    }

    /// Number of blocks in the interval
    pub const fn len(&self) -> u64 {
        debug_assert!(self.from <= self.to, "reversed block interval");
        (self.to - self.from).saturating_add(1)
    }

    /// Always false: a closed interval holds at least one block
    pub const fn is_empty(&self) -> bool {
        false
    }

    pub const fn contains(&self, block: BlockNumber) -> bool {
        self.from <= block && block <= self.to
    }

    /// Common blocks of `self` and `other`, if any
    pub fn intersection(&self, other: &BlockInterval) -> Option<BlockInterval> {
        if self.to < other.from || other.to < self.from {
            return None;
        }
        Some(BlockInterval::new(
            max(self.from, other.from),
            min(self.to, other.to),
        ))
    }

    /// True when the two intervals share a block or sit side by side
    ///
    /// `[10, 20]` touches both `[15, 30]` and `[21, 30]`, but not `[22, 30]`.
    pub fn touches(&self, other: &BlockInterval) -> bool {
        self.from <= other.to.saturating_add(1) && other.from <= self.to.saturating_add(1)
    }

    /// Smallest interval spanning both
    pub fn span(&self, other: &BlockInterval) -> BlockInterval {
        BlockInterval::new(min(self.from, other.from), max(self.to, other.to))
    }
}

impl fmt::Display for BlockInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from, self.to)
    }
}

/// Split of a requested block range into cached and still-missing parts
///
/// Both lists are ordered by ascending `from`; together they partition the
/// requested range exactly, with no gaps and no overlaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryIntervals {
    /// Sub-ranges whose events are fully cached
    pub cached: Vec<BlockInterval>,
    /// Sub-ranges that must still be fetched from the source
    pub non_cached: Vec<BlockInterval>,
}

impl QueryIntervals {
    /// True when no block of the requested range is missing
    pub fn is_fully_cached(&self) -> bool {
        self.non_cached.is_empty()
    }

    /// Whether `block` falls inside one of the cached sub-ranges
    pub fn is_cached(&self, block: BlockNumber) -> bool {
        self.cached.iter().any(|interval| interval.contains(block))
    }

    /// Number of blocks that still need fetching
    pub fn missing_blocks(&self) -> u64 {
        self.non_cached.iter().map(BlockInterval::len).sum()
    }
}
