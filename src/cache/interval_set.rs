// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Per-key block coverage with gap detection
//!
//! An [`IntervalSet`] records which blocks of one cache key are fully cached.
//! It keeps its intervals disjoint and non-adjacent: inserting a range merges
//! it with every stored interval it overlaps or touches.

use alloy_primitives::BlockNumber;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::types::{BlockInterval, QueryIntervals};

/// Disjoint, non-adjacent block intervals of one cache key
///
/// Persisted as a plain list; the order of stored intervals carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BlockInterval>", into = "Vec<BlockInterval>")]
pub struct IntervalSet {
    intervals: Vec<BlockInterval>,
}

impl IntervalSet {
    /// Rebuilds a set from persisted intervals, checking its invariants
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupted`] for an interval with `from > to` or
    /// for two intervals that overlap or touch.
    pub fn from_intervals(mut intervals: Vec<BlockInterval>) -> Result<Self, StoreError> {
        if let Some(bad) = intervals.iter().find(|i| i.from > i.to) {
            return Err(StoreError::corrupted(format!(
                "interval from {} to {} is reversed",
                bad.from, bad.to
            )));
        }

        intervals.sort_by_key(|interval| interval.from);
        if let Some(pair) = intervals.windows(2).find(|pair| pair[0].touches(&pair[1])) {
            return Err(StoreError::corrupted(format!(
                "intervals {} and {} were never merged",
                pair[0], pair[1]
            )));
        }

        Ok(Self { intervals })
    }

    /// Stored intervals that end at or after `from`, sorted by start
    ///
    /// Intervals ending before `from` cannot intersect any range starting at
    /// `from`, so they are the only ones a coverage query can skip.
    pub fn reaching(&self, from: BlockNumber) -> Vec<BlockInterval> {
        let mut candidates: Vec<BlockInterval> = self
            .intervals
            .iter()
            .filter(|interval| interval.to >= from)
            .copied()
            .collect();
        candidates.sort_by_key(|interval| interval.from);
        candidates
    }

    /// Splits `[from, to]` into cached and non-cached sub-ranges
    pub fn coverage(&self, from: BlockNumber, to: BlockNumber) -> QueryIntervals {
        coverage(&self.reaching(from), from, to)
    }

    /// Folds `[from, to]` into the set
    ///
    /// Every stored interval that overlaps or touches the new range is
    /// removed and replaced by one interval spanning all of them. Returns the
    /// resulting union.
    ///
    /// `from` must not exceed `to`; debug builds panic on a reversed range.
    pub fn merge(&mut self, from: BlockNumber, to: BlockNumber) -> BlockInterval {
        let incoming = BlockInterval::new(from, to);

        let mut union = incoming;
        self.intervals.retain(|stored| {
            if stored.touches(&incoming) {
                union = union.span(stored);
                false
            } else {
                true
            }
        });
        let at = self
            .intervals
            .partition_point(|stored| stored.from < union.from);
        self.intervals.insert(at, union);

        union
    }

    /// Stored intervals, sorted by start
    pub fn intervals(&self) -> Vec<BlockInterval> {
        self.reaching(0)
    }

    /// Number of stored intervals
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Check if nothing is cached yet
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Total number of covered blocks
    pub fn covered_blocks(&self) -> u64 {
        self.intervals
            .iter()
            .fold(0u64, |total, interval| total.saturating_add(interval.len()))
    }
}

impl TryFrom<Vec<BlockInterval>> for IntervalSet {
    type Error = StoreError;

    fn try_from(intervals: Vec<BlockInterval>) -> Result<Self, Self::Error> {
        Self::from_intervals(intervals)
    }
}

impl From<IntervalSet> for Vec<BlockInterval> {
    fn from(set: IntervalSet) -> Self {
        set.intervals
    }
}

/// Walks sorted `candidates` and splits `[from, to]` into covered and missing parts
///
/// `candidates` must be disjoint, sorted by `from`, and hold every stored
/// interval with `to >= from` (see [`IntervalSet::reaching`]).
///
/// # Examples
///
/// ```
/// use semiocache::{cache::coverage, BlockInterval};
///
/// let stored = [BlockInterval::new(10, 20), BlockInterval::new(30, 40)];
/// let split = coverage(&stored, 15, 35);
/// assert_eq!(split.cached, vec![BlockInterval::new(15, 20), BlockInterval::new(30, 35)]);
/// assert_eq!(split.non_cached, vec![BlockInterval::new(21, 29)]);
/// ```
pub fn coverage(
    candidates: &[BlockInterval],
    from: BlockNumber,
    to: BlockNumber,
) -> QueryIntervals {
    let mut result = QueryIntervals::default();
    if from > to {
        return result;
    }

    // `None` once the cursor would move past u64::MAX, i.e. nothing is left
    let mut cursor = Some(from);

    for candidate in candidates {
        let Some(start) = cursor else { break };

        let Some(covered) = BlockInterval::new(start, to).intersection(candidate) else {
            break;
        };

        result.cached.push(covered);
        if start < covered.from {
            result
                .non_cached
                .push(BlockInterval::new(start, covered.from - 1));
        }

        cursor = covered.to.checked_add(1);
        if cursor.is_some_and(|next| next > to) {
            break;
        }
    }

    if let Some(start) = cursor.filter(|start| *start <= to) {
        result.non_cached.push(BlockInterval::new(start, to));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(intervals: &[(u64, u64)]) -> IntervalSet {
        let mut set = IntervalSet::default();
        for (from, to) in intervals {
            set.merge(*from, *to);
        }
        set
    }

    fn pairs(intervals: &[BlockInterval]) -> Vec<(u64, u64)> {
        intervals.iter().map(|i| (i.from, i.to)).collect()
    }

    #[test]
    fn test_coverage_empty_set() {
        let split = IntervalSet::default().coverage(10, 20);
        assert!(split.cached.is_empty());
        assert_eq!(pairs(&split.non_cached), vec![(10, 20)]);
    }

    #[test]
    fn test_coverage_tail_gap() {
        let split = set(&[(10, 20)]).coverage(15, 25);
        assert_eq!(pairs(&split.cached), vec![(15, 20)]);
        assert_eq!(pairs(&split.non_cached), vec![(21, 25)]);
    }

    #[test]
    fn test_coverage_leading_gap() {
        let split = set(&[(10, 20)]).coverage(5, 15);
        assert_eq!(pairs(&split.cached), vec![(10, 15)]);
        assert_eq!(pairs(&split.non_cached), vec![(5, 9)]);
    }

    #[test]
    fn test_coverage_middle_gap() {
        let split = set(&[(10, 20), (30, 40)]).coverage(15, 35);
        assert_eq!(pairs(&split.cached), vec![(15, 20), (30, 35)]);
        assert_eq!(pairs(&split.non_cached), vec![(21, 29)]);
    }

    #[test]
    fn test_coverage_fully_cached() {
        let split = set(&[(50, 250)]).coverage(100, 200);
        assert_eq!(pairs(&split.cached), vec![(100, 200)]);
        assert!(split.is_fully_cached());
    }

    #[test]
    fn test_coverage_range_between_intervals() {
        let split = set(&[(10, 20), (30, 40)]).coverage(22, 28);
        assert!(split.cached.is_empty());
        assert_eq!(pairs(&split.non_cached), vec![(22, 28)]);
    }

    #[test]
    fn test_coverage_stops_at_intervals_past_range() {
        let split = set(&[(10, 20), (30, 40), (60, 70)]).coverage(0, 35);
        assert_eq!(pairs(&split.cached), vec![(10, 20), (30, 35)]);
        assert_eq!(pairs(&split.non_cached), vec![(0, 9), (21, 29)]);
    }

    #[test]
    fn test_coverage_single_block() {
        let split = set(&[(10, 20)]).coverage(20, 20);
        assert_eq!(pairs(&split.cached), vec![(20, 20)]);
        assert!(split.non_cached.is_empty());
    }

    #[test]
    fn test_coverage_up_to_max_block() {
        let split = set(&[(u64::MAX - 5, u64::MAX)]).coverage(u64::MAX - 10, u64::MAX);
        assert_eq!(pairs(&split.cached), vec![(u64::MAX - 5, u64::MAX)]);
        assert_eq!(pairs(&split.non_cached), vec![(u64::MAX - 10, u64::MAX - 6)]);
    }

    #[test]
    fn test_merge_disjoint_keeps_both() {
        let s = set(&[(10, 20), (30, 40)]);
        assert_eq!(pairs(&s.intervals()), vec![(10, 20), (30, 40)]);
    }

    #[test]
    fn test_merge_overlapping() {
        let s = set(&[(100, 200), (150, 250)]);
        assert_eq!(pairs(&s.intervals()), vec![(100, 250)]);
    }

    #[test]
    fn test_merge_adjacent() {
        let s = set(&[(10, 20), (21, 30)]);
        assert_eq!(pairs(&s.intervals()), vec![(10, 30)]);
    }

    #[test]
    fn test_merge_bridges_many() {
        let mut s = set(&[(10, 20), (30, 40), (50, 60), (80, 90)]);
        let union = s.merge(15, 55);
        assert_eq!(union, BlockInterval::new(10, 60));
        assert_eq!(pairs(&s.intervals()), vec![(10, 60), (80, 90)]);
    }

    #[test]
    fn test_merge_contained_is_noop() {
        let mut s = set(&[(10, 100)]);
        s.merge(20, 30);
        assert_eq!(pairs(&s.intervals()), vec![(10, 100)]);
        assert_eq!(s.covered_blocks(), 91);
    }

    #[test]
    fn test_from_intervals_rejects_overlap() {
        let err = IntervalSet::from_intervals(vec![
            BlockInterval::new(10, 20),
            BlockInterval::new(15, 30),
        ]);
        assert!(matches!(err, Err(StoreError::Corrupted { .. })));
    }

    #[test]
    fn test_from_intervals_rejects_reversed() {
        let err = IntervalSet::from_intervals(vec![BlockInterval { from: 20, to: 10 }]);
        assert!(matches!(err, Err(StoreError::Corrupted { .. })));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "reversed block interval")]
    fn test_merge_reversed_range_panics_in_debug() {
        IntervalSet::default().merge(20, 10);
    }

    #[test]
    fn test_coverage_of_reversed_range_is_empty() {
        let split = set(&[(10, 20)]).coverage(20, 10);
        assert!(split.cached.is_empty());
        assert!(split.non_cached.is_empty());
    }

    #[test]
    fn test_serializes_as_list() {
        let s = set(&[(10, 20)]);
        assert_eq!(serde_json::to_string(&s).unwrap(), r#"[{"from":10,"to":20}]"#);
    }

    #[test]
    fn test_deserialize_checks_invariants() {
        let ok: IntervalSet =
            serde_json::from_str(r#"[{"from":30,"to":40},{"from":10,"to":20}]"#).unwrap();
        assert_eq!(pairs(&ok.intervals()), vec![(10, 20), (30, 40)]);

        let overlapping = serde_json::from_str::<IntervalSet>(
            r#"[{"from":10,"to":20},{"from":20,"to":40}]"#,
        );
        assert!(overlapping.is_err());
    }
}
