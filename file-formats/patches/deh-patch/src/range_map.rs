//! Run-length boolean map over an integer index domain
//!
//! Allocator bitsets (free states, protected states, free things and so on)
//! span thousands of indices for classic dialects and the whole positive
//! `i32` range for open-ended ones, so only the runs of `true` are stored.

use std::collections::{BTreeMap, BTreeSet};

/// Boolean map over `[min_index, max_index]`, defaulting to `false`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeBoolMap {
    min_index: i64,
    max_index: i64,
    /// Disjoint, non-adjacent runs of `true`: start -> inclusive end
    runs: BTreeMap<i64, i64>,
}

impl RangeBoolMap {
    /// Create a map over an inclusive domain
    pub fn new(min_index: i64, max_index: i64) -> Self {
        let (min_index, max_index) = ordered(min_index, max_index);
        Self {
            min_index,
            max_index,
            runs: BTreeMap::new(),
        }
    }

    /// Lowest index of the domain
    pub fn min_index(&self) -> i64 {
        self.min_index
    }

    /// Highest index of the domain
    pub fn max_index(&self) -> i64 {
        self.max_index
    }

    /// Check whether an index lies inside the domain
    pub fn contains_index(&self, index: i64) -> bool {
        index >= self.min_index && index <= self.max_index
    }

    /// Value at an index
    pub fn get(&self, index: i64) -> bool {
        self.run_containing(index).is_some()
    }

    /// Value at an index, or `default` outside of the domain
    pub fn get_or_default(&self, index: i64, default: bool) -> bool {
        if self.contains_index(index) {
            self.get(index)
        } else {
            default
        }
    }

    /// Set a single index
    pub fn set(&mut self, index: i64, value: bool) {
        self.set_range(index, index, value);
    }

    /// Set an inclusive range; bounds may be given in either order
    ///
    /// The range is clamped to the domain. Writes entirely outside it are
    /// ignored.
    pub fn set_range(&mut self, a: i64, b: i64, value: bool) {
        let (a, b) = ordered(a, b);
        let (lo, hi) = (a.max(self.min_index), b.min(self.max_index));
        if lo > hi {
            return;
        }

        // Every run overlapping or adjacent to [lo, hi]
        let touching: Vec<(i64, i64)> = self
            .runs
            .range(..=hi.saturating_add(1))
            .rev()
            .take_while(|&(_, &end)| end >= lo.saturating_sub(1))
            .map(|(&start, &end)| (start, end))
            .collect();

        for (start, _) in &touching {
            self.runs.remove(start);
        }

        if value {
            let (merged_lo, merged_hi) = touching
                .iter()
                .fold((lo, hi), |(l, h), &(s, e)| (l.min(s), h.max(e)));
            self.runs.insert(merged_lo, merged_hi);
        } else {
            for (start, end) in touching {
                if start < lo {
                    self.runs.insert(start, end.min(lo - 1));
                }
                if end > hi {
                    self.runs.insert((hi + 1).max(start), end);
                }
            }
        }
    }

    /// Count of domain indices currently mapped to `value`
    pub fn index_width(&self, value: bool) -> u64 {
        let set = self.covered(self.min_index, self.max_index);
        if value {
            set
        } else {
            span(self.min_index, self.max_index) - set
        }
    }

    /// Distinct values present in an inclusive range
    pub fn value_set(&self, a: i64, b: i64) -> BTreeSet<bool> {
        let (lo, hi) = ordered(a, b);
        let covered = self.covered(lo, hi);
        let mut out = BTreeSet::new();
        if covered > 0 {
            out.insert(true);
        }
        if covered < span(lo, hi) {
            out.insert(false);
        }
        out
    }

    /// First index in `[from, to)` mapped to `value`
    pub fn first_index_of(&self, value: bool, from: i64, to: i64) -> Option<i64> {
        if from >= to {
            return None;
        }
        let found = match (value, self.run_containing(from)) {
            (true, Some(_)) => Some(from),
            (true, None) => self.runs.range(from..).next().map(|(&start, _)| start),
            (false, Some(end)) => end.checked_add(1),
            (false, None) => Some(from),
        };
        found.filter(|&index| index < to)
    }

    /// Iterate every `true` index in `[from, to)` in ascending order
    pub fn iter_true(&self, from: i64, to: i64) -> impl Iterator<Item = i64> + '_ {
        let to = to.max(from);
        let first_key = self
            .runs
            .range(..=from)
            .next_back()
            .filter(|&(_, &end)| end >= from)
            .map_or(from, |(&start, _)| start);
        self.runs
            .range(first_key..to)
            .flat_map(move |(&start, &end)| start.max(from)..=end.min(to - 1))
    }

    fn run_containing(&self, index: i64) -> Option<i64> {
        self.runs
            .range(..=index)
            .next_back()
            .and_then(|(_, &end)| (end >= index).then_some(end))
    }

    /// Number of `true` indices inside `[lo, hi]`
    fn covered(&self, lo: i64, hi: i64) -> u64 {
        self.iter_runs_overlapping(lo, hi)
            .map(|(s, e)| span(s.max(lo), e.min(hi)))
            .sum()
    }

    fn iter_runs_overlapping(&self, lo: i64, hi: i64) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.runs
            .range(..=hi)
            .rev()
            .take_while(move |&(_, &end)| end >= lo)
            .map(|(&start, &end)| (start, end))
    }
}

fn ordered(a: i64, b: i64) -> (i64, i64) {
    if a <= b { (a, b) } else { (b, a) }
}

fn span(lo: i64, hi: i64) -> u64 {
    (hi - lo + 1) as u64
}
