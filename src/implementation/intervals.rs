// Copyright 2026 The ijgp developers
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! This module provides the half-open value ranges used by the
//! interval-valued flavor of the propagation, along with the pure operations
//! manipulating probability tables keyed by such ranges: merging two tables,
//! normalizing, coalescing down to a bounded number of ranges, snapping the
//! ranges onto a domain, and spreading a uniform mass over a domain.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::{Domain, Value};

// ----------------------------------------------------------------------------
// --- DOMAIN INTERVAL --------------------------------------------------------
// ----------------------------------------------------------------------------
/// A half-open range `[lb, ub)` of values from the domain of one variable.
/// All the intervals stored in one table belong to a single variable and are
/// pairwise disjoint, so ordering them by bounds is total in practice.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct DomainInterval {
    pub lb: Value,
    pub ub: Value,
}

impl DomainInterval {
    pub fn new(lb: Value, ub: Value) -> Self {
        debug_assert!(ub > lb);
        Self { lb, ub }
    }
    /// The interval holding the single value `v`.
    pub fn singleton(v: Value) -> Self {
        Self::new(v, v + 1)
    }
    pub fn len(&self) -> usize {
        (self.ub - self.lb) as usize
    }
    pub fn is_empty(&self) -> bool {
        self.ub <= self.lb
    }
    pub fn contains(&self, value: Value) -> bool {
        self.lb <= value && value < self.ub
    }
}

impl Ord for DomainInterval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ub.cmp(&other.ub).then_with(|| self.lb.cmp(&other.lb))
    }
}
impl PartialOrd for DomainInterval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl fmt::Display for DomainInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.lb, self.ub)
    }
}

/// A probability table over the (disjoint) intervals of one variable.
pub type IntervalTable = BTreeMap<DomainInterval, f64>;

/// Finds the interval of the table containing the given value, if any. The
/// candidate is the first interval whose upper bound lies beyond the value;
/// since the intervals of a table are disjoint, it is the only one that can
/// contain it.
pub fn containing_interval(table: &IntervalTable, value: Value) -> Option<DomainInterval> {
    let probe = DomainInterval {
        lb: Value::MIN,
        ub: value + 1,
    };
    table
        .range(probe..)
        .next()
        .map(|(iv, _)| *iv)
        .filter(|iv| iv.contains(value))
}

// ----------------------------------------------------------------------------
// --- TABLE OPERATIONS -------------------------------------------------------
// ----------------------------------------------------------------------------
/// Merges two interval tables by sweeping them jointly: every overlap region
/// becomes an interval whose probability is the product of the slices each
/// side contributes to the overlap. When one side's upper bound is passed,
/// the other side's remaining probability is scaled down by the fraction that
/// was not consumed yet. The result is not normalized.
pub fn merge_intervals(list1: &IntervalTable, list2: &IntervalTable) -> IntervalTable {
    let mut result = IntervalTable::new();

    let mut it1 = list1.iter();
    let mut it2 = list2.iter();
    let mut cur1 = it1.next().map(|(iv, p)| (iv.lb, iv.ub, *p));
    let mut cur2 = it2.next().map(|(iv, p)| (iv.lb, iv.ub, *p));

    while let (Some((lb1, ub1, p1)), Some((lb2, ub2, p2))) = (cur1, cur2) {
        if ub1 <= lb2 {
            cur1 = it1.next().map(|(iv, p)| (iv.lb, iv.ub, *p));
            continue;
        }
        if ub2 <= lb1 {
            cur2 = it2.next().map(|(iv, p)| (iv.lb, iv.ub, *p));
            continue;
        }

        let lo = lb1.max(lb2);
        let hi = ub1.min(ub2);
        debug_assert!(hi > lo);
        let overlap = (hi - lo) as f64;
        let probability = (overlap / (ub1 - lb1) as f64 * p1) * (overlap / (ub2 - lb2) as f64 * p2);
        result.insert(DomainInterval::new(lo, hi), probability);

        if ub1 == hi {
            // The first list is exhausted up to here; the portion of the
            // second interval at the left of `hi` is consumed as well.
            cur1 = it1.next().map(|(iv, p)| (iv.lb, iv.ub, *p));
            if ub2 > hi {
                cur2 = Some((hi, ub2, p2 * (ub2 - hi) as f64 / (ub2 - lb2) as f64));
            } else {
                cur2 = it2.next().map(|(iv, p)| (iv.lb, iv.ub, *p));
            }
        } else {
            cur2 = it2.next().map(|(iv, p)| (iv.lb, iv.ub, *p));
            cur1 = Some((hi, ub1, p1 * (ub1 - hi) as f64 / (ub1 - lb1) as f64));
        }
    }

    result
}

/// Normalizes an interval table so that it sums up to one. A table with no
/// mass at all degrades to the uniform table over the same intervals.
pub fn normalize_intervals(list: &IntervalTable) -> IntervalTable {
    let total = list.values().sum::<f64>();
    if total > 0.0 {
        list.iter().map(|(iv, p)| (*iv, p / total)).collect()
    } else {
        let uniform = 1.0 / list.len().max(1) as f64;
        list.keys().map(|iv| (*iv, uniform)).collect()
    }
}

/// Coalesces a table down to roughly `max_intervals` ranges. Intervals
/// holding much more than their fair share `1/max_intervals` of the mass are
/// first split into equal-width pieces; adjacent light intervals are then
/// greedily fused until their cumulated mass lands in the
/// `[1/max_intervals, 2/max_intervals]` band. A standalone heavy interval is
/// kept unsplit when fusing it would push the running batch past
/// `1.8/max_intervals`.
pub fn join_intervals(list: &IntervalTable, max_intervals: usize) -> IntervalTable {
    assert!(max_intervals > 0);
    let target = 1.0 / max_intervals as f64;

    let mut split = IntervalTable::new();
    for (interval, p) in list {
        let length = interval.ub - interval.lb;
        let pieces = length.min(((2.0 * p / target).ceil() as Value).max(1));
        let mut lb = interval.lb;
        for i in 0..pieces {
            let ub = interval.lb + ((length * (i + 1)) as f64 / pieces as f64).ceil() as Value;
            let piece_p = (ub - lb) as f64 / length as f64 * p;
            split.insert(DomainInterval::new(lb, ub), piece_p);
            lb = ub;
        }
    }

    let mut result = IntervalTable::new();
    let (mut lb, mut ub) = (0, 0);
    let mut cumulated = 0.0;

    for (interval, p) in &split {
        if cumulated <= 0.0 {
            if *p >= target {
                result.insert(*interval, *p);
            } else {
                lb = interval.lb;
                ub = interval.ub;
                cumulated = *p;
            }
        } else if cumulated + p >= 2.0 * target || (cumulated + p >= 1.8 * target && *p > target) {
            // The batch and the current interval each stand on their own.
            result.insert(DomainInterval::new(lb, ub), cumulated);
            result.insert(*interval, *p);
            cumulated = 0.0;
        } else if cumulated + p >= target {
            result.insert(DomainInterval::new(lb, interval.ub), cumulated + p);
            cumulated = 0.0;
        } else {
            ub = interval.ub;
            cumulated += p;
        }
    }
    if cumulated > 0.0 {
        result.insert(DomainInterval::new(lb, ub), cumulated);
    }

    result
}

/// Snaps every interval onto the given domain: the bounds are tightened to
/// the first and last domain values actually falling inside the range, and
/// intervals holding no domain value at all are dropped. Every emitted
/// interval therefore contains at least one current domain value.
pub fn adjust_intervals_to_domain(list: &IntervalTable, domain: &Domain) -> IntervalTable {
    let mut result = IntervalTable::new();
    for (interval, p) in list {
        let first = match domain.min_at_least(interval.lb) {
            // No domain value at the right of this interval: nothing further
            // can match either since the tables are sorted.
            None => break,
            Some(first) => first,
        };
        if first >= interval.ub {
            continue;
        }
        if let Some(last) = domain.max_below(interval.ub) {
            result.insert(DomainInterval::new(first, last + 1), *p);
        }
    }
    result
}

/// Spreads a uniform mass over the domain, cut into chunks of
/// `len / max_intervals` consecutive values.
pub fn uniform_intervals(domain: &Domain, max_intervals: usize) -> IntervalTable {
    assert!(max_intervals > 0);
    let mut result = IntervalTable::new();
    if domain.is_empty() {
        return result;
    }
    let per_interval = (domain.len() / max_intervals).max(1);
    let values = domain.iter().collect::<Vec<Value>>();
    for chunk in values.chunks(per_interval) {
        let lb = chunk[0];
        let ub = chunk[chunk.len() - 1] + 1;
        result.insert(
            DomainInterval::new(lb, ub),
            chunk.len() as f64 / domain.len() as f64,
        );
    }
    result
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_intervals {
    use crate::*;

    fn table(entries: &[(Value, Value, f64)]) -> IntervalTable {
        entries
            .iter()
            .map(|(lb, ub, p)| (DomainInterval::new(*lb, *ub), *p))
            .collect()
    }

    #[test]
    fn containing_interval_lookup() {
        let t = table(&[(0, 5, 0.5), (7, 9, 0.5)]);
        assert_eq!(Some(DomainInterval::new(0, 5)), containing_interval(&t, 3));
        assert_eq!(Some(DomainInterval::new(7, 9)), containing_interval(&t, 7));
        assert_eq!(None, containing_interval(&t, 5));
        assert_eq!(None, containing_interval(&t, 9));
    }

    #[test]
    fn merge_scales_by_the_overlapping_fractions() {
        let a = table(&[(0, 10, 1.0)]);
        let b = table(&[(5, 10, 1.0)]);
        let merged = merge_intervals(&a, &b);
        assert_eq!(1, merged.len());
        let p = merged[&DomainInterval::new(5, 10)];
        // Half of a's mass times all of b's.
        assert!((p - 0.5).abs() < 1e-9);
    }

    #[test]
    fn merge_consumes_the_left_part_of_a_longer_interval() {
        let a = table(&[(0, 4, 0.4), (4, 8, 0.6)]);
        let b = table(&[(0, 8, 1.0)]);
        let merged = merge_intervals(&a, &b);
        assert_eq!(2, merged.len());
        assert!((merged[&DomainInterval::new(0, 4)] - 0.4 * 0.5).abs() < 1e-9);
        assert!((merged[&DomainInterval::new(4, 8)] - 0.6 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn normalize_handles_the_degenerate_case() {
        let normalized = normalize_intervals(&table(&[(0, 2, 3.0), (2, 4, 1.0)]));
        assert!((normalized.values().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!((normalized[&DomainInterval::new(0, 2)] - 0.75).abs() < 1e-9);

        let flat = normalize_intervals(&table(&[(0, 2, 0.0), (2, 4, 0.0)]));
        assert!(flat.values().all(|p| (*p - 0.5).abs() < 1e-9));
    }

    #[test]
    fn join_splits_heavy_intervals_and_fuses_light_ones() {
        // One interval carries everything: it must be split.
        let heavy = table(&[(0, 8, 1.0)]);
        let joined = join_intervals(&heavy, 4);
        assert!(joined.len() > 1);
        assert!((joined.values().sum::<f64>() - 1.0).abs() < 1e-9);

        // Eight tiny intervals must be fused down to about four.
        let light = table(&[
            (0, 1, 0.125), (1, 2, 0.125), (2, 3, 0.125), (3, 4, 0.125),
            (4, 5, 0.125), (5, 6, 0.125), (6, 7, 0.125), (7, 8, 0.125),
        ]);
        let joined = join_intervals(&light, 4);
        assert!(joined.len() <= 5);
        assert!((joined.values().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn adjust_drops_unpopulated_intervals() {
        let t = table(&[(0, 4, 0.25), (4, 8, 0.25), (8, 12, 0.5)]);
        let domain = Domain::from_iter([2, 3, 9]);
        let adjusted = adjust_intervals_to_domain(&t, &domain);
        assert_eq!(
            table(&[(2, 4, 0.25), (9, 10, 0.5)]),
            adjusted
        );
    }

    #[test]
    fn uniform_chunks_cover_the_domain() {
        let domain = Domain::from_iter([0, 1, 2, 3, 4, 5]);
        let uniform = uniform_intervals(&domain, 3);
        assert_eq!(3, uniform.len());
        assert!((uniform.values().sum::<f64>() - 1.0).abs() < 1e-9);
        for (interval, p) in &uniform {
            assert_eq!(2, domain.count_between(interval.lb, interval.ub));
            assert!((p - 2.0 / 6.0).abs() < 1e-9);
        }
    }
}
