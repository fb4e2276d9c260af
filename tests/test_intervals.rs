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

//! Checks of the interval pipeline on a fully worked example: merging two
//! tables, normalizing, coalescing under a budget and snapping onto a
//! domain.

use ijgp::*;

fn table(entries: &[(Value, Value, f64)]) -> IntervalTable {
    entries
        .iter()
        .map(|(lb, ub, p)| (DomainInterval::new(*lb, *ub), *p))
        .collect()
}

fn list1() -> IntervalTable {
    table(&[
        (0, 10, 0.15),
        (15, 35, 0.20),
        (35, 80, 0.20),
        (85, 100, 0.10),
        (200, 201, 0.35),
    ])
}

fn list2() -> IntervalTable {
    table(&[
        (2, 5, 0.5),
        (15, 20, 0.1),
        (25, 35, 0.20),
        (85, 100, 0.1),
        (200, 202, 0.1),
    ])
}

#[test]
fn merge_produces_the_overlaps_with_product_probabilities() {
    let merged = merge_intervals(&list1(), &list2());

    let expected = [
        // [2, 5): (3/10 * 0.15) * (3/3 * 0.5)
        (DomainInterval::new(2, 5), 0.0225),
        // [15, 20): (5/20 * 0.20) * (5/5 * 0.1)
        (DomainInterval::new(15, 20), 0.005),
        // [25, 35): after [15, 20) was consumed, 15/20 of list1's mass is
        // left on [20, 35): (10/15 * 0.15) * (10/10 * 0.2)
        (DomainInterval::new(25, 35), 0.02),
        // [85, 100): full overlap of both
        (DomainInterval::new(85, 100), 0.01),
        // [200, 201): (1/1 * 0.35) * (1/2 * 0.1)
        (DomainInterval::new(200, 201), 0.0175),
    ];
    assert_eq!(expected.len(), merged.len());
    for (interval, probability) in expected {
        assert!(
            (merged[&interval] - probability).abs() < 1e-9,
            "wrong probability for {interval}"
        );
    }
}

#[test]
fn normalized_merge_sums_to_one() {
    let normalized = normalize_intervals(&merge_intervals(&list1(), &list2()));
    assert!((normalized.values().sum::<f64>() - 1.0).abs() < 1e-9);
}

#[test]
fn join_respects_the_budget_within_splitting_tolerance() {
    let normalized = normalize_intervals(&merge_intervals(&list1(), &list2()));
    let joined = join_intervals(&normalized, 6);
    assert!(joined.len() <= 7);
    assert!((joined.values().sum::<f64>() - 1.0).abs() < 1e-9);
}

#[test]
fn adjust_keeps_only_intervals_holding_domain_values() {
    let normalized = normalize_intervals(&merge_intervals(&list1(), &list2()));
    let joined = join_intervals(&normalized, 6);
    let domain = Domain::from_iter([2, 200]);
    let adjusted = adjust_intervals_to_domain(&joined, &domain);

    assert!(!adjusted.is_empty());
    for interval in adjusted.keys() {
        // Every surviving interval holds at least one domain value.
        assert!(domain.count_between(interval.lb, interval.ub) > 0);
    }
    // Pairwise disjointness: in sorted order, each interval ends before the
    // next one starts.
    let intervals = adjusted.keys().collect::<Vec<_>>();
    for pair in intervals.windows(2) {
        assert!(pair[0].ub <= pair[1].lb);
    }
}

#[test]
fn merge_with_a_uniform_twin_round_trips() {
    let original = list1();
    let uniform = original
        .keys()
        .map(|iv| (*iv, 1.0 / original.len() as f64))
        .collect::<IntervalTable>();

    let joined = join_intervals(&normalize_intervals(&merge_intervals(&original, &uniform)), 4);
    assert!((joined.values().sum::<f64>() - 1.0).abs() < 1e-9);
    assert!(joined.len() <= 5);
}
