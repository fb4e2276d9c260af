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

//! This module provides the schematic mini-bucket partitioning: given an
//! elimination ordering and a bound on the cluster size, the constraint
//! scopes are placed into per-variable buckets and each bucket is packed into
//! mini-buckets whose union stays below the bound. The partitioning is
//! *schematic* because only scopes are manipulated, never actual tables:
//! its one purpose is to shape the join graph.

use std::collections::{BTreeMap, BTreeSet};

use fxhash::FxHashMap;

use crate::{Scope, Variable};

/// The outcome of the schematic mini-bucket pass.
#[derive(Debug, Clone)]
pub struct MiniBuckets {
    /// One list of mini-buckets per position of the elimination ordering.
    /// Every scope placed in `buckets[k]` contains `ordering[k]`.
    pub buckets: Vec<Vec<Scope>>,
    /// Arcs between a just-finalized mini-bucket and the mini-bucket of some
    /// earlier bucket that absorbed its residual scope. The key is the
    /// producing mini-bucket, the value the absorbing one.
    pub outside_arcs: BTreeMap<Scope, Scope>,
}

impl MiniBuckets {
    /// Runs the partitioning. A scope larger than `max_bucket_size` cannot be
    /// packed with anything and ends up as a mini-bucket of its own.
    pub fn build(
        scopes: impl IntoIterator<Item = Scope>,
        ordering: &[Variable],
        max_bucket_size: usize,
    ) -> Self {
        let position = ordering
            .iter()
            .enumerate()
            .map(|(i, v)| (*v, i))
            .collect::<FxHashMap<Variable, usize>>();

        // Place every distinct scope into the bucket of its last-eliminated
        // variable.
        let mut buckets: Vec<Vec<Scope>> = vec![vec![]; ordering.len()];
        for scope in BTreeSet::from_iter(scopes) {
            if let Some(last) = scope.iter().map(|v| position[v]).max() {
                buckets[last].push(scope);
            }
        }

        let mut result = vec![vec![]; ordering.len()];
        let mut outside_arcs = BTreeMap::new();
        // Maps a residual scope awaiting placement to the mini-bucket that
        // produced it.
        let mut pending_arcs: BTreeMap<Scope, Scope> = BTreeMap::new();

        for k in (0..ordering.len()).rev() {
            let mut scopes = std::mem::take(&mut buckets[k]);
            scopes.sort_by(|a, b| b.len().cmp(&a.len()));

            let mut minis: Vec<Scope> = vec![];
            // Arcs recorded against the *index* of the absorbing mini-bucket:
            // the mini-bucket keeps growing as more scopes are packed into
            // it, so its final scope is only known once the bucket is done.
            let mut arc_targets: Vec<(Scope, usize)> = vec![];

            for scope in scopes {
                let chosen = Self::best_fit(&minis, &scope, max_bucket_size);
                let chosen = match chosen {
                    Some((index, union)) => {
                        minis[index] = union;
                        index
                    }
                    None => {
                        minis.push(scope.clone());
                        minis.len() - 1
                    }
                };
                if let Some(producer) = pending_arcs.remove(&scope) {
                    arc_targets.push((producer, chosen));
                }
            }

            for (producer, index) in arc_targets {
                outside_arcs.insert(producer, minis[index].clone());
            }

            // Queue the residual scope of every mini-bucket into the bucket
            // of its last remaining variable, and remember which mini-bucket
            // it came from.
            for mini in &minis {
                let mut residual = mini.clone();
                residual.remove(&ordering[k]);
                if residual.is_empty() {
                    continue;
                }
                let last = residual.iter().map(|v| position[v]).max().unwrap();
                buckets[last].push(residual.clone());
                pending_arcs.insert(residual, mini.clone());
            }

            result[k] = minis;
        }

        debug_assert!(pending_arcs.is_empty());
        MiniBuckets {
            buckets: result,
            outside_arcs,
        }
    }

    /// Best-fit selection: an existing mini-bucket that is a superset of the
    /// scope wins outright; otherwise the mini-bucket yielding the smallest
    /// union within the bound wins; otherwise the scope starts a bucket of
    /// its own.
    fn best_fit(minis: &[Scope], scope: &Scope, max_bucket_size: usize) -> Option<(usize, Scope)> {
        let mut best: Option<(usize, Scope)> = None;
        let mut best_size = max_bucket_size + 1;
        for (index, mini) in minis.iter().enumerate() {
            let union = mini.union(scope).copied().collect::<Scope>();
            if union.len() == mini.len() {
                return Some((index, union));
            }
            if union.len() < best_size {
                best_size = union.len();
                best = Some((index, union));
            }
        }
        best
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_mini_buckets {
    use crate::{MiniBuckets, Scope, Variable};

    fn scope(vars: &[usize]) -> Scope {
        vars.iter().map(|v| Variable(*v)).collect()
    }

    #[test]
    fn every_bucket_scope_contains_its_ordering_variable() {
        let ordering = [Variable(0), Variable(1), Variable(2), Variable(3)];
        let scopes = vec![scope(&[0, 1]), scope(&[1, 2]), scope(&[2, 3]), scope(&[0, 3])];
        let mb = MiniBuckets::build(scopes, &ordering, 2);
        for (k, bucket) in mb.buckets.iter().enumerate() {
            for mini in bucket {
                assert!(mini.contains(&ordering[k]));
            }
        }
    }

    #[test]
    fn bound_is_honored_except_for_oversized_scopes() {
        let ordering = [Variable(0), Variable(1), Variable(2), Variable(3)];
        let scopes = vec![scope(&[0, 1, 2, 3]), scope(&[2, 3]), scope(&[1, 3])];
        let mb = MiniBuckets::build(scopes, &ordering, 2);
        for bucket in &mb.buckets {
            for mini in bucket {
                assert!(mini.len() <= 2 || *mini == scope(&[0, 1, 2, 3]));
            }
        }
    }

    #[test]
    fn superset_packing_merges_contained_scopes() {
        let ordering = [Variable(0), Variable(1), Variable(2)];
        let scopes = vec![scope(&[0, 1, 2]), scope(&[1, 2]), scope(&[2])];
        let mb = MiniBuckets::build(scopes, &ordering, 3);
        // Everything fits in the single mini-bucket of the last bucket.
        assert_eq!(vec![scope(&[0, 1, 2])], mb.buckets[2]);
        // The residual {0, 1} went through the earlier buckets.
        assert_eq!(vec![scope(&[0, 1])], mb.buckets[1]);
        assert_eq!(
            Some(&scope(&[0, 1])),
            mb.outside_arcs.get(&scope(&[0, 1, 2]))
        );
    }

    #[test]
    fn cycle_with_chord_produces_an_outside_arc() {
        let ordering = [Variable(0), Variable(1), Variable(2), Variable(3), Variable(4)];
        let scopes = vec![
            scope(&[0, 1]),
            scope(&[1, 2]),
            scope(&[2, 3]),
            scope(&[3, 0]),
            scope(&[0, 2]),
        ];
        let mb = MiniBuckets::build(scopes, &ordering, 2);
        assert!(!mb.outside_arcs.is_empty());
        for (producer, absorber) in &mb.outside_arcs {
            // The absorber holds the residual of the producer.
            let mut residual = producer.clone();
            let last = producer.iter().max().unwrap();
            residual.remove(last);
            assert!(residual.iter().all(|v| absorber.contains(v)));
        }
    }
}
