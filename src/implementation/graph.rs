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

//! This module provides the primal graph of a problem (one vertex per
//! variable, one edge between any two variables sharing a constraint) and the
//! min-induced-width elimination ordering computed on it. That ordering is
//! the backbone along which the mini-buckets, and hence the join graph, are
//! laid out.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use binary_heap_plus::BinaryHeap;
use compare::Compare;

use crate::{CspProblem, Variable};

/// The undirected graph over the problem variables induced by the constraint
/// scopes.
#[derive(Debug, Clone)]
pub struct PrimalGraph {
    adjacency: BTreeMap<Variable, BTreeSet<Variable>>,
}

/// One candidate of the elimination heap: a vertex along with the degree it
/// had when the entry was pushed. Entries are never updated in place; a
/// vertex whose degree changed is simply pushed again and the stale entries
/// are skipped when popped.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct DegreeEntry {
    degree: usize,
    variable: Variable,
}

/// Heap ordering electing the vertex of minimum degree, ties broken by the
/// smallest variable id so that the choice is stable.
#[derive(Debug, Default, Copy, Clone)]
struct PickMinDegree;
impl Compare<DegreeEntry> for PickMinDegree {
    fn compare(&self, a: &DegreeEntry, b: &DegreeEntry) -> Ordering {
        b.degree
            .cmp(&a.degree)
            .then_with(|| b.variable.cmp(&a.variable))
    }
}

impl PrimalGraph {
    /// Builds the primal graph of the given problem.
    pub fn of_problem(problem: &CspProblem) -> Self {
        let mut adjacency: BTreeMap<Variable, BTreeSet<Variable>> = problem
            .variables()
            .map(|v| (v, BTreeSet::new()))
            .collect();

        for constraint in problem.constraints() {
            let scope = constraint.scope().iter().copied().collect::<Vec<Variable>>();
            for (i, a) in scope.iter().enumerate() {
                for b in scope.iter().skip(i + 1) {
                    adjacency.get_mut(a).unwrap().insert(*b);
                    adjacency.get_mut(b).unwrap().insert(*a);
                }
            }
        }
        Self { adjacency }
    }

    pub fn nb_vertices(&self) -> usize {
        self.adjacency.len()
    }

    pub fn neighbours(&self, variable: Variable) -> impl Iterator<Item = Variable> + '_ {
        self.adjacency[&variable].iter().copied()
    }

    /// Computes a min-induced-width elimination ordering by iterated
    /// min-degree removal: the vertex of smallest degree is placed at the
    /// current last position of the ordering, its neighbours are pairwise
    /// connected (fill-in), and it is removed from the residual graph.
    pub fn min_induced_width_ordering(&self) -> Vec<Variable> {
        let mut adjacency = self.adjacency.clone();
        let mut degrees = adjacency
            .iter()
            .map(|(v, n)| (*v, n.len()))
            .collect::<BTreeMap<Variable, usize>>();

        let mut heap = BinaryHeap::from_vec_cmp(vec![], PickMinDegree);
        for (variable, degree) in &degrees {
            heap.push(DegreeEntry {
                degree: *degree,
                variable: *variable,
            });
        }

        let total = adjacency.len();
        let mut ordering = vec![Variable(0); total];

        for slot in (0..total).rev() {
            let chosen = loop {
                let entry = heap.pop().expect("elimination heap exhausted");
                if degrees.get(&entry.variable) == Some(&entry.degree) {
                    break entry.variable;
                }
            };
            ordering[slot] = chosen;

            let neighbours = adjacency[&chosen].iter().copied().collect::<Vec<Variable>>();
            for (i, a) in neighbours.iter().enumerate() {
                for b in neighbours.iter().skip(i + 1) {
                    if adjacency.get_mut(a).unwrap().insert(*b) {
                        adjacency.get_mut(b).unwrap().insert(*a);
                        *degrees.get_mut(a).unwrap() += 1;
                        *degrees.get_mut(b).unwrap() += 1;
                    }
                }
            }
            for neighbour in &neighbours {
                adjacency.get_mut(neighbour).unwrap().remove(&chosen);
                *degrees.get_mut(neighbour).unwrap() -= 1;
            }
            adjacency.remove(&chosen);
            degrees.remove(&chosen);

            for neighbour in &neighbours {
                heap.push(DegreeEntry {
                    degree: degrees[neighbour],
                    variable: *neighbour,
                });
            }
        }

        ordering
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_primal_graph {
    use std::sync::Arc;

    use crate::*;

    fn chain_problem(n: usize) -> CspProblem {
        let costs = Arc::new(CostModel::default());
        let domains = (0..n).map(|i| (Variable(i), Domain::range(0, 1))).collect();
        let constraints = (0..n - 1)
            .map(|i| {
                Arc::new(DistanceConstraint::new(
                    Variable(i),
                    Variable(i + 1),
                    DistanceRelation::Equal,
                    1,
                    0,
                    Arc::clone(&costs),
                )) as Arc<dyn Constraint>
            })
            .collect();
        CspProblem::new(domains, constraints, costs)
    }

    #[test]
    fn edges_follow_the_constraint_scopes() {
        let graph = PrimalGraph::of_problem(&chain_problem(3));
        assert_eq!(vec![Variable(1)], graph.neighbours(Variable(0)).collect::<Vec<_>>());
        assert_eq!(
            vec![Variable(0), Variable(2)],
            graph.neighbours(Variable(1)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn ordering_is_a_permutation() {
        let graph = PrimalGraph::of_problem(&chain_problem(5));
        let mut ordering = graph.min_induced_width_ordering();
        assert_eq!(5, ordering.len());
        ordering.sort();
        ordering.dedup();
        assert_eq!(5, ordering.len());
    }

    #[test]
    fn star_eliminates_the_leaves_first() {
        let costs = Arc::new(CostModel::default());
        let domains = (0..4).map(|i| (Variable(i), Domain::range(0, 1))).collect();
        let constraints = (1..4)
            .map(|i| {
                Arc::new(DistanceConstraint::new(
                    Variable(0),
                    Variable(i),
                    DistanceRelation::Equal,
                    1,
                    0,
                    Arc::clone(&costs),
                )) as Arc<dyn Constraint>
            })
            .collect();
        let problem = CspProblem::new(domains, constraints, costs);
        let graph = PrimalGraph::of_problem(&problem);
        // Leaves are picked first (in id order) and land at the back; the hub
        // comes out first.
        assert_eq!(
            vec![Variable(0), Variable(3), Variable(2), Variable(1)],
            graph.min_induced_width_ordering()
        );
    }

    #[test]
    fn cycle_elimination_adds_fill_in_edges() {
        let costs = Arc::new(CostModel::default());
        let domains = (0..4).map(|i| (Variable(i), Domain::range(0, 1))).collect();
        let constraints = (0..4)
            .map(|i| {
                Arc::new(DistanceConstraint::new(
                    Variable(i),
                    Variable((i + 1) % 4),
                    DistanceRelation::Equal,
                    1,
                    0,
                    Arc::clone(&costs),
                )) as Arc<dyn Constraint>
            })
            .collect();
        let problem = CspProblem::new(domains, constraints, costs);
        let graph = PrimalGraph::of_problem(&problem);
        // All degrees are 2; vertex 0 goes first, the fill-in edge {1, 3}
        // turns the rest into a triangle which is peeled in id order.
        assert_eq!(
            vec![Variable(3), Variable(2), Variable(1), Variable(0)],
            graph.min_induced_width_ordering()
        );
    }
}
