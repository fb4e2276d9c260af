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

//! This module provides the binary difference constraint of the
//! frequency-assignment benchmarks: the absolute difference between two
//! variables is required to compare in a given way against a target gap.

use std::sync::Arc;

use crate::{Assignment, Constraint, CostModel, Domains, Scope, Value, Variable};

/// How the absolute difference between the two variables must compare against
/// the target gap.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DistanceRelation {
    Equal,
    Less,
    Greater,
}

impl DistanceRelation {
    fn holds(self, distance: Value, target: Value) -> bool {
        match self {
            DistanceRelation::Equal => distance == target,
            DistanceRelation::Less => distance < target,
            DistanceRelation::Greater => distance > target,
        }
    }
}

/// A binary interference relation `|x - y| {<,=,>} target`. With weight zero
/// the relation is hard; otherwise the weight indexes the interference cost
/// table of the shared [`CostModel`].
#[derive(Debug, Clone)]
pub struct DistanceConstraint {
    scope: Scope,
    x: Variable,
    y: Variable,
    relation: DistanceRelation,
    target: Value,
    weight: usize,
    costs: Arc<CostModel>,
}

impl DistanceConstraint {
    pub fn new(
        x: Variable,
        y: Variable,
        relation: DistanceRelation,
        target: Value,
        weight: usize,
        costs: Arc<CostModel>,
    ) -> Self {
        Self {
            scope: Scope::from_iter([x, y]),
            x,
            y,
            relation,
            target,
            weight,
            costs,
        }
    }

    fn satisfied_by(&self, assignment: &Assignment) -> bool {
        let distance = (assignment[&self.x] - assignment[&self.y]).abs();
        self.relation.holds(distance, self.target)
    }
}

impl Constraint for DistanceConstraint {
    fn evaluate(&self, assignment: &Assignment) -> f64 {
        let satisfied = self.satisfied_by(assignment);
        if self.weight == 0 {
            if satisfied {
                1.0
            } else {
                self.costs.epsilon()
            }
        } else {
            self.costs.interference_factor(self.weight, satisfied)
        }
    }

    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn is_soft(&self) -> bool {
        self.weight > 0
    }

    fn has_support(
        &self,
        variable: Variable,
        value: Value,
        domains: &Domains,
        evidence: &Assignment,
    ) -> bool {
        if self.is_soft() {
            return true;
        }
        debug_assert!(variable == self.x || variable == self.y);
        let other = if variable == self.x { self.y } else { self.x };

        if let Some(pinned) = evidence.get(&variable) {
            return *pinned == value;
        }
        if let Some(pinned) = evidence.get(&other) {
            return self.relation.holds((value - pinned).abs(), self.target);
        }

        // Neither end is pinned: look for a witness in the other variable's
        // domain. The sorted-set bound lookups keep this sublinear.
        let domain = &domains[&other];
        match self.relation {
            DistanceRelation::Equal => {
                domain.contains(value - self.target) || domain.contains(value + self.target)
            }
            DistanceRelation::Greater => {
                domain.min_at_least(value + self.target + 1).is_some()
                    || domain.max_below(value - self.target).is_some()
            }
            DistanceRelation::Less => {
                domain.any_strictly_between(value - self.target, value + self.target)
            }
        }
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_distance {
    use std::sync::Arc;

    use crate::*;

    fn hard_eq(target: Value) -> DistanceConstraint {
        DistanceConstraint::new(
            Variable(0),
            Variable(1),
            DistanceRelation::Equal,
            target,
            0,
            Arc::new(CostModel::default()),
        )
    }

    #[test]
    fn hard_relation_evaluates_to_one_or_epsilon() {
        let constraint = hard_eq(1);
        let sat = Assignment::from_iter([(Variable(0), 0), (Variable(1), 1)]);
        let unsat = Assignment::from_iter([(Variable(0), 0), (Variable(1), 0)]);
        assert_eq!(1.0, constraint.evaluate(&sat));
        assert_eq!(1.0e-25, constraint.evaluate(&unsat));
        assert!(!constraint.is_soft());
    }

    #[test]
    fn weighted_relation_is_soft() {
        let costs = Arc::new(
            CostModelBuilder::default()
                .interference_costs(vec![2.0])
                .exp_root(2.0)
                .build()
                .unwrap(),
        );
        let constraint = DistanceConstraint::new(
            Variable(0),
            Variable(1),
            DistanceRelation::Greater,
            2,
            1,
            costs,
        );
        assert!(constraint.is_soft());
        let sat = Assignment::from_iter([(Variable(0), 0), (Variable(1), 5)]);
        let unsat = Assignment::from_iter([(Variable(0), 0), (Variable(1), 1)]);
        assert!((constraint.evaluate(&sat) - 4.0).abs() < 1e-9);
        assert!((constraint.evaluate(&unsat) - 1.0).abs() < 1e-9);
        // Soft relations never prune anything.
        let domains = Domains::new();
        assert!(constraint.has_support(Variable(0), 0, &domains, &Assignment::new()));
    }

    #[test]
    fn support_against_pinned_other_end() {
        let constraint = hard_eq(2);
        let evidence = Assignment::from_iter([(Variable(1), 5)]);
        let domains = Domains::new();
        assert!(constraint.has_support(Variable(0), 3, &domains, &evidence));
        assert!(constraint.has_support(Variable(0), 7, &domains, &evidence));
        assert!(!constraint.has_support(Variable(0), 5, &domains, &evidence));
    }

    #[test]
    fn support_scans_the_other_domain() {
        let mut domains = Domains::new();
        domains.insert(Variable(0), Domain::range(0, 10));
        domains.insert(Variable(1), Domain::from_iter([4, 8]));
        let none = Assignment::new();

        let eq = hard_eq(2);
        assert!(eq.has_support(Variable(0), 6, &domains, &none));
        assert!(!eq.has_support(Variable(0), 1, &domains, &none));

        let lt = DistanceConstraint::new(
            Variable(0),
            Variable(1),
            DistanceRelation::Less,
            2,
            0,
            Arc::new(CostModel::default()),
        );
        assert!(lt.has_support(Variable(0), 5, &domains, &none));
        assert!(!lt.has_support(Variable(0), 1, &domains, &none));

        let gt = DistanceConstraint::new(
            Variable(0),
            Variable(1),
            DistanceRelation::Greater,
            3,
            0,
            Arc::new(CostModel::default()),
        );
        assert!(gt.has_support(Variable(0), 0, &domains, &none));
        assert!(!gt.has_support(Variable(0), 6, &domains, &none));
    }
}
