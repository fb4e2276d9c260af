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

//! This module provides the unary preference constraint: a variable should
//! keep its preassigned value, and moving it away costs a mobility penalty.

use std::sync::Arc;

use crate::{Assignment, Constraint, CostModel, Domains, Scope, Value, Variable};

/// A unary relation `x == preferred`. With weight zero the variable is pinned
/// hard onto its preferred value; otherwise the weight indexes the mobility
/// cost table of the shared [`CostModel`].
#[derive(Debug, Clone)]
pub struct PreferenceConstraint {
    scope: Scope,
    variable: Variable,
    preferred: Value,
    weight: usize,
    costs: Arc<CostModel>,
}

impl PreferenceConstraint {
    pub fn new(variable: Variable, preferred: Value, weight: usize, costs: Arc<CostModel>) -> Self {
        Self {
            scope: Scope::from_iter([variable]),
            variable,
            preferred,
            weight,
            costs,
        }
    }
}

impl Constraint for PreferenceConstraint {
    fn evaluate(&self, assignment: &Assignment) -> f64 {
        let satisfied = assignment[&self.variable] == self.preferred;
        if self.weight == 0 {
            if satisfied {
                1.0
            } else {
                self.costs.epsilon()
            }
        } else {
            self.costs.mobility_factor(self.weight, satisfied)
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
        _domains: &Domains,
        evidence: &Assignment,
    ) -> bool {
        if self.is_soft() {
            return true;
        }
        debug_assert!(variable == self.variable);
        match evidence.get(&self.variable) {
            Some(pinned) => *pinned == value,
            None => value == self.preferred,
        }
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_preference {
    use std::sync::Arc;

    use crate::*;

    #[test]
    fn soft_preference_weighs_the_preferred_value() {
        let costs = Arc::new(
            CostModelBuilder::default()
                .mobility_costs(vec![1.0, 1.5, 2.0])
                .exp_root(2.0)
                .build()
                .unwrap(),
        );
        let constraint = PreferenceConstraint::new(Variable(0), 1, 3, costs);
        assert!(constraint.is_soft());

        let preferred = Assignment::from_iter([(Variable(0), 1)]);
        let other = Assignment::from_iter([(Variable(0), 2)]);
        assert!((constraint.evaluate(&preferred) - 4.0).abs() < 1e-9);
        assert!((constraint.evaluate(&other) - 1.0).abs() < 1e-9);
        assert!(constraint.has_support(Variable(0), 2, &Domains::new(), &Assignment::new()));
    }

    #[test]
    fn hard_preference_only_supports_the_preferred_value() {
        let constraint =
            PreferenceConstraint::new(Variable(0), 1, 0, Arc::new(CostModel::default()));
        let domains = Domains::new();
        let none = Assignment::new();
        assert!(constraint.has_support(Variable(0), 1, &domains, &none));
        assert!(!constraint.has_support(Variable(0), 0, &domains, &none));

        let pinned = Assignment::from_iter([(Variable(0), 0)]);
        assert!(constraint.has_support(Variable(0), 0, &domains, &pinned));
        assert!(!constraint.has_support(Variable(0), 1, &domains, &pinned));
    }
}
