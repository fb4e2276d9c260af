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

//! This module provides the constraint kinds of the interval-labeling
//! workloads: a separation between two variables matching a third one, plain
//! disequality, two separations required to differ, and pinning a variable to
//! a constant. All of them follow the same satisfied-or-exponential weighing
//! pattern as the binary difference relations.

use std::sync::Arc;

use crate::{Assignment, Constraint, CostModel, Domains, Scope, Value, Variable};

fn weigh(costs: &CostModel, weight: usize, satisfied: bool) -> f64 {
    if weight == 0 {
        if satisfied {
            1.0
        } else {
            costs.epsilon()
        }
    } else {
        costs.separation_factor(satisfied)
    }
}

// ----------------------------------------------------------------------------
// --- SEPARATION EQUALS ------------------------------------------------------
// ----------------------------------------------------------------------------
/// The relation `|x - y| == s`: the separation between two variables is
/// itself the value of a third variable.
#[derive(Debug, Clone)]
pub struct SeparationEqualsConstraint {
    scope: Scope,
    x: Variable,
    y: Variable,
    separation: Variable,
    weight: usize,
    costs: Arc<CostModel>,
}

impl SeparationEqualsConstraint {
    pub fn new(
        x: Variable,
        y: Variable,
        separation: Variable,
        weight: usize,
        costs: Arc<CostModel>,
    ) -> Self {
        Self {
            scope: Scope::from_iter([x, y, separation]),
            x,
            y,
            separation,
            weight,
            costs,
        }
    }
}

impl Constraint for SeparationEqualsConstraint {
    fn evaluate(&self, assignment: &Assignment) -> f64 {
        let satisfied =
            (assignment[&self.x] - assignment[&self.y]).abs() == assignment[&self.separation];
        weigh(&self.costs, self.weight, satisfied)
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
        _evidence: &Assignment,
    ) -> bool {
        if self.is_soft() {
            return true;
        }
        if variable == self.separation {
            // Any two end values at distance `value` from one another will do.
            let dx = &domains[&self.x];
            let dy = &domains[&self.y];
            dx.iter().any(|x| dy.contains(x + value) || dy.contains(x - value))
        } else {
            let other = if variable == self.x { self.y } else { self.x };
            let dother = &domains[&other];
            let dsep = &domains[&self.separation];
            dother.iter().any(|y| dsep.contains((value - y).abs()))
        }
    }
}

// ----------------------------------------------------------------------------
// --- NOT EQUAL --------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The plain disequality `x != y`.
#[derive(Debug, Clone)]
pub struct NotEqualConstraint {
    scope: Scope,
    x: Variable,
    y: Variable,
    weight: usize,
    costs: Arc<CostModel>,
}

impl NotEqualConstraint {
    pub fn new(x: Variable, y: Variable, weight: usize, costs: Arc<CostModel>) -> Self {
        Self {
            scope: Scope::from_iter([x, y]),
            x,
            y,
            weight,
            costs,
        }
    }
}

impl Constraint for NotEqualConstraint {
    fn evaluate(&self, assignment: &Assignment) -> f64 {
        let satisfied = assignment[&self.x] != assignment[&self.y];
        weigh(&self.costs, self.weight, satisfied)
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
        _evidence: &Assignment,
    ) -> bool {
        if self.is_soft() {
            return true;
        }
        let other = if variable == self.x { self.y } else { self.x };
        let domain = &domains[&other];
        // Support unless the other end is forced onto the very same value.
        domain.len() > 1 || (domain.len() == 1 && !domain.contains(value))
    }
}

// ----------------------------------------------------------------------------
// --- SEPARATIONS DIFFER -----------------------------------------------------
// ----------------------------------------------------------------------------
/// The relation `|x1 - x2| != |x3 - x4|`. This kind is only ever used as a
/// soft diversification pressure, so it never prunes any value.
#[derive(Debug, Clone)]
pub struct SeparationsDifferConstraint {
    scope: Scope,
    x1: Variable,
    x2: Variable,
    x3: Variable,
    x4: Variable,
    weight: usize,
    costs: Arc<CostModel>,
}

impl SeparationsDifferConstraint {
    pub fn new(
        x1: Variable,
        x2: Variable,
        x3: Variable,
        x4: Variable,
        weight: usize,
        costs: Arc<CostModel>,
    ) -> Self {
        Self {
            scope: Scope::from_iter([x1, x2, x3, x4]),
            x1,
            x2,
            x3,
            x4,
            weight,
            costs,
        }
    }
}

impl Constraint for SeparationsDifferConstraint {
    fn evaluate(&self, assignment: &Assignment) -> f64 {
        let satisfied = (assignment[&self.x1] - assignment[&self.x2]).abs()
            != (assignment[&self.x3] - assignment[&self.x4]).abs();
        weigh(&self.costs, self.weight, satisfied)
    }

    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn is_soft(&self) -> bool {
        true
    }

    fn has_support(
        &self,
        _variable: Variable,
        _value: Value,
        _domains: &Domains,
        _evidence: &Assignment,
    ) -> bool {
        true
    }
}

// ----------------------------------------------------------------------------
// --- FIXED VALUE ------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The relation `x == constant`.
#[derive(Debug, Clone)]
pub struct FixedValueConstraint {
    scope: Scope,
    variable: Variable,
    target: Value,
    weight: usize,
    costs: Arc<CostModel>,
}

impl FixedValueConstraint {
    pub fn new(variable: Variable, target: Value, weight: usize, costs: Arc<CostModel>) -> Self {
        Self {
            scope: Scope::from_iter([variable]),
            variable,
            target,
            weight,
            costs,
        }
    }
}

impl Constraint for FixedValueConstraint {
    fn evaluate(&self, assignment: &Assignment) -> f64 {
        let satisfied = assignment[&self.variable] == self.target;
        weigh(&self.costs, self.weight, satisfied)
    }

    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn is_soft(&self) -> bool {
        self.weight > 0
    }

    fn has_support(
        &self,
        _variable: Variable,
        value: Value,
        _domains: &Domains,
        _evidence: &Assignment,
    ) -> bool {
        self.is_soft() || value == self.target
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_separation {
    use std::sync::Arc;

    use crate::*;

    fn costs() -> Arc<CostModel> {
        Arc::new(CostModel::default())
    }

    #[test]
    fn separation_equals_checks_the_third_variable() {
        let constraint = SeparationEqualsConstraint::new(
            Variable(0),
            Variable(1),
            Variable(2),
            0,
            costs(),
        );
        let sat = Assignment::from_iter([(Variable(0), 2), (Variable(1), 7), (Variable(2), 5)]);
        let unsat = Assignment::from_iter([(Variable(0), 2), (Variable(1), 7), (Variable(2), 4)]);
        assert_eq!(1.0, constraint.evaluate(&sat));
        assert_eq!(1.0e-25, constraint.evaluate(&unsat));

        let mut domains = Domains::new();
        domains.insert(Variable(0), Domain::from_iter([0, 4]));
        domains.insert(Variable(1), Domain::from_iter([1, 9]));
        domains.insert(Variable(2), Domain::from_iter([3, 5]));
        let none = Assignment::new();
        // 4 and 9 are 5 apart.
        assert!(constraint.has_support(Variable(2), 5, &domains, &none));
        assert!(!constraint.has_support(Variable(2), 2, &domains, &none));
        // |4 - 1| = 3 is in the separation domain.
        assert!(constraint.has_support(Variable(0), 4, &domains, &none));
        assert!(!constraint.has_support(Variable(0), 2, &domains, &none));
    }

    #[test]
    fn not_equal_needs_an_alternative_in_the_other_domain() {
        let constraint = NotEqualConstraint::new(Variable(0), Variable(1), 0, costs());
        let mut domains = Domains::new();
        domains.insert(Variable(0), Domain::from_iter([0, 1]));
        domains.insert(Variable(1), Domain::from_iter([1]));
        let none = Assignment::new();
        assert!(constraint.has_support(Variable(0), 0, &domains, &none));
        assert!(!constraint.has_support(Variable(0), 1, &domains, &none));
    }

    #[test]
    fn separations_differ_is_always_soft() {
        let constraint = SeparationsDifferConstraint::new(
            Variable(0),
            Variable(1),
            Variable(2),
            Variable(3),
            0,
            costs(),
        );
        assert!(constraint.is_soft());
        let unsat = Assignment::from_iter([
            (Variable(0), 0),
            (Variable(1), 3),
            (Variable(2), 10),
            (Variable(3), 7),
        ]);
        assert_eq!(1.0e-25, constraint.evaluate(&unsat));
        assert!(constraint.has_support(Variable(0), 0, &Domains::new(), &Assignment::new()));
    }

    #[test]
    fn fixed_value_pins_the_variable() {
        let constraint = FixedValueConstraint::new(Variable(0), 3, 0, costs());
        let none = Assignment::new();
        assert!(constraint.has_support(Variable(0), 3, &Domains::new(), &none));
        assert!(!constraint.has_support(Variable(0), 1, &Domains::new(), &none));
    }
}
