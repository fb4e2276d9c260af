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

//! This module provides the n-ary tabular constraint of the standard WCSP
//! benchmarks: every tuple of the scope carries a weight (a default one,
//! overridden by an exception table), and any weight reaching the hard
//! threshold forbids the tuple outright.

use std::sync::Arc;

use fxhash::FxHashMap;

use crate::{Assignment, Constraint, CostModel, Domains, Scope, Value, Variable};

/// An n-ary weighted tabular relation. The weight of a tuple is looked up in
/// the exception table and falls back onto the default weight. A tuple whose
/// weight reaches the hard threshold evaluates to zero; every other tuple
/// earns `exp(ln 2 * exp_k * (-weight))`.
#[derive(Debug, Clone)]
pub struct TableConstraint {
    scope: Scope,
    /// The scope variables in ascending order: the order in which tuple keys
    /// are laid out.
    order: Vec<Variable>,
    default_weight: u64,
    hard_weight: u64,
    tuples: FxHashMap<Vec<Value>, u64>,
    max_weight: u64,
    costs: Arc<CostModel>,
}

impl TableConstraint {
    pub fn new(
        scope: impl IntoIterator<Item = Variable>,
        default_weight: u64,
        hard_weight: u64,
        costs: Arc<CostModel>,
    ) -> Self {
        let scope = Scope::from_iter(scope);
        let order = scope.iter().copied().collect();
        Self {
            scope,
            order,
            default_weight,
            hard_weight,
            tuples: FxHashMap::default(),
            max_weight: default_weight,
            costs,
        }
    }

    /// Registers an exception tuple with its own weight. The tuple values
    /// must be laid out in ascending scope-variable order.
    pub fn add_tuple(&mut self, tuple: Vec<Value>, weight: u64) {
        debug_assert_eq!(tuple.len(), self.order.len());
        self.max_weight = self.max_weight.max(weight);
        self.tuples.insert(tuple, weight);
    }

    fn weight_of(&self, assignment: &Assignment) -> u64 {
        let key = self
            .order
            .iter()
            .map(|v| assignment[v])
            .collect::<Vec<Value>>();
        self.tuples
            .get(&key)
            .copied()
            .unwrap_or(self.default_weight)
    }

    fn search_support(
        &self,
        assignment: &mut Assignment,
        rest: &[Variable],
        domains: &Domains,
    ) -> bool {
        match rest.split_first() {
            None => self.weight_of(assignment) < self.hard_weight,
            Some((variable, rest)) => {
                let values = domains[variable].iter().collect::<Vec<Value>>();
                let mut found = false;
                for value in values {
                    assignment.insert(*variable, value);
                    if self.search_support(assignment, rest, domains) {
                        found = true;
                        break;
                    }
                }
                assignment.remove(variable);
                found
            }
        }
    }
}

impl Constraint for TableConstraint {
    fn evaluate(&self, assignment: &Assignment) -> f64 {
        let weight = self.weight_of(assignment);
        if weight >= self.hard_weight {
            0.0
        } else {
            self.costs.tabular_factor(weight)
        }
    }

    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn is_soft(&self) -> bool {
        self.max_weight < self.hard_weight
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
        if let Some(pinned) = evidence.get(&variable) {
            return *pinned == value;
        }

        let mut assignment = evidence.clone();
        assignment.insert(variable, value);
        let unassigned = self
            .order
            .iter()
            .copied()
            .filter(|v| !assignment.contains_key(v))
            .collect::<Vec<Variable>>();
        self.search_support(&mut assignment, &unassigned, domains)
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_table {
    use std::sync::Arc;

    use crate::*;

    fn vars3() -> [Variable; 3] {
        [Variable(0), Variable(1), Variable(2)]
    }

    fn forbidding_table() -> TableConstraint {
        let costs = Arc::new(CostModelBuilder::default().exp_k(1.0).build().unwrap());
        let mut table = TableConstraint::new(vars3(), 0, 10, costs);
        table.add_tuple(vec![0, 0, 0], 10);
        table.add_tuple(vec![1, 1, 1], 1);
        table
    }

    fn assign(values: [Value; 3]) -> Assignment {
        vars3().iter().copied().zip(values).collect()
    }

    #[test]
    fn forbidden_tuple_evaluates_to_zero() {
        let table = forbidding_table();
        assert_eq!(0.0, table.evaluate(&assign([0, 0, 0])));
        assert!((table.evaluate(&assign([1, 1, 1])) - 0.5).abs() < 1e-9);
        assert!((table.evaluate(&assign([2, 0, 1])) - 1.0).abs() < 1e-9);
        assert!(!table.is_soft());
    }

    #[test]
    fn softness_depends_on_the_largest_observed_weight() {
        let costs = Arc::new(CostModel::default());
        let mut table = TableConstraint::new(vars3(), 0, 10, costs);
        table.add_tuple(vec![0, 0, 0], 9);
        assert!(table.is_soft());
        table.add_tuple(vec![1, 0, 0], 12);
        assert!(!table.is_soft());
    }

    #[test]
    fn support_searches_completions_under_the_threshold() {
        let table = forbidding_table();
        let mut domains = Domains::new();
        for v in vars3() {
            domains.insert(v, Domain::from_iter([0]));
        }
        // The only completion of x0 = 0 is (0, 0, 0) which is forbidden.
        assert!(!table.has_support(Variable(0), 0, &domains, &Assignment::new()));

        domains.insert(Variable(2), Domain::from_iter([0, 1]));
        // Now (0, 0, 1) provides a support.
        assert!(table.has_support(Variable(0), 0, &domains, &Assignment::new()));

        // Evidence consistent search: pinning x2 to 0 removes it again.
        let pinned = Assignment::from_iter([(Variable(2), 0)]);
        assert!(!table.has_support(Variable(0), 0, &domains, &pinned));
    }
}
