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

//! This module defines the "contract" of what it means to be a factor of a
//! weighted constraint satisfaction problem. Every relation manipulated by
//! the library -- the hard-wired kinds shipped in the `implementation` module
//! as well as any user supplied one -- goes through this one trait.

use std::collections::BTreeMap;

use crate::{Assignment, Domains, Scope, Value, Variable};

/// A factor over a subset (the *scope*) of the problem variables. The product
/// of all the factor evaluations on a full assignment is the unnormalized
/// probability mass of that assignment.
///
/// A constraint is either *hard* (it must be satisfied; unsupported values
/// are pruned away during propagation) or *soft* (it merely weighs the
/// assignments; it never prunes anything and must evaluate to a strictly
/// positive value so that the product stays samplable).
pub trait Constraint {
    /// Evaluates the factor on the given assignment. The assignment must bind
    /// at least every variable of the constraint scope. The returned weight is
    /// non negative; it is zero only for a violated hard constraint.
    fn evaluate(&self, assignment: &Assignment) -> f64;
    /// The set of variables this constraint bears on. This set is stable over
    /// the whole life of the constraint.
    fn scope(&self) -> &Scope;
    /// Tells whether the constraint is soft (weighing only) or hard
    /// (mandatory).
    fn is_soft(&self) -> bool;
    /// Checks whether assigning `value` to `variable` can be extended into an
    /// assignment of the whole constraint scope that satisfies the
    /// constraint, given the current `domains` and the values already pinned
    /// by the `evidence`. Soft constraints always report a support.
    fn has_support(
        &self,
        variable: Variable,
        value: Value,
        domains: &Domains,
        evidence: &Assignment,
    ) -> bool;

    /// Computes, for each variable of the scope, the probability mass that
    /// every one of its domain values gathers when the constraint is
    /// enumerated exhaustively over the current domains. This is the raw
    /// material from which per-variable interval tables are derived; the
    /// default implementation fits every constraint since scopes are low
    /// arity.
    fn value_scores(&self, domains: &Domains) -> ValueScores {
        let scope = self.scope().iter().copied().collect::<Vec<Variable>>();
        let mut scores = ValueScores {
            per_variable: scope.iter().map(|v| (*v, BTreeMap::new())).collect(),
            total: 0.0,
        };
        let mut assignment = Assignment::new();
        enumerate_scores(self, &scope, 0, domains, &mut assignment, &mut scores);
        scores
    }
}

/// The outcome of the exhaustive enumeration of one constraint: for each
/// scope variable, the probability mass gathered by each of its values, along
/// with the total mass of the enumeration.
#[derive(Debug, Clone)]
pub struct ValueScores {
    pub per_variable: BTreeMap<Variable, BTreeMap<Value, f64>>,
    pub total: f64,
}

fn enumerate_scores<C: Constraint + ?Sized>(
    constraint: &C,
    scope: &[Variable],
    depth: usize,
    domains: &Domains,
    assignment: &mut Assignment,
    out: &mut ValueScores,
) {
    if depth == scope.len() {
        let weight = constraint.evaluate(assignment);
        out.total += weight;
        for variable in scope {
            let table = out.per_variable.get_mut(variable).unwrap();
            *table.entry(assignment[variable]).or_insert(0.0) += weight;
        }
    } else {
        let variable = scope[depth];
        let values = domains[&variable].iter().collect::<Vec<Value>>();
        for value in values {
            assignment.insert(variable, value);
            enumerate_scores(constraint, scope, depth + 1, domains, assignment, out);
        }
        assignment.remove(&variable);
    }
}
