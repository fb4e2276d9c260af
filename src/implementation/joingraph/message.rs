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

//! This module provides the probability tables exchanged between the
//! join-graph nodes. A message lives on one edge separator; once normalized
//! it is immutable and acts as a plain factor over the separator variables,
//! which is why it implements the [`Constraint`] trait.

use std::collections::BTreeMap;

use crate::{Assignment, Constraint, Domains, Scope, Value, Variable};

/// When the previous generation of a message holds a zero where the new one
/// does not, the Kullback-Leibler summand degenerates; this large constant
/// stands in for it so that the pass is simply deemed not converged.
pub const KL_DIVERGENCE_MAX: f64 = 1.0e10;
/// Propagation is considered converged once the graph-wide divergence drops
/// below this threshold.
pub const KL_DIVERGENCE_MIN: f64 = 1.0e-2;

/// A probability table over the visible part of an edge separator (the
/// separator variables that are not pinned by the evidence), keyed by the
/// tuple of their values.
#[derive(Debug, Clone)]
pub struct Message {
    scope: Scope,
    table: BTreeMap<Vec<Value>, f64>,
    total: f64,
    normalized: bool,
}

impl Message {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            table: BTreeMap::new(),
            total: 0.0,
            normalized: false,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
    /// Iterates the table probabilities (mostly useful to check invariants).
    pub fn probabilities(&self) -> impl Iterator<Item = f64> + '_ {
        self.table.values().copied()
    }

    /// Stores the probability attached to one tuple of separator values.
    /// Each tuple is visited exactly once during the enumeration.
    pub fn set_probability(&mut self, key: Vec<Value>, probability: f64) {
        debug_assert!(!self.normalized);
        self.total += probability;
        self.table.insert(key, probability);
    }

    /// Turns the accumulated masses into a probability distribution: every
    /// entry is divided by the total, unless the total mass is zero in which
    /// case the table degrades to the uniform distribution. The message is
    /// immutable afterwards.
    pub fn normalize(&mut self) {
        if self.total > 0.0 {
            for probability in self.table.values_mut() {
                *probability /= self.total;
            }
        } else {
            let uniform = 1.0 / self.table.len().max(1) as f64;
            for probability in self.table.values_mut() {
                *probability = uniform;
            }
        }
        self.total = 1.0;
        self.normalized = true;
    }

    /// Looks the message up as a factor: the key is read off the assignment,
    /// value combinations outside the enumerated table carry no mass.
    pub fn evaluate_assignment(&self, assignment: &Assignment) -> f64 {
        debug_assert!(self.normalized);
        let key = self
            .scope
            .iter()
            .map(|v| assignment[v])
            .collect::<Vec<Value>>();
        self.table.get(&key).copied().unwrap_or(0.0)
    }

    /// The Kullback-Leibler divergence `sum p * ln(p / q)` between this
    /// message and its previous generation, the two tables being paired in
    /// key order. A zero in the previous generation contributes
    /// [`KL_DIVERGENCE_MAX`].
    pub fn kl_divergence(&self, previous: &Message) -> f64 {
        let mut divergence = 0.0;
        for ((_, p), (_, q)) in self.table.iter().zip(previous.table.iter()) {
            if *q == 0.0 {
                divergence += KL_DIVERGENCE_MAX;
            } else if *p > 0.0 {
                divergence += p * (p / q).ln();
            }
        }
        divergence
    }
}

impl Constraint for Message {
    fn evaluate(&self, assignment: &Assignment) -> f64 {
        self.evaluate_assignment(assignment)
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

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
