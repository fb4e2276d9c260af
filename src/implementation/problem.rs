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

//! This module provides the container tying a weighted CSP together: the
//! variables with their domains, the constraints, and the services built on
//! top of them -- full assignment evaluation, generalized arc consistency
//! with reversible domain edits, and the schematic mini-bucket partitioning
//! feeding the join-graph construction.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use fxhash::FxHashMap;

use crate::{
    Assignment, Constraint, CostModel, Domain, Domains, MiniBuckets, Value, Variable,
};

// ----------------------------------------------------------------------------
// --- DOMAIN JOURNAL ---------------------------------------------------------
// ----------------------------------------------------------------------------
/// The journal of the values pruned from the domains by one propagation (or
/// one sampler invocation). The journal -- not the domains -- owns the
/// "pending removal" state: feeding it back to
/// [`CspProblem::restore_domains`] undoes exactly the recorded removals, so
/// nested propagations compose by stacking journals.
#[derive(Debug, Clone, Default)]
pub struct DomainJournal {
    removed: BTreeMap<Variable, Domain>,
}

impl DomainJournal {
    pub fn new() -> Self {
        Self::default()
    }
    /// Records the removal of `value` from the domain of `variable`.
    pub fn record(&mut self, variable: Variable, value: Value) {
        self.removed.entry(variable).or_default().insert(value);
    }
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
    /// Iterates the removals, per variable.
    pub fn entries(&self) -> impl Iterator<Item = (Variable, &Domain)> {
        self.removed.iter().map(|(v, d)| (*v, d))
    }
}

// ----------------------------------------------------------------------------
// --- CSP PROBLEM ------------------------------------------------------------
// ----------------------------------------------------------------------------
/// A weighted constraint satisfaction problem: the variables with their
/// (mutable) domains, the constraints, and an index from each variable to the
/// constraints mentioning it. The problem exclusively owns its domains; the
/// constraints are shared with the join-graph nodes that evaluate them.
pub struct CspProblem {
    domains: Domains,
    constraints: Vec<Arc<dyn Constraint>>,
    by_variable: FxHashMap<Variable, Vec<usize>>,
    costs: Arc<CostModel>,
}

impl CspProblem {
    pub fn new(
        domains: Domains,
        constraints: Vec<Arc<dyn Constraint>>,
        costs: Arc<CostModel>,
    ) -> Self {
        let mut by_variable: FxHashMap<Variable, Vec<usize>> = FxHashMap::default();
        by_variable.extend(domains.keys().map(|v| (*v, vec![])));
        for (index, constraint) in constraints.iter().enumerate() {
            for variable in constraint.scope() {
                by_variable.entry(*variable).or_default().push(index);
            }
        }
        Self {
            domains,
            constraints,
            by_variable,
            costs,
        }
    }

    pub fn nb_variables(&self) -> usize {
        self.domains.len()
    }
    /// Iterates the problem variables in their canonical (ascending) order:
    /// the order in which the samplers assign them.
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.domains.keys().copied()
    }
    pub fn domains(&self) -> &Domains {
        &self.domains
    }
    pub fn domain(&self, variable: Variable) -> &Domain {
        &self.domains[&variable]
    }
    pub fn domain_mut(&mut self, variable: Variable) -> &mut Domain {
        self.domains.get_mut(&variable).expect("unknown variable")
    }
    pub fn constraints(&self) -> &[Arc<dyn Constraint>] {
        &self.constraints
    }
    pub fn cost_model(&self) -> &Arc<CostModel> {
        &self.costs
    }

    /// Evaluates a full assignment: the product of every constraint
    /// evaluation.
    pub fn eval(&self, assignment: &Assignment) -> f64 {
        self.constraints
            .iter()
            .map(|c| c.evaluate(assignment))
            .product()
    }

    /// Enforces generalized arc consistency on the whole problem, given the
    /// evidence. Every pruned value is recorded in the journal; the method
    /// reports false iff some domain was emptied (in which case the caller
    /// must still restore the journal to roll the domains back).
    pub fn propagate(&mut self, evidence: &Assignment, journal: &mut DomainJournal) -> bool {
        let mut queue = BTreeSet::new();
        for (index, constraint) in self.constraints.iter().enumerate() {
            for variable in constraint.scope() {
                if !evidence.contains_key(variable) {
                    queue.insert((index, *variable));
                }
            }
        }
        self.propagate_queue(evidence, queue, journal)
    }

    /// Incremental flavor of [`propagate`](Self::propagate): only the
    /// constraints mentioning the just-changed variable seed the revision
    /// queue. This is what the samplers call after they pinned one more
    /// variable.
    pub fn propagate_from(
        &mut self,
        evidence: &Assignment,
        journal: &mut DomainJournal,
        changed: Variable,
    ) -> bool {
        let mut queue = BTreeSet::new();
        for &index in &self.by_variable[&changed] {
            for variable in self.constraints[index].scope() {
                if *variable != changed && !evidence.contains_key(variable) {
                    queue.insert((index, *variable));
                }
            }
        }
        self.propagate_queue(evidence, queue, journal)
    }

    fn propagate_queue(
        &mut self,
        evidence: &Assignment,
        mut queue: BTreeSet<(usize, Variable)>,
        journal: &mut DomainJournal,
    ) -> bool {
        while let Some(entry) = queue.iter().next().copied() {
            queue.remove(&entry);
            let (index, variable) = entry;
            let constraint = Arc::clone(&self.constraints[index]);

            let values = self.domains[&variable].iter().collect::<Vec<Value>>();
            let mut changed = false;
            for value in values {
                if !constraint.has_support(variable, value, &self.domains, evidence) {
                    self.domain_mut(variable).remove(value);
                    journal.record(variable, value);
                    changed = true;
                }
            }

            if self.domains[&variable].is_empty() {
                return false;
            }
            if changed {
                for &other in &self.by_variable[&variable] {
                    for revised in self.constraints[other].scope() {
                        if *revised != variable && !evidence.contains_key(revised) {
                            queue.insert((other, *revised));
                        }
                    }
                }
            }
        }
        true
    }

    /// Adds the journaled values back into the domains. This must run on
    /// every exit path -- success or failure -- so that propagation effects
    /// stay strictly scoped to the call that triggered them.
    pub fn restore_domains(&mut self, journal: &DomainJournal) {
        for (variable, removed) in journal.entries() {
            self.domain_mut(variable).restore(removed);
        }
    }

    /// Partitions the constraint scopes into mini-buckets of at most
    /// `max_bucket_size` variables along the given elimination ordering.
    pub fn schematic_mini_buckets(
        &self,
        ordering: &[Variable],
        max_bucket_size: usize,
    ) -> MiniBuckets {
        MiniBuckets::build(
            self.constraints.iter().map(|c| c.scope().clone()),
            ordering,
            max_bucket_size,
        )
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
