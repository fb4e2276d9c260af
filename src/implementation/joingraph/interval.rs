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

//! This module provides the interval-valued flavor of the join graph. Where
//! the plain flavor enumerates every separator value, this one summarizes
//! each variable by a bounded number of value ranges: messages are keyed by
//! tuples of intervals, and the factor mass of a range is estimated from a
//! handful of representative values drawn uniformly from the domain slice it
//! covers. This is what keeps large domains tractable.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use super::GraphSkeleton;
use crate::{
    adjust_intervals_to_domain, assignment_scope, containing_interval, join_intervals,
    merge_intervals, normalize_intervals, uniform_intervals, Assignment, Constraint, CspProblem,
    DomainInterval, Domains, IntervalTable, JoinGraphEdge, NodeId, Scope, Variable,
    KL_DIVERGENCE_MAX, KL_DIVERGENCE_MIN,
};

/// The default bound on the number of ranges summarizing one variable.
pub const DEFAULT_MAX_DOMAIN_INTERVALS: usize = 10;
/// The default number of representative values drawn from each range when a
/// factor mass is estimated.
pub const DEFAULT_MAX_VALUES_FROM_INTERVAL: usize = 2;

// ----------------------------------------------------------------------------
// --- INTERVAL MESSAGE -------------------------------------------------------
// ----------------------------------------------------------------------------
/// A probability table over tuples of separator *intervals*. The message
/// carries the per-variable interval tables it was computed from, so that a
/// downstream evaluation can find which interval an assigned value falls in
/// and spread the interval mass over its current domain population.
#[derive(Debug, Clone)]
pub struct IntervalMessage {
    scope: Scope,
    table: BTreeMap<Vec<DomainInterval>, f64>,
    intervals: BTreeMap<Variable, IntervalTable>,
    total: f64,
    normalized: bool,
}

impl IntervalMessage {
    fn new(scope: Scope, intervals: &BTreeMap<Variable, IntervalTable>) -> Self {
        let intervals = scope
            .iter()
            .map(|v| (*v, intervals[v].clone()))
            .collect::<BTreeMap<Variable, IntervalTable>>();
        Self {
            scope,
            table: BTreeMap::new(),
            intervals,
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
    pub fn probabilities(&self) -> impl Iterator<Item = f64> + '_ {
        self.table.values().copied()
    }

    /// Adds mass to one tuple of intervals. The same tuple is hit several
    /// times over (once per drawn representative), hence the accumulation.
    fn accumulate(&mut self, key: &[DomainInterval], probability: f64) {
        debug_assert!(!self.normalized);
        *self.table.entry(key.to_vec()).or_insert(0.0) += probability;
        self.total += probability;
    }

    fn normalize(&mut self) {
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

    /// Looks the message up as a factor on a concrete assignment: each
    /// separator value is located in its interval table (no interval means no
    /// mass) and the tuple probability is spread uniformly over the current
    /// population of the intervals, hence the division.
    pub fn evaluate_in(&self, assignment: &Assignment, domains: &Domains) -> f64 {
        debug_assert!(self.normalized);
        let mut key = Vec::with_capacity(self.scope.len());
        let mut population = 1.0;
        for variable in &self.scope {
            let value = assignment[variable];
            match containing_interval(&self.intervals[variable], value) {
                None => return 0.0,
                Some(interval) => {
                    let count = domains[variable].count_between(interval.lb, interval.ub);
                    if count == 0 {
                        return 0.0;
                    }
                    population *= count as f64;
                    key.push(interval);
                }
            }
        }
        match self.table.get(&key) {
            Some(probability) => probability / population,
            None => 0.0,
        }
    }

    /// Same pairing-based divergence as the plain messages.
    pub fn kl_divergence(&self, previous: &IntervalMessage) -> f64 {
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

// ----------------------------------------------------------------------------
// --- NODES ------------------------------------------------------------------
// ----------------------------------------------------------------------------
/// One cluster of the interval join graph. On top of the plain cluster
/// state, the node maintains two per-variable interval tables: the base
/// tables derived from the owned constraints, and the working tables which
/// get re-snapped onto the (shrinking) domains as sampling progresses.
pub struct IntervalJoinGraphNode {
    scope: Scope,
    constraints: Vec<Arc<dyn Constraint>>,
    edges: Vec<JoinGraphEdge>,
    incoming: BTreeMap<NodeId, IntervalMessage>,
    previous: BTreeMap<NodeId, IntervalMessage>,
    base_intervals: BTreeMap<Variable, IntervalTable>,
    working_intervals: BTreeMap<Variable, IntervalTable>,
}

impl IntervalJoinGraphNode {
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
    pub fn edges(&self) -> &[JoinGraphEdge] {
        &self.edges
    }
    pub fn incoming_messages(&self) -> impl Iterator<Item = &IntervalMessage> {
        self.incoming.values()
    }
    /// The working interval table of one scope variable.
    pub fn intervals_of(&self, variable: Variable) -> Option<&IntervalTable> {
        self.working_intervals.get(&variable)
    }

    /// Derives the per-variable interval tables from the owned constraints.
    /// A node owning no constraint falls back onto uniform ranges over the
    /// domains. An unsatisfiable hard constraint clears the domains of its
    /// variables outright; a soft constraint with no mass left degrades to
    /// uniform value weights.
    fn init_intervals(&mut self, problem: &mut CspProblem, max_intervals: usize) {
        self.base_intervals.clear();

        for constraint in &self.constraints {
            let tables = derive_constraint_intervals(constraint.as_ref(), problem, max_intervals);
            for (variable, table) in tables {
                match self.base_intervals.get_mut(&variable) {
                    None => {
                        self.base_intervals.insert(variable, table);
                    }
                    Some(existing) => {
                        *existing = merge_intervals(existing, &table);
                    }
                }
            }
        }

        for (variable, table) in self.base_intervals.iter_mut() {
            *table = adjust_intervals_to_domain(
                &join_intervals(&normalize_intervals(table), max_intervals),
                problem.domain(*variable),
            );
        }

        // Scope variables not covered by any owned constraint (a node may
        // exist for a residual scope alone) fall back onto uniform ranges.
        for variable in &self.scope {
            self.base_intervals.entry(*variable).or_insert_with(|| {
                uniform_intervals(problem.domain(*variable), max_intervals)
            });
        }
        self.working_intervals = self.base_intervals.clone();
    }

    /// Re-snaps the working tables onto the current domains.
    fn refresh_intervals(&mut self, problem: &CspProblem, max_intervals: usize) {
        for (variable, table) in self.working_intervals.iter_mut() {
            *table = join_intervals(
                &normalize_intervals(&adjust_intervals_to_domain(table, problem.domain(*variable))),
                max_intervals,
            );
        }
    }

    /// Resets the working tables back to the constraint-derived ones.
    fn restore_intervals(&mut self) {
        self.working_intervals = self.base_intervals.clone();
    }

    fn set_message(&mut self, from: NodeId, message: IntervalMessage) {
        if let Some(replaced) = self.incoming.insert(from, message) {
            self.previous.insert(from, replaced);
        }
    }

    fn eval_assignment(
        &self,
        assignment: &Assignment,
        exclude: Option<NodeId>,
        domains: &Domains,
    ) -> f64 {
        let mut result = 1.0;
        for constraint in &self.constraints {
            result *= constraint.evaluate(assignment);
        }
        for (sender, message) in &self.incoming {
            if Some(*sender) == exclude {
                continue;
            }
            result *= message.evaluate_in(assignment, domains);
        }
        result
    }

    fn kl_divergence(&self) -> Option<f64> {
        if self.incoming.is_empty() || self.previous.is_empty() {
            return None;
        }
        let mut divergence = 0.0;
        for (sender, message) in &self.incoming {
            divergence += message.kl_divergence(self.previous.get(sender)?);
        }
        Some(divergence / self.incoming.len() as f64)
    }

    fn purge_messages(&mut self) {
        self.incoming.clear();
        self.previous.clear();
    }
}

/// Turns the exhaustive per-value scores of one constraint into per-variable
/// interval tables: every positive-mass value becomes a singleton range, the
/// tables are then coalesced down to the interval budget.
fn derive_constraint_intervals(
    constraint: &dyn Constraint,
    problem: &mut CspProblem,
    max_intervals: usize,
) -> BTreeMap<Variable, IntervalTable> {
    let mut scores = constraint.value_scores(problem.domains());
    let scope = constraint.scope().clone();

    if scores.total <= 0.0 && !constraint.is_soft() {
        // The hard constraint cannot be satisfied at all: the problem has no
        // solution and the domains of its variables are emptied accordingly.
        for variable in &scope {
            problem.domain_mut(*variable).clear();
        }
        return scope.iter().map(|v| (*v, IntervalTable::new())).collect();
    }
    if scores.total <= 0.0 {
        scores.total = 1.0;
        for variable in &scope {
            let size = problem.domain(*variable).len().max(1);
            if let Some(table) = scores.per_variable.get_mut(variable) {
                for probability in table.values_mut() {
                    *probability = 1.0 / size as f64;
                }
            }
        }
    }

    let mut result = BTreeMap::new();
    for (variable, values) in &scores.per_variable {
        let mut table = IntervalTable::new();
        for (value, probability) in values {
            if *probability > 0.0 {
                table.insert(DomainInterval::singleton(*value), probability / scores.total);
            }
        }
        result.insert(*variable, join_intervals(&table, max_intervals));
    }
    result
}

// ----------------------------------------------------------------------------
// --- INTERVAL JOIN GRAPH ----------------------------------------------------
// ----------------------------------------------------------------------------
/// The interval-valued join graph: same arena topology as the plain one, but
/// all tables are interval-keyed and the enumeration draws representative
/// values at random instead of walking whole domains.
pub struct IntervalJoinGraph {
    nodes: Vec<IntervalJoinGraphNode>,
    ordering: Vec<NodeId>,
    max_domain_intervals: usize,
    max_values_from_interval: usize,
}

impl IntervalJoinGraph {
    /// Builds the graph and derives the initial interval tables. The problem
    /// is borrowed mutably because deriving the tables of an unsatisfiable
    /// hard constraint clears the domains of its variables.
    pub fn of_problem(
        problem: &mut CspProblem,
        max_bucket_size: usize,
        max_domain_intervals: usize,
        max_values_from_interval: usize,
    ) -> Self {
        let skeleton = GraphSkeleton::of_problem(problem, max_bucket_size);
        let nodes = skeleton
            .clusters
            .into_iter()
            .map(|cluster| IntervalJoinGraphNode {
                scope: cluster.scope,
                constraints: cluster.constraints,
                edges: cluster.edges,
                incoming: BTreeMap::new(),
                previous: BTreeMap::new(),
                base_intervals: BTreeMap::new(),
                working_intervals: BTreeMap::new(),
            })
            .collect();
        let mut graph = Self {
            nodes,
            ordering: skeleton.ordering,
            max_domain_intervals,
            max_values_from_interval,
        };
        graph.init_intervals(problem);
        graph
    }

    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }
    pub fn nodes(&self) -> impl Iterator<Item = &IntervalJoinGraphNode> {
        self.nodes.iter()
    }

    /// (Re)derives every node's interval tables from its constraints.
    pub fn init_intervals(&mut self, problem: &mut CspProblem) {
        for node in self.nodes.iter_mut() {
            node.init_intervals(problem, self.max_domain_intervals);
        }
    }

    /// Re-snaps every node's working tables onto the current domains.
    pub fn adjust_to_domains(&mut self, problem: &CspProblem) {
        for node in self.nodes.iter_mut() {
            node.refresh_intervals(problem, self.max_domain_intervals);
        }
    }

    /// Resets every node's working tables to the constraint-derived ones.
    pub fn restore_intervals(&mut self) {
        for node in self.nodes.iter_mut() {
            node.restore_intervals();
        }
    }

    pub fn purge_messages(&mut self) {
        for node in self.nodes.iter_mut() {
            node.purge_messages();
        }
    }

    /// Runs the iterative propagation, like the plain flavor, and returns the
    /// number of passes performed. Before a node sends along one of its
    /// edges, its working tables are re-snapped onto the current domains so
    /// that every interval of the outgoing message holds at least one live
    /// value.
    pub fn run<R: Rng>(
        &mut self,
        problem: &CspProblem,
        evidence: &Assignment,
        max_iterations: usize,
        rng: &mut R,
    ) -> usize {
        let evidence_scope = assignment_scope(evidence);
        let mut iterations = 0;

        while iterations < max_iterations {
            for position in 0..self.ordering.len() {
                let node_id = self.ordering[position];
                for edge_index in 0..self.nodes[node_id.0].edges.len() {
                    self.nodes[node_id.0].refresh_intervals(problem, self.max_domain_intervals);
                    let message = self.compute_message(
                        node_id,
                        edge_index,
                        problem,
                        evidence,
                        &evidence_scope,
                        rng,
                    );
                    let target = self.nodes[node_id.0].edges[edge_index].target;
                    self.nodes[target.0].set_message(node_id, message);
                }
            }
            iterations += 1;

            if let Some(divergence) = self.kl_divergence() {
                debug!(iterations, divergence, "interval propagation pass done");
                if divergence.abs() < KL_DIVERGENCE_MIN {
                    break;
                }
            }
        }
        iterations
    }

    pub fn kl_divergence(&self) -> Option<f64> {
        if self.nodes.is_empty() {
            return Some(0.0);
        }
        let mut divergence = 0.0;
        for node in &self.nodes {
            divergence += node.kl_divergence()?;
        }
        Some(divergence / self.nodes.len() as f64)
    }

    /// The unnormalized conditional distribution of the target variable given
    /// the evidence, over the intervals currently summarizing the target in
    /// its hosting node. Each interval's mass is estimated by marginalizing
    /// on a handful of representatives drawn from the domain slice.
    pub fn conditional_distribution<R: Rng>(
        &self,
        problem: &CspProblem,
        target: Variable,
        evidence: &Assignment,
        rng: &mut R,
    ) -> IntervalTable {
        debug_assert!(!evidence.contains_key(&target));
        let node = self
            .ordering
            .iter()
            .map(|id| &self.nodes[id.0])
            .find(|node| node.scope.contains(&target))
            .expect("no join-graph node covers the target variable");

        let mut kept = assignment_scope(evidence);
        kept.insert(target);
        let marginalized = node
            .scope
            .difference(&kept)
            .copied()
            .collect::<Vec<Variable>>();

        let mut result = IntervalTable::new();
        let mut assignment = evidence.clone();
        let domain = problem.domain(target);
        for interval in node.working_intervals[&target].keys().copied().collect::<Vec<_>>() {
            let mut sum = 0.0;
            for _ in 0..self.max_values_from_interval {
                let value = domain.pick_uniform_between(rng, interval.lb, interval.ub);
                if let Some(value) = value {
                    assignment.insert(target, value);
                    sum += self.marginalize(node, None, problem, &marginalized, 0, &mut assignment, rng);
                    assignment.remove(&target);
                }
            }
            result.insert(interval, sum);
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn compute_message<R: Rng>(
        &self,
        from: NodeId,
        edge_index: usize,
        problem: &CspProblem,
        evidence: &Assignment,
        evidence_scope: &Scope,
        rng: &mut R,
    ) -> IntervalMessage {
        let node = &self.nodes[from.0];
        let edge = &node.edges[edge_index];

        let visible = edge
            .separator
            .difference(evidence_scope)
            .copied()
            .collect::<Vec<Variable>>();
        let kept = edge
            .separator
            .union(evidence_scope)
            .copied()
            .collect::<Scope>();
        let marginalized = node
            .scope
            .difference(&kept)
            .copied()
            .collect::<Vec<Variable>>();

        let mut message = IntervalMessage::new(
            visible.iter().copied().collect(),
            &node.working_intervals,
        );
        let mut assignment = evidence.clone();
        let mut key = Vec::with_capacity(visible.len());
        self.enumerate_message(
            node,
            edge.target,
            problem,
            &visible,
            &marginalized,
            &mut key,
            &mut assignment,
            &mut message,
            rng,
        );
        message.normalize();
        message
    }

    #[allow(clippy::too_many_arguments)]
    fn enumerate_message<R: Rng>(
        &self,
        node: &IntervalJoinGraphNode,
        exclude: NodeId,
        problem: &CspProblem,
        visible: &[Variable],
        marginalized: &[Variable],
        key: &mut Vec<DomainInterval>,
        assignment: &mut Assignment,
        message: &mut IntervalMessage,
        rng: &mut R,
    ) {
        if key.len() == visible.len() {
            let mass = self.marginalize(
                node,
                Some(exclude),
                problem,
                marginalized,
                0,
                assignment,
                rng,
            );
            message.accumulate(key, mass);
        } else {
            let variable = visible[key.len()];
            let domain = problem.domain(variable);
            let intervals = node.working_intervals[&variable]
                .keys()
                .copied()
                .collect::<Vec<DomainInterval>>();
            for interval in intervals {
                key.push(interval);
                for _ in 0..self.max_values_from_interval {
                    let value = domain.pick_uniform_between(rng, interval.lb, interval.ub);
                    if let Some(value) = value {
                        assignment.insert(variable, value);
                        self.enumerate_message(
                            node,
                            exclude,
                            problem,
                            visible,
                            marginalized,
                            key,
                            assignment,
                            message,
                            rng,
                        );
                        assignment.remove(&variable);
                    }
                }
                key.pop();
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn marginalize<R: Rng>(
        &self,
        node: &IntervalJoinGraphNode,
        exclude: Option<NodeId>,
        problem: &CspProblem,
        marginalized: &[Variable],
        depth: usize,
        assignment: &mut Assignment,
        rng: &mut R,
    ) -> f64 {
        match marginalized.get(depth) {
            None => node.eval_assignment(assignment, exclude, problem.domains()),
            Some(variable) => {
                let domain = problem.domain(*variable);
                let intervals = node.working_intervals[variable]
                    .keys()
                    .copied()
                    .collect::<Vec<DomainInterval>>();
                let mut sum = 0.0;
                for interval in intervals {
                    for _ in 0..self.max_values_from_interval {
                        let value = domain.pick_uniform_between(rng, interval.lb, interval.ub);
                        if let Some(value) = value {
                            assignment.insert(*variable, value);
                            sum += self.marginalize(
                                node,
                                exclude,
                                problem,
                                marginalized,
                                depth + 1,
                                assignment,
                                rng,
                            );
                            assignment.remove(variable);
                        }
                    }
                }
                sum
            }
        }
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
