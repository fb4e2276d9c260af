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

//! This module provides the join graph: the cluster graph built on top of the
//! mini-bucket partitioning, and the iterative propagation that circulates
//! probability tables along its separators. Nodes and edges live in a flat
//! arena and reference one another through plain indices, so the cyclic
//! structure of the graph involves no ownership cycle at all.

mod interval;
mod message;

pub use interval::*;
pub use message::*;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::{
    assignment_scope, Assignment, Constraint, CspProblem, MiniBuckets, PrimalGraph, Scope, Value,
    Variable,
};

/// The default cap on the number of propagation passes of one run.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

// ----------------------------------------------------------------------------
// --- NODES AND EDGES --------------------------------------------------------
// ----------------------------------------------------------------------------
/// The identifier of a node: it indicates the position of the referenced node
/// in the 'nodes' vector of the join graph.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub usize);

/// A directed edge of the join graph, labelled by its separator scope. Edges
/// always come in pairs: for every edge from `n` to `m` the node `m` holds
/// the reverse edge with the same separator.
#[derive(Debug, Clone)]
pub struct JoinGraphEdge {
    pub target: NodeId,
    pub separator: Scope,
}

/// One cluster of the join graph. A node owns the original constraints whose
/// scope fits inside its own, and the two generations of incoming messages
/// (the current one and the previous one, kept for the convergence check).
pub struct JoinGraphNode {
    scope: Scope,
    constraints: Vec<Arc<dyn Constraint>>,
    edges: Vec<JoinGraphEdge>,
    incoming: BTreeMap<NodeId, Message>,
    previous: BTreeMap<NodeId, Message>,
}

impl JoinGraphNode {
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
    pub fn edges(&self) -> &[JoinGraphEdge] {
        &self.edges
    }
    pub fn nb_constraints(&self) -> usize {
        self.constraints.len()
    }
    /// Iterates the current generation of incoming messages.
    pub fn incoming_messages(&self) -> impl Iterator<Item = &Message> {
        self.incoming.values()
    }

    /// Stores a freshly received message, moving the one it replaces into the
    /// previous generation.
    fn set_message(&mut self, from: NodeId, message: Message) {
        if let Some(replaced) = self.incoming.insert(from, message) {
            self.previous.insert(from, replaced);
        }
    }

    /// Multiplies the owned constraints and the current incoming messages on
    /// the given assignment, skipping the message received from `exclude`:
    /// a node never sends back what it was told by the target itself.
    fn eval_assignment(&self, assignment: &Assignment, exclude: Option<NodeId>) -> f64 {
        let mut result = 1.0;
        for constraint in &self.constraints {
            result *= constraint.evaluate(assignment);
        }
        for (sender, message) in &self.incoming {
            if Some(*sender) == exclude {
                continue;
            }
            result *= message.evaluate_assignment(assignment);
        }
        result
    }

    /// The mean divergence between the current and previous generations of
    /// the incoming messages, or None as long as one of the generations is
    /// not complete.
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

// ----------------------------------------------------------------------------
// --- JOIN GRAPH -------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The join graph itself: a flat arena of nodes plus the frozen order in
/// which they are visited by every propagation pass.
pub struct JoinGraph {
    nodes: Vec<JoinGraphNode>,
    ordering: Vec<NodeId>,
}

impl JoinGraph {
    /// Builds the join graph of a problem: primal graph, min-induced-width
    /// elimination ordering, schematic mini-buckets, then one node per
    /// mini-bucket.
    pub fn of_problem(problem: &CspProblem, max_bucket_size: usize) -> Self {
        let skeleton = GraphSkeleton::of_problem(problem, max_bucket_size);
        let nodes = skeleton
            .clusters
            .into_iter()
            .map(|cluster| JoinGraphNode {
                scope: cluster.scope,
                constraints: cluster.constraints,
                edges: cluster.edges,
                incoming: BTreeMap::new(),
                previous: BTreeMap::new(),
            })
            .collect();
        Self {
            nodes,
            ordering: skeleton.ordering,
        }
    }

    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }
    pub fn nodes(&self) -> impl Iterator<Item = &JoinGraphNode> {
        self.nodes.iter()
    }

    /// Drops both generations of messages everywhere. This is called before
    /// each sample so that no stale evidence leaks between samples.
    pub fn purge_messages(&mut self) {
        for node in self.nodes.iter_mut() {
            node.purge_messages();
        }
    }

    /// Runs the iterative propagation until the graph-wide divergence drops
    /// below [`KL_DIVERGENCE_MIN`] or `max_iterations` passes were made, and
    /// returns the number of passes performed.
    ///
    /// Within one pass, the nodes are visited in the frozen graph ordering
    /// and each node reads its live incoming table: a message recomputed
    /// earlier in the same pass is used right away by the nodes visited after
    /// its sender (the asynchronous flavor of the propagation).
    pub fn run(
        &mut self,
        problem: &CspProblem,
        evidence: &Assignment,
        max_iterations: usize,
    ) -> usize {
        let evidence_scope = assignment_scope(evidence);
        let mut iterations = 0;

        while iterations < max_iterations {
            for position in 0..self.ordering.len() {
                let node_id = self.ordering[position];
                for edge_index in 0..self.nodes[node_id.0].edges.len() {
                    let message =
                        self.compute_message(node_id, edge_index, problem, evidence, &evidence_scope);
                    let target = self.nodes[node_id.0].edges[edge_index].target;
                    self.nodes[target.0].set_message(node_id, message);
                }
            }
            iterations += 1;

            if let Some(divergence) = self.kl_divergence() {
                debug!(iterations, divergence, "propagation pass done");
                if divergence.abs() < KL_DIVERGENCE_MIN {
                    break;
                }
            }
        }
        iterations
    }

    /// The graph-wide divergence: the mean over the nodes of the mean
    /// divergence of their message tables, or None as long as some node has
    /// not seen two generations of messages yet.
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
    /// the evidence, extracted from the first node whose scope contains the
    /// target: for each candidate value, everything else in the node scope is
    /// marginalized out.
    pub fn conditional_distribution(
        &self,
        problem: &CspProblem,
        target: Variable,
        evidence: &Assignment,
    ) -> BTreeMap<Value, f64> {
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

        let mut result = BTreeMap::new();
        let mut assignment = evidence.clone();
        for value in problem.domain(target).iter().collect::<Vec<Value>>() {
            assignment.insert(target, value);
            let mass = self.marginalize(node, None, problem, &marginalized, 0, &mut assignment);
            result.insert(value, mass);
        }
        result
    }

    fn compute_message(
        &self,
        from: NodeId,
        edge_index: usize,
        problem: &CspProblem,
        evidence: &Assignment,
        evidence_scope: &Scope,
    ) -> Message {
        let node = &self.nodes[from.0];
        let edge = &node.edges[edge_index];

        // The message bears on the separator variables that are not pinned
        // down by the evidence; everything else of the node scope gets
        // marginalized out.
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

        let mut message = Message::new(visible.iter().copied().collect());
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
        );
        message.normalize();
        message
    }

    #[allow(clippy::too_many_arguments)]
    fn enumerate_message(
        &self,
        node: &JoinGraphNode,
        exclude: NodeId,
        problem: &CspProblem,
        visible: &[Variable],
        marginalized: &[Variable],
        key: &mut Vec<Value>,
        assignment: &mut Assignment,
        message: &mut Message,
    ) {
        if key.len() == visible.len() {
            let mass =
                self.marginalize(node, Some(exclude), problem, marginalized, 0, assignment);
            message.set_probability(key.clone(), mass);
        } else {
            let variable = visible[key.len()];
            let values = problem.domain(variable).iter().collect::<Vec<Value>>();
            for value in values {
                key.push(value);
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
                );
                key.pop();
                assignment.remove(&variable);
            }
        }
    }

    fn marginalize(
        &self,
        node: &JoinGraphNode,
        exclude: Option<NodeId>,
        problem: &CspProblem,
        marginalized: &[Variable],
        depth: usize,
        assignment: &mut Assignment,
    ) -> f64 {
        match marginalized.get(depth) {
            None => node.eval_assignment(assignment, exclude),
            Some(variable) => {
                let values = problem.domain(*variable).iter().collect::<Vec<Value>>();
                let mut sum = 0.0;
                for value in values {
                    assignment.insert(*variable, value);
                    sum += self.marginalize(node, exclude, problem, marginalized, depth + 1, assignment);
                    assignment.remove(variable);
                }
                sum
            }
        }
    }
}

// ----------------------------------------------------------------------------
// --- GRAPH SKELETON ---------------------------------------------------------
// ----------------------------------------------------------------------------
/// One cluster of the graph topology, before any flavor-specific state is
/// attached to it.
pub(crate) struct Cluster {
    pub scope: Scope,
    pub constraints: Vec<Arc<dyn Constraint>>,
    pub edges: Vec<JoinGraphEdge>,
}

/// The topology shared by both flavors of the join graph: the clusters with
/// their attached constraints and separator-labelled edges, plus the frozen
/// traversal ordering.
pub(crate) struct GraphSkeleton {
    pub clusters: Vec<Cluster>,
    pub ordering: Vec<NodeId>,
}

impl GraphSkeleton {
    pub fn of_problem(problem: &CspProblem, max_bucket_size: usize) -> Self {
        let primal = PrimalGraph::of_problem(problem);
        let ordering = primal.min_induced_width_ordering();
        let mini_buckets = problem.schematic_mini_buckets(&ordering, max_bucket_size);
        Self::from_mini_buckets(problem, &ordering, &mini_buckets)
    }

    fn from_mini_buckets(
        problem: &CspProblem,
        ordering: &[Variable],
        mini_buckets: &MiniBuckets,
    ) -> Self {
        let mut clusters: Vec<Cluster> = vec![];
        let mut index: BTreeMap<Scope, NodeId> = BTreeMap::new();

        for (k, bucket) in mini_buckets.buckets.iter().enumerate() {
            for mini in bucket {
                let id = NodeId(clusters.len());
                let constraints = problem
                    .constraints()
                    .iter()
                    .filter(|c| c.scope().is_subset(mini))
                    .cloned()
                    .collect();
                clusters.push(Cluster {
                    scope: mini.clone(),
                    constraints,
                    edges: vec![],
                });
                index.insert(mini.clone(), id);

                // The residual of this mini-bucket was absorbed by a
                // mini-bucket created earlier: connect the two, labelled by
                // the intersection of their scopes.
                if let Some(absorber) = mini_buckets.outside_arcs.get(mini) {
                    let separator = mini.intersection(absorber).copied().collect::<Scope>();
                    let other = index[absorber];
                    clusters[id.0].edges.push(JoinGraphEdge {
                        target: other,
                        separator: separator.clone(),
                    });
                    clusters[other.0].edges.push(JoinGraphEdge {
                        target: id,
                        separator,
                    });
                }
            }

            // Mini-buckets of one same bucket form a clique whose edges are
            // labelled by the bucket variable alone.
            for (i, a) in bucket.iter().enumerate() {
                for b in bucket.iter().skip(i + 1) {
                    let separator = Scope::from_iter([ordering[k]]);
                    let ida = index[a];
                    let idb = index[b];
                    clusters[ida.0].edges.push(JoinGraphEdge {
                        target: idb,
                        separator: separator.clone(),
                    });
                    clusters[idb.0].edges.push(JoinGraphEdge {
                        target: ida,
                        separator,
                    });
                }
            }
        }

        let ordering = index.into_values().collect();
        Self { clusters, ordering }
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_joingraph {
    use std::sync::Arc;

    use crate::*;

    /// x0 -- x1 -- x2 chained by two hard "difference equals one" relations
    /// over boolean domains.
    fn chain_problem() -> CspProblem {
        let costs = Arc::new(CostModel::default());
        let domains = (0..3).map(|i| (Variable(i), Domain::range(0, 1))).collect();
        let constraints = (0..2)
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
    fn separators_are_contained_in_both_endpoints() {
        let problem = chain_problem();
        let graph = JoinGraph::of_problem(&problem, 2);
        for node in graph.nodes() {
            for edge in node.edges() {
                let target_scope = graph.nodes().nth(edge.target.0).unwrap().scope();
                assert!(edge.separator.is_subset(node.scope()));
                assert!(edge.separator.is_subset(target_scope));
            }
        }
    }

    #[test]
    fn every_constraint_lands_in_some_node() {
        let problem = chain_problem();
        let graph = JoinGraph::of_problem(&problem, 2);
        let attached = graph.nodes().map(|n| n.nb_constraints()).sum::<usize>();
        assert!(attached >= problem.constraints().len());
    }

    #[test]
    fn messages_are_normalized_after_a_run() {
        let problem = chain_problem();
        let mut graph = JoinGraph::of_problem(&problem, 2);
        graph.run(&problem, &Assignment::new(), DEFAULT_MAX_ITERATIONS);
        for node in graph.nodes() {
            for message in node.incoming_messages() {
                let total = message.probabilities().sum::<f64>();
                assert!((total - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn symmetric_chain_converges_in_two_passes() {
        let problem = chain_problem();
        let mut graph = JoinGraph::of_problem(&problem, 3);
        let iterations = graph.run(&problem, &Assignment::new(), DEFAULT_MAX_ITERATIONS);
        assert!(iterations <= 2);
        assert!(graph.kl_divergence().unwrap() < KL_DIVERGENCE_MIN);
    }

    #[test]
    fn conditional_distribution_reflects_the_hard_relation() {
        let problem = chain_problem();
        let mut graph = JoinGraph::of_problem(&problem, 3);
        let evidence = Assignment::from_iter([(Variable(0), 0)]);
        graph.run(&problem, &evidence, DEFAULT_MAX_ITERATIONS);
        let dist = graph.conditional_distribution(&problem, Variable(1), &evidence);
        // Given x0 = 0, the relation |x0 - x1| = 1 only leaves x1 = 1 with
        // any substantial mass.
        assert!(dist[&1] > 1e6 * dist[&0]);
    }
}
