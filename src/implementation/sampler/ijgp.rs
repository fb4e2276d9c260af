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

//! This module provides the propagation-guided backtracking sampler working
//! on plain (value-keyed) probability tables. One variable is assigned at a
//! time: constraints are propagated on the evidence gathered so far, the
//! join graph is queried for the conditional distribution of the next
//! variable, a value is drawn from it, and dead ends backtrack after
//! discarding the value that led to them.

use std::collections::BTreeMap;

use derive_builder::Builder;
use rand::Rng;
use tracing::debug;

use crate::{
    Assignment, CspProblem, DomainJournal, JoinGraph, Sampler, Value, Variable,
    DEFAULT_MAX_ITERATIONS,
};

/// The tuning knobs of the plain sampler.
#[derive(Debug, Clone, Copy, Builder)]
pub struct IjgpConfig {
    /// Bound on the size of the mini-buckets (hence on the scope of the
    /// join-graph clusters).
    #[builder(default = "3")]
    pub max_bucket_size: usize,
    /// Probability of rerunning the propagation before each variable is
    /// assigned. The first variable always gets a run.
    #[builder(default = "1.0")]
    pub ijgp_probability: f64,
    /// Cap on the number of passes of one propagation run.
    #[builder(default = "DEFAULT_MAX_ITERATIONS")]
    pub max_iterations: usize,
}

impl Default for IjgpConfig {
    fn default() -> Self {
        IjgpConfigBuilder::default().build().unwrap()
    }
}

/// The plain backtracking sampler. It borrows the problem mutably for its
/// whole life (domains are edited -- reversibly -- while a sample is drawn)
/// and owns the join graph built from it.
pub struct IjgpSampler<'a, R: Rng> {
    problem: &'a mut CspProblem,
    graph: JoinGraph,
    config: IjgpConfig,
    rng: R,
}

impl<'a, R: Rng> IjgpSampler<'a, R> {
    pub fn new(problem: &'a mut CspProblem, config: IjgpConfig, rng: R) -> Self {
        debug_assert!(config.max_bucket_size >= 1);
        debug_assert!(config.max_iterations >= 1);
        debug_assert!((0.0..=1.0).contains(&config.ijgp_probability));
        let graph = JoinGraph::of_problem(&*problem, config.max_bucket_size);
        Self {
            problem,
            graph,
            config,
            rng,
        }
    }

    fn sample_step(
        &mut self,
        variables: &[Variable],
        depth: usize,
        evidence: &mut Assignment,
        changed: Option<Variable>,
    ) -> bool {
        if depth == variables.len() {
            return true;
        }

        let mut journal = DomainJournal::new();
        let consistent = match changed {
            None => self.problem.propagate(evidence, &mut journal),
            Some(variable) => self.problem.propagate_from(evidence, &mut journal, variable),
        };

        if consistent {
            let target = variables[depth];
            if evidence.is_empty() || self.rng.gen::<f64>() <= self.config.ijgp_probability {
                self.graph
                    .run(&*self.problem, evidence, self.config.max_iterations);
            }
            let mut distribution =
                self.graph
                    .conditional_distribution(&*self.problem, target, evidence);

            while !distribution.is_empty() {
                let value = self.draw(target, &distribution);
                evidence.insert(target, value);
                let stash = self.problem.domain_mut(target).restrict_to(value);

                let found = self.sample_step(variables, depth + 1, evidence, Some(target));

                self.problem.domain_mut(target).restore(&stash);
                if found {
                    self.problem.restore_domains(&journal);
                    return true;
                }

                // The value leads nowhere: drop it from the evidence, from
                // the distribution and from the domain (the journal makes
                // that last removal reversible on exit).
                debug!(variable = target.id(), value, "dead end, discarding value");
                evidence.remove(&target);
                distribution.remove(&value);
                self.problem.domain_mut(target).remove(value);
                journal.record(target, value);
            }
        } else {
            debug!(depth, "propagation emptied a domain, backtracking");
        }

        self.problem.restore_domains(&journal);
        false
    }

    /// Draws one value by inverse transform over the (unnormalized)
    /// distribution; a distribution with no mass at all falls back onto a
    /// uniform draw from the current domain.
    fn draw(&mut self, target: Variable, distribution: &BTreeMap<Value, f64>) -> Value {
        let total = distribution.values().sum::<f64>();
        if total <= 0.0 {
            return self
                .problem
                .domain(target)
                .pick_uniform(&mut self.rng)
                .expect("empty domain after successful propagation");
        }
        let selected = self.rng.gen::<f64>() * total;
        let mut accumulated = 0.0;
        for (value, probability) in distribution {
            accumulated += probability;
            if selected <= accumulated {
                return *value;
            }
        }
        *distribution.keys().next_back().unwrap()
    }
}

impl<R: Rng> Sampler for IjgpSampler<'_, R> {
    fn get_sample(&mut self, out: &mut Assignment) -> bool {
        self.graph.purge_messages();
        out.clear();
        let variables = self.problem.variables().collect::<Vec<Variable>>();
        self.sample_step(&variables, 0, out, None)
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
