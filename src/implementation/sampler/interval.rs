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

//! This module provides the interval flavor of the backtracking sampler: the
//! conditional distributions are interval-keyed, a draw first selects a
//! range then a concrete value uniformly from the domain slice it covers,
//! and a discarded value only sheds its share `1 / |slice|` of the range
//! probability.

use derive_builder::Builder;
use rand::Rng;
use tracing::debug;

use crate::{
    containing_interval, Assignment, CspProblem, DomainJournal, IntervalJoinGraph, IntervalTable,
    Sampler, Value, Variable, DEFAULT_MAX_DOMAIN_INTERVALS, DEFAULT_MAX_ITERATIONS,
    DEFAULT_MAX_VALUES_FROM_INTERVAL,
};

/// The tuning knobs of the interval sampler.
#[derive(Debug, Clone, Copy, Builder)]
pub struct IntervalIjgpConfig {
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
    /// Bound on the number of ranges summarizing one variable.
    #[builder(default = "DEFAULT_MAX_DOMAIN_INTERVALS")]
    pub max_domain_intervals: usize,
    /// Number of representative values drawn from each range during the
    /// propagation.
    #[builder(default = "DEFAULT_MAX_VALUES_FROM_INTERVAL")]
    pub max_values_from_interval: usize,
}

impl Default for IntervalIjgpConfig {
    fn default() -> Self {
        IntervalIjgpConfigBuilder::default().build().unwrap()
    }
}

/// The interval-valued backtracking sampler.
pub struct IntervalIjgpSampler<'a, R: Rng> {
    problem: &'a mut CspProblem,
    graph: IntervalJoinGraph,
    config: IntervalIjgpConfig,
    rng: R,
}

impl<'a, R: Rng> IntervalIjgpSampler<'a, R> {
    pub fn new(problem: &'a mut CspProblem, config: IntervalIjgpConfig, rng: R) -> Self {
        debug_assert!(config.max_bucket_size >= 1);
        debug_assert!(config.max_iterations >= 1);
        debug_assert!((0.0..=1.0).contains(&config.ijgp_probability));
        debug_assert!(config.max_domain_intervals >= 1);
        debug_assert!(config.max_values_from_interval >= 1);
        let graph = IntervalJoinGraph::of_problem(
            &mut *problem,
            config.max_bucket_size,
            config.max_domain_intervals,
            config.max_values_from_interval,
        );
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
                self.graph.run(
                    &*self.problem,
                    evidence,
                    self.config.max_iterations,
                    &mut self.rng,
                );
            }
            let mut distribution = self.graph.conditional_distribution(
                &*self.problem,
                target,
                evidence,
                &mut self.rng,
            );

            loop {
                // Ranges left without any live domain value cannot be drawn
                // from anymore.
                let domain = self.problem.domain(target);
                distribution.retain(|iv, _| domain.count_between(iv.lb, iv.ub) > 0);
                if distribution.is_empty() {
                    break;
                }

                let value = self.draw(target, &distribution);
                evidence.insert(target, value);
                let stash = self.problem.domain_mut(target).restrict_to(value);

                let found = self.sample_step(variables, depth + 1, evidence, Some(target));

                self.problem.domain_mut(target).restore(&stash);
                if found {
                    self.problem.restore_domains(&journal);
                    return true;
                }

                debug!(variable = target.id(), value, "dead end, discarding value");
                evidence.remove(&target);
                self.discard(target, value, &mut distribution);
                self.problem.domain_mut(target).remove(value);
                journal.record(target, value);
            }
        } else {
            debug!(depth, "propagation emptied a domain, backtracking");
        }

        self.problem.restore_domains(&journal);
        false
    }

    /// Draws one value: inverse transform over the ranges, then a uniform
    /// pick inside the selected range's domain slice. A distribution with no
    /// mass falls back onto a uniform draw from the whole domain.
    fn draw(&mut self, target: Variable, distribution: &IntervalTable) -> Value {
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
        for (interval, probability) in distribution {
            accumulated += probability;
            if selected <= accumulated {
                if let Some(value) = self.problem.domain(target).pick_uniform_between(
                    &mut self.rng,
                    interval.lb,
                    interval.ub,
                ) {
                    return value;
                }
            }
        }
        // All remaining mass sits on drained ranges: uniform fallback.
        self.problem
            .domain(target)
            .pick_uniform(&mut self.rng)
            .expect("empty domain after successful propagation")
    }

    /// Sheds a discarded value from the distribution: its range loses the
    /// share `1 / |slice|` of its probability, and is dropped outright when
    /// the value was the last of the slice.
    fn discard(&mut self, target: Variable, value: Value, distribution: &mut IntervalTable) {
        let Some(interval) = containing_interval(distribution, value) else {
            return;
        };
        let population = self
            .problem
            .domain(target)
            .count_between(interval.lb, interval.ub);
        if population > 1 {
            if let Some(probability) = distribution.get_mut(&interval) {
                *probability -= 1.0 / population as f64;
            }
        } else {
            distribution.remove(&interval);
        }
    }
}

impl<R: Rng> Sampler for IntervalIjgpSampler<'_, R> {
    fn get_sample(&mut self, out: &mut Assignment) -> bool {
        self.graph.purge_messages();
        self.graph.init_intervals(&mut *self.problem);
        out.clear();
        let variables = self.problem.variables().collect::<Vec<Variable>>();
        self.sample_step(&variables, 0, out, None)
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_interval_sampler {
    use std::sync::Arc;

    use rand::{rngs::StdRng, SeedableRng};

    use crate::*;

    fn gap_problem() -> CspProblem {
        let costs = Arc::new(CostModel::default());
        CspProblem::new(
            Domains::from_iter([
                (Variable(0), Domain::range(0, 19)),
                (Variable(1), Domain::range(0, 19)),
            ]),
            vec![Arc::new(DistanceConstraint::new(
                Variable(0),
                Variable(1),
                DistanceRelation::Greater,
                10,
                0,
                Arc::clone(&costs),
            )) as Arc<dyn Constraint>],
            costs,
        )
    }

    #[test]
    fn samples_satisfy_the_hard_gap() {
        let mut problem = gap_problem();
        let mut sampler = IntervalIjgpSampler::new(
            &mut problem,
            IntervalIjgpConfigBuilder::default()
                .max_domain_intervals(4)
                .build()
                .unwrap(),
            StdRng::seed_from_u64(3),
        );
        let mut sample = Assignment::new();
        for _ in 0..10 {
            assert!(sampler.get_sample(&mut sample));
            let gap = (sample[&Variable(0)] - sample[&Variable(1)]).abs();
            assert!(gap > 10);
        }
    }

    #[test]
    fn domains_are_intact_after_sampling() {
        let mut problem = gap_problem();
        let before = problem.domains().clone();
        let mut sampler = IntervalIjgpSampler::new(
            &mut problem,
            IntervalIjgpConfig::default(),
            StdRng::seed_from_u64(11),
        );
        let mut sample = Assignment::new();
        assert!(sampler.get_sample(&mut sample));
        drop(sampler);
        assert_eq!(&before, problem.domains());
    }

    #[test]
    fn config_defaults_follow_the_documented_values() {
        let config = IntervalIjgpConfig::default();
        assert_eq!(10, config.max_domain_intervals);
        assert_eq!(2, config.max_values_from_interval);
    }
}
