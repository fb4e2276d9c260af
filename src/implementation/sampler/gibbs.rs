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

//! This module provides the baseline Gibbs sampler: an unconditional
//! whole-assignment MCMC walk. It is kept as a contrast for the
//! propagation-guided samplers; it never fails but needs a long burn-in
//! before its samples resemble the target distribution.

use rand::Rng;
use tracing::debug;

use crate::{Assignment, CspProblem, Sampler, Value};

/// The baseline sampler: starting from a uniformly random full assignment,
/// every variable in turn is resampled from its full conditional (computed by
/// brute-force evaluation of the whole problem for each candidate value).
pub struct GibbsSampler<'a, R: Rng> {
    problem: &'a CspProblem,
    burn_in: usize,
    state: Assignment,
    initialized: bool,
    rng: R,
}

impl<'a, R: Rng> GibbsSampler<'a, R> {
    pub fn new(problem: &'a CspProblem, burn_in: usize, rng: R) -> Self {
        Self {
            problem,
            burn_in,
            state: Assignment::new(),
            initialized: false,
            rng,
        }
    }

    fn init_state(&mut self) {
        self.state.clear();
        for variable in self.problem.variables().collect::<Vec<_>>() {
            let value = self
                .problem
                .domain(variable)
                .pick_uniform(&mut self.rng)
                .expect("empty domain");
            self.state.insert(variable, value);
        }
    }

    /// One full sweep of the walk: every variable is redrawn from its full
    /// conditional given the rest of the current state.
    fn resample_once(&mut self) {
        let epsilon = self.problem.cost_model().epsilon();
        for variable in self.problem.variables().collect::<Vec<_>>() {
            let values = self.problem.domain(variable).iter().collect::<Vec<Value>>();
            let mut weights = Vec::with_capacity(values.len());
            let mut total = 0.0;

            for value in &values {
                self.state.insert(variable, *value);
                let weight = self.problem.eval(&self.state).max(epsilon);
                weights.push(weight);
                total += weight;
            }

            let chosen = if total < epsilon {
                self.problem
                    .domain(variable)
                    .pick_uniform(&mut self.rng)
                    .expect("empty domain")
            } else {
                let selected = self.rng.gen::<f64>() * total;
                let mut accumulated = 0.0;
                let mut chosen = values[values.len() - 1];
                for (value, weight) in values.iter().zip(weights.iter()) {
                    accumulated += weight;
                    if accumulated >= selected {
                        chosen = *value;
                        break;
                    }
                }
                chosen
            };
            self.state.insert(variable, chosen);
        }
    }
}

impl<R: Rng> Sampler for GibbsSampler<'_, R> {
    fn get_sample(&mut self, out: &mut Assignment) -> bool {
        if self.initialized {
            self.resample_once();
        } else {
            self.init_state();
            for step in 0..self.burn_in {
                debug!(step, "burn-in sweep");
                self.resample_once();
            }
            self.initialized = true;
        }
        out.clone_from(&self.state);
        true
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
