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

//! This module defines the weight configuration shared by every soft
//! constraint of a problem. The configuration is built once, before any
//! constraint, and is never mutated afterwards: constraints and problem hold
//! it behind an `Arc`.

use derive_builder::Builder;

/// The weight configuration read by all constraint evaluations: the two cost
/// tables of the frequency-assignment benchmarks (one for interference
/// relations, one for mobility preferences), the base of the soft-constraint
/// exponential and the damping factor applied to tabular weights.
///
/// A violated hard constraint does not evaluate to plain zero but to
/// `epsilon`, a tiny positive weight which leaves a smallish chance to
/// unfeasible assignments and keeps every product samplable.
#[derive(Debug, Clone, Builder)]
pub struct CostModel {
    /// Cost of violating a binary interference relation, indexed by
    /// `weight - 1`.
    #[builder(default = "vec![]")]
    interference_costs: Vec<f64>,
    /// Cost of moving a variable away from its preferred value, indexed by
    /// `weight - 1`.
    #[builder(default = "vec![]")]
    mobility_costs: Vec<f64>,
    /// Base of the exponential weighing satisfied soft constraints.
    #[builder(default = "1.6")]
    exp_root: f64,
    /// Damping factor applied to the weight of tabular constraints.
    #[builder(default = "0.001")]
    exp_k: f64,
    /// The "nearly zero but samplable" weight of a violated hard constraint.
    #[builder(default = "1.0e-25")]
    epsilon: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        CostModelBuilder::default().build().unwrap()
    }
}

impl CostModel {
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
    pub fn exp_k(&self) -> f64 {
        self.exp_k
    }
    pub fn exp_root(&self) -> f64 {
        self.exp_root
    }

    /// The factor earned by a binary interference relation of the given
    /// weight, depending on whether it is satisfied. Weight indices must fall
    /// within the configured table; anything else is a configuration error.
    pub fn interference_factor(&self, weight: usize, satisfied: bool) -> f64 {
        self.exponential_factor(&self.interference_costs, weight, satisfied)
    }
    /// The factor earned by a unary mobility preference of the given weight.
    pub fn mobility_factor(&self, weight: usize, satisfied: bool) -> f64 {
        self.exponential_factor(&self.mobility_costs, weight, satisfied)
    }
    /// The factor earned by the fixed-cost relations (separation constraints)
    /// which do not go through a per-weight table.
    pub fn separation_factor(&self, satisfied: bool) -> f64 {
        (self.exp_root.ln() * SEPARATION_COST * f64::from(satisfied as u8)).exp()
    }
    /// The factor earned by a tabular constraint whose selected tuple carries
    /// the given (sub-threshold) weight.
    pub fn tabular_factor(&self, weight: u64) -> f64 {
        (2.0_f64.ln() * self.exp_k * -(weight as f64)).exp()
    }

    fn exponential_factor(&self, costs: &[f64], weight: usize, satisfied: bool) -> f64 {
        debug_assert!(weight <= costs.len());
        (self.exp_root.ln() * costs[weight - 1] * f64::from(satisfied as u8)).exp()
    }
}

/// The cost earned by a satisfied separation relation, common to all of the
/// interval-labeling constraint kinds.
const SEPARATION_COST: f64 = 5.0;

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_cost_model {
    use crate::{CostModel, CostModelBuilder};

    #[test]
    fn defaults() {
        let costs = CostModel::default();
        assert_eq!(1.6, costs.exp_root());
        assert_eq!(0.001, costs.exp_k());
        assert_eq!(1.0e-25, costs.epsilon());
    }

    #[test]
    fn interference_factor_is_exponential_in_the_cost() {
        let costs = CostModelBuilder::default()
            .interference_costs(vec![1.0, 2.0])
            .exp_root(2.0)
            .build()
            .unwrap();
        assert!((costs.interference_factor(2, true) - 4.0).abs() < 1e-9);
        assert!((costs.interference_factor(2, false) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn tabular_factor_decreases_with_weight() {
        let costs = CostModelBuilder::default().exp_k(1.0).build().unwrap();
        assert!((costs.tabular_factor(0) - 1.0).abs() < 1e-9);
        assert!((costs.tabular_factor(1) - 0.5).abs() < 1e-9);
        assert!((costs.tabular_factor(2) - 0.25).abs() < 1e-9);
    }
}
