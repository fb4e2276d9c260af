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

//! # IJGP
//! IJGP is a library to draw samples from the solution space of weighted
//! (soft) constraint satisfaction problems. Given a set of integer variables
//! with finite domains and a set of weighted constraints, it produces full
//! assignments whose probability mass is proportional to the product of the
//! constraint evaluations. Hard constraints (weight zero) must be satisfied;
//! soft ones merely weigh the assignments.
//!
//! The engine behind the samplers is *iterative join-graph propagation*: the
//! constraint scopes are packed into mini-buckets along a min-induced-width
//! elimination ordering, the mini-buckets become the clusters of a join
//! graph, and probability tables are circulated along the cluster separators
//! until they stop changing (Kullback-Leibler convergence) or an iteration
//! cap is hit. Sampling then proceeds variable by variable: constraints are
//! propagated (generalized arc consistency) on the evidence gathered so far,
//! the join graph is queried for the conditional distribution of the next
//! variable, a value is drawn, and dead ends backtrack.
//!
//! Two flavors of the machinery are available:
//! * [`IjgpSampler`] works on plain probability tables keyed by value
//!   tuples, and is exact about the table entries it manipulates;
//! * [`IntervalIjgpSampler`] summarizes large domains by a bounded number of
//!   value ranges ([`DomainInterval`]) and estimates the range masses from a
//!   few sampled representatives, trading accuracy for tractability.
//!
//! A baseline [`GibbsSampler`] (plain MCMC over full assignments) is
//! included as a contrast.
//!
//! ## Quick Example
//! The following builds a tiny problem with two boolean variables that must
//! differ by exactly one, and draws a sample from it.
//!
//! ```
//! use std::sync::Arc;
//! use rand::{rngs::StdRng, SeedableRng};
//! use ijgp::*;
//!
//! // The weight configuration shared by all the constraints.
//! let costs = Arc::new(CostModel::default());
//!
//! // Two variables over {0, 1} ...
//! let domains = Domains::from_iter([
//!     (Variable(0), Domain::range(0, 1)),
//!     (Variable(1), Domain::range(0, 1)),
//! ]);
//! // ... subject to the hard relation |x0 - x1| = 1.
//! let constraints: Vec<Arc<dyn Constraint>> = vec![
//!     Arc::new(DistanceConstraint::new(
//!         Variable(0),
//!         Variable(1),
//!         DistanceRelation::Equal,
//!         1,
//!         0,
//!         Arc::clone(&costs),
//!     )),
//! ];
//! let mut problem = CspProblem::new(domains, constraints, costs);
//!
//! // The random stream is injected, so runs are reproducible at will.
//! let mut sampler = IjgpSampler::new(
//!     &mut problem,
//!     IjgpConfig::default(),
//!     StdRng::seed_from_u64(42),
//! );
//!
//! let mut sample = Assignment::new();
//! assert!(sampler.get_sample(&mut sample));
//! assert_eq!(1, (sample[&Variable(0)] - sample[&Variable(1)]).abs());
//! ```
//!
//! ## Plugging your own constraints
//! All the machinery is polymorphic over the [`Constraint`] trait: provide
//! `evaluate` (the factor value), `scope`, `is_soft` and `has_support` (can
//! this value still be part of a satisfying extension?) and your relation
//! kind participates in propagation, join-graph construction and sampling
//! exactly like the shipped ones.

mod common;
mod abstraction;
mod implementation;

pub use common::*;
pub use abstraction::*;
pub use implementation::*;
