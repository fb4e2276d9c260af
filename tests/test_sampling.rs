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

//! End-to-end sampling checks over small, fully understood problems.

use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};

use ijgp::*;

/// Two boolean variables whose values must differ by exactly one.
fn alternating_pair() -> CspProblem {
    let costs = Arc::new(CostModel::default());
    CspProblem::new(
        Domains::from_iter([
            (Variable(0), Domain::range(0, 1)),
            (Variable(1), Domain::range(0, 1)),
        ]),
        vec![Arc::new(DistanceConstraint::new(
            Variable(0),
            Variable(1),
            DistanceRelation::Equal,
            1,
            0,
            Arc::clone(&costs),
        )) as Arc<dyn Constraint>],
        costs,
    )
}

#[test]
fn alternating_pair_always_yields_one_of_the_two_solutions() {
    let mut problem = alternating_pair();
    let scorer = alternating_pair();
    let mut sampler = IjgpSampler::new(
        &mut problem,
        IjgpConfig::default(),
        StdRng::seed_from_u64(1),
    );
    let mut sample = Assignment::new();
    for _ in 0..50 {
        assert!(sampler.get_sample(&mut sample));
        let x = sample[&Variable(0)];
        let y = sample[&Variable(1)];
        assert!((x, y) == (0, 1) || (x, y) == (1, 0));
        assert_eq!(1.0, scorer.eval(&sample));
    }
}

#[test]
fn alternating_pair_with_the_interval_sampler() {
    let mut problem = alternating_pair();
    let scorer = alternating_pair();
    let mut sampler = IntervalIjgpSampler::new(
        &mut problem,
        IntervalIjgpConfig::default(),
        StdRng::seed_from_u64(2),
    );
    let mut sample = Assignment::new();
    for _ in 0..20 {
        assert!(sampler.get_sample(&mut sample));
        assert_eq!(1.0, scorer.eval(&sample));
    }
}

#[test]
fn contradictory_hard_constraints_yield_no_sample() {
    let costs = Arc::new(CostModel::default());
    let mut problem = CspProblem::new(
        Domains::from_iter([
            (Variable(0), Domain::range(0, 1)),
            (Variable(1), Domain::range(0, 1)),
        ]),
        vec![
            Arc::new(FixedValueConstraint::new(Variable(0), 0, 0, Arc::clone(&costs)))
                as Arc<dyn Constraint>,
            Arc::new(FixedValueConstraint::new(Variable(0), 1, 0, Arc::clone(&costs))),
        ],
        costs,
    );
    let before = problem.domains().clone();
    let mut sampler = IjgpSampler::new(
        &mut problem,
        IjgpConfig::default(),
        StdRng::seed_from_u64(3),
    );
    let mut sample = Assignment::new();
    assert!(!sampler.get_sample(&mut sample));
    assert!(!sampler.get_sample(&mut sample));
    drop(sampler);
    // Failure leaves the domains exactly as they were.
    assert_eq!(&before, problem.domains());
}

#[test]
fn soft_preference_shows_up_in_the_sampling_frequency() {
    let costs = Arc::new(
        CostModelBuilder::default()
            .mobility_costs(vec![0.0, 0.0, 2.0])
            .exp_root(2.0)
            .build()
            .unwrap(),
    );
    let mut problem = CspProblem::new(
        Domains::from_iter([(Variable(0), Domain::range(0, 2))]),
        vec![Arc::new(PreferenceConstraint::new(
            Variable(0),
            1,
            3,
            Arc::clone(&costs),
        )) as Arc<dyn Constraint>],
        costs,
    );
    // The preferred value weighs exp(ln 2 * 2) = 4, the others 1.
    assert_eq!(
        4.0,
        problem.eval(&Assignment::from_iter([(Variable(0), 1)]))
    );
    assert_eq!(
        1.0,
        problem.eval(&Assignment::from_iter([(Variable(0), 2)]))
    );

    let mut sampler = IjgpSampler::new(
        &mut problem,
        IjgpConfig::default(),
        StdRng::seed_from_u64(4),
    );
    let mut sample = Assignment::new();
    let mut preferred = 0usize;
    let total = 10_000usize;
    for _ in 0..total {
        assert!(sampler.get_sample(&mut sample));
        if sample[&Variable(0)] == 1 {
            preferred += 1;
        }
    }
    let frequency = preferred as f64 / total as f64;
    // 4 / (4 + 1 + 1) of the mass sits on the preferred value.
    assert!((frequency - 4.0 / 6.0).abs() <= 0.02);
}

#[test]
fn tabular_problem_never_samples_a_forbidden_tuple() {
    let costs = Arc::new(CostModelBuilder::default().exp_k(0.001).build().unwrap());
    let variables = [Variable(0), Variable(1), Variable(2)];
    let mut table = TableConstraint::new(variables, 0, 10, Arc::clone(&costs));
    table.add_tuple(vec![0, 0, 0], 10);
    table.add_tuple(vec![1, 1, 1], 1);

    let domains = variables
        .iter()
        .map(|v| (*v, Domain::range(0, 2)))
        .collect::<Domains>();
    let scorer = CspProblem::new(
        domains.clone(),
        vec![Arc::new(table.clone()) as Arc<dyn Constraint>],
        Arc::clone(&costs),
    );
    let mut problem = CspProblem::new(
        domains,
        vec![Arc::new(table) as Arc<dyn Constraint>],
        costs,
    );

    let forbidden = Assignment::from_iter([(Variable(0), 0), (Variable(1), 0), (Variable(2), 0)]);
    let preferred = Assignment::from_iter([(Variable(0), 1), (Variable(1), 1), (Variable(2), 1)]);
    assert_eq!(0.0, scorer.eval(&forbidden));
    let expected = (2.0_f64.ln() * 0.001 * -1.0).exp();
    assert!((scorer.eval(&preferred) - expected).abs() < 1e-12);

    let mut sampler = IjgpSampler::new(
        &mut problem,
        IjgpConfig::default(),
        StdRng::seed_from_u64(5),
    );
    let mut sample = Assignment::new();
    for _ in 0..100 {
        assert!(sampler.get_sample(&mut sample));
        assert_ne!(
            (sample[&Variable(0)], sample[&Variable(1)], sample[&Variable(2)]),
            (0, 0, 0)
        );
        assert!(scorer.eval(&sample) > 0.0);
    }
}

#[test]
fn propagation_is_reversible_under_evidence() {
    let costs = Arc::new(CostModel::default());
    let domains = (0..5)
        .map(|i| (Variable(i), Domain::range(0, 4)))
        .collect::<Domains>();
    let mut constraints = (0..4)
        .map(|i| {
            Arc::new(DistanceConstraint::new(
                Variable(i),
                Variable((i + 1) % 4),
                DistanceRelation::Greater,
                1,
                0,
                Arc::clone(&costs),
            )) as Arc<dyn Constraint>
        })
        .collect::<Vec<_>>();
    constraints.push(Arc::new(DistanceConstraint::new(
        Variable(3),
        Variable(4),
        DistanceRelation::Less,
        2,
        0,
        Arc::clone(&costs),
    )));
    let mut problem = CspProblem::new(domains, constraints, costs);

    let before = problem.domains().clone();
    let evidence = Assignment::from_iter([(Variable(0), 0), (Variable(2), 4)]);
    let mut journal = DomainJournal::new();
    let _ = problem.propagate(&evidence, &mut journal);
    problem.restore_domains(&journal);
    assert_eq!(&before, problem.domains());
}

#[test]
fn hard_cycle_samples_are_proper_solutions() {
    let costs = Arc::new(CostModel::default());
    let domains = (0..4)
        .map(|i| (Variable(i), Domain::range(0, 1)))
        .collect::<Domains>();
    let mut constraints = (0..4)
        .map(|i| {
            Arc::new(DistanceConstraint::new(
                Variable(i),
                Variable((i + 1) % 4),
                DistanceRelation::Equal,
                1,
                0,
                Arc::clone(&costs),
            )) as Arc<dyn Constraint>
        })
        .collect::<Vec<_>>();
    // The chord pins the two opposite corners onto the same value.
    constraints.push(Arc::new(DistanceConstraint::new(
        Variable(0),
        Variable(2),
        DistanceRelation::Equal,
        0,
        0,
        Arc::clone(&costs),
    )));
    let scorer = CspProblem::new(domains.clone(), constraints.clone(), Arc::clone(&costs));
    let mut problem = CspProblem::new(domains, constraints, costs);

    let mut sampler = IjgpSampler::new(
        &mut problem,
        IjgpConfigBuilder::default()
            .max_bucket_size(2)
            .build()
            .unwrap(),
        StdRng::seed_from_u64(6),
    );
    let mut sample = Assignment::new();
    for _ in 0..20 {
        assert!(sampler.get_sample(&mut sample));
        // Every constraint is hard here: a valid sample scores exactly one.
        assert_eq!(1.0, scorer.eval(&sample));
    }
}
