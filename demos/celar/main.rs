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

//! This example shows how to sample assignments for a frequency-assignment
//! (radio link) dataset with any of the shipped samplers. It is also the
//! place to look at if you want to see how a dataset gets loaded and how the
//! samplers are wired together.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use rand::{rngs::StdRng, SeedableRng};

use ijgp::*;

mod io_utils;
use io_utils::read_instance;

/// Which sampling algorithm should be used.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SamplerKind {
    /// The baseline MCMC walker.
    Gibbs,
    /// The backtracking sampler on plain probability tables.
    Ijgp,
    /// The backtracking sampler on interval-keyed probability tables.
    IntervalIjgp,
}

/// This structure uses `clap-derive` annotations and define the arguments that can
/// be passed on to the executable solver.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path to the dataset directory (costs.txt, dom.txt, var.txt, ctr.txt)
    dataset: PathBuf,
    /// The sampling algorithm to use
    #[clap(short, long, value_enum, default_value = "ijgp")]
    sampler: SamplerKind,
    /// The number of samples to draw
    #[clap(short = 'n', long, default_value = "100")]
    num_samples: usize,
    /// The maximum size of a single mini-bucket
    #[clap(short = 'b', long, default_value = "3")]
    bucket_size: usize,
    /// The probability with which propagation is rerun before each variable
    #[clap(short = 'p', long, default_value = "1.0")]
    ijgp_probability: f64,
    /// The maximum number of iterations of one propagation run
    #[clap(long, default_value = "10")]
    ijgp_iterations: usize,
    /// The number of burn-in sweeps of the Gibbs walker
    #[clap(long, default_value = "1000")]
    burn_in: usize,
    /// The maximum number of ranges summarizing one variable (interval flavor)
    #[clap(long, default_value = "10")]
    domain_intervals: usize,
    /// The number of representative values drawn per range (interval flavor)
    #[clap(long, default_value = "2")]
    values_from_interval: usize,
    /// The damping factor applied to tabular constraint weights
    #[clap(short = 'k', long, default_value = "0.001")]
    koef: f64,
    /// Seed of the random stream (a fresh one is drawn when omitted)
    #[clap(long)]
    seed: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args = Args::parse();
    let (domains, constraints, costs) =
        read_instance(&args.dataset, args.koef).expect("cannot load the dataset");

    // The second instance shares the constraints and only serves scoring:
    // the sampler edits the domains of the first one while it works.
    let scorer = CspProblem::new(domains.clone(), constraints.clone(), Arc::clone(&costs));
    let mut problem = CspProblem::new(domains, constraints, costs);

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut sampler: Box<dyn Sampler + '_> = match args.sampler {
        SamplerKind::Gibbs => Box::new(GibbsSampler::new(&scorer, args.burn_in, rng)),
        SamplerKind::Ijgp => Box::new(IjgpSampler::new(
            &mut problem,
            IjgpConfigBuilder::default()
                .max_bucket_size(args.bucket_size)
                .ijgp_probability(args.ijgp_probability)
                .max_iterations(args.ijgp_iterations)
                .build()
                .unwrap(),
            rng,
        )),
        SamplerKind::IntervalIjgp => Box::new(IntervalIjgpSampler::new(
            &mut problem,
            IntervalIjgpConfigBuilder::default()
                .max_bucket_size(args.bucket_size)
                .ijgp_probability(args.ijgp_probability)
                .max_iterations(args.ijgp_iterations)
                .max_domain_intervals(args.domain_intervals)
                .max_values_from_interval(args.values_from_interval)
                .build()
                .unwrap(),
            rng,
        )),
    };

    let mut sample = Assignment::new();
    for _ in 0..args.num_samples {
        if sampler.get_sample(&mut sample) {
            println!("SAMPLE {} | {}", scorer.eval(&sample), fmt_assignment(&sample));
        } else {
            println!("No solution exists.");
            break;
        }
    }
}

fn fmt_assignment(assignment: &Assignment) -> String {
    assignment
        .iter()
        .map(|(variable, value)| format!("{}: {}", variable.id(), value))
        .collect::<Vec<String>>()
        .join(", ")
}
