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

//! This module is all about reading a frequency-assignment dataset directory
//! (`costs.txt`, `dom.txt`, `var.txt`, `ctr.txt`) and turning it into the
//! variables and constraints of a weighted CSP.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    num::{ParseFloatError, ParseIntError},
    path::Path,
    sync::Arc,
};

use ijgp::*;

/// This enumeration simply groups the kind of errors that might occur when
/// parsing a dataset from files. There can be io errors (file unavailable ?),
/// format errors (e.g. a constraint line missing its operator), or parse
/// errors (the parser expected a number but got ... something else).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// There was an io related error
    #[error("io error {0}")]
    Io(#[from] std::io::Error),
    /// The parser expected to read something that was an integer but got
    /// some garbage
    #[error("parse int {0}")]
    ParseInt(#[from] ParseIntError),
    /// The parser expected to read something that was a float but got some
    /// garbage
    #[error("parse float {0}")]
    ParseFloat(#[from] ParseFloatError),
    /// The file was not properly formatted.
    #[error("ill formed instance")]
    Format,
}

/// Reads a whole dataset directory and returns the problem ingredients: the
/// variable domains, the constraints, and the weight configuration they
/// share.
pub fn read_instance<P: AsRef<Path>>(
    dir: P,
    exp_k: f64,
) -> Result<(Domains, Vec<Arc<dyn Constraint>>, Arc<CostModel>), Error> {
    let dir = dir.as_ref();
    let (interference, mobility) = read_costs(dir.join("costs.txt"))?;
    let costs = Arc::new(
        CostModelBuilder::default()
            .interference_costs(interference)
            .mobility_costs(mobility)
            .exp_k(exp_k)
            .build()
            .unwrap(),
    );

    let pool = read_domain_pool(dir.join("dom.txt"))?;
    let mut constraints = read_constraints(dir.join("ctr.txt"), &costs)?;
    let domains = read_variables(dir.join("var.txt"), &pool, &costs, &mut constraints)?;
    Ok((domains, constraints, costs))
}

/// The costs file holds two rows of floats: the interference violation costs
/// and the mobility costs, both indexed by `weight - 1`.
fn read_costs<P: AsRef<Path>>(path: P) -> Result<(Vec<f64>, Vec<f64>), Error> {
    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();

    let mut read_row = |lines: &mut std::io::Lines<BufReader<File>>| -> Result<Vec<f64>, Error> {
        let line = lines.next().ok_or(Error::Format)??;
        line.split_whitespace()
            .map(|token| token.parse::<f64>().map_err(Error::from))
            .collect()
    };

    let interference = read_row(&mut lines)?;
    let mobility = read_row(&mut lines)?;
    Ok((interference, mobility))
}

/// The domains file lists one domain per line: an identifier followed by the
/// member values. Domains are referenced by their position in the file.
fn read_domain_pool<P: AsRef<Path>>(path: P) -> Result<Vec<Domain>, Error> {
    let file = File::open(path)?;
    let mut pool = vec![];
    for line in BufReader::new(file).lines() {
        let line = line?;
        let mut tokens = line.split_whitespace();
        let _id = tokens.next();
        let domain = tokens
            .map(|token| token.parse::<Value>().map_err(Error::from))
            .collect::<Result<Domain, Error>>()?;
        pool.push(domain);
    }
    Ok(pool)
}

/// The variables file gives `var-id domain-id [preferred-value weight]` per
/// line; the optional pair yields a mobility preference constraint.
fn read_variables<P: AsRef<Path>>(
    path: P,
    pool: &[Domain],
    costs: &Arc<CostModel>,
    constraints: &mut Vec<Arc<dyn Constraint>>,
) -> Result<Domains, Error> {
    let file = File::open(path)?;
    let mut domains = Domains::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let tokens = line.split_whitespace().collect::<Vec<&str>>();
        if tokens.len() < 2 {
            continue;
        }
        let variable = Variable(tokens[0].parse::<usize>()?);
        let domain_id = tokens[1].parse::<usize>()?;
        let domain = pool.get(domain_id).ok_or(Error::Format)?;
        domains.insert(variable, domain.clone());

        if tokens.len() >= 4 {
            constraints.push(Arc::new(PreferenceConstraint::new(
                variable,
                tokens[2].parse::<Value>()?,
                tokens[3].parse::<usize>()?,
                Arc::clone(costs),
            )));
        }
    }
    Ok(domains)
}

/// The constraints file gives `v1 v2 kind op target [weight]` per line, each
/// describing one binary difference relation.
fn read_constraints<P: AsRef<Path>>(
    path: P,
    costs: &Arc<CostModel>,
) -> Result<Vec<Arc<dyn Constraint>>, Error> {
    let file = File::open(path)?;
    let mut constraints: Vec<Arc<dyn Constraint>> = vec![];
    for line in BufReader::new(file).lines() {
        let line = line?;
        let tokens = line.split_whitespace().collect::<Vec<&str>>();
        if tokens.len() < 5 {
            if !tokens.is_empty() {
                eprintln!("wrong constraint specified: {line}");
            }
            continue;
        }
        let v1 = Variable(tokens[0].parse::<usize>()?);
        let v2 = Variable(tokens[1].parse::<usize>()?);
        let relation = match tokens[3] {
            ">" => DistanceRelation::Greater,
            "<" => DistanceRelation::Less,
            _ => DistanceRelation::Equal,
        };
        let target = tokens[4].parse::<Value>()?;
        let weight = if tokens.len() >= 6 {
            tokens[5].parse::<usize>()?
        } else {
            0
        };
        constraints.push(Arc::new(DistanceConstraint::new(
            v1,
            v2,
            relation,
            target,
            weight,
            Arc::clone(costs),
        )));
    }
    Ok(constraints)
}
