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

//! This module is all about reading an instance in the standard WCSP textual
//! format: a header line, a line of domain sizes, then one block per tabular
//! constraint (scope, default weight and exception tuples).

use std::{
    fs::File,
    io::{BufRead, BufReader, Lines},
    num::ParseIntError,
    path::Path,
    sync::Arc,
};

use ijgp::*;

/// This enumeration simply groups the kind of errors that might occur when
/// parsing a wcsp instance from file. There can be io errors (file
/// unavailable ?), format errors (e.g. a truncated constraint block), or
/// parse int errors (the parser expected an integer but got ... something
/// else).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// There was an io related error
    #[error("io error {0}")]
    Io(#[from] std::io::Error),
    /// The parser expected to read something that was an integer but got
    /// some garbage
    #[error("parse int {0}")]
    ParseInt(#[from] ParseIntError),
    /// The file was not properly formatted.
    #[error("ill formed instance")]
    Format,
}

/// Reads one instance file and returns the problem ingredients: the variable
/// domains, the tabular constraints, and the weight configuration they
/// share.
pub fn read_instance<P: AsRef<Path>>(
    path: P,
    exp_k: f64,
) -> Result<(Domains, Vec<Arc<dyn Constraint>>, Arc<CostModel>), Error> {
    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();

    // Header: problem name, #variables, max domain size, #constraints and
    // the weight from which a tuple is considered forbidden.
    let header = tokens_of(&mut lines)?;
    if header.len() < 5 {
        return Err(Error::Format);
    }
    let hard_weight = header[4].parse::<u64>()?;

    let costs = Arc::new(CostModelBuilder::default().exp_k(exp_k).build().unwrap());

    // One domain size per variable, in variable order.
    let mut domains = Domains::new();
    for (id, token) in tokens_of(&mut lines)?.iter().enumerate() {
        let size = token.parse::<Value>()?;
        domains.insert(Variable(id), Domain::range(0, size - 1));
    }

    let mut constraints: Vec<Arc<dyn Constraint>> = vec![];
    loop {
        let block = match tokens_of(&mut lines) {
            Err(Error::Format) => break, // no more constraint blocks
            other => other?,
        };
        if block.len() < 3 {
            return Err(Error::Format);
        }
        let arity = block[0].parse::<usize>()?;
        if block.len() < arity + 3 {
            return Err(Error::Format);
        }
        let scope = block[1..=arity]
            .iter()
            .map(|token| token.parse::<usize>().map(Variable))
            .collect::<Result<Vec<Variable>, ParseIntError>>()?;
        let default_weight = block[block.len() - 2].parse::<u64>()?;
        let nb_tuples = block[block.len() - 1].parse::<usize>()?;

        // Tuple values are laid out in the file's scope order; the table
        // itself is keyed in ascending variable order.
        let mut order = (0..arity).collect::<Vec<usize>>();
        order.sort_by_key(|i| scope[*i]);

        let mut table =
            TableConstraint::new(scope.iter().copied(), default_weight, hard_weight, Arc::clone(&costs));
        for _ in 0..nb_tuples {
            let tuple_line = tokens_of(&mut lines)?;
            if tuple_line.len() < arity + 1 {
                return Err(Error::Format);
            }
            let raw = tuple_line[..arity]
                .iter()
                .map(|token| token.parse::<Value>())
                .collect::<Result<Vec<Value>, ParseIntError>>()?;
            let weight = tuple_line[arity].parse::<u64>()?;
            let tuple = order.iter().map(|i| raw[*i]).collect::<Vec<Value>>();
            table.add_tuple(tuple, weight);
        }
        constraints.push(Arc::new(table));
    }

    Ok((domains, constraints, costs))
}

/// The next non-empty line, split on whitespace.
fn tokens_of(lines: &mut Lines<BufReader<File>>) -> Result<Vec<String>, Error> {
    for line in lines.by_ref() {
        let line = line?;
        let tokens = line
            .split_whitespace()
            .map(str::to_string)
            .collect::<Vec<String>>();
        if !tokens.is_empty() {
            return Ok(tokens);
        }
    }
    Err(Error::Format)
}
