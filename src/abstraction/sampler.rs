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

//! This module defines the common surface of all the samplers shipped with
//! this library.

use crate::Assignment;

/// An object able to draw assignments from the solution space of a weighted
/// CSP, with probability mass proportional to the product of the constraint
/// evaluations.
pub trait Sampler {
    /// Attempts to draw one full assignment. On success, `out` holds a value
    /// for every variable of the problem and the method returns true. When no
    /// assignment is reachable (a hard constraint emptied some domain, or
    /// every candidate value was exhausted at some level), the method returns
    /// false and the content of `out` is unspecified.
    ///
    /// On exit -- successful or not -- the domains of the underlying problem
    /// are exactly what they were on entry.
    fn get_sample(&mut self, out: &mut Assignment) -> bool;
}
