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

//! This module defines the most basic data types that are used throughout all
//! the code of our library (both at the abstraction and implementation levels).
//! These are also the types your client library is likely to work with.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use rand::Rng;

// ----------------------------------------------------------------------------
// --- VARIABLE ---------------------------------------------------------------
// ----------------------------------------------------------------------------
/// This type denotes a variable from the constraint problem at hand.
/// In this case, each variable is assumed to be identified with an integer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Variable(pub usize);
impl Variable {
    #[inline]
    /// Unwraps the numeric identifier of the variable, which is handy when
    /// indexing per-variable data or printing an assignment.
    ///
    /// # Examples:
    /// ```
    /// # use ijgp::Variable;
    /// let x = Variable(7);
    /// assert_eq!(7, x.id());
    /// ```
    pub fn id(self) -> usize {
        self.0
    }
}

// ----------------------------------------------------------------------------
// --- VALUE, ASSIGNMENT AND SCOPE --------------------------------------------
// ----------------------------------------------------------------------------
/// A value that can be assumed by one of the problem variables. All the
/// domains manipulated by this library are finite ordered sets of these.
pub type Value = isize;

/// A (possibly partial) assignment of values to the problem variables. The
/// ordered representation guarantees that iterating an assignment always
/// follows the variable numbering, which the samplers rely on when they build
/// their evidence prefix by prefix.
pub type Assignment = BTreeMap<Variable, Value>;

/// The scope of a constraint or of a join-graph cluster: the set of variables
/// it bears on.
pub type Scope = BTreeSet<Variable>;

/// The domains of all the variables of a problem, keyed by variable.
pub type Domains = BTreeMap<Variable, Domain>;

/// Projects an assignment onto the set of variables it binds. This is mostly
/// useful to compute the visible portion of a separator during message
/// passing.
pub fn assignment_scope(a: &Assignment) -> Scope {
    a.keys().copied().collect()
}

// ----------------------------------------------------------------------------
// --- DOMAIN -----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The domain of one variable: a finite, totally ordered set of integer
/// values. On top of the usual set operations, a domain supports the two
/// reversible mutations used during sampling: `restrict_to` which temporarily
/// pins the domain onto a single value, and `restore` which unions a
/// previously removed set of values back in.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Domain(BTreeSet<Value>);

impl Domain {
    /// Creates an empty domain.
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }
    /// Creates the domain comprising all values between `lo` and `hi`
    /// (inclusive on both ends).
    ///
    /// # Examples:
    /// ```
    /// # use ijgp::Domain;
    /// let dom = Domain::range(0, 3);
    /// assert_eq!(4, dom.len());
    /// assert!(dom.contains(0) && dom.contains(3));
    /// ```
    pub fn range(lo: Value, hi: Value) -> Self {
        Self((lo..=hi).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn contains(&self, value: Value) -> bool {
        self.0.contains(&value)
    }
    pub fn insert(&mut self, value: Value) {
        self.0.insert(value);
    }
    pub fn remove(&mut self, value: Value) {
        self.0.remove(&value);
    }
    pub fn clear(&mut self) {
        self.0.clear();
    }
    /// Iterates the domain values in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        self.0.iter().copied()
    }

    /// Counts the values of the domain falling in the half open range
    /// `[lb, ub)`.
    ///
    /// # Examples:
    /// ```
    /// # use ijgp::Domain;
    /// let dom = Domain::from_iter([2, 5, 7, 11]);
    /// assert_eq!(2, dom.count_between(3, 11));
    /// ```
    pub fn count_between(&self, lb: Value, ub: Value) -> usize {
        if lb >= ub {
            0
        } else {
            self.0.range(lb..ub).count()
        }
    }
    /// The smallest domain value that is greater than or equal to `lb`.
    pub fn min_at_least(&self, lb: Value) -> Option<Value> {
        self.0.range(lb..).next().copied()
    }
    /// The largest domain value that is strictly less than `ub`.
    pub fn max_below(&self, ub: Value) -> Option<Value> {
        self.0.range(..ub).next_back().copied()
    }
    /// Tells whether the domain holds at least one value in the open range
    /// `(lo, hi)` (both bounds excluded).
    pub fn any_strictly_between(&self, lo: Value, hi: Value) -> bool {
        self.0
            .range((Bound::Excluded(lo), Bound::Excluded(hi)))
            .next()
            .is_some()
    }

    /// Replaces the domain with the singleton `{value}` and returns the set
    /// of values that were removed in the process. Feeding that set back to
    /// `restore` undoes the restriction.
    pub fn restrict_to(&mut self, value: Value) -> Domain {
        let mut removed = std::mem::take(&mut self.0);
        removed.remove(&value);
        self.0.insert(value);
        Domain(removed)
    }
    /// Unions a previously removed set of values back into the domain.
    pub fn restore(&mut self, removed: &Domain) {
        for value in removed.iter() {
            self.0.insert(value);
        }
    }

    /// Picks one domain value uniformly at random.
    pub fn pick_uniform<R: Rng>(&self, rng: &mut R) -> Option<Value> {
        if self.0.is_empty() {
            None
        } else {
            let index = rng.gen_range(0..self.0.len());
            self.0.iter().nth(index).copied()
        }
    }
    /// Picks one value uniformly at random among the domain values falling in
    /// the half open range `[lb, ub)`.
    pub fn pick_uniform_between<R: Rng>(&self, rng: &mut R, lb: Value, ub: Value) -> Option<Value> {
        let count = self.count_between(lb, ub);
        if count == 0 {
            None
        } else {
            let index = rng.gen_range(0..count);
            self.0.range(lb..ub).nth(index).copied()
        }
    }
}

impl FromIterator<Value> for Domain {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_domain {
    use rand::{rngs::StdRng, SeedableRng};

    use crate::Domain;

    #[test]
    fn range_is_inclusive_on_both_ends() {
        let dom = Domain::range(-2, 2);
        assert_eq!(vec![-2, -1, 0, 1, 2], dom.iter().collect::<Vec<_>>());
    }

    #[test]
    fn count_between_is_half_open() {
        let dom = Domain::from_iter([0, 1, 2, 3, 4]);
        assert_eq!(2, dom.count_between(1, 3));
        assert_eq!(0, dom.count_between(3, 3));
        assert_eq!(0, dom.count_between(5, 2));
    }

    #[test]
    fn bounds_lookups() {
        let dom = Domain::from_iter([2, 5, 7]);
        assert_eq!(Some(5), dom.min_at_least(3));
        assert_eq!(Some(2), dom.min_at_least(2));
        assert_eq!(None, dom.min_at_least(8));
        assert_eq!(Some(5), dom.max_below(7));
        assert_eq!(None, dom.max_below(2));
        assert!(dom.any_strictly_between(2, 7));
        assert!(!dom.any_strictly_between(5, 7));
    }

    #[test]
    fn restrict_then_restore_is_identity() {
        let mut dom = Domain::from_iter([1, 2, 3, 4]);
        let before = dom.clone();
        let removed = dom.restrict_to(3);
        assert_eq!(vec![3], dom.iter().collect::<Vec<_>>());
        assert_eq!(vec![1, 2, 4], removed.iter().collect::<Vec<_>>());
        dom.restore(&removed);
        assert_eq!(before, dom);
    }

    #[test]
    fn uniform_picks_stay_in_range() {
        let dom = Domain::from_iter([0, 3, 6, 9]);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let picked = dom.pick_uniform_between(&mut rng, 3, 9).unwrap();
            assert!(picked == 3 || picked == 6);
        }
        assert_eq!(None, dom.pick_uniform_between(&mut rng, 4, 6));
    }
}
