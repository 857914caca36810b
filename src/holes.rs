//! Idle-time interval allocator ("holes").
//!
//! Tracks the free time of one machine as a set of disjoint intervals,
//! ordered by (duration, end). A fresh list holds a single interval
//! `[0, ∞)`. Allocating an operation only ever removes free time:
//! [`HoleList::reduce`] consumes the head of an interval, [`HoleList::cut`]
//! carves a slot out of its middle and keeps the leading gap.
//!
//! The allocator backs the no-wait evaluation of a finished schedule
//! (see [`crate::permutation::PermutationSchedule::evaluate_no_wait`]); it is
//! independent of the incremental head/tail construction.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{Time, INFINITE_TIME};

/// Placement policy for operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolePolicy {
    /// Earliest-starting hole that fits.
    #[default]
    Earliest,
    /// Smallest hole (by duration, then end) that fits.
    Smallest,
}

/// A free interval `[end - len, end)`.
///
/// Field order gives the set ordering: by length, then by end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    /// Length of the interval.
    pub len: Time,
    /// Exclusive end.
    pub end: Time,
}

impl Interval {
    /// Creates an interval of length `len` ending at `end`.
    pub fn new(len: Time, end: Time) -> Self {
        debug_assert!(len <= end);
        Self { len, end }
    }

    /// Start of the interval.
    #[inline]
    pub fn start(&self) -> Time {
        self.end - self.len
    }

    /// Usable length for an operation ready at `ready`.
    #[inline]
    pub fn available(&self, ready: Time) -> Time {
        let s = self.start().max(ready);
        self.end.saturating_sub(s)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.start(), self.end)
    }
}

/// Free time of one machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleList {
    holes: BTreeSet<Interval>,
}

impl Default for HoleList {
    fn default() -> Self {
        Self::new()
    }
}

impl HoleList {
    /// A machine that is free from time 0 on.
    pub fn new() -> Self {
        let mut holes = BTreeSet::new();
        holes.insert(Interval::new(INFINITE_TIME, INFINITE_TIME));
        Self { holes }
    }

    /// Number of holes.
    pub fn len(&self) -> usize {
        self.holes.len()
    }

    /// Whether no free time is left.
    pub fn is_empty(&self) -> bool {
        self.holes.is_empty()
    }

    /// Holes in set order.
    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.holes.iter()
    }

    /// Sum of all hole lengths.
    pub fn total_free(&self) -> Time {
        self.holes.iter().map(|h| h.len).sum()
    }

    /// Earliest-starting hole with room for `p` after `ready`.
    ///
    /// Scans every hole not smaller than `(p, ready)` in set order; falls
    /// back to the largest hole, which for a fresh list is the unbounded tail.
    pub fn earliest(&self, p: Time, ready: Time) -> Option<Interval> {
        let mut best = *self.holes.last()?;
        for h in self.holes.range(Interval { len: p, end: ready }..) {
            if p <= h.available(ready) && h.start() < best.start() {
                best = *h;
            }
        }
        Some(best)
    }

    /// Smallest hole with room for `p` after `ready`.
    pub fn smallest(&self, p: Time, ready: Time) -> Option<Interval> {
        self.holes
            .range(Interval { len: p, end: 0 }..)
            .find(|h| h.available(ready) >= p)
            .copied()
    }

    /// Selects a hole according to `policy`.
    pub fn select(&self, policy: HolePolicy, p: Time, ready: Time) -> Option<Interval> {
        match policy {
            HolePolicy::Earliest => self.earliest(p, ready),
            HolePolicy::Smallest => self.smallest(p, ready),
        }
    }

    /// Consumes `amount` from the start of `hole`. Returns whether the hole
    /// was used up and removed.
    pub fn reduce(&mut self, hole: Interval, amount: Time) -> bool {
        let removed = self.holes.remove(&hole);
        debug_assert!(removed, "hole {hole} not in list");
        if hole.len <= amount {
            true
        } else {
            self.holes.insert(Interval::new(hole.len - amount, hole.end));
            false
        }
    }

    /// Allocates `[ready, ready + p)` inside `hole`, keeping the gap
    /// `[start, ready)` as a separate hole.
    pub fn cut(&mut self, hole: Interval, ready: Time, p: Time) {
        let s = hole.start();
        debug_assert!(s <= ready);
        self.reduce(hole, ready + p - s);
        if s < ready {
            self.holes.insert(Interval::new(ready - s, ready));
        }
    }

    /// Allocates an operation of length `p` ready at `ready` into `hole`.
    /// Returns its start time.
    pub fn allocate(&mut self, hole: Interval, ready: Time, p: Time) -> Time {
        let s = hole.start();
        if ready <= s {
            self.reduce(hole, p);
            s
        } else {
            self.cut(hole, ready, p);
            ready
        }
    }
}

impl fmt::Display for HoleList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for h in &self.holes {
            write!(f, "{h} ")?;
        }
        Ok(())
    }
}
