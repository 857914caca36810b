//! Head and tail completion-time arrays for insertion.
//!
//! For a prefix `[1, fbegin)`:
//! - `head(i, k)`: completion time on machine `i` of the job at position `k`
//!   when positions `1..=k` are scheduled from time 0.
//! - `tail(i, k)`: the same quantity for the reversed problem, over the last
//!   `k` scheduled positions `[fbegin - k, fbegin)` read back to front.
//!
//! Column 0 and row 0 are never written and stay zero. Callers recompute
//! only the range a structural change invalidated.
//!
//! # Reference
//! Taillard (1990), "Some efficient heuristic methods for the flow shop
//! sequencing problem"

use std::ops::Range;

use crate::models::{Instance, Job, Time};

/// Owned head/tail buffers sized `(m + 1) × (n + 1)`.
#[derive(Debug, Clone)]
pub(crate) struct HeadTail {
    cols: usize,
    heads: Vec<Time>,
    tails: Vec<Time>,
}

impl HeadTail {
    pub(crate) fn new(instance: &Instance) -> Self {
        let cols = instance.jobs() + 1;
        let size = (instance.machines() + 1) * cols;
        Self {
            cols,
            heads: vec![0; size],
            tails: vec![0; size],
        }
    }

    #[inline]
    pub(crate) fn head(&self, i: usize, k: usize) -> Time {
        self.heads[i * self.cols + k]
    }

    #[inline]
    pub(crate) fn tail(&self, i: usize, k: usize) -> Time {
        self.tails[i * self.cols + k]
    }

    /// Recomputes heads for positions in `range` from heads at `range.start - 1`.
    pub(crate) fn recompute_heads(&mut self, instance: &Instance, seq: &[Job], range: Range<usize>) {
        for k in range {
            self.head_column(instance, seq[k], k);
        }
    }

    /// Recomputes heads for `range` and the running prefix flow times
    /// `flow[k] = flow[k - 1] + C(job at k)`.
    pub(crate) fn recompute_heads_flowtimes(
        &mut self,
        instance: &Instance,
        seq: &[Job],
        range: Range<usize>,
        flow: &mut [Time],
    ) {
        for k in range {
            let ck = self.head_column(instance, seq[k], k);
            flow[k] = flow[k - 1] + ck;
        }
    }

    /// Recomputes tails `range` of a prefix ending before `fbegin`. Index `k`
    /// covers the job at position `fbegin - k`.
    pub(crate) fn recompute_tails(
        &mut self,
        instance: &Instance,
        seq: &[Job],
        fbegin: usize,
        range: Range<usize>,
    ) {
        let m = instance.machines();
        for k in range {
            let j = seq[fbegin - k];
            let mut ck = 0;
            for i in (1..=m).rev() {
                let p = instance.p(j, i);
                let prev = self.tails[i * self.cols + k - 1];
                self.tails[i * self.cols + k] = if p == 0 {
                    prev
                } else {
                    ck = ck.max(prev) + p;
                    ck
                };
            }
        }
    }

    /// Fills head column `k` for job `j`; returns the job's completion time.
    fn head_column(&mut self, instance: &Instance, j: Job, k: usize) -> Time {
        let mut ck = 0;
        for i in 1..=instance.machines() {
            let p = instance.p(j, i);
            let prev = self.heads[i * self.cols + k - 1];
            self.heads[i * self.cols + k] = if p == 0 {
                prev
            } else {
                ck = ck.max(prev) + p;
                ck
            };
        }
        ck
    }
}
