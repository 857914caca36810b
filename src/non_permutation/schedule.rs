//! Non-permutation schedule: one job order per machine.
//!
//! Orders are stored 1-based in a flat `(m + 1) × (n + 1)` table with a rank
//! index `rank(i, order(i)[k]) == k`. All machines share the split index
//! `fbegin`; positions `[1, fbegin)` are scheduled.

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::models::{Instance, Job, ScheduleResult, Time, INFINITE_TIME};
use crate::permutation::PermutationSchedule;
use crate::validation::is_permutation;

/// A (possibly partial) non-permutation schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonPermutationSchedule {
    cols: usize,
    orders: Vec<Job>,
    ranks: Vec<usize>,
    pub(crate) fbegin: usize,
    pub(crate) of: Time,
}

impl NonPermutationSchedule {
    /// Every machine uses the identity order.
    pub fn identity(instance: &Instance) -> Self {
        let row: Vec<Job> = (1..=instance.jobs()).collect();
        Self::from_rows(instance, vec![row; instance.machines()])
    }

    /// Every machine uses the order of `schedule`. The flow time of the
    /// complete order becomes the objective value.
    pub fn from_permutation(instance: &Instance, schedule: &PermutationSchedule) -> Self {
        let row = schedule.order().to_vec();
        Self::from_rows(instance, vec![row; instance.machines()])
    }

    /// Builds a complete schedule from one 1-based order per machine.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidPermutation`] naming the first machine whose
    /// order is not a permutation of `{1..n}`.
    pub fn from_orders(instance: &Instance, rows: Vec<Vec<Job>>) -> Result<Self> {
        let n = instance.jobs();
        if rows.len() != instance.machines() {
            return Err(ScheduleError::InvalidPermutation {
                machine: rows.len().min(instance.machines()) + 1,
            });
        }
        for (i, row) in rows.iter().enumerate() {
            let mut seq = Vec::with_capacity(n + 1);
            seq.push(0);
            seq.extend_from_slice(row);
            if !is_permutation(&seq, n) {
                return Err(ScheduleError::InvalidPermutation { machine: i + 1 });
            }
        }
        Ok(Self::from_rows(instance, rows))
    }

    fn from_rows(instance: &Instance, rows: Vec<Vec<Job>>) -> Self {
        let (n, m) = (instance.jobs(), instance.machines());
        let cols = n + 1;
        let mut orders = vec![0; (m + 1) * cols];
        for (i, row) in rows.iter().enumerate() {
            let base = (i + 1) * cols;
            orders[base + 1..base + cols].copy_from_slice(row);
        }
        let mut schedule = Self {
            cols,
            orders,
            ranks: vec![0; (m + 1) * cols],
            fbegin: cols,
            of: INFINITE_TIME,
        };
        schedule.rebuild_ranks();
        schedule.of = schedule.makespan_flowtime(instance).1;
        schedule
    }

    /// Reads the serialized form: `n · m` zero-based job ids, machine by
    /// machine, lines starting with `#` ignored.
    pub fn parse(instance: &Instance, text: &str) -> Result<Self> {
        let n = instance.jobs();
        let mut ids = Vec::with_capacity(n * instance.machines());
        for (line_no, line) in text.lines().enumerate() {
            if line.starts_with('#') {
                continue;
            }
            for tok in line.split_whitespace() {
                let j: Job = tok.parse().map_err(|_| ScheduleError::Parse {
                    line: line_no + 1,
                    message: format!("invalid job id '{tok}'"),
                })?;
                ids.push(j + 1);
            }
        }
        if ids.len() != n * instance.machines() {
            return Err(ScheduleError::Parse {
                line: text.lines().count(),
                message: format!(
                    "expected {} job ids, found {}",
                    n * instance.machines(),
                    ids.len()
                ),
            });
        }
        let rows = ids.chunks(n.max(1)).map(<[Job]>::to_vec).collect();
        Self::from_orders(instance, rows)
    }

    /// Writes one line of zero-based ids per machine.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for i in 1..=self.machines() {
            for &j in self.order(i) {
                write!(out, "{} ", j - 1)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// The serialized form produced by [`write_to`](Self::write_to).
    pub fn to_zero_based_string(&self) -> String {
        let mut buf = Vec::new();
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Number of jobs.
    pub fn len(&self) -> usize {
        self.cols - 1
    }

    /// Whether the schedule has no jobs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of machines.
    pub fn machines(&self) -> usize {
        self.orders.len() / self.cols - 1
    }

    /// Complete order of machine `i`, without the sentinel.
    pub fn order(&self, i: usize) -> &[Job] {
        &self.row(i)[1..]
    }

    /// Position of job `j` on machine `i`.
    #[inline]
    pub fn rank(&self, i: usize, j: Job) -> usize {
        self.ranks[i * self.cols + j]
    }

    /// Job at position `k` on machine `i`.
    #[inline]
    pub fn job_at(&self, i: usize, k: usize) -> Job {
        self.orders[i * self.cols + k]
    }

    /// Number of scheduled positions per machine.
    pub fn scheduled(&self) -> usize {
        self.fbegin - 1
    }

    /// Whether every job is scheduled.
    pub fn is_complete(&self) -> bool {
        self.fbegin == self.cols
    }

    /// Maintained objective (flow time).
    pub fn objective(&self) -> Time {
        self.of
    }

    /// Whether all machines use the same order.
    pub fn is_permutation_schedule(&self) -> bool {
        (2..=self.machines()).all(|i| self.order(i) == self.order(1))
    }

    /// Whether every order is a permutation and the rank index agrees with it.
    pub fn is_consistent(&self) -> bool {
        (1..=self.machines()).all(|i| {
            is_permutation(self.row(i), self.len())
                && (1..self.cols).all(|k| self.rank(i, self.job_at(i, k)) == k)
        })
    }

    /// Makespan and flow time of the scheduled positions.
    pub fn makespan_flowtime(&self, instance: &Instance) -> (Time, Time) {
        let mut cj = vec![0; self.cols];
        let mut ms = 0;
        for i in 1..=self.machines() {
            let mut ci = 0;
            for &j in &self.row(i)[1..self.fbegin] {
                let p = instance.p(j, i);
                if p > 0 {
                    ci = ci.max(cj[j]) + p;
                    cj[j] = ci;
                }
            }
            ms = ms.max(ci);
        }
        (ms, cj.iter().sum())
    }

    /// Completion time of every scheduled job on every machine, indexed
    /// `[machine][job]`. A missing operation carries the job's completion
    /// on its previous machine.
    pub fn completion_times(&self, instance: &Instance) -> Vec<Vec<Time>> {
        let m = self.machines();
        let mut c = vec![vec![0; self.cols]; m + 1];
        let mut cj = vec![0; self.cols];
        for i in 1..=m {
            let mut ci = 0;
            for &j in &self.row(i)[1..self.fbegin] {
                let p = instance.p(j, i);
                if p > 0 {
                    ci = ci.max(cj[j]) + p;
                    cj[j] = ci;
                }
                c[i][j] = cj[j];
            }
        }
        c
    }

    /// Result triple for reporting.
    pub fn result(&self, instance: &Instance, time_found: f64) -> ScheduleResult {
        let (ms, ft) = self.makespan_flowtime(instance);
        ScheduleResult::new(ms, ft, time_found)
    }

    #[inline]
    fn row(&self, i: usize) -> &[Job] {
        &self.orders[i * self.cols..(i + 1) * self.cols]
    }

    /// Swaps positions `k - 1` and `k` on machine `i` without touching ranks.
    /// Callers undo the swap before ranks are read again.
    #[inline]
    pub(crate) fn swap_adjacent(&mut self, i: usize, k: usize) {
        let base = i * self.cols;
        self.orders.swap(base + k - 1, base + k);
    }

    /// Moves the job at position `to` of machine `i` to `from`, shifting
    /// `from..to` one step right, and refreshes their ranks.
    pub(crate) fn rotate_right(&mut self, i: usize, from: usize, to: usize) {
        let base = i * self.cols;
        self.orders[base + from..=base + to].rotate_right(1);
        self.refresh_ranks(i, from, to);
    }

    /// Moves the job at position `from` of machine `i` to `to`, shifting
    /// `from + 1..=to` one step left, and refreshes their ranks.
    pub(crate) fn rotate_left(&mut self, i: usize, from: usize, to: usize) {
        let base = i * self.cols;
        self.orders[base + from..=base + to].rotate_left(1);
        self.refresh_ranks(i, from, to);
    }

    fn refresh_ranks(&mut self, i: usize, from: usize, to: usize) {
        let base = i * self.cols;
        for k in from..=to {
            let j = self.orders[base + k];
            self.ranks[base + j] = k;
        }
    }

    /// Rotates positions `1..=last` of every machine one step left, without
    /// touching ranks.
    pub(crate) fn rotate_prefix_left(&mut self, last: usize) {
        for i in 1..=self.machines() {
            let base = i * self.cols;
            self.orders[base + 1..=base + last].rotate_left(1);
        }
    }

    fn rebuild_ranks(&mut self) {
        for i in 1..=self.machines() {
            let base = i * self.cols;
            for k in 1..self.cols {
                let j = self.orders[base + k];
                self.ranks[base + j] = k;
            }
        }
    }
}

impl fmt::Display for NonPermutationSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<")?;
        for i in 1..=self.machines() {
            if i > 1 {
                write!(f, "|")?;
            }
            let jobs: Vec<String> = self.row(i)[1..self.fbegin]
                .iter()
                .map(|j| j.to_string())
                .collect();
            write!(f, "{}", jobs.join(","))?;
        }
        write!(f, ";of={}>", self.of)
    }
}
