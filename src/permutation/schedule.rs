//! Permutation schedule: one job order shared by all machines.
//!
//! The order is stored 1-based with slot 0 as a sentinel. A split index
//! `fbegin` separates the scheduled prefix `[1, fbegin)` from the
//! unscheduled suffix `[fbegin, n]`; only the prefix contributes to the
//! objective. A complete schedule has `fbegin == n + 1`.

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::holes::{HoleList, HolePolicy};
use crate::models::{Instance, Job, ScheduleResult, Time};
use crate::validation::{is_permutation, validate_permutation};

/// Objective of a schedule that has not been evaluated. Flow times of valid
/// instances can exceed `INFINITE_TIME` but never reach this.
const UNEVALUATED: Time = Time::MAX;

/// A (possibly partial) permutation schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermutationSchedule {
    pub(crate) seq: Vec<Job>,
    pub(crate) fbegin: usize,
    pub(crate) of: Time,
}

impl PermutationSchedule {
    /// Identity order `1, 2, ..., n`, complete but not yet evaluated.
    pub fn identity(instance: &Instance) -> Self {
        let n = instance.jobs();
        Self {
            seq: (0..=n).collect(),
            fbegin: n + 1,
            of: UNEVALUATED,
        }
    }

    /// Complete schedule from a 1-based job order (no sentinel).
    ///
    /// # Errors
    /// [`ScheduleError::InvalidPermutation`] unless `order` is a permutation
    /// of `{1..n}`.
    pub fn from_order(instance: &Instance, order: &[Job]) -> Result<Self> {
        let n = instance.jobs();
        let mut seq = Vec::with_capacity(n + 1);
        seq.push(0);
        seq.extend_from_slice(order);
        validate_permutation(&seq, n).map_err(|_| ScheduleError::InvalidPermutation { machine: 0 })?;
        Ok(Self {
            seq,
            fbegin: n + 1,
            of: UNEVALUATED,
        })
    }

    /// Reads the serialized form: zero-based job ids separated by
    /// whitespace, lines starting with `#` ignored.
    pub fn parse(instance: &Instance, text: &str) -> Result<Self> {
        let mut order = Vec::with_capacity(instance.jobs());
        for (line_no, line) in text.lines().enumerate() {
            if line.starts_with('#') {
                continue;
            }
            for tok in line.split_whitespace() {
                let j: Job = tok.parse().map_err(|_| ScheduleError::Parse {
                    line: line_no + 1,
                    message: format!("invalid job id '{tok}'"),
                })?;
                order.push(j + 1);
            }
        }
        Self::from_order(instance, &order)
    }

    /// Writes the order as zero-based ids on one line.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for &j in &self.seq[1..] {
            write!(out, "{} ", j - 1)?;
        }
        writeln!(out)
    }

    /// The serialized form produced by [`write_to`](Self::write_to).
    pub fn to_zero_based_string(&self) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Number of jobs.
    pub fn len(&self) -> usize {
        self.seq.len() - 1
    }

    /// Whether the schedule has no jobs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scheduled prefix.
    pub fn jobs(&self) -> &[Job] {
        &self.seq[1..self.fbegin]
    }

    /// Unscheduled suffix.
    pub fn free_jobs(&self) -> &[Job] {
        &self.seq[self.fbegin..]
    }

    /// Whole order including the suffix.
    pub fn order(&self) -> &[Job] {
        &self.seq[1..]
    }

    /// Number of scheduled jobs (`fbegin - 1`).
    pub fn scheduled(&self) -> usize {
        self.fbegin - 1
    }

    /// Whether every job is scheduled.
    pub fn is_complete(&self) -> bool {
        self.fbegin == self.seq.len()
    }

    /// Maintained primary objective value.
    pub fn objective(&self) -> Time {
        self.of
    }

    /// Whether the objective has been computed.
    pub fn is_evaluated(&self) -> bool {
        self.of != UNEVALUATED
    }

    /// Whether the order is a permutation of `{1..n}`.
    pub fn is_valid_permutation(&self) -> bool {
        is_permutation(&self.seq, self.len())
    }

    /// Makespan and flow time of the scheduled prefix, from scratch.
    pub fn makespan_flowtime(&self, instance: &Instance) -> (Time, Time) {
        let m = instance.machines();
        let mut c = vec![0; m + 1];
        let (mut ms, mut ft) = (0, 0);
        for &j in self.jobs() {
            let mut cj = 0;
            for (i, ci) in c.iter_mut().enumerate().skip(1) {
                let p = instance.p(j, i);
                if p > 0 {
                    cj = (*ci).max(cj) + p;
                    *ci = cj;
                }
            }
            ft += cj;
            ms = ms.max(cj);
        }
        (ms, ft)
    }

    /// Completion time of every scheduled job on every machine, indexed
    /// `[machine][job]`. A missing operation carries the job's completion on
    /// its previous machine (0 before its first operation).
    pub fn completion_times(&self, instance: &Instance) -> Vec<Vec<Time>> {
        let (n, m) = (instance.jobs(), instance.machines());
        let mut c = vec![vec![0; n + 1]; m + 1];
        let mut machine_free = vec![0; m + 1];
        for &j in self.jobs() {
            let mut cj = 0;
            for i in 1..=m {
                let p = instance.p(j, i);
                if p > 0 {
                    cj = machine_free[i].max(cj) + p;
                    machine_free[i] = cj;
                }
                c[i][j] = cj;
            }
        }
        c
    }

    /// Result triple for reporting.
    pub fn result(&self, instance: &Instance, time_found: f64) -> ScheduleResult {
        let (ms, ft) = self.makespan_flowtime(instance);
        ScheduleResult::new(ms, ft, time_found)
    }

    /// Evaluates the order under the no-wait allocation model: jobs are
    /// taken in order and each operation goes into a free interval of its
    /// machine chosen by `policy`, no earlier than the job's previous
    /// operation ends. Returns `(makespan, flowtime)`.
    pub fn evaluate_no_wait(&self, instance: &Instance, policy: HolePolicy) -> Result<(Time, Time)> {
        let m = instance.machines();
        let mut holes = vec![HoleList::new(); m + 1];
        let (mut ms, mut ft) = (0, 0);
        for &j in self.order() {
            let mut ct = 0;
            for (i, machine) in holes.iter_mut().enumerate().skip(1) {
                let p = instance.p(j, i);
                if p == 0 {
                    continue;
                }
                let hole = machine
                    .select(policy, p, ct)
                    .ok_or(ScheduleError::NoFreeInterval { machine: i })?;
                ct = machine.allocate(hole, ct, p) + p;
            }
            ms = ms.max(ct);
            ft += ct;
        }
        Ok((ms, ft))
    }

    /// Sorts the scheduled prefix by decreasing total processing time,
    /// ties by increasing job id.
    pub fn total_time_order(&mut self, instance: &Instance) {
        let totals = instance.total_times();
        let fbegin = self.fbegin;
        self.seq[1..fbegin].sort_by(|&a, &b| totals[b].cmp(&totals[a]).then(a.cmp(&b)));
    }
}

impl fmt::Display for PermutationSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let jobs: Vec<String> = self.jobs().iter().map(|j| j.to_string()).collect();
        write!(f, "<{};of={}>", jobs.join(","), self.of)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_by_two() -> Instance {
        Instance::new(vec![vec![2, 3], vec![4, 1], vec![1, 5]], 0.0).unwrap()
    }

    #[test]
    fn test_identity() {
        let s = PermutationSchedule::identity(&three_by_two());
        assert_eq!(s.order(), &[1, 2, 3]);
        assert!(s.is_complete());
        assert!(!s.is_evaluated());
        assert!(s.is_valid_permutation());
    }

    #[test]
    fn test_makespan_flowtime() {
        let inst = three_by_two();
        let s = PermutationSchedule::from_order(&inst, &[3, 1, 2]).unwrap();
        // m1: 1, 3, 7   m2: 6, 9, 10
        assert_eq!(s.makespan_flowtime(&inst), (10, 25));
    }

    #[test]
    fn test_missing_operation_is_skipped() {
        // Job 1 skips machine 2: its machine-3 start only waits for machine 1.
        let inst = Instance::new(vec![vec![3, 0, 2], vec![1, 4, 2]], 1.0 / 6.0).unwrap();
        let s = PermutationSchedule::from_order(&inst, &[1, 2]).unwrap();
        // Job 1: m1 [0,3), m3 [3,5). Job 2: m1 [3,4), m2 [4,8), m3 [8,10).
        assert_eq!(s.makespan_flowtime(&inst), (10, 15));

        let c = s.completion_times(&inst);
        assert_eq!(c[1][1], 3);
        assert_eq!(c[2][1], 3); // inherited over the missing operation
        assert_eq!(c[3][1], 5);
        assert_eq!(c[2][2], 8);
        assert_eq!(c[3][2], 10);
    }

    #[test]
    fn test_from_order_rejects_non_permutation() {
        let inst = three_by_two();
        assert!(matches!(
            PermutationSchedule::from_order(&inst, &[1, 1, 2]),
            Err(ScheduleError::InvalidPermutation { .. })
        ));
        assert!(PermutationSchedule::from_order(&inst, &[1, 2]).is_err());
    }

    #[test]
    fn test_serialization() {
        let inst = three_by_two();
        let s = PermutationSchedule::from_order(&inst, &[3, 1, 2]).unwrap();
        assert_eq!(s.to_zero_based_string(), "2 0 1 \n");
        let back = PermutationSchedule::parse(&inst, "# comment\n2 0 1\n").unwrap();
        assert_eq!(back.order(), s.order());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let inst = three_by_two();
        assert!(matches!(
            PermutationSchedule::parse(&inst, "2 x 1"),
            Err(ScheduleError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_display() {
        let inst = three_by_two();
        let mut s = PermutationSchedule::from_order(&inst, &[3, 1, 2]).unwrap();
        s.of = 10;
        assert_eq!(s.to_string(), "<3,1,2;of=10>");
    }

    #[test]
    fn test_total_time_order() {
        let inst = three_by_two();
        let mut s = PermutationSchedule::identity(&inst);
        s.total_time_order(&inst);
        // Totals: 5, 5, 6.
        assert_eq!(s.order(), &[3, 1, 2]);
    }

    #[test]
    fn test_no_wait_single_machine() {
        let inst = Instance::new(vec![vec![5], vec![3]], 0.0).unwrap();
        let s = PermutationSchedule::identity(&inst);
        for policy in [HolePolicy::Earliest, HolePolicy::Smallest] {
            assert_eq!(s.evaluate_no_wait(&inst, policy).unwrap(), (8, 13));
        }
    }

    #[test]
    fn test_no_wait_fills_gap() {
        // J1 leaves [0,1) free on machine 2; J3 skips machine 1 and takes it.
        let inst = Instance::new(vec![vec![1, 1], vec![5, 1], vec![0, 1]], 0.0).unwrap();
        let s = PermutationSchedule::identity(&inst);
        let (ms, ft) = s.evaluate_no_wait(&inst, HolePolicy::Earliest).unwrap();
        // J1: m1 [0,1) m2 [1,2). J2: m1 [1,6) m2 [6,7). J3: m2 [0,1).
        assert_eq!((ms, ft), (7, 10));
        // The permutation model would queue J3 behind J2.
        assert_eq!(s.makespan_flowtime(&inst), (8, 17));
    }
}
