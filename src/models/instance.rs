//! Flow shop instance with missing operations.
//!
//! An instance is a dense processing-time table over `n` jobs and `m`
//! machines. Every job visits the machines in order `1..=m`; a zero entry
//! means the job skips that machine (a missing operation).
//!
//! Jobs and machines are 1-based throughout the crate. Row and column 0 of
//! the table are zero, which lets completion-time recurrences read
//! "position 0" as the empty schedule without special cases.
//!
//! # Reference
//! Henneberg & Neufeld (2016), "A constraint-based approach for the
//! permutation flow shop with missing operations"

use serde::Serialize;

use crate::error::{Result, ScheduleError};
use crate::validation::validate_times;

/// Job identifier, `1..=n`.
pub type Job = usize;

/// Processing or completion time.
pub type Time = u64;

/// Sentinel for unattained or upper-bound times. Compares worse than any
/// measured completion time; validation keeps real totals strictly below it.
pub const INFINITE_TIME: Time = i32::MAX as Time;

/// Immutable flow shop instance.
///
/// # Example
/// ```
/// use flowshop_mo::models::Instance;
///
/// let inst = Instance::new(vec![vec![2, 3], vec![4, 0]], 0.25).unwrap();
/// assert_eq!(inst.jobs(), 2);
/// assert_eq!(inst.machines(), 2);
/// assert_eq!(inst.p(2, 2), 0);
/// assert_eq!(inst.num_effective_operations(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instance {
    n: usize,
    m: usize,
    /// Missing-operations rate (informational).
    missing_rate: f64,
    /// `(n+1) × (m+1)` row-major table, indexed `[j][i]`.
    p: Vec<Time>,
    effective_ops: usize,
}

impl Instance {
    /// Creates an instance from one row of `m` processing times per job.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidInstance`] if the table is empty, ragged, or
    /// its total would reach [`INFINITE_TIME`].
    pub fn new(times: Vec<Vec<Time>>, missing_rate: f64) -> Result<Self> {
        let m = times.first().map_or(0, Vec::len);
        validate_times(&times, m).map_err(ScheduleError::InvalidInstance)?;

        let n = times.len();
        let mut p = vec![0; (n + 1) * (m + 1)];
        for (j, row) in times.iter().enumerate() {
            let base = (j + 1) * (m + 1);
            p[base + 1..base + 1 + m].copy_from_slice(row);
        }
        let effective_ops = p.iter().filter(|&&t| t != 0).count();

        Ok(Self {
            n,
            m,
            missing_rate,
            p,
            effective_ops,
        })
    }

    /// Parses the Henneberg & Neufeld text format:
    ///
    /// ```text
    /// numberMachines 2 numberJobs 3 missing Operations 0.0
    /// t_0_0 2 t_0_1 4 t_0_2 1
    /// t_1_0 3 t_1_1 1 t_1_2 5
    /// ```
    ///
    /// Entries are machine-major; the label `t_<i>_<j>` is zero-based and must
    /// match its position.
    pub fn from_hn_str(text: &str) -> Result<Self> {
        let mut tokens = text
            .lines()
            .enumerate()
            .flat_map(|(line, l)| l.split_whitespace().map(move |t| (line + 1, t)));

        expect_token(tokens.next(), "numberMachines")?;
        let m: usize = parse_token(tokens.next(), "machine count")?;
        expect_token(tokens.next(), "numberJobs")?;
        let n: usize = parse_token(tokens.next(), "job count")?;
        expect_token(tokens.next(), "missing")?;
        expect_token(tokens.next(), "Operations")?;
        let missing_rate: f64 = parse_token(tokens.next(), "missing rate")?;

        let mut times = vec![vec![0; m]; n];
        for i in 0..m {
            for (j, row) in times.iter_mut().enumerate() {
                expect_token(tokens.next(), &format!("t_{i}_{j}"))?;
                row[i] = parse_token(tokens.next(), "processing time")?;
            }
        }

        Self::new(times, missing_rate)
    }

    /// Number of jobs.
    #[inline]
    pub fn jobs(&self) -> usize {
        self.n
    }

    /// Number of machines.
    #[inline]
    pub fn machines(&self) -> usize {
        self.m
    }

    /// Missing-operations rate recorded with the instance.
    pub fn missing_rate(&self) -> f64 {
        self.missing_rate
    }

    /// Processing time of job `j` on machine `i` (both 1-based; 0 = missing).
    #[inline]
    pub fn p(&self, j: Job, i: usize) -> Time {
        self.p[j * (self.m + 1) + i]
    }

    /// Total processing time per job, indexed by job (slot 0 is zero).
    pub fn total_times(&self) -> Vec<Time> {
        (0..=self.n)
            .map(|j| (1..=self.m).map(|i| self.p(j, i)).sum())
            .collect()
    }

    /// Sum of all processing times.
    pub fn total_time(&self) -> Time {
        self.p.iter().sum()
    }

    /// Average time per effective operation.
    pub fn avg_time(&self) -> f64 {
        self.total_time() as f64 / self.effective_ops.max(1) as f64
    }

    /// Number of operations including missing ones (`n·m`).
    pub fn num_operations(&self) -> usize {
        self.n * self.m
    }

    /// Number of operations with non-zero time.
    pub fn num_effective_operations(&self) -> usize {
        self.effective_ops
    }

    /// Number of maximal runs of consecutive present operations, summed
    /// over all jobs.
    pub fn num_pseudojobs(&self) -> usize {
        let mut count = 0;
        for j in 1..=self.n {
            let mut missing = true;
            for i in 1..=self.m {
                let present = self.p(j, i) != 0;
                if missing && present {
                    count += 1;
                }
                missing = !present;
            }
        }
        count
    }

    /// First machine job `j` visits, or `m+1` if it has no operations.
    pub fn first_operation(&self, j: Job) -> usize {
        self.next_operation(0, j)
    }

    /// Next machine after `i` that job `j` visits, or `m+1` if none.
    pub fn next_operation(&self, i: usize, j: Job) -> usize {
        (i + 1..=self.m)
            .find(|&o| self.p(j, o) != 0)
            .unwrap_or(self.m + 1)
    }

    /// Last machine job `j` visits, or 0 if it has no operations.
    pub fn last_operation(&self, j: Job) -> usize {
        (1..=self.m).rev().find(|&o| self.p(j, o) != 0).unwrap_or(0)
    }
}

fn expect_token(token: Option<(usize, &str)>, expected: &str) -> Result<()> {
    match token {
        Some((_, t)) if t == expected => Ok(()),
        Some((line, t)) => Err(ScheduleError::Parse {
            line,
            message: format!("expected '{expected}', found '{t}'"),
        }),
        None => Err(ScheduleError::Parse {
            line: 0,
            message: format!("expected '{expected}', found end of input"),
        }),
    }
}

fn parse_token<T: std::str::FromStr>(token: Option<(usize, &str)>, what: &str) -> Result<T> {
    match token {
        Some((line, t)) => t.parse().map_err(|_| ScheduleError::Parse {
            line,
            message: format!("invalid {what} '{t}'"),
        }),
        None => Err(ScheduleError::Parse {
            line: 0,
            message: format!("missing {what}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Instance {
        Instance::new(vec![vec![3, 0, 2], vec![1, 4, 2], vec![0, 0, 0]], 0.4).unwrap()
    }

    #[test]
    fn test_dimensions_and_lookup() {
        let inst = sample();
        assert_eq!(inst.jobs(), 3);
        assert_eq!(inst.machines(), 3);
        assert_eq!(inst.p(1, 1), 3);
        assert_eq!(inst.p(1, 2), 0);
        assert_eq!(inst.p(2, 2), 4);
        assert_eq!(inst.p(0, 1), 0);
        assert_eq!(inst.p(1, 0), 0);
    }

    #[test]
    fn test_aggregates() {
        let inst = sample();
        assert_eq!(inst.total_times(), vec![0, 5, 7, 0]);
        assert_eq!(inst.total_time(), 12);
        assert_eq!(inst.num_operations(), 9);
        assert_eq!(inst.num_effective_operations(), 5);
        assert!((inst.avg_time() - 2.4).abs() < 1e-12);
    }

    #[test]
    fn test_operation_navigation() {
        let inst = sample();
        assert_eq!(inst.first_operation(1), 1);
        assert_eq!(inst.next_operation(1, 1), 3);
        assert_eq!(inst.next_operation(3, 1), 4);
        assert_eq!(inst.last_operation(1), 3);
        assert_eq!(inst.first_operation(3), 4);
        assert_eq!(inst.last_operation(3), 0);
    }

    #[test]
    fn test_pseudojobs() {
        // Job 1 splits into two runs, job 2 is one run, job 3 none.
        assert_eq!(sample().num_pseudojobs(), 3);
    }

    #[test]
    fn test_rejects_ragged_table() {
        let err = Instance::new(vec![vec![1, 2], vec![3]], 0.0).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidInstance(_)));
    }

    #[test]
    fn test_parse_hn_format() {
        let text = "numberMachines 2 numberJobs 3 missing Operations 0.0\n\
                    t_0_0 2 t_0_1 4 t_0_2 1\n\
                    t_1_0 3 t_1_1 1 t_1_2 5\n";
        let inst = Instance::from_hn_str(text).unwrap();
        assert_eq!(inst.jobs(), 3);
        assert_eq!(inst.machines(), 2);
        assert_eq!(inst.p(1, 1), 2);
        assert_eq!(inst.p(1, 2), 3);
        assert_eq!(inst.p(3, 2), 5);
        assert_eq!(inst.missing_rate(), 0.0);
    }

    #[test]
    fn test_parse_rejects_mislabelled_entry() {
        let text = "numberMachines 1 numberJobs 2 missing Operations 0.5\nt_0_1 2 t_0_0 4\n";
        let err = Instance::from_hn_str(text).unwrap_err();
        assert!(matches!(err, ScheduleError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_bad_number() {
        let text = "numberMachines x numberJobs 2 missing Operations 0.5\n";
        assert!(matches!(
            Instance::from_hn_str(text),
            Err(ScheduleError::Parse { line: 1, .. })
        ));
    }
}
