//! Read-only measures of how a complete schedule uses its buffers.
//!
//! Both measures look at each job between two consecutive operations: it
//! finishes on machine `i`, but the machine is not blocked until the next
//! job on `i` starts, and it starts on its next machine `nm` at `s`. If the
//! machine is released before `s`, the job waits in the buffer of `nm` over
//! `[release, s)`.
//!
//! - [`NonPermutationSchedule::buffer_space`]: the largest number of jobs
//!   waiting at the same time, over all buffers.
//! - [`NonPermutationSchedule::job_rank_inversion`]: how far each machine's
//!   order departs from the order in which jobs reach its buffer, as a
//!   normalized Kendall tau distance.

use crate::models::{Instance, Job, Time};

use super::schedule::NonPermutationSchedule;

impl NonPermutationSchedule {
    /// Maximum number of jobs buffered simultaneously.
    ///
    /// Intervals are half-open: a job leaving at `t` and another arriving
    /// at `t` never overlap.
    pub fn buffer_space(&self, instance: &Instance) -> usize {
        debug_assert!(self.is_complete());
        let (n, m) = (instance.jobs(), instance.machines());
        let c = self.completion_times(instance);

        let mut events: Vec<(Time, i32)> = Vec::new();
        for i in 1..m {
            for k in 1..=n {
                let j = self.job_at(i, k);
                if instance.p(j, i) == 0 {
                    continue;
                }
                let nm = instance.next_operation(i, j);
                if nm > m {
                    continue;
                }
                let Some(nj) = self.next_present(instance, i, k) else {
                    continue;
                };
                let start = c[nm][j] - instance.p(j, nm);
                let release = (c[i][nj] - instance.p(nj, i)).min(start);
                if release < start {
                    events.push((release, 1));
                    events.push((start, -1));
                }
            }
        }
        events.sort_unstable();

        let (mut level, mut peak) = (0i32, 0i32);
        for (_, delta) in events {
            level += delta;
            peak = peak.max(level);
        }
        peak as usize
    }

    /// Mean Kendall tau distance between each machine's order and the order
    /// in which its jobs become ready, over machines `2..=m`, divided by
    /// `n · (m - 1)`. Zero for a single machine.
    ///
    /// A job is ready for machine `nm` when its previous machine is released
    /// (see [`buffer_space`](Self::buffer_space)); jobs starting on `nm` are
    /// ready at 0. Ties are broken by the machine's own order.
    pub fn job_rank_inversion(&self, instance: &Instance) -> f64 {
        debug_assert!(self.is_complete());
        let (n, m) = (instance.jobs(), instance.machines());
        if m < 2 {
            return 0.0;
        }
        let c = self.completion_times(instance);

        let mut ready: Vec<Vec<(Time, Job)>> = vec![Vec::new(); m + 1];
        for i in 1..m {
            for k in 1..=n {
                let j = self.job_at(i, k);
                if instance.p(j, i) == 0 {
                    if i == 1 {
                        let first = instance.first_operation(j);
                        if first <= m {
                            ready[first].push((0, j));
                        }
                    }
                    continue;
                }
                let nm = instance.next_operation(i, j);
                if nm > m {
                    continue;
                }
                let t = match self.next_present(instance, i, k) {
                    None => c[instance.last_operation(j)][j],
                    Some(nj) => {
                        let start = c[nm][j] - instance.p(j, nm);
                        (c[i][nj] - instance.p(nj, i)).min(start)
                    }
                };
                ready[nm].push((t, j));
            }
        }

        let mut inversions = 0;
        for (i, arrivals) in ready.iter_mut().enumerate().skip(2) {
            arrivals.sort_by_key(|&(t, j)| (t, self.rank(i, j)));
            let arrival_order: Vec<Job> = arrivals.iter().map(|&(_, j)| j).collect();
            let machine_order: Vec<Job> = self
                .order(i)
                .iter()
                .copied()
                .filter(|&j| instance.p(j, i) != 0)
                .collect();
            inversions += kendall_tau(&arrival_order, &machine_order);
        }
        inversions as f64 / (n * (m - 1)) as f64
    }

    /// Next job after position `k` on machine `i` that is processed there.
    fn next_present(&self, instance: &Instance, i: usize, k: usize) -> Option<Job> {
        (k + 1..=self.len())
            .map(|l| self.job_at(i, l))
            .find(|&j| instance.p(j, i) != 0)
    }
}

/// Number of job pairs ordered differently by `a` and `b`.
///
/// Both slices must hold the same set of jobs.
///
/// # Example
/// ```
/// use flowshop_mo::non_permutation::kendall_tau;
///
/// assert_eq!(kendall_tau(&[1, 2, 3], &[1, 2, 3]), 0);
/// assert_eq!(kendall_tau(&[1, 2, 3], &[3, 2, 1]), 3);
/// ```
pub fn kendall_tau(a: &[Job], b: &[Job]) -> usize {
    debug_assert_eq!(a.len(), b.len());
    let size = b.iter().copied().max().map_or(0, |j| j + 1);
    let mut pos = vec![0; size];
    for (k, &j) in b.iter().enumerate() {
        pos[j] = k;
    }
    let mut count = 0;
    for (k1, &j1) in a.iter().enumerate() {
        for &j2 in &a[k1 + 1..] {
            if pos[j1] > pos[j2] {
                count += 1;
            }
        }
    }
    count
}
