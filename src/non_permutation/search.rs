//! Reinsertion search over per-machine orders.
//!
//! # Algorithm
//!
//! `insert_all` places each unscheduled job at every prefix position, and
//! additionally tries every split in which some machines take the job one
//! position earlier than the others. Each candidate is evaluated from
//! scratch; the best (flow time, makespan) pair wins, first found on ties.
//!
//! Candidates are generated by adjacent swaps in two sweeps from the end of
//! the prefix toward the start, so that every evaluation differs from the
//! previous one by a single swap:
//!
//! 1. Machines `m, m-1, ..., 2` in turn move the job one step forward
//!    ([`NpMove::AdvanceTail`]), then machine 1 follows and the job sits at
//!    the next position on every machine ([`NpMove::Insert`]).
//! 2. Machines `1, 2, ..., m-1` in turn move the job forward
//!    ([`NpMove::AdvanceHead`]), then machine `m` follows.
//!
//! The engine always optimizes flow time, with makespan as tie-break.
//!
//! # Complexity
//! O(n·m) candidates per inserted job, each evaluated in O(n·m).

use tracing::trace;

use super::schedule::NonPermutationSchedule;
use crate::clock::Clock;
use crate::models::{Instance, Job, ScheduleResult, Time};

/// Where an inserted job lands on each machine.
///
/// `position` is the slot the job takes on machines that do not advance;
/// advancing machines take `position - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpMove {
    /// Same position on every machine.
    Insert { position: usize },
    /// Machines `from..=m` advance.
    AdvanceTail { position: usize, from: usize },
    /// Machines `1..until` advance.
    AdvanceHead { position: usize, until: usize },
}

impl NpMove {
    /// Target position of the job on machine `i`.
    pub fn slot(&self, i: usize) -> usize {
        match *self {
            NpMove::Insert { position } => position,
            NpMove::AdvanceTail { position, from } if i >= from => position - 1,
            NpMove::AdvanceHead { position, until } if i < until => position - 1,
            NpMove::AdvanceTail { position, .. } | NpMove::AdvanceHead { position, .. } => position,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    mv: NpMove,
    flowtime: Time,
    makespan: Time,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        (self.flowtime, self.makespan) < (other.flowtime, other.makespan)
    }
}

/// A non-permutation schedule with the operations that improve it in place.
pub struct NonPermutationSearch<'a> {
    instance: &'a Instance,
    clock: &'a dyn Clock,
    schedule: NonPermutationSchedule,
    time_found: f64,
}

impl<'a> NonPermutationSearch<'a> {
    /// Starts from `schedule`.
    pub fn new(instance: &'a Instance, schedule: NonPermutationSchedule, clock: &'a dyn Clock) -> Self {
        debug_assert!(schedule.is_consistent());
        Self {
            instance,
            clock,
            schedule,
            time_found: 0.0,
        }
    }

    /// The current schedule.
    pub fn schedule(&self) -> &NonPermutationSchedule {
        &self.schedule
    }

    /// Consumes the search, returning its schedule.
    pub fn into_schedule(self) -> NonPermutationSchedule {
        self.schedule
    }

    /// Seconds since start when the current schedule was found.
    pub fn time_found(&self) -> f64 {
        self.time_found
    }

    /// Stamps the current schedule as found now.
    pub fn mark_found(&mut self) {
        self.time_found = self.clock.elapsed_secs();
    }

    /// Result triple of the current schedule.
    pub fn result(&self) -> ScheduleResult {
        self.schedule.result(self.instance, self.time_found)
    }

    /// Empties the scheduled prefix on every machine.
    pub fn clear(&mut self) {
        self.schedule.fbegin = 1;
    }

    /// Moves job `j` to the first unscheduled position on every machine.
    pub fn remove(&mut self, j: Job) {
        let s = &mut self.schedule;
        s.fbegin -= 1;
        let last = s.fbegin;
        for i in 1..=s.machines() {
            let k = s.rank(i, j);
            debug_assert!(k <= last);
            s.rotate_left(i, k, last);
        }
    }

    /// Inserts every unscheduled job at its best candidate placement.
    pub fn insert_all(&mut self) {
        let end = self.instance.jobs() + 1;
        while self.schedule.fbegin != end {
            let best = self.best_insertion();
            let s = &mut self.schedule;
            let last = s.fbegin;
            for i in 1..=s.machines() {
                s.rotate_right(i, best.mv.slot(i), last);
            }
            s.fbegin += 1;
            s.of = best.flowtime;
        }
        debug_assert!(self.schedule.is_consistent());
        debug_assert_eq!(self.schedule.of, self.schedule.makespan_flowtime(self.instance).1);
    }

    /// Evaluates every placement of the job at `fbegin` and returns the
    /// best. Leaves the orders unchanged.
    fn best_insertion(&mut self) -> Candidate {
        let inst = self.instance;
        let m = inst.machines();
        let s = &mut self.schedule;
        let f = s.fbegin;
        s.fbegin = f + 1;

        // The unchanged orders place the job at `f` on every machine.
        let (makespan, flowtime) = s.makespan_flowtime(inst);
        let mut best = Candidate {
            mv: NpMove::Insert { position: f },
            flowtime,
            makespan,
        };
        let mut consider = |s: &NonPermutationSchedule, mv: NpMove| {
            let (makespan, flowtime) = s.makespan_flowtime(inst);
            let candidate = Candidate {
                mv,
                flowtime,
                makespan,
            };
            if candidate.beats(&best) {
                best = candidate;
            }
        };

        for k in (1..=f).rev() {
            if k < f {
                consider(s, NpMove::Insert { position: k });
            }
            if k == 1 {
                break;
            }
            for l in (2..=m).rev() {
                s.swap_adjacent(l, k);
                consider(s, NpMove::AdvanceTail { position: k, from: l });
            }
            s.swap_adjacent(1, k);
        }
        s.rotate_prefix_left(f);

        for k in (2..=f).rev() {
            for l in 1..m {
                s.swap_adjacent(l, k);
                consider(s, NpMove::AdvanceHead { position: k, until: l + 1 });
            }
            s.swap_adjacent(m, k);
        }
        s.rotate_prefix_left(f);

        s.fbegin = f;
        best
    }

    /// One sweep removing and reinserting every job. The sweep is undone
    /// unless it lowers the flow time. Returns whether it did.
    pub fn shift_step(&mut self) -> bool {
        debug_assert!(self.schedule.is_complete());
        let before = self.schedule.of;
        let checkpoint = self.schedule.clone();
        for j in 1..=self.instance.jobs() {
            self.remove(j);
            self.insert_all();
        }
        if self.schedule.of >= before {
            self.schedule = checkpoint;
        }
        self.schedule.of < before
    }

    /// Repeats [`shift_step`](Self::shift_step) until a sweep fails to
    /// improve. Returns the number of improving sweeps.
    pub fn shift_local_search(&mut self) -> usize {
        let mut steps = 0;
        while self.shift_step() {
            self.mark_found();
            steps += 1;
            trace!(flowtime = self.schedule.of, steps, "non-permutation sweep improved");
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::Objective;
    use crate::permutation::{PermutationSchedule, PermutationSearch};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use std::time::Duration;

    const CLOCK: FixedClock = FixedClock(Duration::ZERO);

    fn random_instance(n: usize, m: usize, seed: u64) -> Instance {
        let mut rng = SmallRng::seed_from_u64(seed);
        let times = (0..n)
            .map(|_| {
                (0..m)
                    .map(|_| {
                        if rng.random_bool(0.25) {
                            0
                        } else {
                            rng.random_range(1..15)
                        }
                    })
                    .collect()
            })
            .collect();
        Instance::new(times, 0.25).unwrap()
    }

    #[test]
    fn test_move_slots() {
        let insert = NpMove::Insert { position: 4 };
        assert_eq!((1..=3).map(|i| insert.slot(i)).collect::<Vec<_>>(), vec![4, 4, 4]);
        let tail = NpMove::AdvanceTail { position: 4, from: 2 };
        assert_eq!((1..=3).map(|i| tail.slot(i)).collect::<Vec<_>>(), vec![4, 3, 3]);
        let head = NpMove::AdvanceHead { position: 4, until: 3 };
        assert_eq!((1..=3).map(|i| head.slot(i)).collect::<Vec<_>>(), vec![3, 3, 4]);
    }

    #[test]
    fn test_remove_moves_job_to_suffix_everywhere() {
        let inst = random_instance(4, 3, 1);
        let np = NonPermutationSchedule::from_orders(
            &inst,
            vec![vec![1, 2, 3, 4], vec![2, 1, 4, 3], vec![4, 3, 2, 1]],
        )
        .unwrap();
        let mut s = NonPermutationSearch::new(&inst, np, &CLOCK);
        s.remove(2);
        let np = s.schedule();
        assert_eq!(np.scheduled(), 3);
        assert_eq!(np.order(1), &[1, 3, 4, 2]);
        assert_eq!(np.order(2), &[1, 4, 3, 2]);
        assert_eq!(np.order(3), &[4, 3, 1, 2]);
        assert!(np.is_consistent());
    }

    #[test]
    fn test_best_insertion_leaves_orders_unchanged() {
        let inst = random_instance(5, 3, 2);
        let perm = PermutationSchedule::from_order(&inst, &[5, 3, 1, 4, 2]).unwrap();
        let mut s = NonPermutationSearch::new(
            &inst,
            NonPermutationSchedule::from_permutation(&inst, &perm),
            &CLOCK,
        );
        s.remove(1);
        let before = s.schedule().clone();
        s.best_insertion();
        assert_eq!(s.schedule(), &before);
    }

    #[test]
    fn test_best_insertion_reports_evaluated_objective() {
        for seed in 0..5 {
            let inst = random_instance(5, 3, 20 + seed);
            let perm = PermutationSchedule::identity(&inst);
            let mut s = NonPermutationSearch::new(
                &inst,
                NonPermutationSchedule::from_permutation(&inst, &perm),
                &CLOCK,
            );
            s.remove(3);
            let best = s.best_insertion();
            s.insert_all();
            let (ms, ft) = s.schedule().makespan_flowtime(&inst);
            assert_eq!((best.makespan, best.flowtime), (ms, ft));
            assert_eq!(s.schedule().objective(), ft);
        }
    }

    #[test]
    fn test_single_job_insertion() {
        let inst = Instance::new(vec![vec![3, 0, 4]], 0.0).unwrap();
        let mut s = NonPermutationSearch::new(&inst, NonPermutationSchedule::identity(&inst), &CLOCK);
        s.clear();
        let best = s.best_insertion();
        assert_eq!(best.mv, NpMove::Insert { position: 1 });
        assert_eq!((best.makespan, best.flowtime), (7, 7));
        s.insert_all();
        assert_eq!(s.schedule().objective(), 7);
    }

    #[test]
    fn test_insert_all_is_never_worse_than_same_position() {
        for seed in 0..10 {
            let inst = random_instance(6, 3, seed);
            let perm = PermutationSchedule::identity(&inst);
            let mut s = NonPermutationSearch::new(
                &inst,
                NonPermutationSchedule::from_permutation(&inst, &perm),
                &CLOCK,
            );
            let start = s.schedule().objective();
            // Reinserting the last job may put it back where it was.
            s.remove(inst.jobs());
            s.insert_all();
            assert!(s.schedule().objective() <= start);
            assert!(s.schedule().is_complete());
            assert!(s.schedule().is_consistent());
            assert_eq!(s.schedule().objective(), s.schedule().makespan_flowtime(&inst).1);
        }
    }

    #[test]
    fn test_construction_from_empty() {
        let inst = random_instance(5, 4, 7);
        let mut s = NonPermutationSearch::new(&inst, NonPermutationSchedule::identity(&inst), &CLOCK);
        s.clear();
        s.insert_all();
        assert!(s.schedule().is_complete());
        assert!(s.schedule().is_consistent());
        assert_eq!(s.schedule().objective(), s.schedule().makespan_flowtime(&inst).1);
    }

    #[test]
    fn test_local_search_improves_on_permutation() {
        for seed in 0..5 {
            let inst = random_instance(6, 3, 100 + seed);
            let mut perm = PermutationSearch::new(&inst, Objective::Flowtime, &CLOCK);
            perm.total_time_order();
            perm.clear();
            perm.insert_all();
            perm.shift_local_search();
            let seed_ft = perm.schedule().objective();

            let np = NonPermutationSchedule::from_permutation(&inst, perm.schedule());
            assert_eq!(np.objective(), seed_ft);
            let mut s = NonPermutationSearch::new(&inst, np, &CLOCK);
            let steps = s.shift_local_search();

            let ft = s.schedule().objective();
            assert!(ft <= seed_ft);
            assert_eq!(steps > 0, ft < seed_ft);
            assert!(s.schedule().is_consistent());
            assert_eq!(s.result().flowtime, ft);
            // A final sweep finds nothing more.
            assert!(!s.shift_step());
            assert_eq!(s.schedule().objective(), ft);
        }
    }
}
