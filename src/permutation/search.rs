//! Insertion construction and shift local search for permutation schedules.
//!
//! # Algorithm
//!
//! `insert_all` takes the unscheduled jobs one at a time and places each at
//! the prefix position that minimizes the objective. Candidate positions are
//! scanned from the end of the prefix toward the start; the first position
//! reaching the best key is kept.
//!
//! - **Makespan mode** keys on (makespan, idle time introduced). Each
//!   candidate costs O(m) thanks to the head/tail arrays, and a candidate is
//!   abandoned as soon as its partial makespan exceeds the best.
//! - **Flow-time mode** keys on (flow time, makespan). The jobs after the
//!   candidate position are replayed, so a candidate costs O(n·m); the scan
//!   stops early once a partial flow time exceeds the best.
//!
//! After each insertion only the invalidated head and tail ranges are
//! recomputed.
//!
//! # Complexity
//! Makespan mode: O(n·m) per inserted job. One shift pass: O(n²·m).
//!
//! # Reference
//! Nawaz, Enscore & Ham (1983), "A heuristic algorithm for the m-machine,
//! n-job flow-shop sequencing problem"

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::trace;

use super::accel::HeadTail;
use super::schedule::PermutationSchedule;
use crate::clock::Clock;
use crate::config::Objective;
use crate::error::{Result, ScheduleError};
use crate::models::{Instance, Job, ScheduleResult, Time};
use crate::random::sample_floyd;

/// Best schedule seen under the objective that is not being optimized.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryBest {
    /// Job order (1-based, no sentinel).
    pub order: Vec<Job>,
    /// Secondary objective value.
    pub value: Time,
    /// Seconds since start when it was recorded.
    pub time_found: f64,
}

/// A permutation schedule with the state needed to improve it in place.
///
/// Owns its schedule and accelerator arrays exclusively; cloning the
/// schedule is the only way to keep a rollback point.
pub struct PermutationSearch<'a> {
    pub(super) instance: &'a Instance,
    pub(super) clock: &'a dyn Clock,
    pub(super) schedule: PermutationSchedule,
    accel: HeadTail,
    objective: Objective,
    pub(super) time_found: f64,
    secondary: Option<SecondaryBest>,
}

impl<'a> PermutationSearch<'a> {
    /// Starts from the identity order.
    pub fn new(instance: &'a Instance, objective: Objective, clock: &'a dyn Clock) -> Self {
        Self::with_schedule(instance, PermutationSchedule::identity(instance), objective, clock)
    }

    /// Starts from an existing schedule over `instance`.
    pub fn with_schedule(
        instance: &'a Instance,
        schedule: PermutationSchedule,
        objective: Objective,
        clock: &'a dyn Clock,
    ) -> Self {
        debug_assert_eq!(schedule.len(), instance.jobs());
        Self {
            instance,
            clock,
            schedule,
            accel: HeadTail::new(instance),
            objective,
            time_found: 0.0,
            secondary: None,
        }
    }

    /// The current schedule.
    pub fn schedule(&self) -> &PermutationSchedule {
        &self.schedule
    }

    /// Consumes the search, returning its schedule.
    pub fn into_schedule(self) -> PermutationSchedule {
        self.schedule
    }

    /// Primary objective.
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Seconds since start when the current schedule was found.
    pub fn time_found(&self) -> f64 {
        self.time_found
    }

    /// Stamps the current schedule as found now.
    pub fn mark_found(&mut self) {
        self.time_found = self.clock.elapsed_secs();
    }

    /// Empties the scheduled prefix. O(1).
    pub fn clear(&mut self) {
        self.schedule.fbegin = 1;
    }

    /// Sorts the prefix by decreasing total processing time.
    pub fn total_time_order(&mut self) {
        self.schedule.total_time_order(self.instance);
    }

    /// Inserts every unscheduled job, in suffix order, at its best position.
    pub fn insert_all(&mut self) {
        if self.schedule.is_complete() {
            self.schedule.of = self.evaluate();
            return;
        }
        match self.objective {
            Objective::Makespan => self.insert_all_makespan(),
            Objective::Flowtime => self.insert_all_flowtime(),
        }
        debug_assert!(self.schedule.is_valid_permutation());
    }

    fn insert_all_makespan(&mut self) {
        let inst = self.instance;
        let m = inst.machines();
        let end = inst.jobs() + 1;
        let Self { accel, schedule: s, .. } = self;

        accel.recompute_heads(inst, &s.seq, 1..s.fbegin);
        accel.recompute_tails(inst, &s.seq, s.fbegin, 1..s.fbegin);

        let mut cm = 0;
        while s.fbegin != end {
            let fb = s.fbegin;
            let jb = s.seq[fb];

            let mut bp = 0;
            let mut best_idle = Time::MAX;
            cm = Time::MAX;
            for k in (1..=fb).rev() {
                let (mut cmax_k, mut cj, mut cjk, mut idle) = (0, 0, 0, 0);
                for i in 1..=m {
                    let pb = inst.p(jb, i);
                    let ci = if pb > 0 {
                        cj = cj.max(accel.head(i, k - 1)) + pb;
                        cj
                    } else {
                        accel.head(i, k - 1)
                    };
                    cmax_k = cmax_k.max(ci + accel.tail(i, fb - k));
                    if cmax_k > cm {
                        break;
                    }
                    if k < fb {
                        // Idle time pushed onto the job displaced from position k.
                        let pk = inst.p(s.seq[k], i);
                        if pk > 0 {
                            cjk = ci.max(cjk) + pk;
                            idle += cjk - accel.head(i, k);
                        } else {
                            idle += ci - accel.head(i, k);
                        }
                    } else if pb > 0 {
                        idle += cj - accel.head(i, k - 1);
                    }
                }
                if cmax_k < cm || (cmax_k == cm && idle < best_idle) {
                    cm = cmax_k;
                    bp = k;
                    best_idle = idle;
                }
            }

            debug_assert!((1..=fb).contains(&bp));
            s.seq[bp..=fb].rotate_right(1);
            s.fbegin += 1;

            if s.fbegin != end {
                accel.recompute_heads(inst, &s.seq, bp..s.fbegin);
                accel.recompute_tails(inst, &s.seq, s.fbegin, s.fbegin - bp..s.fbegin);
            }
            debug_assert_eq!(cm, s.makespan_flowtime(inst).0);
        }
        s.of = cm;
    }

    fn insert_all_flowtime(&mut self) {
        let inst = self.instance;
        let m = inst.machines();
        let end = inst.jobs() + 1;
        let Self { accel, schedule: s, .. } = self;

        let mut flow = vec![0; end];
        accel.recompute_heads_flowtimes(inst, &s.seq, 1..s.fbegin, &mut flow);

        let mut c = vec![0; m + 1];
        let mut cf = 0;
        while s.fbegin != end {
            let fb = s.fbegin;
            let jb = s.seq[fb];

            let mut bp = 0;
            let mut cm = Time::MAX;
            cf = Time::MAX;
            for k in (1..=fb).rev() {
                let mut fk = flow[k - 1];
                let mut cj = 0;
                for (i, ci) in c.iter_mut().enumerate().skip(1) {
                    let pb = inst.p(jb, i);
                    *ci = if pb > 0 {
                        cj = cj.max(accel.head(i, k - 1)) + pb;
                        cj
                    } else {
                        accel.head(i, k - 1)
                    };
                }
                fk += cj;
                if fk > cf {
                    break;
                }

                for &jl in &s.seq[k..fb] {
                    cj = 0;
                    for (i, ci) in c.iter_mut().enumerate().skip(1) {
                        let pl = inst.p(jl, i);
                        if pl > 0 {
                            cj = cj.max(*ci) + pl;
                            *ci = cj;
                        }
                    }
                    fk += cj;
                    if fk > cf {
                        break;
                    }
                }

                let cmax_k = c.iter().copied().max().unwrap_or(0);
                if fk < cf || (fk == cf && cmax_k < cm) {
                    cf = fk;
                    cm = cmax_k;
                    bp = k;
                }
            }

            debug_assert!((1..=fb).contains(&bp));
            s.seq[bp..=fb].rotate_right(1);
            s.fbegin += 1;

            if s.fbegin != end {
                accel.recompute_heads_flowtimes(inst, &s.seq, bp..s.fbegin, &mut flow);
            }
            debug_assert_eq!(cf, s.makespan_flowtime(inst).1);
        }
        s.of = cf;
    }

    /// Uniformly shuffles the unscheduled suffix.
    pub fn shuffle_free<R: Rng>(&mut self, rng: &mut R) {
        let fbegin = self.schedule.fbegin;
        self.schedule.seq[fbegin..].shuffle(rng);
    }

    /// Moves the job at prefix position `k` to the front of the suffix.
    pub fn remove(&mut self, k: usize) {
        let s = &mut self.schedule;
        debug_assert!((1..s.fbegin).contains(&k));
        s.seq[k..s.fbegin].rotate_left(1);
        s.fbegin -= 1;
    }

    /// Objective value of the scheduled prefix, from scratch.
    pub fn evaluate(&self) -> Time {
        let (ms, ft) = self.schedule.makespan_flowtime(self.instance);
        match self.objective {
            Objective::Makespan => ms,
            Objective::Flowtime => ft,
        }
    }

    /// Records the current schedule if it beats the best one seen under the
    /// secondary objective.
    pub fn record_secondary(&mut self) {
        let (ms, ft) = self.schedule.makespan_flowtime(self.instance);
        let value = match self.objective {
            Objective::Makespan => ft,
            Objective::Flowtime => ms,
        };
        if self.secondary.as_ref().map_or(true, |b| value < b.value) {
            self.secondary = Some(SecondaryBest {
                order: self.schedule.order().to_vec(),
                value,
                time_found: self.clock.elapsed_secs(),
            });
        }
    }

    /// Best schedule seen under the secondary objective, if any.
    pub fn secondary(&self) -> Option<&SecondaryBest> {
        self.secondary.as_ref()
    }

    /// The secondary-best order as a schedule.
    pub fn secondary_schedule(&self) -> Option<PermutationSchedule> {
        self.secondary.as_ref().and_then(|b| {
            PermutationSchedule::from_order(self.instance, &b.order).ok()
        })
    }

    /// Result triple of the current schedule.
    pub fn result(&self) -> ScheduleResult {
        self.schedule.result(self.instance, self.time_found)
    }

    /// Result triple of the secondary-best schedule.
    pub fn secondary_result(&self) -> Option<ScheduleResult> {
        let best = self.secondary.as_ref()?;
        let schedule = self.secondary_schedule()?;
        Some(schedule.result(self.instance, best.time_found))
    }

    /// One shift pass: each prefix position in turn is removed and its job
    /// reinserted at the best position. A reinsertion that makes the
    /// objective worse is undone. Returns whether the pass improved it.
    pub fn shift_step(&mut self) -> bool {
        debug_assert!(self.schedule.is_complete());
        let before = self.schedule.of;
        for k in 1..=self.instance.jobs() {
            let (saved, saved_of) = (self.schedule.seq.clone(), self.schedule.of);
            self.remove(k);
            self.insert_all();
            if self.schedule.of > saved_of {
                self.schedule.seq = saved;
                self.schedule.of = saved_of;
            }
            self.record_secondary();
        }
        debug_assert!(self.schedule.of <= before);
        self.schedule.of < before
    }

    /// Repeats shift passes until one fails to improve. Returns the number
    /// of improving passes.
    pub fn shift_local_search(&mut self) -> usize {
        if !self.schedule.is_evaluated() {
            self.insert_all();
        }
        self.record_secondary();
        let mut steps = 0;
        while self.shift_step() {
            self.mark_found();
            steps += 1;
            trace!(objective = self.schedule.of, steps, "shift pass improved");
        }
        steps
    }

    /// Removes `d` randomly chosen prefix jobs, shuffles them and reinserts
    /// them with [`insert_all`](Self::insert_all).
    ///
    /// # Errors
    /// [`ScheduleError::DegeneratePerturbation`] unless `0 < d < fbegin`.
    pub fn perturb<R: Rng>(&mut self, d: usize, rng: &mut R) -> Result<()> {
        let scheduled = self.schedule.scheduled();
        if d == 0 || d > scheduled {
            return Err(ScheduleError::DegeneratePerturbation { size: d, scheduled });
        }

        let mut cuts: Vec<usize> = sample_floyd(d, scheduled, rng)
            .into_iter()
            .map(|k| k + 1)
            .collect();
        cuts.push(self.schedule.fbegin);

        // Slide the growing block of removed jobs to the end of the prefix.
        let seq = &mut self.schedule.seq;
        for i in 0..d {
            seq[cuts[i] - i..cuts[i + 1]].rotate_left(i + 1);
        }
        self.schedule.fbegin -= d;

        self.shuffle_free(rng);
        self.insert_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::validation::is_permutation;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const CLOCK: FixedClock = FixedClock(std::time::Duration::ZERO);

    fn three_by_two() -> Instance {
        Instance::new(vec![vec![2, 3], vec![4, 1], vec![1, 5]], 0.0).unwrap()
    }

    fn random_instance(n: usize, m: usize, seed: u64) -> Instance {
        let mut rng = SmallRng::seed_from_u64(seed);
        let times = (0..n)
            .map(|_| {
                (0..m)
                    .map(|_| {
                        if rng.random_bool(0.3) {
                            0
                        } else {
                            rng.random_range(1..20)
                        }
                    })
                    .collect()
            })
            .collect();
        Instance::new(times, 0.3).unwrap()
    }

    fn permutations(items: &[Job]) -> Vec<Vec<Job>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head);
                out.push(tail);
            }
        }
        out
    }

    fn brute_force(inst: &Instance) -> (Time, Time) {
        let jobs: Vec<Job> = (1..=inst.jobs()).collect();
        permutations(&jobs)
            .iter()
            .map(|o| {
                PermutationSchedule::from_order(inst, o)
                    .unwrap()
                    .makespan_flowtime(inst)
            })
            .fold((Time::MAX, Time::MAX), |(bm, bf), (ms, ft)| {
                (bm.min(ms), bf.min(ft))
            })
    }

    #[test]
    fn test_construction_makespan_matches_brute_force() {
        let inst = three_by_two();
        let mut s = PermutationSearch::new(&inst, Objective::Makespan, &CLOCK);
        s.total_time_order();
        s.clear();
        s.insert_all();

        assert_eq!(s.schedule().order(), &[3, 1, 2]);
        assert_eq!(s.schedule().objective(), 10);
        assert_eq!(brute_force(&inst).0, 10);
    }

    #[test]
    fn test_makespan_tie_keeps_first_scanned_position() {
        // Inserting job 2 into [3, 1]: positions 3 and 2 both give
        // makespan 10 with equal idle time; the later position is scanned first.
        let inst = three_by_two();
        let sched = PermutationSchedule::from_order(&inst, &[3, 1, 2]).unwrap();
        let mut s = PermutationSearch::with_schedule(&inst, sched, Objective::Makespan, &CLOCK);
        s.schedule.fbegin = 3;
        s.insert_all();
        assert_eq!(s.schedule().order(), &[3, 1, 2]);
    }

    #[test]
    fn test_construction_flowtime() {
        let inst = three_by_two();
        let mut s = PermutationSearch::new(&inst, Objective::Flowtime, &CLOCK);
        s.total_time_order();
        s.clear();
        s.insert_all();

        // [3] -> [3, 1] (ties on 15, makespan 9 < 10) -> [3, 2, 1] (23 < 25).
        assert_eq!(s.schedule().order(), &[3, 2, 1]);
        assert_eq!(s.schedule().objective(), 23);
        assert_eq!(s.schedule().makespan_flowtime(&inst).1, 23);
        assert_eq!(brute_force(&inst).1, 23);
    }

    #[test]
    fn test_flowtime_exceeding_sentinel_keeps_permutation() {
        // Total time stays below INFINITE_TIME but the flow time does not.
        let inst = Instance::new(vec![vec![1_000_000_000], vec![1_000_000_000]], 0.0).unwrap();
        let mut s = PermutationSearch::new(&inst, Objective::Flowtime, &CLOCK);
        s.clear();
        s.insert_all();

        assert!(s.schedule().objective() > crate::models::INFINITE_TIME);
        assert_eq!(s.schedule().order(), &[1, 2]);
        assert_eq!(s.schedule().objective(), 3_000_000_000);
        assert!(s.schedule().is_valid_permutation());
        assert!(s.schedule().is_evaluated());

        s.shift_local_search();
        assert_eq!(s.schedule().objective(), 3_000_000_000);
        assert!(s.schedule().is_valid_permutation());
    }

    #[test]
    fn test_incremental_objective_matches_recomputation() {
        for seed in 0..20 {
            let inst = random_instance(9, 4, seed);
            for objective in [Objective::Makespan, Objective::Flowtime] {
                let mut s = PermutationSearch::new(&inst, objective, &CLOCK);
                s.total_time_order();
                s.clear();
                s.insert_all();
                assert_eq!(s.schedule().objective(), s.evaluate());
                assert!(s.schedule().is_valid_permutation());
            }
        }
    }

    #[test]
    fn test_remove_moves_job_to_suffix() {
        let inst = three_by_two();
        let sched = PermutationSchedule::from_order(&inst, &[3, 1, 2]).unwrap();
        let mut s = PermutationSearch::with_schedule(&inst, sched, Objective::Makespan, &CLOCK);
        s.remove(1);
        assert_eq!(s.schedule().jobs(), &[1, 2]);
        assert_eq!(s.schedule().free_jobs(), &[3]);
        assert!(is_permutation(&s.schedule().seq, 3));
    }

    #[test]
    fn test_insert_all_on_complete_schedule_evaluates() {
        let inst = three_by_two();
        let sched = PermutationSchedule::from_order(&inst, &[1, 2, 3]).unwrap();
        let mut s = PermutationSearch::with_schedule(&inst, sched, Objective::Flowtime, &CLOCK);
        s.insert_all();
        assert_eq!(s.schedule().objective(), 5 + 7 + 12);
    }

    #[test]
    fn test_shift_step_never_worsens() {
        for seed in 0..10 {
            let inst = random_instance(10, 3, seed);
            for objective in [Objective::Makespan, Objective::Flowtime] {
                let mut s = PermutationSearch::new(&inst, objective, &CLOCK);
                s.insert_all();
                loop {
                    let before = s.schedule().objective();
                    let improved = s.shift_step();
                    let after = s.schedule().objective();
                    assert!(after <= before);
                    assert_eq!(improved, after < before);
                    assert_eq!(after, s.evaluate());
                    if !improved {
                        break;
                    }
                }
            }
        }
    }

    #[test]
    fn test_shift_local_search_reaches_local_optimum() {
        let inst = random_instance(8, 4, 99);
        let mut s = PermutationSearch::new(&inst, Objective::Makespan, &CLOCK);
        s.clear();
        s.insert_all();
        let start = s.schedule().objective();
        s.shift_local_search();
        let local = s.schedule().objective();
        assert!(local <= start);
        // No single reinsertion improves further.
        assert!(!s.shift_step());
        assert_eq!(s.schedule().objective(), local);
    }

    #[test]
    fn test_secondary_best_is_tracked() {
        let inst = random_instance(7, 3, 5);
        let mut s = PermutationSearch::new(&inst, Objective::Makespan, &CLOCK);
        s.insert_all();
        s.shift_local_search();
        let best = s.secondary().unwrap();
        let sched = s.secondary_schedule().unwrap();
        assert_eq!(sched.makespan_flowtime(&inst).1, best.value);
        let current_ft = s.schedule().makespan_flowtime(&inst).1;
        assert!(best.value <= current_ft);
        assert_eq!(s.secondary_result().unwrap().flowtime, best.value);
    }

    #[test]
    fn test_perturb_keeps_permutation() {
        let mut rng = SmallRng::seed_from_u64(11);
        let inst = random_instance(12, 3, 4);
        for objective in [Objective::Makespan, Objective::Flowtime] {
            let mut s = PermutationSearch::new(&inst, objective, &CLOCK);
            s.insert_all();
            for d in 1..=12 {
                s.perturb(d, &mut rng).unwrap();
                assert!(s.schedule().is_complete());
                assert!(s.schedule().is_valid_permutation());
                assert_eq!(s.schedule().objective(), s.evaluate());
            }
        }
    }

    #[test]
    fn test_perturb_rejects_degenerate_size() {
        let mut rng = SmallRng::seed_from_u64(1);
        let inst = three_by_two();
        let mut s = PermutationSearch::new(&inst, Objective::Makespan, &CLOCK);
        s.insert_all();
        let before = s.schedule().clone();
        assert!(matches!(
            s.perturb(0, &mut rng),
            Err(ScheduleError::DegeneratePerturbation { .. })
        ));
        assert!(matches!(
            s.perturb(4, &mut rng),
            Err(ScheduleError::DegeneratePerturbation { size: 4, scheduled: 3 })
        ));
        assert_eq!(s.schedule(), &before);
    }

    #[test]
    fn test_shuffle_free_only_touches_suffix() {
        let mut rng = SmallRng::seed_from_u64(2);
        let inst = random_instance(8, 2, 1);
        let mut s = PermutationSearch::new(&inst, Objective::Makespan, &CLOCK);
        s.schedule.fbegin = 4;
        s.shuffle_free(&mut rng);
        assert_eq!(s.schedule().jobs(), &[1, 2, 3]);
        let mut free = s.schedule().free_jobs().to_vec();
        free.sort();
        assert_eq!(free, vec![4, 5, 6, 7, 8]);
    }
}
