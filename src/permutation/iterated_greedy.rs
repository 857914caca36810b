//! Iterated greedy with Metropolis acceptance.
//!
//! # Algorithm
//!
//! Each iteration perturbs the current schedule (remove `d` random jobs and
//! reinsert them), then runs shift local search on the result:
//!
//! 1. Strictly better than the best so far: becomes the new best.
//! 2. Otherwise, not better than the pre-perturbation schedule: kept with
//!    probability `exp(-Δ / T)`, else rolled back.
//!
//! The budget is checked before every iteration. On exit the best schedule
//! is restored.
//!
//! # Reference
//! Ruiz & Stützle (2007), "A simple and effective iterated greedy algorithm
//! for the permutation flowshop scheduling problem"

use rand::Rng;
use tracing::debug;

use super::schedule::PermutationSchedule;
use super::search::PermutationSearch;
use crate::config::IgOptions;
use crate::error::{Result, ScheduleError};
use crate::random::uniform;

impl PermutationSearch<'_> {
    /// Runs iterated greedy until `options.budget` is exhausted and leaves
    /// the best schedule found in place. Returns the number of iterations.
    ///
    /// An incomplete schedule is completed with
    /// [`insert_all`](Self::insert_all) first. Every iteration that produces
    /// a new best also updates the secondary-objective record.
    ///
    /// # Errors
    /// - [`ScheduleError::Config`] if the options are unusable
    /// - [`ScheduleError::DegeneratePerturbation`] if the destruction size
    ///   exceeds the number of jobs
    pub fn iterated_greedy<R: Rng>(&mut self, options: &IgOptions, rng: &mut R) -> Result<u64> {
        options.validate()?;
        let n = self.instance.jobs();
        let d = options.destruction_size;
        if d > n {
            return Err(ScheduleError::DegeneratePerturbation {
                size: d,
                scheduled: n,
            });
        }
        if !self.schedule.is_complete() || !self.schedule.is_evaluated() {
            self.insert_all();
        }

        let mut best: PermutationSchedule = self.schedule.clone();
        let mut best_time = self.time_found;
        let mut steps = 0;

        while !options.budget.exhausted(steps, self.clock.elapsed()) {
            let prev = self.schedule.clone();
            self.perturb(d, rng)?;
            self.shift_local_search();

            let (of, prev_of) = (self.schedule.of, prev.of);
            if of < best.of {
                self.mark_found();
                best = self.schedule.clone();
                best_time = self.time_found;
                self.record_secondary();
                debug!(objective = of, steps, time = best_time, "new best schedule");
            } else if !(of < prev_of || uniform(rng) < metropolis(of - prev_of, options.temperature)) {
                self.schedule = prev;
            }
            steps += 1;
        }

        self.schedule = best;
        self.time_found = best_time;
        Ok(steps)
    }
}

/// Acceptance probability of a worsening by `delta` at temperature `t`.
#[inline]
fn metropolis(delta: u64, t: f64) -> f64 {
    (-(delta as f64) / t).exp()
}
