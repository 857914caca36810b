//! End-to-end solve: construction, local search, iterated greedy and the
//! optional non-permutation phase.
//!
//! # Algorithm
//!
//! 1. Sort jobs by decreasing total processing time and build a schedule by
//!    insertion.
//! 2. Shift local search.
//! 3. Iterated greedy until the iteration or time limit.
//! 4. If enabled, seed a non-permutation schedule from the result and run
//!    non-permutation shift local search on it.
//!
//! Every phase reports the primary result and, for permutation phases, the
//! best schedule seen under the other objective. No-wait evaluations are
//! taken after construction, after iterated greedy, and for the
//! secondary-best schedule.
//!
//! # Reference
//! Henneberg & Neufeld (2016), "A constraint-based approach for the
//! permutation flow shop with missing operations"

use std::fmt;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use super::kpi::ScheduleKpi;
use crate::clock::{Clock, Stopwatch};
use crate::config::{IgOptions, Objective, SearchBudget, SolverConfig};
use crate::error::Result;
use crate::holes::HolePolicy;
use crate::models::{Instance, ScheduleResult, Time};
use crate::non_permutation::{NonPermutationSchedule, NonPermutationSearch};
use crate::permutation::{PermutationSchedule, PermutationSearch};

/// Solve phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Construction,
    LocalSearch,
    IteratedGreedy,
    NonPermutation,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Construction => "construction",
            Phase::LocalSearch => "local_search",
            Phase::IteratedGreedy => "iterated_greedy",
            Phase::NonPermutation => "non_permutation",
        };
        f.write_str(name)
    }
}

/// Results at the end of one phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseResult {
    pub phase: Phase,
    /// Current schedule.
    pub primary: ScheduleResult,
    /// Best schedule under the secondary objective so far.
    pub secondary: Option<ScheduleResult>,
}

/// Which schedule a no-wait evaluation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoWaitSource {
    Construction,
    Final,
    SecondaryBest,
}

/// No-wait (makespan, flow time) of one schedule under both placement
/// policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoWaitEvaluation {
    pub source: NoWaitSource,
    pub earliest: (Time, Time),
    pub smallest: (Time, Time),
}

impl NoWaitEvaluation {
    fn of(source: NoWaitSource, instance: &Instance, schedule: &PermutationSchedule) -> Result<Self> {
        Ok(Self {
            source,
            earliest: schedule.evaluate_no_wait(instance, HolePolicy::Earliest)?,
            smallest: schedule.evaluate_no_wait(instance, HolePolicy::Smallest)?,
        })
    }
}

/// Everything a solve produced.
#[derive(Debug, Clone, Serialize)]
pub struct SolveReport {
    pub objective: Objective,
    /// Destruction size actually used.
    pub destruction_size: usize,
    /// Acceptance temperature actually used.
    pub temperature: f64,
    pub iteration_limit: u64,
    pub time_limit_secs: f64,
    pub phases: Vec<PhaseResult>,
    /// Improving shift passes in the local search phase.
    pub shift_steps: usize,
    pub iterated_greedy_steps: u64,
    /// Improving sweeps of the non-permutation phase (0 when disabled).
    pub non_permutation_steps: usize,
    pub no_wait: Vec<NoWaitEvaluation>,
    /// Final permutation schedule.
    pub permutation: PermutationSchedule,
    /// Best schedule under the secondary objective.
    pub secondary: Option<PermutationSchedule>,
    pub non_permutation: Option<NonPermutationSchedule>,
    /// KPIs of the final permutation schedule.
    pub kpi: ScheduleKpi,
    pub elapsed_secs: f64,
}

impl SolveReport {
    /// Result of `phase`, if it ran.
    pub fn phase(&self, phase: Phase) -> Option<&PhaseResult> {
        self.phases.iter().find(|r| r.phase == phase)
    }

    /// Result of the last phase that ran.
    pub fn best(&self) -> Option<&ScheduleResult> {
        self.phases.last().map(|r| &r.primary)
    }
}

/// The full heuristic pipeline for one instance.
///
/// # Example
///
/// ```
/// use flowshop_mo::config::SolverConfig;
/// use flowshop_mo::models::Instance;
/// use flowshop_mo::scheduler::{Phase, Pipeline};
///
/// let inst = Instance::new(vec![vec![2, 3], vec![4, 1], vec![1, 5]], 0.0).unwrap();
/// let config = SolverConfig::new().with_iteration_limit(20).with_time_limit_secs(5.0);
/// let report = Pipeline::new(config).solve(&inst).unwrap();
///
/// assert_eq!(report.phase(Phase::IteratedGreedy).unwrap().primary.makespan, 10);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: SolverConfig,
}

impl Pipeline {
    /// Creates a pipeline.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solves `instance` against a wall clock started now.
    pub fn solve(&self, instance: &Instance) -> Result<SolveReport> {
        let clock = Stopwatch::start();
        self.run(instance, &clock)
    }

    /// Solves `instance`, measuring the time limit on `clock`.
    ///
    /// # Errors
    /// - [`crate::error::ScheduleError::Config`] for invalid parameters
    /// - [`crate::error::ScheduleError::NoFreeInterval`] if a no-wait
    ///   evaluation fails
    pub fn run(&self, instance: &Instance, clock: &dyn Clock) -> Result<SolveReport> {
        let config = &self.config;
        config.validate()?;
        let mut rng = SmallRng::seed_from_u64(config.seed);

        let destruction_size = config.destruction_size(instance);
        let temperature = config.temperature(instance);
        let iteration_limit = config.iteration_limit(instance);
        let time_limit = config.time_limit(instance);
        info!(
            event = "solve_start",
            jobs = instance.jobs(),
            machines = instance.machines(),
            objective = ?config.objective,
            destruction_size,
            temperature,
            iteration_limit,
            time_limit_secs = time_limit.as_secs_f64(),
        );

        let mut phases = Vec::new();
        let mut no_wait = Vec::new();

        let mut search = PermutationSearch::new(instance, config.objective, clock);
        search.total_time_order();
        search.clear();
        search.insert_all();
        search.record_secondary();
        search.mark_found();
        phases.push(permutation_phase(Phase::Construction, &search, 0));
        no_wait.push(NoWaitEvaluation::of(NoWaitSource::Construction, instance, search.schedule())?);

        let shift_steps = search.shift_local_search();
        phases.push(permutation_phase(Phase::LocalSearch, &search, shift_steps as u64));

        // The limit applies to the whole run, so the budget is checked
        // against the same clock that timed the earlier phases.
        let budget = SearchBudget {
            iteration_limit: Some(iteration_limit),
            time_limit: Some(time_limit),
        };
        // A derived temperature is zero only when every processing time is
        // zero, and then every order has the same objective.
        let iterated_greedy_steps = if temperature > 0.0 {
            let options = IgOptions::new(destruction_size, temperature, budget);
            search.iterated_greedy(&options, &mut rng)?
        } else {
            info!(event = "phase_skipped", phase = %Phase::IteratedGreedy, temperature);
            0
        };
        phases.push(permutation_phase(Phase::IteratedGreedy, &search, iterated_greedy_steps));

        no_wait.push(NoWaitEvaluation::of(NoWaitSource::Final, instance, search.schedule())?);
        let secondary = search.secondary_schedule();
        if let Some(best) = &secondary {
            no_wait.push(NoWaitEvaluation::of(NoWaitSource::SecondaryBest, instance, best)?);
        }

        let permutation = search.into_schedule();
        let kpi = ScheduleKpi::calculate(instance, &permutation)?;

        let mut non_permutation_steps = 0;
        let non_permutation = if config.non_permutation {
            let seed = NonPermutationSchedule::from_permutation(instance, &permutation);
            let mut np = NonPermutationSearch::new(instance, seed, clock);
            non_permutation_steps = np.shift_local_search();
            let primary = np.result();
            info!(
                event = "phase_end",
                phase = %Phase::NonPermutation,
                steps = non_permutation_steps as u64,
                makespan = primary.makespan,
                flowtime = primary.flowtime,
            );
            phases.push(PhaseResult {
                phase: Phase::NonPermutation,
                primary,
                secondary: None,
            });
            Some(np.into_schedule())
        } else {
            None
        };

        let elapsed_secs = clock.elapsed_secs();
        info!(event = "solve_end", elapsed_secs, makespan = kpi.makespan, flowtime = kpi.flowtime);

        Ok(SolveReport {
            objective: config.objective,
            destruction_size,
            temperature,
            iteration_limit,
            time_limit_secs: time_limit.as_secs_f64(),
            phases,
            shift_steps,
            iterated_greedy_steps,
            non_permutation_steps,
            no_wait,
            permutation,
            secondary,
            non_permutation,
            kpi,
            elapsed_secs,
        })
    }
}

fn permutation_phase(phase: Phase, search: &PermutationSearch<'_>, steps: u64) -> PhaseResult {
    let primary = search.result();
    let secondary = search.secondary_result();
    info!(
        event = "phase_end",
        phase = %phase,
        steps,
        makespan = primary.makespan,
        flowtime = primary.flowtime,
        time_found = primary.time_found,
    );
    PhaseResult {
        phase,
        primary,
        secondary,
    }
}
