//! Solve pipeline and KPI evaluation.
//!
//! Runs the heuristic phases in sequence and measures the resulting
//! schedule.
//!
//! # Algorithm
//!
//! `Pipeline` chains insertion construction, shift local search, iterated
//! greedy and (optionally) non-permutation local search, reporting each
//! phase's result. It is not exact, but reaches good schedules within a
//! fixed time or iteration budget.
//!
//! # KPI
//!
//! `ScheduleKpi` computes makespan, flow time, utilization, the no-wait
//! evaluations and the buffer measures of a finished schedule.
//!
//! # References
//!
//! - Ruiz & Stützle (2007), "A simple and effective iterated greedy
//!   algorithm for the permutation flowshop scheduling problem"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 6

mod kpi;
mod pipeline;

pub use kpi::ScheduleKpi;
pub use pipeline::{NoWaitEvaluation, NoWaitSource, Phase, PhaseResult, Pipeline, SolveReport};
