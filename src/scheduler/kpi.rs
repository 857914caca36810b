//! Schedule quality metrics (KPIs).
//!
//! Computes performance indicators of a complete schedule over an
//! instance.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan (C_max) | Latest completion time |
//! | Flow time | Sum of job completion times |
//! | Avg Flow Time | Flow time / n |
//! | Utilization | Busy time of a machine / makespan |
//! | No-wait (C_max, ΣC) | Same order evaluated by interval allocation |
//! | Buffer space | Most jobs waiting between machines at once |
//! | Rank inversion | Normalized overtaking between ready order and machine order |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use serde::Serialize;

use crate::error::Result;
use crate::holes::HolePolicy;
use crate::models::{Instance, Time};
use crate::non_permutation::NonPermutationSchedule;
use crate::permutation::PermutationSchedule;

/// Schedule performance indicators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleKpi {
    /// Makespan: latest completion time.
    pub makespan: Time,
    /// Sum of completion times.
    pub flowtime: Time,
    /// Mean completion time per job.
    pub avg_flow_time: f64,
    /// Mean machine utilization (0.0..=1.0).
    pub avg_utilization: f64,
    /// Utilization of machines `1..=m`, in order.
    pub utilization_by_machine: Vec<f64>,
    /// No-wait (makespan, flow time), earliest-fit placement. Permutation
    /// schedules only.
    pub no_wait_earliest: Option<(Time, Time)>,
    /// No-wait (makespan, flow time), smallest-fit placement. Permutation
    /// schedules only.
    pub no_wait_smallest: Option<(Time, Time)>,
    /// Maximum number of simultaneously buffered jobs.
    pub buffer_space: usize,
    /// Normalized job rank inversion.
    pub rank_inversion: f64,
    /// Operations with non-zero processing time.
    pub effective_operations: usize,
}

impl ScheduleKpi {
    /// Computes KPIs of a complete permutation schedule.
    ///
    /// # Errors
    /// [`crate::error::ScheduleError::NoFreeInterval`] if the no-wait
    /// allocation fails.
    pub fn calculate(instance: &Instance, schedule: &PermutationSchedule) -> Result<Self> {
        let np = NonPermutationSchedule::from_permutation(instance, schedule);
        let mut kpi = Self::calculate_non_permutation(instance, &np);
        kpi.no_wait_earliest = Some(schedule.evaluate_no_wait(instance, HolePolicy::Earliest)?);
        kpi.no_wait_smallest = Some(schedule.evaluate_no_wait(instance, HolePolicy::Smallest)?);
        Ok(kpi)
    }

    /// Computes KPIs of a complete non-permutation schedule.
    pub fn calculate_non_permutation(instance: &Instance, schedule: &NonPermutationSchedule) -> Self {
        let (makespan, flowtime) = schedule.makespan_flowtime(instance);
        let n = instance.jobs();

        let utilization_by_machine: Vec<f64> = (1..=instance.machines())
            .map(|i| {
                if makespan == 0 {
                    0.0
                } else {
                    let busy: Time = (1..=n).map(|j| instance.p(j, i)).sum();
                    busy as f64 / makespan as f64
                }
            })
            .collect();
        let avg_utilization = if utilization_by_machine.is_empty() {
            0.0
        } else {
            utilization_by_machine.iter().sum::<f64>() / utilization_by_machine.len() as f64
        };

        Self {
            makespan,
            flowtime,
            avg_flow_time: if n == 0 { 0.0 } else { flowtime as f64 / n as f64 },
            avg_utilization,
            utilization_by_machine,
            no_wait_earliest: None,
            no_wait_smallest: None,
            buffer_space: schedule.buffer_space(instance),
            rank_inversion: schedule.job_rank_inversion(instance),
            effective_operations: instance.num_effective_operations(),
        }
    }

    /// Whether the schedule meets the given makespan and utilization bounds.
    pub fn meets_thresholds(&self, max_makespan: Time, min_utilization: f64) -> bool {
        self.makespan <= max_makespan && self.avg_utilization >= min_utilization
    }
}
