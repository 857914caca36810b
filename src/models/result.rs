//! Reported results.
//!
//! A [`ScheduleResult`] is the triple every phase reports: makespan, flow
//! time, and the elapsed time at which the schedule was found.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Time;

/// Makespan, flow time and time-when-found of a schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    /// Maximum completion time.
    pub makespan: Time,
    /// Sum of completion times.
    pub flowtime: Time,
    /// Seconds since the run started when this schedule was found.
    pub time_found: f64,
}

impl ScheduleResult {
    /// Creates a result.
    pub fn new(makespan: Time, flowtime: Time, time_found: f64) -> Self {
        Self {
            makespan,
            flowtime,
            time_found,
        }
    }
}

impl fmt::Display for ScheduleResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.makespan, self.flowtime, self.time_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let r = ScheduleResult::new(10, 27, 0.5);
        assert_eq!(r.to_string(), "10 27 0.5");
    }

    #[test]
    fn test_serde_roundtrip() {
        let r = ScheduleResult::new(12, 40, 1.25);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"makespan\":12"));
        let back: ScheduleResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
