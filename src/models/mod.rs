//! Flow shop domain models.
//!
//! Provides the immutable problem instance and the result types reported
//! by every search phase. Schedules themselves live with the engines that
//! mutate them ([`crate::permutation`], [`crate::non_permutation`]).
//!
//! # Conventions
//!
//! | Concept | Representation |
//! |---------|----------------|
//! | Job | `usize` in `1..=n` |
//! | Machine | `usize` in `1..=m` |
//! | Missing operation | processing time `0` |
//! | Unattained time | [`INFINITE_TIME`] |

mod instance;
mod result;

pub use instance::{Instance, Job, Time, INFINITE_TIME};
pub use result::ScheduleResult;
