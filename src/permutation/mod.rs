//! Permutation flow shop engine.
//!
//! All machines process jobs in the same order. The engine builds that
//! order incrementally and improves it in place:
//!
//! - [`PermutationSchedule`]: the order, its prefix/suffix split and
//!   objective value, plus from-scratch evaluation and serialization
//! - [`PermutationSearch`]: insertion construction, shift local search,
//!   perturbation and iterated greedy over an owned schedule
//!
//! # Example
//!
//! ```
//! use flowshop_mo::clock::Stopwatch;
//! use flowshop_mo::config::Objective;
//! use flowshop_mo::models::Instance;
//! use flowshop_mo::permutation::PermutationSearch;
//!
//! let inst = Instance::new(vec![vec![2, 3], vec![4, 1], vec![1, 5]], 0.0).unwrap();
//! let clock = Stopwatch::start();
//! let mut search = PermutationSearch::new(&inst, Objective::Makespan, &clock);
//! search.total_time_order();
//! search.clear();
//! search.insert_all();
//! search.shift_local_search();
//!
//! assert_eq!(search.schedule().objective(), 10);
//! ```

mod accel;
mod iterated_greedy;
mod schedule;
mod search;

pub use schedule::PermutationSchedule;
pub use search::{PermutationSearch, SecondaryBest};
