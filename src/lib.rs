//! Heuristic flow shop scheduling with missing operations.
//!
//! Jobs visit machines `1..=m` in order and may skip some of them. The
//! crate builds and improves schedules minimizing makespan or total flow
//! time.
//!
//! # Modules
//!
//! - **`models`**: The immutable `Instance` and the `ScheduleResult` triple
//! - **`permutation`**: One shared job order; insertion construction, shift
//!   local search, iterated greedy
//! - **`non_permutation`**: Independent per-machine orders; reinsertion
//!   local search and buffer analysis
//! - **`holes`**: Idle-interval allocator behind the no-wait evaluation
//! - **`scheduler`**: The end-to-end `Pipeline` and `ScheduleKpi`
//! - **`config`**: TOML-loadable `SolverConfig` and resolved search options
//! - **`validation`**: Input integrity checks (table shape, overflow, permutations)
//! - **`clock`**, **`random`**: Injected time source and sampling helpers
//!
//! # Example
//!
//! ```
//! use flowshop_mo::config::{Objective, SolverConfig};
//! use flowshop_mo::models::Instance;
//! use flowshop_mo::scheduler::Pipeline;
//!
//! let inst = Instance::from_hn_str(
//!     "numberMachines 2 numberJobs 3 missing Operations 0.0\n\
//!      t_0_0 2 t_0_1 4 t_0_2 1\n\
//!      t_1_0 3 t_1_1 1 t_1_2 5\n",
//! )
//! .unwrap();
//! let config = SolverConfig::new()
//!     .with_objective(Objective::Flowtime)
//!     .with_iteration_limit(50)
//!     .with_time_limit_secs(10.0);
//!
//! let report = Pipeline::new(config).solve(&inst).unwrap();
//! assert!(report.permutation.is_valid_permutation());
//! ```
//!
//! # References
//!
//! - Nawaz, Enscore & Ham (1983), "A heuristic algorithm for the m-machine,
//!   n-job flow-shop sequencing problem"
//! - Ruiz & Stützle (2007), "A simple and effective iterated greedy
//!   algorithm for the permutation flowshop scheduling problem"
//! - Henneberg & Neufeld (2016), "A constraint-based approach for the
//!   permutation flow shop with missing operations"

pub mod clock;
pub mod config;
pub mod error;
pub mod holes;
pub mod models;
pub mod non_permutation;
pub mod permutation;
pub mod random;
pub mod scheduler;
pub mod validation;

pub use error::{Result, ScheduleError};
