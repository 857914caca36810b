//! Non-permutation flow shop engine.
//!
//! Each machine keeps its own job order, so a job may overtake another
//! between machines. The engine is usually seeded from a finished
//! permutation schedule and improved by reinsertion local search:
//!
//! - [`NonPermutationSchedule`]: per-machine orders with a rank index,
//!   evaluation, serialization and buffer analysis
//! - [`NonPermutationSearch`]: insertion over position/machine-split
//!   candidates and shift local search on flow time

mod analysis;
mod schedule;
mod search;

pub use analysis::kendall_tau;
pub use schedule::NonPermutationSchedule;
pub use search::{NonPermutationSearch, NpMove};
